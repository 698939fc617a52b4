//! Client configuration, mirroring the keyword arguments `Game.__init__`
//! takes in the reference client.

/// How the client reaches the server: the stock HTTP polling transport,
/// or a persistent TCP socket (used by `cho-token`-less IRC-over-bancho
/// style deployments and some private servers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Http,
    Tcp,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub server: String,
    pub client_version: String,
    /// Executable hash of `osu!.exe`, as returned by a check-updates call.
    pub executable_hash: String,
    pub transport: TransportKind,
    /// Only meaningful for `TransportKind::Tcp`.
    pub tcp_port: u16,
    pub tournament: bool,
    pub disable_chat: bool,
    pub min_idle_time: f64,
    pub max_idle_time: f64,
    /// Bound on concurrently running threaded dispatch handlers.
    pub worker_count: usize,
}

impl Config {
    pub fn new(username: impl Into<String>, password: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            server: server.into(),
            client_version: "b20220829".to_string(),
            executable_hash: String::new(),
            transport: TransportKind::Http,
            tcp_port: 13381,
            tournament: false,
            disable_chat: false,
            min_idle_time: 1.0,
            max_idle_time: 4.0,
            worker_count: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_client() {
        let config = Config::new("user", "pw", "ppy.sh");
        assert_eq!(config.min_idle_time, 1.0);
        assert_eq!(config.max_idle_time, 4.0);
        assert_eq!(config.worker_count, 10);
    }
}
