//! Minimal headless session runner: logs in, joins `#osu`, and prints chat
//! and presence events until interrupted.

use bancho_client::config::{Config, TransportKind};
use bancho_client::BanchoClient;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("bancho_client=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let username = args.get(1).cloned().unwrap_or_else(|| "guest".to_string());
    let password = args.get(2).cloned().unwrap_or_default();
    let server = args.get(3).cloned().unwrap_or_else(|| "ppy.sh".to_string());

    info!(username, server, "starting bancho session");

    let mut config = Config::new(username, password, server);
    config.transport = TransportKind::Http;

    let mut client = BanchoClient::new(config)?;
    client.run().await?;

    Ok(())
}
