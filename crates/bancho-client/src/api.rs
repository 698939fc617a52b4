//! One-shot pre-login REST calls, grounded on `api/client.py::WebAPI.check_updates`
//! and `game.py::Game.fetch_version`. Both run once before the bancho session
//! itself opens: resolving a client version string and fetching the
//! executable hash bancho needs in the login fingerprint.

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// One entry of the `/web/check-updates.php` response.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFile {
    pub filename: String,
    pub file_hash: String,
}

/// Queries `check-updates.php` for `stream` and returns the listed files.
/// The caller picks out `osu!.exe`'s hash with [`find_executable_hash`].
pub async fn check_updates(client: &reqwest::Client, stream: &str) -> Result<Vec<UpdateFile>> {
    let response = client
        .get("https://osu.ppy.sh/web/check-updates.php")
        .query(&[("action", "check"), ("stream", stream)])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientError::ConnectionRefused {
            url: "https://osu.ppy.sh/web/check-updates.php".to_string(),
            status: response.status().as_u16(),
        });
    }

    let body = response.text().await?;
    if body.contains("fallback") {
        return Err(ClientError::ConnectionRefused {
            url: "https://osu.ppy.sh/web/check-updates.php".to_string(),
            status: 200,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

/// The hash of `osu!.exe` out of a `check_updates` response, matching
/// `ClientInfo.get_file_hash`.
pub fn find_executable_hash(files: &[UpdateFile]) -> Option<&str> {
    files
        .iter()
        .find(|file| file.filename == "osu!.exe")
        .map(|file| file.file_hash.as_str())
}

/// Resolves the latest client version for `stream` by following the
/// changelog redirect and reading the version segment back out of the
/// final URL, matching `Game.fetch_version`.
pub async fn fetch_version(client: &reqwest::Client, stream: &str, tournament: bool) -> Result<String> {
    let url = format!("https://osu.ppy.sh/home/changelog/{stream}");
    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(ClientError::ConnectionRefused {
            url,
            status: response.status().as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let version = final_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    if version.replace('.', "").chars().all(|c| c.is_ascii_digit()) && !version.is_empty() {
        let suffix = if tournament { "tourney" } else { "" };
        Ok(format!("b{version}{suffix}"))
    } else {
        Err(ClientError::InvalidVersionResponse(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_executable_hash_matches_osu_exe_entry() {
        let files = vec![
            UpdateFile { filename: "avcodec-51.dll".into(), file_hash: "aaa".into() },
            UpdateFile { filename: "osu!.exe".into(), file_hash: "deadbeef".into() },
        ];
        assert_eq!(find_executable_hash(&files), Some("deadbeef"));
    }

    #[test]
    fn find_executable_hash_missing_entry_is_none() {
        let files = vec![UpdateFile { filename: "avcodec-51.dll".into(), file_hash: "aaa".into() }];
        assert_eq!(find_executable_hash(&files), None);
    }
}
