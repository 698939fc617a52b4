//! HTTP polling transport, grounded on `bancho/client.py::BanchoClient`.
//! A plain request/response cycle: login is one POST that either returns a
//! `cho-token` header or a packet stream carrying a `LoginError`; every
//! subsequent cycle POSTs the outbound queue (or nothing, for a bare ping)
//! and reads back a zlib-compressed packet stream.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;

use crate::error::{ClientError, Result};

pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(server: &str, client_version: &str) -> Result<Self> {
        let domain = format!("c.{server}");
        let url = format!("https://{domain}");

        let mut headers = HeaderMap::new();
        headers.insert("osu-version", HeaderValue::from_str(client_version)?);
        headers.insert("Accept-Encoding", HeaderValue::from_static("gzip, deflate"));
        headers.insert("User-Agent", HeaderValue::from_static("osu!"));
        headers.insert("Host", HeaderValue::from_str(&domain)?);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, url })
    }

    /// POSTs the login body. Returns `(token, response_body)` — the
    /// caller decides what to do with `response_body` depending on
    /// whether a token came back (see `bancho/client.py::connect`).
    pub async fn login(&self, body: String) -> Result<(Option<String>, Vec<u8>)> {
        let response = self.client.post(&self.url).body(body).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::ConnectionRefused {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let token = response
            .headers()
            .get("cho-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?.to_vec();
        Ok((token, bytes))
    }

    /// Sends `body` (the concatenated outbound queue, or empty for a bare
    /// ping) with the session token attached and returns the response
    /// bytes, grounded on `BanchoClient.dequeue`.
    pub async fn cycle(&self, token: &str, body: Vec<u8>) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.url)
            .header("osu-token", token)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::ConnectionRefused {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
