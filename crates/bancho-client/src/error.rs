use thiserror::Error;

use bancho_protocol::ProtocolError;

/// Transport, login and fatal-runtime errors. Malformed-frame errors from
/// the wire codec are folded in via `#[from]` rather than re-wrapped.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection to {url} was refused: {status}")]
    ConnectionRefused { url: String, status: u16 },

    #[error("login rejected: {0}")]
    LoginRejected(#[from] bancho_protocol::LoginError),

    #[error("server did not return a cho-token")]
    MissingToken,

    #[error("could not parse a client version out of changelog response {0:?}")]
    InvalidVersionResponse(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
