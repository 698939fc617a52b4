//! The two interchangeable wire transports: HTTP polling and a persistent
//! TCP socket. Both speak the same framed packet format underneath; only
//! the connection shape and the compression algorithm differ.

pub mod http;
pub mod tcp;

pub use http::HttpTransport;
pub use tcp::TcpTransport;
