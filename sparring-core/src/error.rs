use std::time::Duration;

use thiserror::Error;

/// Failures a client connection can run into.
///
/// None of these ever escape the connection: they are logged, recorded in the
/// client's report and move the connection to `Disconnected`. A clean EOF from
/// the peer is not an error and is recorded as `ClientEvent::PeerClosed`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect to {addr} failed: {source}")]
    ConnectFailure {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("read failed: {0}")]
    ReadFailure(#[source] std::io::Error),

    #[error("write failed: {0}")]
    WriteFailure(#[source] std::io::Error),

    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("client is not connected")]
    NotConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_failure_names_the_target() {
        let err = ClientError::ConnectFailure {
            addr: "127.0.0.1:1".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        let text = err.to_string();
        assert!(text.starts_with("connect to 127.0.0.1:1 failed"));
    }
}
