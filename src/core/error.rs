//! Error types for each hop of the quote pipeline.
//!
//! Every failure is reported as a distinct variant so callers can tell a
//! slow upstream from a bad payload or a failed write.
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while fetching a quote from the upstream API.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network or connection failure, including an exhausted fetch budget.
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-success status code.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// The upstream body did not have the expected shape.
    #[error("upstream decode error: {0}")]
    Decode(String),
}

/// Failure while persisting a quote.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The insert did not commit (deadline exceeded, constraint violation, lost connection).
    #[error("store write error: {0}")]
    Write(String),

    /// The store could not be opened or its table could not be created.
    #[error("store initialization error: {0}")]
    Init(#[from] sqlx::Error),
}

/// Failure in the standalone quote client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The call to the quote service failed or returned a non-200 status.
    #[error("service call failed: {0}")]
    Call(String),

    /// The service response did not carry a usable `bid`.
    #[error("could not decode service response: {0}")]
    Decode(String),

    /// The artifact file could not be written.
    #[error("failed to write artifact {}: {source}", .path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_underlying_cause() {
        let err = FetchError::Transport("deadline of 200ms exceeded".to_string());
        assert_eq!(
            err.to_string(),
            "upstream transport error: deadline of 200ms exceeded"
        );
        assert_eq!(
            FetchError::Status(503).to_string(),
            "upstream returned status 503"
        );

        let err = ClientError::ArtifactWrite {
            path: PathBuf::from("/nope/cotacao.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        };
        assert_eq!(
            err.to_string(),
            "failed to write artifact /nope/cotacao.txt: no such directory"
        );
    }
}
