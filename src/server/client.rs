//! Client for connecting to the suggestion daemon

use crate::index::types::CorpusMode;
use crate::server::get_socket_path;
use crate::server::protocol::{
    Request, Response, StatusResponse, SuggestResponse, read_message, write_message,
};
use std::io::{BufReader, BufWriter};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Read/write timeout
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Suggestion daemon is not running")]
    NotRunning,
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Server error: {0}")]
    ServerError(String),
    #[error("Invalid response from server")]
    InvalidResponse,
}

/// Client for the suggestion daemon
pub struct SuggestClient {
    reader: BufReader<UnixStream>,
    writer: BufWriter<UnixStream>,
}

impl SuggestClient {
    /// Try to connect to the running daemon
    /// Returns None if daemon is not running (allowing fallback to direct mode)
    pub fn connect() -> Option<Self> {
        Self::connect_to(&get_socket_path())
    }

    /// Connect to a daemon listening on a specific socket
    pub fn connect_to(socket_path: &Path) -> Option<Self> {
        if !socket_path.exists() {
            return None;
        }

        let stream = UnixStream::connect(socket_path).ok()?;

        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        let reader = BufReader::new(stream.try_clone().ok()?);
        let writer = BufWriter::new(stream);

        Some(Self { reader, writer })
    }

    /// Connect or return an error (for when daemon is required)
    pub fn connect_required() -> ClientResult<Self> {
        Self::connect().ok_or(ClientError::NotRunning)
    }

    fn call(&mut self, request: &Request) -> ClientResult<Response> {
        write_message(&mut self.writer, request)?;
        match read_message(&mut self.reader)? {
            Response::Error { message } => Err(ClientError::ServerError(message)),
            response => Ok(response),
        }
    }

    /// Complete a prefix
    pub fn suggest(
        &mut self,
        prefix: &str,
        root_path: &Path,
        mode: CorpusMode,
        limit: usize,
    ) -> ClientResult<SuggestResponse> {
        let request = Request::Suggest {
            prefix: prefix.to_string(),
            root_path: root_path.to_path_buf(),
            mode,
            limit,
        };

        match self.call(&request)? {
            Response::Suggest(sr) => Ok(sr),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Get server status
    pub fn status(&mut self) -> ClientResult<StatusResponse> {
        match self.call(&Request::Status)? {
            Response::Status(status) => Ok(status),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request a vocabulary reload
    pub fn reload(&mut self, root_path: &Path, mode: CorpusMode) -> ClientResult<(bool, String)> {
        let request = Request::Reload {
            root_path: PathBuf::from(root_path),
            mode,
        };

        match self.call(&request)? {
            Response::Reloaded { success, message } => Ok((success, message)),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request graceful shutdown
    pub fn shutdown(&mut self) -> ClientResult<()> {
        match self.call(&Request::Shutdown)? {
            Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Ping the server
    pub fn ping(&mut self) -> ClientResult<()> {
        match self.call(&Request::Ping)? {
            Response::Pong => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_to_missing_socket() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SuggestClient::connect_to(&dir.path().join("absent.sock")).is_none());
    }
}
