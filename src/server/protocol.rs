//! Protocol messages for client-server communication
//!
//! Uses a simple length-prefixed JSON protocol:
//! - 4 bytes (little-endian u32): message length
//! - N bytes: JSON-encoded message

use crate::index::types::CorpusMode;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Largest message accepted from the wire
const MAX_MESSAGE_LEN: usize = 100 * 1024 * 1024;

/// Request from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Complete a prefix
    Suggest {
        /// What the user typed so far
        prefix: String,
        /// Root path of the corpus
        root_path: PathBuf,
        mode: CorpusMode,
        /// Maximum number of suggestions, capped by the server; 0 yields none
        limit: usize,
    },

    /// Check server health and get stats
    Status,

    /// Reload the vocabulary of a corpus
    Reload { root_path: PathBuf, mode: CorpusMode },

    /// Graceful shutdown request
    Shutdown,

    /// Ping for connection testing
    Ping,
}

/// Response from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Suggest(SuggestResponse),

    Status(StatusResponse),

    /// Reload completed
    Reloaded { success: bool, message: String },

    /// Shutdown acknowledged
    ShuttingDown,

    Pong,

    Error { message: String },
}

/// Suggestions for one prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    /// Completions in trie order
    pub suggestions: Vec<String>,
    /// Time taken in milliseconds
    pub duration_ms: f64,
    /// Whether results came from cache
    pub cached: bool,
}

/// Server status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    /// Number of vocabularies currently loaded
    pub vocabularies_loaded: usize,
    /// Words across all loaded vocabularies
    pub total_words: usize,
    pub queries_served: u64,
    /// Cache hit rate (0.0 - 1.0)
    pub cache_hit_rate: f32,
    /// Approximate trie memory in bytes
    pub memory_bytes: u64,
    pub loaded_roots: Vec<(PathBuf, CorpusMode)>,
}

/// Write a message to a stream with length prefix
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })?;

    let len = json.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read a message from a stream with length prefix
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;

    serde_json::from_slice(&buf).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_suggest_request() {
        let req = Request::Suggest {
            prefix: "caf".to_string(),
            root_path: PathBuf::from("/srv/www"),
            mode: CorpusMode::Images,
            limit: 10,
        };

        let mut buf = Vec::new();
        write_message(&mut buf, &req).unwrap();
        assert_eq!(u32::from_le_bytes(buf[..4].try_into().unwrap()) as usize, buf.len() - 4);

        let mut cursor = Cursor::new(buf);
        let decoded: Request = read_message(&mut cursor).unwrap();

        match decoded {
            Request::Suggest { prefix, root_path, mode, limit } => {
                assert_eq!(prefix, "caf");
                assert_eq!(root_path, PathBuf::from("/srv/www"));
                assert_eq!(mode, CorpusMode::Images);
                assert_eq!(limit, 10);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_suggest_response_keeps_order() {
        let resp = Response::Suggest(SuggestResponse {
            suggestions: vec!["search".into(), "series".into(), "setup".into()],
            duration_ms: 0.2,
            cached: true,
        });

        let mut buf = Vec::new();
        write_message(&mut buf, &resp).unwrap();
        let decoded: Response = read_message(&mut Cursor::new(buf)).unwrap();

        match decoded {
            Response::Suggest(sr) => {
                assert_eq!(sr.suggestions, vec!["search", "series", "setup"]);
                assert!(sr.cached);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_oversized_message_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(u32::MAX).to_le_bytes());
        let err = read_message::<_, Request>(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_message() {
        let mut buf = Vec::new();
        write_message(&mut buf, &Request::Ping).unwrap();
        buf.truncate(buf.len() - 1);
        let err = read_message::<_, Request>(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
