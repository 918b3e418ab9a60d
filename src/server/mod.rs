//! Suggestion daemon
//!
//! Keeps vocabularies loaded so each keystroke is answered without reading
//! the vocabulary file again.
//!
//! Architecture:
//! - `oggle daemon`: loads vocabularies on demand, answers over a Unix socket
//! - Client: connects to the socket, sends prefixes, receives completions
//! - Fallback: if the daemon is unavailable the CLI loads the vocabulary itself

mod client;
pub mod daemon;
pub mod protocol;

pub use client::{ClientError, SuggestClient};

use std::path::PathBuf;

/// Socket path for the daemon, in a per-user runtime directory
pub fn get_socket_path() -> PathBuf {
    runtime_file("oggle.sock")
}

/// PID file path for the daemon
pub fn get_pid_path() -> PathBuf {
    runtime_file("oggle.pid")
}

fn runtime_file(name: &str) -> PathBuf {
    // XDG_RUNTIME_DIR is tmpfs-backed and private to the user
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(name);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".local").join("run").join(name);
    }

    let uid = unsafe { libc::getuid() };
    let (stem, ext) = name.split_once('.').unwrap_or((name, ""));
    PathBuf::from(format!("/tmp/{}-{}.{}", stem, uid, ext))
}

/// Check if the daemon is running
pub fn is_daemon_running() -> bool {
    let pid_path = get_pid_path();
    if !pid_path.exists() {
        return false;
    }

    if let Ok(pid_str) = std::fs::read_to_string(&pid_path) {
        if let Ok(pid) = pid_str.trim().parse::<i32>() {
            // Signal 0 only checks that the process exists
            unsafe {
                return libc::kill(pid, 0) == 0;
            }
        }
    }

    false
}
