use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use oggle::index::types::CorpusMode;
use oggle::query::SuggestionEngine;
use oggle::utils::{AppConfig, remove_vocabulary};
use oggle::{index, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "oggle")]
#[command(about = "Prefix autocomplete over the words of a document corpus")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or rebuild the vocabulary of a corpus
    Index {
        /// Corpus root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Index image file names instead of HTML pages
        #[arg(long)]
        images: bool,

        /// Remove the existing vocabulary first
        #[arg(short, long)]
        force: bool,
    },
    /// Complete a prefix
    Suggest {
        /// What the user typed so far
        prefix: String,

        /// Corpus root
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Use the image vocabulary
        #[arg(long)]
        images: bool,

        /// Maximum number of suggestions
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print a JSON array instead of one word per line
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show vocabulary statistics
    Stats {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        images: bool,
    },
    /// List all built vocabularies
    List,
    /// Remove a vocabulary
    Remove {
        /// Corpus root the vocabulary was built for
        path: PathBuf,

        #[arg(long)]
        images: bool,
    },
    /// Manage the suggestion daemon (keeps vocabularies warm)
    #[cfg(all(unix, feature = "daemon"))]
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[cfg(all(unix, feature = "daemon"))]
#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon in background
    Start,
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
    /// Run daemon in foreground (for debugging)
    Foreground,
    /// Reload the vocabulary of a corpus
    Reload {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        images: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.command);

    match cli.command {
        Commands::Index { path, images, force } => {
            let mode = CorpusMode::from_flag(images);
            let summary = index::build::build_vocabulary(&path, mode, force)?;
            notify_daemon(&summary.root, mode);
        }
        Commands::Suggest {
            prefix,
            path,
            images,
            limit,
            json,
            no_color,
        } => {
            let suggestions = suggest(&prefix, &path, CorpusMode::from_flag(images), limit)?;
            if json {
                output::print_suggestions_json(&suggestions)?;
            } else {
                output::print_suggestions(&prefix, &suggestions, !no_color)?;
            }
        }
        Commands::Stats { path, images } => {
            index::stats::show_stats(&path, CorpusMode::from_flag(images))?;
        }
        Commands::List => {
            index::stats::list_vocabularies_cmd()?;
        }
        Commands::Remove { path, images } => {
            let root = path.canonicalize().context("Invalid corpus path")?;
            let mode = CorpusMode::from_flag(images);
            if remove_vocabulary(&root, mode)? {
                println!("Removed {} vocabulary for: {}", mode, root.display());
            } else {
                println!("No {} vocabulary for: {}", mode, root.display());
            }
            notify_daemon(&root, mode);
        }
        #[cfg(all(unix, feature = "daemon"))]
        Commands::Daemon { action } => {
            handle_daemon_command(action)?;
        }
    }

    Ok(())
}

/// Daemon runs log at info, everything else only warns
fn init_logging(command: &Commands) {
    #[cfg(all(unix, feature = "daemon"))]
    let default = match command {
        Commands::Daemon { .. } => "info",
        _ => "warn",
    };
    #[cfg(not(all(unix, feature = "daemon")))]
    let default = {
        let _ = command;
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

/// Ask the daemon when it is up, otherwise load the vocabulary directly
fn suggest(prefix: &str, path: &Path, mode: CorpusMode, limit: Option<usize>) -> Result<Vec<String>> {
    let root = path.canonicalize().context("Invalid corpus path")?;
    let config = AppConfig::load_or_default();
    let limit = limit.unwrap_or(config.max_suggestions);

    #[cfg(all(unix, feature = "daemon"))]
    if let Some(mut client) = oggle::server::SuggestClient::connect() {
        match client.suggest(prefix, &root, mode, limit) {
            Ok(response) => return Ok(response.suggestions),
            Err(e) => warn!("daemon query failed, loading vocabulary directly: {}", e),
        }
    }

    let engine = SuggestionEngine::open(&root, mode, &config)?;
    if engine.word_count() == 0 {
        warn!("{} vocabulary for {} is empty (run `oggle index`)", mode, root.display());
    }
    Ok(engine.suggest_n(prefix, limit))
}

/// Make a running daemon pick up a rebuilt or removed vocabulary
#[cfg(all(unix, feature = "daemon"))]
fn notify_daemon(root: &Path, mode: CorpusMode) {
    let Some(mut client) = oggle::server::SuggestClient::connect() else {
        return;
    };
    match client.reload(root, mode) {
        Ok((true, message)) => info!("daemon: {}", message),
        Ok((false, message)) => warn!("daemon reload failed: {}", message),
        Err(e) => warn!("daemon reload failed: {}", e),
    }
}

#[cfg(not(all(unix, feature = "daemon")))]
fn notify_daemon(_root: &Path, _mode: CorpusMode) {}

#[cfg(all(unix, feature = "daemon"))]
fn handle_daemon_command(action: DaemonAction) -> Result<()> {
    use oggle::server::{self, SuggestClient, get_socket_path, is_daemon_running};

    match action {
        DaemonAction::Start => {
            if is_daemon_running() {
                println!("Daemon is already running");
                return Ok(());
            }

            println!("Starting oggle daemon...");
            server::daemon::daemonize(AppConfig::load_or_default())?;

            // Wait a moment for daemon to start
            std::thread::sleep(std::time::Duration::from_millis(500));

            if is_daemon_running() {
                println!("Daemon started (socket: {})", get_socket_path().display());
            } else {
                println!("Daemon may have failed to start. Check /tmp/oggled-error.log");
            }
        }

        DaemonAction::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            println!("Stopping daemon...");

            // Try graceful shutdown via client first
            if let Some(mut client) = SuggestClient::connect() {
                let _ = client.shutdown();
                std::thread::sleep(std::time::Duration::from_millis(500));
            }

            if is_daemon_running() {
                server::daemon::stop_daemon()?;
            }

            println!("Daemon stopped");
        }

        DaemonAction::Status => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            match SuggestClient::connect() {
                Some(mut client) => match client.status() {
                    Ok(status) => {
                        println!("oggle daemon status:");
                        println!("  Uptime: {}s", status.uptime_secs);
                        println!("  Vocabularies loaded: {}", status.vocabularies_loaded);
                        println!("  Total words: {}", status.total_words);
                        println!("  Queries served: {}", status.queries_served);
                        println!("  Cache hit rate: {:.1}%", status.cache_hit_rate * 100.0);
                        println!(
                            "  Memory (approx): {:.1} MB",
                            status.memory_bytes as f64 / 1024.0 / 1024.0
                        );
                        if !status.loaded_roots.is_empty() {
                            println!("  Loaded corpora:");
                            for (root, mode) in &status.loaded_roots {
                                println!("    - {} ({})", root.display(), mode);
                            }
                        }
                    }
                    Err(e) => {
                        println!("Failed to get status: {}", e);
                    }
                },
                None => {
                    println!("Daemon is running but not responding");
                }
            }
        }

        DaemonAction::Foreground => {
            if is_daemon_running() {
                println!("Daemon is already running in background. Stop it first with 'oggle daemon stop'");
                return Ok(());
            }

            println!("Running daemon in foreground (Ctrl+C to stop)...");
            server::daemon::run_foreground(AppConfig::load_or_default())?;
        }

        DaemonAction::Reload { path, images } => {
            let root = path.canonicalize().context("Invalid corpus path")?;

            if !is_daemon_running() {
                println!("Daemon is not running. Start it with 'oggle daemon start'");
                return Ok(());
            }

            match SuggestClient::connect() {
                Some(mut client) => match client.reload(&root, CorpusMode::from_flag(images)) {
                    Ok((true, message)) => println!("Reloaded: {}", message),
                    Ok((false, message)) => println!("Reload failed: {}", message),
                    Err(e) => println!("Failed to reload: {}", e),
                },
                None => {
                    println!("Failed to connect to daemon");
                }
            }
        }
    }

    Ok(())
}
