//! CLI argument surface and process wiring.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::Parser;
use tracing::{info, warn};

use crate::error::Result;
use crate::index::{ContentIndex, FileIndex};
use crate::indexing;
use crate::matcher::{IgnoreMatcher, MatcherOptions};
use crate::mcp::handlers::HandlerContext;
use crate::mcp::server;
use crate::sync;
use crate::watcher::{IgnoreChecker, Watcher};

/// In-memory indexed code search over MCP stdio.
#[derive(Parser, Debug)]
#[command(name = "codeindex-mcp", version, about, after_help = "\
The server reads JSON-RPC 2.0 requests from stdin and writes responses to\n\
stdout. Logging never touches stdout; it goes to the log file (default:\n\
codeindex-mcp.log in the root directory) or stderr.")]
pub struct Cli {
    /// Project root directory (default: current working directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Extra ignore pattern (repeatable)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Force-include pattern that overrides all excludes (repeatable)
    #[arg(long = "force-include", action = clap::ArgAction::Append)]
    pub force_include: Vec<String>,

    /// Maximum file size in bytes
    #[arg(long = "max-file-size", default_value = "1048576")]
    pub max_file_size: u64,

    /// Default max search results
    #[arg(long = "max-results", default_value = "50")]
    pub max_results: i64,

    /// Log level: debug|info|warn|error
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    /// Log file path (default: codeindex-mcp.log in root dir)
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Enable logging (set to false to disable all logging)
    #[arg(long = "log-enabled", default_value = "true", action = clap::ArgAction::Set)]
    pub log_enabled: bool,

    /// Periodic sync interval in seconds (0 = disabled)
    #[arg(long = "sync-interval", default_value = "0")]
    pub sync_interval: u64,
}

/// Build every subsystem and run the server loop until stdin closes.
pub fn run(cli: Cli) -> Result<()> {
    let root_dir = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let root_dir = std::fs::canonicalize(&root_dir).unwrap_or(root_dir);

    if cli.log_enabled {
        init_logging(&cli.log_level, cli.log_file.clone(), &root_dir);
    }

    info!(
        root = %root_dir.display(),
        max_file_size = cli.max_file_size,
        max_results = cli.max_results,
        force_includes = ?cli.force_include,
        "starting codeindex-mcp"
    );

    let start_time = Instant::now();

    let matcher = Arc::new(IgnoreMatcher::new(MatcherOptions {
        root_dir: root_dir.clone(),
        custom_patterns: cli.exclude,
        force_include_patterns: cli.force_include,
        max_file_size_bytes: cli.max_file_size,
    })?);

    let file_index = Arc::new(FileIndex::new());
    let content_index = Arc::new(ContentIndex::new());

    let (indexed_count, total_size) =
        indexing::perform_indexing(&root_dir, &file_index, &content_index, &matcher);
    info!(
        files = indexed_count,
        total_size,
        duration_ms = start_time.elapsed().as_millis() as u64,
        "initial indexing complete"
    );

    // Live updates are best-effort: a watcher failure downgrades to
    // reconciler-only synchronization.
    let checker: Arc<dyn IgnoreChecker> = Arc::clone(&matcher) as Arc<dyn IgnoreChecker>;
    let mut watcher = match Watcher::new(&root_dir, checker) {
        Ok(mut w) => {
            w.start();
            if let Some(batches) = w.events() {
                let root = root_dir.clone();
                let file_index = Arc::clone(&file_index);
                let content_index = Arc::clone(&content_index);
                let matcher = Arc::clone(&matcher);
                thread::spawn(move || {
                    indexing::handle_watcher_events(
                        &batches,
                        &root,
                        &file_index,
                        &content_index,
                        &matcher,
                    );
                });
            }
            Some(w)
        }
        Err(e) => {
            warn!(error = %e, "failed to start file watcher, continuing without live updates");
            None
        }
    };

    let _sync_stop = if cli.sync_interval > 0 {
        let (stop_tx, stop_rx) = mpsc::channel();
        let root = root_dir.clone();
        let file_index = Arc::clone(&file_index);
        let content_index = Arc::clone(&content_index);
        let matcher = Arc::clone(&matcher);
        let interval = cli.sync_interval;
        thread::spawn(move || {
            sync::run_periodic(interval, root, file_index, content_index, matcher, stop_rx);
        });
        Some(stop_tx)
    } else {
        None
    };

    let ctx = Arc::new(HandlerContext {
        file_index,
        content_index,
        matcher,
        root_dir,
        start_time,
        max_results: cli.max_results,
    });

    info!("MCP server starting on stdio");
    server::run_server(ctx);

    // Dropping the stop sender ends the reconciler loop.
    if let Some(ref mut w) = watcher {
        w.close();
    }

    Ok(())
}

/// Install the tracing subscriber, writing to the log file when it can be
/// opened and to stderr otherwise. stdout stays reserved for JSON-RPC.
fn init_logging(level: &str, log_file: Option<PathBuf>, root_dir: &std::path::Path) {
    let level = parse_log_level(level);
    let log_path = log_file.unwrap_or_else(|| root_dir.join("codeindex-mcp.log"));

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            let file = Arc::new(file);
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(true)
                .with_ansi(false)
                .with_writer(move || SharedFileWriter(Arc::clone(&file)))
                .init();
        }
        Err(e) => {
            eprintln!(
                "Warning: cannot open log file {}: {}, falling back to stderr",
                log_path.display(),
                e
            );
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(true)
                .with_ansi(false)
                .with_writer(io::stderr)
                .init();
        }
    }
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// Shared handle to the append-only log file; `&File` is `Write`.
struct SharedFileWriter(Arc<File>);

impl Write for SharedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}
