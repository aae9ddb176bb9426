//! codeindex_status handler: index and process health snapshot.

use std::fmt::Write as _;

use serde_json::Value;
use tracing::info;

use crate::mcp::protocol::ToolCallResult;

use super::format::{format_duration, format_file_size};
use super::HandlerContext;

pub(crate) fn handle_status(ctx: &HandlerContext, _args: &Value) -> ToolCallResult {
    let file_count = ctx.file_index.file_count();
    let total_size = ctx.file_index.total_size_bytes();
    let lang_counts = ctx.file_index.language_counts();
    let doc_count = ctx.content_index.document_count();
    let uptime = ctx.start_time.elapsed();
    let resident = resident_set_bytes();

    info!(
        files = file_count,
        total_size,
        memory = resident.unwrap_or(0),
        uptime_s = uptime.as_secs(),
        "codeindex_status"
    );

    let mut out = String::new();
    out.push_str("=== codeindex-mcp Status ===\n\n");
    let _ = writeln!(out, "Root directory: {}", ctx.root_dir.display());
    let _ = writeln!(out, "Uptime: {}", format_duration(uptime));
    let _ = writeln!(out, "Indexed files: {}", file_count);
    let _ = writeln!(out, "Content-indexed documents: {}", doc_count);
    let _ = writeln!(out, "Total indexed size: {}", format_file_size(total_size));
    match resident {
        Some(bytes) => {
            let _ = writeln!(out, "Memory usage: {} (resident)", format_file_size(bytes));
        }
        None => {
            let _ = writeln!(out, "Memory usage: n/a");
        }
    }

    if !lang_counts.is_empty() {
        out.push_str("\nLanguages:\n");
        let mut entries: Vec<(String, usize)> = lang_counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (lang, count) in entries {
            let _ = writeln!(out, "  {:<20} {} files", lang, count);
        }
    }

    ToolCallResult::success(out)
}

/// Resident set size of this process, when the platform exposes it.
#[cfg(target_os = "linux")]
fn resident_set_bytes() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(resident_pages * 4096)
}

#[cfg(not(target_os = "linux"))]
fn resident_set_bytes() -> Option<u64> {
    None
}
