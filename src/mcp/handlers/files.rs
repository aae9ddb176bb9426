//! codeindex_files handler: glob lookup against the file-path index.

use std::time::Instant;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::mcp::protocol::ToolCallResult;

use super::format::format_file_results;
use super::HandlerContext;

pub(crate) fn handle_files(ctx: &HandlerContext, args: &Value) -> ToolCallResult {
    let start = Instant::now();

    let pattern = args
        .get("pattern")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if pattern.is_empty() {
        warn!("codeindex_files called with empty pattern");
        return ToolCallResult::error("Error: pattern parameter is required".to_string());
    }

    let name_only = args
        .get("nameOnly")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let max_results = args
        .get("maxResults")
        .and_then(|v| v.as_i64())
        .unwrap_or(ctx.max_results);

    let results = match ctx.file_index.search_by_glob(&pattern, max_results) {
        Ok(r) => r,
        Err(e) => {
            error!(pattern = %pattern, error = %e, "codeindex_files failed");
            return ToolCallResult::error(format!("Search error: {}", e));
        }
    };

    info!(
        pattern = %pattern,
        results = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "codeindex_files"
    );

    ToolCallResult::success(format_file_results(&results, name_only))
}
