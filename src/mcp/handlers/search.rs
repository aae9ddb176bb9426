//! codeindex_search handler: full-text search over the content index.

use std::time::Instant;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::index::SearchOptions;
use crate::mcp::protocol::ToolCallResult;

use super::format::format_search_results;
use super::HandlerContext;

pub(crate) fn handle_search(ctx: &HandlerContext, args: &Value) -> ToolCallResult {
    let start = Instant::now();

    let query = args
        .get("query")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if query.is_empty() {
        warn!("codeindex_search called with empty query");
        return ToolCallResult::error("Error: query parameter is required".to_string());
    }

    let file_path = args
        .get("filePath")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let file_glob = args
        .get("fileGlob")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let max_results = args
        .get("maxResults")
        .and_then(|v| v.as_i64())
        .unwrap_or(ctx.max_results);
    // Absent contextLines means "give me a little context", like grep -C 2.
    let context_lines = match args.get("contextLines").and_then(|v| v.as_i64()) {
        Some(0) | None => 2,
        Some(n) => n,
    };

    let options = SearchOptions {
        query: query.clone(),
        file_path: file_path.clone(),
        file_glob: file_glob.clone(),
        max_results,
        context_lines,
    };

    let (results, total_matches) = match ctx.content_index.search(&options) {
        Ok(r) => r,
        Err(e) => {
            error!(query = %query, error = %e, "codeindex_search failed");
            return ToolCallResult::error(format!("Search error: {}", e));
        }
    };

    info!(
        query = %query,
        file_path = %file_path,
        file_glob = %file_glob,
        files = results.len(),
        matches = total_matches,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "codeindex_search"
    );

    ToolCallResult::success(format_search_results(&results, total_matches))
}
