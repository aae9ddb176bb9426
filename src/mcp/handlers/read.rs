//! codeindex_read handler: serve file contents straight from the index.

use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn};

use crate::mcp::protocol::ToolCallResult;

use super::format::format_file_content;
use super::HandlerContext;

pub(crate) fn handle_read(ctx: &HandlerContext, args: &Value) -> ToolCallResult {
    let start = Instant::now();

    let file_path = args
        .get("filePath")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if file_path.is_empty() {
        warn!("codeindex_read called with empty filePath");
        return ToolCallResult::error("Error: filePath parameter is required".to_string());
    }

    let content = match ctx.content_index.get_file_content(&file_path) {
        Some(c) => c,
        None => {
            info!(file_path = %file_path, "codeindex_read file not found");
            return ToolCallResult::error(format!("File not found in index: {}", file_path));
        }
    };

    info!(
        file_path = %file_path,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "codeindex_read"
    );

    ToolCallResult::success(format_file_content(&file_path, &content))
}
