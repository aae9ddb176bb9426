//! codeindex_reindex handler: full rebuild of both indexes.

use std::time::Instant;

use serde_json::Value;
use tracing::info;

use crate::indexing::perform_indexing;
use crate::mcp::protocol::ToolCallResult;

use super::format::format_file_size;
use super::HandlerContext;

pub(crate) fn handle_reindex(ctx: &HandlerContext, _args: &Value) -> ToolCallResult {
    info!("codeindex_reindex started");
    let start = Instant::now();

    ctx.file_index.clear();
    ctx.content_index.clear();
    // Pick up any .gitignore / .claudeignore edits made since startup.
    ctx.matcher.reload();

    let (count, total_size) = perform_indexing(
        &ctx.root_dir,
        &ctx.file_index,
        &ctx.content_index,
        &ctx.matcher,
    );
    let elapsed = start.elapsed();

    info!(
        files = count,
        total_size,
        elapsed_ms = elapsed.as_millis() as u64,
        "codeindex_reindex complete"
    );

    ToolCallResult::success(format!(
        "reindexed: {} files ({}) in {}ms",
        count,
        format_file_size(total_size),
        elapsed.as_millis(),
    ))
}
