//! MCP tool handlers: dispatches tool calls to specialized handler modules.

mod files;
mod format;
mod read;
mod reindex;
mod search;
mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::index::{ContentIndex, FileIndex};
use crate::matcher::IgnoreMatcher;
use crate::mcp::protocol::{ToolCallResult, ToolDefinition};

/// Shared state for tool handlers.
pub struct HandlerContext {
    pub file_index: Arc<FileIndex>,
    pub content_index: Arc<ContentIndex>,
    pub matcher: Arc<IgnoreMatcher>,
    pub root_dir: PathBuf,
    pub start_time: Instant,
    /// Default result cap when a request does not pass maxResults.
    pub max_results: i64,
}

/// Return all tool definitions for tools/list.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "codeindex_search".to_string(),
            description: concat!(
                "Search file contents using full-text indexed search. Much faster than grep ",
                "for large codebases.\n\n",
                "Query formats:\n",
                "  - Plain text: word-level matching (e.g., \"handleRequest\")\n",
                "  - \"quoted text\": exact phrase matching (e.g., \"\\\"func main\\\"\")\n",
                "  - /regex/: regular expression matching (e.g., \"/func\\s+\\w+Handler/\")\n\n",
                "Filtering:\n",
                "  - filePath: exact relative path to search in a single file ",
                "(e.g., \"src/main.go\"). Overrides fileGlob.\n",
                "  - fileGlob: glob pattern to filter by file type (e.g., \"**/*.go\").",
            )
            .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query. Plain text for word match, quoted for exact phrase, /regex/ for regular expression"
                    },
                    "filePath": {
                        "type": "string",
                        "description": "Exact relative file path to search in (overrides fileGlob). Use this to search within a single specific file"
                    },
                    "fileGlob": {
                        "type": "string",
                        "description": "Optional glob pattern to filter files (e.g. **/*.go)"
                    },
                    "maxResults": {
                        "type": "integer",
                        "description": "Maximum number of file results to return (default 50)"
                    },
                    "contextLines": {
                        "type": "integer",
                        "description": "Number of context lines before and after each match (default 2)"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "codeindex_files".to_string(),
            description: concat!(
                "Find files by glob pattern. Faster than find/ls for indexed projects.\n\n",
                "Pattern examples:\n",
                "  - \"**/*.go\" - all Go files\n",
                "  - \"src/**/*.ts\" - TypeScript files under src/\n",
                "  - \"**/test_*.py\" - Python test files\n",
                "  - \"*.json\" - JSON files in root only",
            )
            .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pattern": {
                        "type": "string",
                        "description": "Glob pattern to match files (e.g. **/*.ts or src/**/*.go)"
                    },
                    "nameOnly": {
                        "type": "boolean",
                        "description": "If true return only file paths without metadata"
                    },
                    "maxResults": {
                        "type": "integer",
                        "description": "Maximum number of results to return (default 50)"
                    }
                },
                "required": ["pattern"]
            }),
        },
        ToolDefinition {
            name: "codeindex_read".to_string(),
            description: concat!(
                "Read a file's contents from the in-memory index. Zero disk I/O — faster than ",
                "the built-in Read tool. Returns numbered lines. Use this instead of Read for ",
                "any indexed file.",
            )
            .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "filePath": {
                        "type": "string",
                        "description": "Relative file path to read from the index (e.g. src/main.go)"
                    }
                },
                "required": ["filePath"]
            }),
        },
        ToolDefinition {
            name: "codeindex_status".to_string(),
            description:
                "Show index status: file count, size, languages, memory usage, and uptime."
                    .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "codeindex_reindex".to_string(),
            description: concat!(
                "Force a full re-index of the project. Clears existing index and rebuilds ",
                "from scratch.",
            )
            .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
    ]
}

/// Dispatch a tool call to the right handler.
pub fn dispatch_tool(ctx: &HandlerContext, tool_name: &str, arguments: &Value) -> ToolCallResult {
    match tool_name {
        "codeindex_search" => search::handle_search(ctx, arguments),
        "codeindex_files" => files::handle_files(ctx, arguments),
        "codeindex_read" => read::handle_read(ctx, arguments),
        "codeindex_status" => status::handle_status(ctx, arguments),
        "codeindex_reindex" => reindex::handle_reindex(ctx, arguments),
        _ => ToolCallResult::error(format!("Unknown tool: {}", tool_name)),
    }
}
