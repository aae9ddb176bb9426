//! JSON-RPC 2.0 event loop over stdio.
//!
//! stdout carries protocol frames only; logging goes to the log file or
//! stderr. Tool calls run on their own threads so a slow query never blocks
//! the reader.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::mcp::handlers::{self, HandlerContext};
use crate::mcp::protocol::*;

/// Run the server until stdin closes. In-flight tool calls are allowed to
/// finish before returning.
pub fn run_server(ctx: Arc<HandlerContext>) {
    let stdin = io::stdin();
    let reader = stdin.lock();
    let writer: Arc<Mutex<io::Stdout>> = Arc::new(Mutex::new(io::stdout()));

    info!("MCP server ready, waiting for JSON-RPC requests on stdin");

    let mut in_flight: Vec<thread::JoinHandle<()>> = Vec::new();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, "error reading stdin");
                break;
            }
        };

        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        debug!(request = %line, "incoming JSON-RPC");

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "failed to parse JSON-RPC request");
                let err = JsonRpcErrorResponse::new(
                    Value::Null,
                    -32700,
                    format!("Parse error: {}", e),
                );
                write_response(&writer, &serde_json::to_value(err).unwrap());
                continue;
            }
        };

        // Notifications have no id and get no response.
        let id = match request.id {
            Some(id) => id,
            None => {
                debug!(method = %request.method, "received notification");
                continue;
            }
        };

        if request.method == "tools/call" {
            // Queries execute in parallel; the response carries the id.
            let ctx = Arc::clone(&ctx);
            let writer = Arc::clone(&writer);
            in_flight.retain(|h| !h.is_finished());
            in_flight.push(thread::spawn(move || {
                let response = handle_request(&ctx, &request.method, &request.params, id);
                write_response(&writer, &response);
            }));
        } else {
            let response = handle_request(&ctx, &request.method, &request.params, id);
            write_response(&writer, &response);
        }
    }

    for handle in in_flight {
        let _ = handle.join();
    }

    info!("stdin closed, shutting down");
}

fn write_response(writer: &Arc<Mutex<io::Stdout>>, response: &Value) {
    let text = serde_json::to_string(response).unwrap();
    debug!(response = %text, "outgoing JSON-RPC");
    let mut out = match writer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let _ = writeln!(out, "{}", text);
    let _ = out.flush();
}

fn handle_request(ctx: &HandlerContext, method: &str, params: &Option<Value>, id: Value) -> Value {
    match method {
        "initialize" => {
            let result = InitializeResult::new();
            serde_json::to_value(JsonRpcResponse::new(
                id,
                serde_json::to_value(result).unwrap(),
            ))
            .unwrap()
        }
        "tools/list" => {
            let result = ToolsListResult {
                tools: handlers::tool_definitions(),
            };
            serde_json::to_value(JsonRpcResponse::new(
                id,
                serde_json::to_value(result).unwrap(),
            ))
            .unwrap()
        }
        "tools/call" => {
            let params = match params {
                Some(p) => p,
                None => {
                    let result = ToolCallResult::error("Missing params".to_string());
                    return serde_json::to_value(JsonRpcResponse::new(
                        id,
                        serde_json::to_value(result).unwrap(),
                    ))
                    .unwrap();
                }
            };

            let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or(Value::Object(serde_json::Map::new()));

            let result = handlers::dispatch_tool(ctx, tool_name, &arguments);

            serde_json::to_value(JsonRpcResponse::new(
                id,
                serde_json::to_value(result).unwrap(),
            ))
            .unwrap()
        }
        "ping" => serde_json::to_value(JsonRpcResponse::new(id, json!({}))).unwrap(),
        _ => serde_json::to_value(JsonRpcErrorResponse::new(
            id,
            -32601,
            format!("Method not found: {}", method),
        ))
        .unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::handlers::tests::test_context;

    #[test]
    fn test_handle_initialize() {
        let ctx = test_context();
        let result = handle_request(&ctx, "initialize", &None, json!(1));
        assert_eq!(result["jsonrpc"], "2.0");
        assert_eq!(result["id"], 1);
        assert_eq!(result["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(result["result"]["serverInfo"]["name"], "codeindex-mcp");
    }

    #[test]
    fn test_handle_tools_list() {
        let ctx = test_context();
        let result = handle_request(&ctx, "tools/list", &None, json!(2));
        assert_eq!(result["jsonrpc"], "2.0");
        let tools = result["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"codeindex_search"));
        assert!(names.contains(&"codeindex_reindex"));
    }

    #[test]
    fn test_handle_tools_call_search() {
        let ctx = test_context();
        ctx.content_index
            .index_file("main.go", "hello world\n", "Go")
            .unwrap();

        let params = json!({
            "name": "codeindex_search",
            "arguments": { "query": "hello" }
        });
        let result = handle_request(&ctx, "tools/call", &Some(params), json!(3));
        assert_eq!(result["jsonrpc"], "2.0");
        assert_eq!(result["id"], 3);
        let content = result["result"]["content"].as_array().unwrap();
        assert_eq!(content[0]["type"], "text");
        assert!(content[0]["text"].as_str().unwrap().contains("main.go"));
    }

    #[test]
    fn test_handle_tools_call_missing_params() {
        let ctx = test_context();
        let result = handle_request(&ctx, "tools/call", &None, json!(5));
        assert_eq!(result["result"]["isError"], true);
        assert!(result["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Missing params"));
    }

    #[test]
    fn test_handle_ping() {
        let ctx = test_context();
        let result = handle_request(&ctx, "ping", &None, json!(42));
        assert_eq!(result["id"], 42);
        assert!(result["result"].is_object());
    }

    #[test]
    fn test_handle_unknown_method() {
        let ctx = test_context();
        let result = handle_request(&ctx, "unknown/method", &None, json!(99));
        assert_eq!(result["error"]["code"], -32601);
        assert!(result["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Method not found"));
    }
}
