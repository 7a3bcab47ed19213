//! # JSON-RPC Protocol
//!
//! Newline-delimited JSON-RPC 2.0 over stdio.
//!
//! ## Message Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tool Protocol Messages                             │
//! │                                                                         │
//! │  HANDSHAKE                                                             │
//! │  ─────────                                                             │
//! │  client ───► initialize { protocolVersion, capabilities, clientInfo }   │
//! │  server ◄─── { protocolVersion, capabilities.tools, serverInfo }        │
//! │  client ───► notifications/initialized          (no response)           │
//! │                                                                         │
//! │  TOOLS                                                                 │
//! │  ─────                                                                 │
//! │  client ───► tools/list                                                 │
//! │  server ◄─── { tools: [{ name, description, inputSchema }] }            │
//! │  client ───► tools/call { name, arguments }                             │
//! │  server ◄─── { content: [{ type: "text", text }], isError }             │
//! │                                                                         │
//! │  KEEPALIVE                                                             │
//! │  ─────────                                                             │
//! │  client ───► ping                                                       │
//! │  server ◄─── {}                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! One JSON object per line, in both directions:
//! ```json
//! {"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_sales_summary"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use ventas_core::Clock;

use crate::tools::{catalog, ToolBox};

/// Protocol revision advertised in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name advertised in `serverInfo`.
pub const SERVER_NAME: &str = "ventas-mcp-server";

// =============================================================================
// Error Codes
// =============================================================================

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

// =============================================================================
// Messages
// =============================================================================

/// An incoming request or notification (no `id`).
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// An outgoing response. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Response {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Response {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

// =============================================================================
// Server
// =============================================================================

/// Dispatches protocol messages to the tool box.
#[derive(Debug, Clone)]
pub struct Server {
    tools: ToolBox,
}

impl Server {
    pub fn new(tools: ToolBox) -> Self {
        Server { tools }
    }

    /// Handles one line of input. Returns the serialized response, or `None`
    /// for notifications and blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => Some(Response::err(Value::Null, PARSE_ERROR, format!("Parse error: {}", e))),
            Ok(raw) => {
                let id = raw.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<Request>(raw) {
                    Ok(request) => self.handle(request).await,
                    Err(e) => Some(Response::err(
                        id,
                        INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    )),
                }
            }
        };

        response.and_then(|r| match serde_json::to_string(&r) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to serialize response");
                None
            }
        })
    }

    /// Handles a parsed request. Notifications get no response.
    pub async fn handle(&self, request: Request) -> Option<Response> {
        if request.jsonrpc != "2.0" {
            return Some(Response::err(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }

        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => Response::ok(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            ),
            "ping" => Response::ok(id, json!({})),
            "tools/list" => Response::ok(id, json!({ "tools": catalog() })),
            "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
                Ok(params) => Response::ok(id, self.call_tool(&params.name, params.arguments).await),
                Err(e) => Response::err(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
            },
            other => Response::err(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
        };

        Some(response)
    }

    /// Runs a tool and wraps the outcome as text content.
    async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        let (body, is_error) = match self.tools.call(name, arguments).await {
            Ok(value) => (value, false),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                (e.payload(name, self.tools.db().clock().now()), true)
            }
        };

        let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
        json!({
            "content": [{ "type": "text", "text": text }],
            "isError": is_error,
        })
    }

    /// Reads requests from `reader` until EOF, writing one response per line.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(response) = self.handle_line(&line).await {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("Input closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ventas_db::{Database, DbConfig};

    async fn server() -> Server {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Server::new(ToolBox::new(db))
    }

    async fn roundtrip(server: &Server, line: &str) -> Value {
        let text = server.handle_line(line).await.unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let server = server().await;

        let init = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#,
        )
        .await;
        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["serverInfo"]["name"], "ventas-mcp-server");
        assert!(init["result"]["capabilities"]["tools"].is_object());

        let notified = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(notified.is_none());

        let list = roundtrip(&server, r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#).await;
        assert_eq!(list["id"], "a");
        assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 12);

        let pong = roundtrip(&server, r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#).await;
        assert_eq!(pong["result"], json!({}));
    }

    #[tokio::test]
    async fn test_tool_call_content() {
        let server = server().await;

        let ok = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_sales_summary","arguments":{}}}"#,
        )
        .await;
        assert_eq!(ok["result"]["isError"], false);
        let text = ok["result"]["content"][0]["text"].as_str().unwrap();
        let body: Value = serde_json::from_str(text).unwrap();
        assert_eq!(body["summary"]["total_sales"], 0);

        let failed = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"execute_custom_query","arguments":{"query":"SELECT 1; DROP TABLE sales"}}}"#,
        )
        .await;
        assert_eq!(failed["result"]["isError"], true);
        let text = failed["result"]["content"][0]["text"].as_str().unwrap();
        let body: Value = serde_json::from_str(text).unwrap();
        assert_eq!(body["tool"], "execute_custom_query");
        assert!(body["error"].as_str().unwrap().starts_with("Query rejected"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server().await;

        let parse = roundtrip(&server, "{not json").await;
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert_eq!(parse["id"], Value::Null);

        let unknown = roundtrip(&server, r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let params = roundtrip(&server, r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{}}"#).await;
        assert_eq!(params["error"]["code"], INVALID_PARAMS);

        let version = roundtrip(&server, r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#).await;
        assert_eq!(version["error"]["code"], INVALID_REQUEST);

        assert!(server.handle_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_serve_over_streams() {
        let server = server().await;
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );

        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["id"], 2);
    }
}
