//! Gauge MCP Server
//!
//! Newline-delimited JSON-RPC 2.0 over stdio. Logs go to stderr only.
//!
//! Tools:
//! - convert: Convert a value between units, combined units, currencies or timezones
//! - validate_unit: Check a unit and get suggestions for near misses
//! - list_units: List units by category, optionally filtered
//! - list_currencies: List currencies by country
//! - list_timezones: List timezones with their UTC offsets

use std::io;
use gauge_core::GaugeError;
use gauge_units::{ConversionError, EngineConfig, UnitEngine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const PROTOCOL_VERSION: &str = "2025-11-25";
const SERVER_NAME: &str = "gauge";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// MCP Protocol types
#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<JsonValue>,
    method: String,
    #[serde(default)]
    params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, Serialize)]
struct McpError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<JsonValue>,
}

impl McpError {
    fn invalid_params(message: impl Into<String>) -> Self {
        McpError { code: -32602, message: message.into(), data: None }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    // stdout is the protocol channel
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = EngineConfig::from_env();
    info!(
        version = SERVER_VERSION,
        protocol = PROTOCOL_VERSION,
        currency = config.currency_enabled,
        base = %config.base_currency,
        "Gauge MCP Server starting"
    );

    let engine = UnitEngine::with_config(config).map_err(|e| {
        error!(%e, "failed to build conversion tables");
        io::Error::new(io::ErrorKind::InvalidData, e.to_string())
    })?;

    info!("Server ready, waiting for requests...");
    serve(&engine, tokio::io::stdin(), tokio::io::stdout()).await?;
    info!("Server shutting down");
    Ok(())
}

/// Read requests line by line until EOF, answering each on its own line
async fn serve<R, W>(engine: &UnitEngine, input: R, output: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            info!("Client disconnected (EOF)");
            break;
        }

        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        debug!(bytes = request.len(), "received request");

        let Some(response) = handle_line(engine, request) else {
            continue;
        };

        let response_json = serde_json::to_string(&response)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Parse and dispatch one line. Notifications (no id) get no response.
fn handle_line(engine: &UnitEngine, line: &str) -> Option<McpResponse> {
    let request: McpRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            warn!(%e, "error parsing request");
            return Some(McpResponse {
                jsonrpc: "2.0".to_string(),
                id: None,
                result: None,
                error: Some(McpError {
                    code: -32700,
                    message: format!("Parse error: {}", e),
                    data: None,
                }),
            });
        }
    };

    debug!(method = %request.method, "processing");
    let response = handle_request(engine, &request);

    if request.id.is_none() {
        debug!(method = %request.method, "notification processed (no response)");
        return None;
    }
    Some(response)
}

fn handle_request(engine: &UnitEngine, request: &McpRequest) -> McpResponse {
    let result = match request.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(&request.params),
        "initialized" => Ok(json!({})),
        "ping" => Ok(json!({})),

        // Tools
        "tools/list" => handle_tools_list(),
        "tools/call" => handle_tool_call(engine, &request.params),

        _ => Err(McpError {
            code: -32601,
            message: format!("Method not found: {}", request.method),
            data: None,
        }),
    };

    match result {
        Ok(r) => McpResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id.clone(),
            result: Some(r),
            error: None,
        },
        Err(e) => McpResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id.clone(),
            result: None,
            error: Some(e),
        },
    }
}

fn handle_initialize(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let client_info = params.as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");

    // Use client's protocol version for compatibility
    let client_protocol = params.as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or(PROTOCOL_VERSION);

    info!(client = client_info, protocol = client_protocol, "client connected");

    Ok(json!({
        "protocolVersion": client_protocol,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": "Unit, currency and timezone conversion"
        },
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "instructions": "Gauge converts values between units (e.g. 'mi' to 'km'), combined units with matching structure (e.g. 'mi/h' to 'm/s', 'ft*lb' to 'm*kg'), currencies ('$USD' to '$EUR') and timezones ('PST' to 'China CST'). Use list_units to discover unit names and validate_unit when a name is rejected."
    }))
}

fn handle_tools_list() -> Result<JsonValue, McpError> {
    Ok(json!({
        "tools": [
            {
                "name": "convert",
                "description": "Convert a value from one unit to another. Supports simple units (mi, kg), combined units (mi/h, ft*lb), currencies ($USD) and timezones (PST, China CST).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "from": {
                            "type": "string",
                            "description": "Source unit"
                        },
                        "to": {
                            "type": "string",
                            "description": "Target unit"
                        },
                        "value": {
                            "type": "number",
                            "description": "Value to convert"
                        }
                    },
                    "required": ["from", "to", "value"]
                }
            },
            {
                "name": "validate_unit",
                "description": "Check whether a unit name is known. Returns its qualified identifier, or suggestions when it is not.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "unit": {
                            "type": "string",
                            "description": "Unit, combined unit, currency or timezone"
                        }
                    },
                    "required": ["unit"]
                }
            },
            {
                "name": "list_units",
                "description": "List available units by category, optionally filtered by a search term (typos tolerated).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "search": {
                            "type": "string",
                            "description": "Search term"
                        },
                        "category": {
                            "type": "string",
                            "description": "Only this category, e.g. distance, currency, timezone"
                        }
                    }
                }
            },
            {
                "name": "list_currencies",
                "description": "List currencies with their country names.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "search": {
                            "type": "string",
                            "description": "Search term"
                        }
                    }
                }
            },
            {
                "name": "list_timezones",
                "description": "List timezones with their UTC offsets.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "search": {
                            "type": "string",
                            "description": "Search term"
                        }
                    }
                }
            }
        ]
    }))
}

fn handle_tool_call(engine: &UnitEngine, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let params = params.as_ref().ok_or_else(|| McpError::invalid_params("Missing params"))?;

    let name = params.get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;

    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    match name {
        "convert" => tool_convert(engine, &args),
        "validate_unit" => tool_validate_unit(engine, &args),
        "list_units" => tool_list_units(engine, &args),
        "list_currencies" => tool_list_currencies(engine, &args),
        "list_timezones" => tool_list_timezones(engine, &args),
        _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
    }
}

fn required_str<'a>(args: &'a JsonValue, key: &str) -> Result<&'a str, McpError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params(format!("Missing {} argument", key)))
}

fn optional_str<'a>(args: &'a JsonValue, key: &str) -> &'a str {
    args.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// Tool result for a domain failure
fn tool_error(err: GaugeError) -> JsonValue {
    let text = match &err.suggestion {
        Some(s) => format!("{} ({})", err.message, s),
        None => err.message.clone(),
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "error": err.to_json(),
        "isError": true
    })
}

fn tool_convert(engine: &UnitEngine, args: &JsonValue) -> Result<JsonValue, McpError> {
    let from = required_str(args, "from")?;
    let to = required_str(args, "to")?;

    let value = match args.get("value") {
        None | Some(JsonValue::Null) => return Err(McpError::invalid_params("Missing value argument")),
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return Ok(tool_error(GaugeError::invalid_argument("value must be a finite number")));
    };

    match engine.convert(from, to, value) {
        Ok(result) => Ok(json!({
            "content": [{ "type": "text", "text": format!("{} {} = {} {}", value, from, result, to) }],
            "from": from,
            "to": to,
            "value": value,
            "result": result,
            "isError": false
        })),
        Err(err) => {
            debug!(from, to, %err, "conversion failed");
            Ok(tool_error(err.into()))
        }
    }
}

fn tool_validate_unit(engine: &UnitEngine, args: &JsonValue) -> Result<JsonValue, McpError> {
    let unit = required_str(args, "unit")?;

    if engine.is_timezone(unit) {
        return Ok(json!({
            "content": [{ "type": "text", "text": format!("'{}' is a timezone", unit) }],
            "valid": true,
            "kind": "timezone"
        }));
    }

    let combined = engine.is_combined(unit);
    let leaves = engine.extract_units(unit);
    let invalid: Vec<&String> = leaves.iter().filter(|u| !engine.is_valid(u)).collect();

    if invalid.is_empty() {
        let normalized: Vec<String> = leaves
            .iter()
            .filter_map(|u| engine.normalize(u))
            .map(|id| id.to_string())
            .collect();
        let kind = if combined { "combined" } else { "unit" };
        return Ok(json!({
            "content": [{ "type": "text", "text": format!("'{}' is valid: {}", unit, normalized.join(", ")) }],
            "valid": true,
            "kind": kind,
            "normalized": normalized
        }));
    }

    let first = invalid[0];
    let err: GaugeError = ConversionError::UnknownUnit {
        unit: first.clone(),
        suggestions: engine.suggest(first, None),
    }
    .into();

    Ok(json!({
        "content": [{ "type": "text", "text": err.message.clone() }],
        "valid": false,
        "invalid": invalid,
        "suggestions": err.candidates.clone(),
        "error": err.to_json()
    }))
}

fn tool_list_units(engine: &UnitEngine, args: &JsonValue) -> Result<JsonValue, McpError> {
    let search = optional_str(args, "search");
    let category = args.get("category").and_then(|v| v.as_str());

    let listing = match category {
        Some(c) => engine.units(search, Some(&[c][..])),
        None => engine.units(search, None),
    };

    let count: usize = listing.iter().map(|c| c.units.len()).sum();
    Ok(json!({
        "content": [{ "type": "text", "text": format!("{} units in {} categories", count, listing.len()) }],
        "data": listing
    }))
}

fn tool_list_currencies(engine: &UnitEngine, args: &JsonValue) -> Result<JsonValue, McpError> {
    let entries = engine.currencies(optional_str(args, "search"));
    Ok(json!({
        "content": [{ "type": "text", "text": format!("{} currencies", entries.len()) }],
        "data": entries
    }))
}

fn tool_list_timezones(engine: &UnitEngine, args: &JsonValue) -> Result<JsonValue, McpError> {
    let entries = engine.timezones(optional_str(args, "search"));
    Ok(json!({
        "content": [{ "type": "text", "text": format!("{} timezones", entries.len()) }],
        "data": entries
    }))
}
