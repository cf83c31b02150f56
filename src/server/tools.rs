//! The `find_brick` tool: definition and invocation.

use crate::config::OutputFormat;
use crate::error::BrickFinderError;
use crate::output::ResultSet;
use crate::pipeline::upload::BrickognizeClient;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use rmcp::ErrorData as McpError;
use serde_json::{json, Value};
use std::sync::Arc;

pub const FIND_BRICK: &str = "find_brick";

const DESCRIPTION: &str = "Search and identify LEGO bricks from an image given by local file path. \
Returns candidate names, probability scores, image URLs, BrickLink URLs and predicted colors. \
Only PNG and JPEG images are supported.";

/// Tool descriptor returned by `tools/list`.
pub fn find_brick_tool() -> Tool {
    let mut tool = Tool::new(FIND_BRICK, DESCRIPTION, as_object(input_schema()));
    tool.output_schema = Some(Arc::new(as_object(result_set_schema())));
    tool
}

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "file_path": {
                "type": "string",
                "description": "Absolute or working-directory-relative path to a .jpg, .jpeg or .png photo"
            }
        },
        "required": ["file_path"]
    })
}

fn result_set_schema() -> Value {
    let nullable_string = json!({ "type": ["string", "null"] });
    let nullable_number = json!({ "type": ["number", "null"] });
    json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean" },
            "count": { "type": "integer", "minimum": 0 },
            "candidates": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": nullable_string,
                        "score": nullable_number,
                        "imageUrl": nullable_string,
                        "externalUrl": nullable_string,
                        "topColor": {
                            "type": ["object", "null"],
                            "properties": {
                                "name": nullable_string,
                                "score": nullable_number
                            }
                        }
                    }
                }
            }
        },
        "required": ["success", "count", "candidates"]
    })
}

fn as_object(schema: Value) -> JsonObject {
    match schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

/// Pull `file_path` out of the call arguments.
///
/// An absent or null path becomes `""` so the pipeline reports it as
/// `MissingArgument` in-band. Any other non-string is a protocol error.
pub fn file_path_argument(arguments: Option<&JsonObject>) -> Result<String, McpError> {
    match arguments.and_then(|a| a.get("file_path")) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(McpError::invalid_params("file_path must be a string", None)),
    }
}

/// Successful call: the ResultSet as structured content plus one text block.
pub fn success_result(result: &ResultSet, format: OutputFormat) -> CallToolResult {
    let text = match format {
        OutputFormat::Json => result.to_json_pretty(),
        OutputFormat::Text => result.to_text(),
    };
    let mut outcome = CallToolResult::success(vec![Content::text(text)]);
    outcome.structured_content = serde_json::to_value(result).ok();
    outcome
}

/// Pipeline failure, reported in-band with `isError` so the calling model
/// can read the message.
pub fn failure_result(error: &BrickFinderError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!(
        "Error processing image: {error}"
    ))])
}

/// Run `find_brick` for `file_path` and wrap the outcome.
pub async fn call_find_brick(
    client: &BrickognizeClient,
    file_path: &str,
    format: OutputFormat,
) -> CallToolResult {
    match client.identify(file_path).await {
        Ok(result) => success_result(&result, format),
        Err(e) => failure_result(&e),
    }
}
