//! Tool-call extraction from model output.
//!
//! Best-effort extraction over unstructured text, not a strict protocol:
//! invocations are `<tool>NAME:JSON</tool>` tags scanned left to right,
//! non-overlapping. A tag with a malformed payload is dropped with a logged
//! warning and scanning continues after its closing tag.

use serde_json::{Map, Value};

const OPEN_TAG: &str = "<tool>";
const CLOSE_TAG: &str = "</tool>";

/// One extracted invocation, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCall {
    pub name: String,
    pub args: Map<String, Value>,
}

/// Extract tool invocations from raw assistant text.
///
/// Pure function: identical input always yields the identical ordered output.
/// Zero tags is a valid, empty result.
pub fn extract_tool_calls(text: &str) -> Vec<ParsedCall> {
    let mut calls = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(OPEN_TAG) {
        let after_open = &rest[open + OPEN_TAG.len()..];
        let Some(close) = after_open.find(CLOSE_TAG) else {
            // Unclosed tag: nothing further can parse.
            tracing::warn!("unclosed tool tag in model output");
            break;
        };
        let body = &after_open[..close];
        rest = &after_open[close + CLOSE_TAG.len()..];

        match parse_body(body) {
            Some(call) => calls.push(call),
            None => tracing::warn!(tag = body, "dropping malformed tool tag"),
        }
    }

    calls
}

/// `NAME:JSON` where JSON must be a single object.
fn parse_body(body: &str) -> Option<ParsedCall> {
    let (name, payload) = body.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let value: Value = serde_json::from_str(payload).ok()?;
    let args = value.as_object()?.clone();

    Some(ParsedCall {
        name: name.to_string(),
        args,
    })
}
