//! Small helpers for pulling fields out of request parameter values.

use serde_json::Value;

/// `textDocument.uri`
pub fn uri(params: &Value) -> Option<String> {
    params
        .pointer("/textDocument/uri")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `position` as `(line, utf16_character)`
pub fn position(params: &Value) -> Option<(u32, u32)> {
    let line = params.pointer("/position/line")?.as_u64()?;
    let character = params.pointer("/position/character")?.as_u64()?;
    Some((line as u32, character as u32))
}

/// `range` as `((line, character), (line, character))`
pub fn range(params: &Value) -> Option<((u32, u32), (u32, u32))> {
    let get = |pointer: &str| params.pointer(pointer)?.as_u64().map(|n| n as u32);
    Some((
        (get("/range/start/line")?, get("/range/start/character")?),
        (get("/range/end/line")?, get("/range/end/character")?),
    ))
}

/// `context.triggerCharacter`
pub fn trigger_character(params: &Value) -> Option<String> {
    params
        .pointer("/context/triggerCharacter")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// A string field at the top level of the params.
pub fn string_field(params: &Value, field: &str) -> Option<String> {
    params.get(field).and_then(Value::as_str).map(str::to_string)
}

/// A boolean at a JSON-pointer path.
pub fn bool_at(params: &Value, pointer: &str) -> Option<bool> {
    params.pointer(pointer).and_then(Value::as_bool)
}
