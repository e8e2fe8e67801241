use serde_json::{Map, Value};

/// A backend's raw output, decoded once into one of the shapes the
/// normalizer knows how to read.
#[derive(Debug, Clone, PartialEq)]
pub enum RawExtractionResult {
    /// A JSON object carrying the extracted fields.
    Fields(Map<String, Value>),
    /// `null`, `{}` or a blank string. Also what a failed call is treated as.
    Empty,
    /// Anything that can't be read as a record.
    Malformed(String),
}

impl RawExtractionResult {
    /// Decode raw backend JSON.
    ///
    /// Chat-completion envelopes (`choices[0].message.content`) are unwrapped
    /// one level, and JSON that arrives as a string (optionally inside a
    /// Markdown code fence) is parsed.
    pub fn decode(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Object(map) if map.is_empty() => Self::Empty,
            Value::Object(map) if map.get("choices").is_some_and(Value::is_array) => {
                match chat_content(&map) {
                    Some(content) => Self::decode_content(content.clone()),
                    None => Self::Malformed("chat completion without message content".to_string()),
                }
            }
            Value::Object(map) => Self::Fields(map),
            Value::String(s) => Self::decode_str(&s),
            other => Self::Malformed(format!("expected a JSON object, got {}", kind(&other))),
        }
    }

    /// The field map, if there is one.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Fields(map) => Some(map),
            _ => None,
        }
    }

    pub fn malformed_reason(&self) -> Option<&str> {
        match self {
            Self::Malformed(reason) => Some(reason),
            _ => None,
        }
    }

    fn decode_content(content: Value) -> Self {
        match content {
            Value::Null => Self::Empty,
            Value::Object(map) if map.is_empty() => Self::Empty,
            Value::Object(map) => Self::Fields(map),
            Value::String(s) => Self::decode_str(&s),
            other => Self::Malformed(format!("message content is {}", kind(&other))),
        }
    }

    fn decode_str(raw: &str) -> Self {
        let body = strip_code_fence(raw);
        if body.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) if map.is_empty() => Self::Empty,
            Ok(Value::Object(map)) => Self::Fields(map),
            Ok(Value::Null) => Self::Empty,
            Ok(other) => Self::Malformed(format!("string holds {}, not an object", kind(&other))),
            Err(e) => Self::Malformed(format!("unparsable JSON string: {e}")),
        }
    }
}

fn chat_content(map: &Map<String, Value>) -> Option<&Value> {
    map.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_object_is_fields() {
        let raw = RawExtractionResult::decode(json!({"title": "Lomba"}));
        assert_eq!(raw.fields().unwrap()["title"], "Lomba");
    }

    #[test]
    fn null_and_empty_object_are_empty() {
        assert_eq!(RawExtractionResult::decode(Value::Null), RawExtractionResult::Empty);
        assert_eq!(RawExtractionResult::decode(json!({})), RawExtractionResult::Empty);
        assert_eq!(RawExtractionResult::decode(json!("  ")), RawExtractionResult::Empty);
    }

    #[test]
    fn chat_completion_with_string_content_is_unwrapped() {
        let raw = RawExtractionResult::decode(json!({
            "id": "cmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"title\": \"Hackathon\"}"}
            }]
        }));
        assert_eq!(raw.fields().unwrap()["title"], "Hackathon");
    }

    #[test]
    fn chat_completion_without_content_is_malformed() {
        let raw = RawExtractionResult::decode(json!({"choices": []}));
        assert!(raw.malformed_reason().is_some());
    }

    #[test]
    fn fenced_json_string_is_parsed() {
        let raw = RawExtractionResult::decode(json!("```json\n{\"location\": \"Bandung\"}\n```"));
        assert_eq!(raw.fields().unwrap()["location"], "Bandung");
    }

    #[test]
    fn non_objects_are_malformed() {
        assert!(RawExtractionResult::decode(json!([1, 2])).malformed_reason().is_some());
        assert!(RawExtractionResult::decode(json!(42)).malformed_reason().is_some());
        assert!(RawExtractionResult::decode(json!("not json at all")).malformed_reason().is_some());
    }
}
