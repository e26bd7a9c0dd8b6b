//! Maps decoded JSON objects to creation stage payloads.
//!
//! Shapes are checked in a fixed order: `title` + `description`, then
//! `icon`, then `suggested_prompts`, then `chatbot_id`. The first match
//! wins, so an object carrying several of these keys is classified by the
//! earliest one.

use serde_json::Value;

use docutalk_types::creation::CreationPayload;

/// Classify one object from the creation stream.
///
/// Returns `None` for shapes matching no known stage, including known keys
/// with values of the wrong type.
pub fn classify(object: &Value) -> Option<CreationPayload> {
    let map = object.as_object()?;

    if let (Some(title), Some(description)) = (
        map.get("title").and_then(Value::as_str),
        map.get("description").and_then(Value::as_str),
    ) {
        return Some(CreationPayload::Identity {
            title: title.to_string(),
            description: description.to_string(),
        });
    }

    if let Some(data) = map.get("icon").and_then(Value::as_str) {
        return Some(CreationPayload::Icon {
            data: data.to_string(),
        });
    }

    if let Some(prompts) = map.get("suggested_prompts").and_then(Value::as_array) {
        let suggested = prompts
            .iter()
            .map(|p| p.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?;
        return Some(CreationPayload::Prompts { suggested });
    }

    if let Some(chatbot_id) = map.get("chatbot_id").and_then(Value::as_str) {
        return Some(CreationPayload::Finalized {
            chatbot_id: chatbot_id.to_string(),
        });
    }

    None
}
