// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request body validation.
//!
//! Bodies arrive as untyped JSON so wrong types can be reported against the
//! field that carried them. Fields not named here are ignored, which keeps
//! callers from setting `id`, `clientId`, `senderId` and the like.

use serde_json::{Map, Value};
use supportdesk_config::ChatConfig;
use supportdesk_core::SupportError;
use supportdesk_core::types::{ConversationPatch, ConversationStatus, Priority};

use crate::sanitize::sanitize;

/// Validated input for opening a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationInput {
    pub subject: String,
    pub message: String,
}

/// Validated input for posting a message.
///
/// `is_internal_note` is what the caller asked for; the authorization gate
/// decides what is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInput {
    pub content: String,
    pub is_internal_note: bool,
    pub file_ids: Vec<String>,
}

fn object(body: &Value) -> Result<&Map<String, Value>, SupportError> {
    body.as_object().ok_or_else(|| SupportError::Validation {
        field: None,
        message: "request body must be a JSON object".into(),
    })
}

/// Required free-text field: a string, sanitized, non-empty, at most `max` characters.
fn text_field(
    body: &Map<String, Value>,
    field: &str,
    max: usize,
) -> Result<String, SupportError> {
    let raw = match body.get(field) {
        None | Some(Value::Null) => {
            return Err(SupportError::validation(field, format!("{field} is required")));
        }
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(SupportError::validation(field, format!("{field} must be a string")));
        }
    };
    let clean = sanitize(raw);
    if clean.is_empty() {
        return Err(SupportError::validation(field, format!("{field} must not be empty")));
    }
    if clean.chars().count() > max {
        return Err(SupportError::validation(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
    Ok(clean)
}

pub fn conversation_input(
    body: &Value,
    limits: &ChatConfig,
) -> Result<ConversationInput, SupportError> {
    let body = object(body)?;
    Ok(ConversationInput {
        subject: text_field(body, "subject", limits.max_subject_len)?,
        message: text_field(body, "message", limits.max_content_len)?,
    })
}

pub fn message_input(body: &Value, limits: &ChatConfig) -> Result<MessageInput, SupportError> {
    let body = object(body)?;
    let content = text_field(body, "content", limits.max_content_len)?;

    // `null` reads as an omitted field.
    let is_internal_note = match body.get("isInternalNote") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            return Err(SupportError::validation(
                "isInternalNote",
                "isInternalNote must be a boolean",
            ));
        }
    };

    let file_ids = match body.get("fileIds") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
                _ => Err(SupportError::validation(
                    "fileIds",
                    "fileIds must contain only non-empty strings",
                )),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(SupportError::validation("fileIds", "fileIds must be an array"));
        }
    };

    Ok(MessageInput {
        content,
        is_internal_note,
        file_ids,
    })
}

fn enum_field<T: std::str::FromStr>(
    body: &Map<String, Value>,
    field: &str,
    allowed: &str,
) -> Result<Option<T>, SupportError> {
    match body.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| SupportError::validation(field, format!("{field} must be one of {allowed}"))),
        Some(_) => Err(SupportError::validation(
            field,
            format!("{field} must be one of {allowed}"),
        )),
    }
}

/// Parse a metadata patch. Existence of the assignee is checked by the service.
pub fn conversation_patch(body: &Value) -> Result<ConversationPatch, SupportError> {
    let body = object(body)?;
    let status = enum_field::<ConversationStatus>(
        body,
        "status",
        "open, in_progress, resolved, closed",
    )?;
    let priority = enum_field::<Priority>(body, "priority", "low, normal, high")?;
    let assigned_to = match body.get("assignedTo") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(id)) if !id.trim().is_empty() => Some(Some(id.trim().to_string())),
        Some(_) => {
            return Err(SupportError::validation(
                "assignedTo",
                "assignedTo must be a staff user id or null",
            ));
        }
    };
    Ok(ConversationPatch {
        status,
        priority,
        assigned_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> ChatConfig {
        ChatConfig::default()
    }

    fn field_of(err: SupportError) -> Option<String> {
        match err {
            SupportError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn conversation_ok_and_sanitized() {
        let input = conversation_input(
            &json!({"subject": "  Help <script>x()</script> ", "message": "I need help", "clientId": "spoof"}),
            &limits(),
        )
        .unwrap();
        assert_eq!(input.subject, "Help");
        assert_eq!(input.message, "I need help");
    }

    #[test]
    fn conversation_rejects_wrong_types_and_lengths() {
        let cases = [
            (json!({"message": "m"}), "subject"),
            (json!({"subject": 5, "message": "m"}), "subject"),
            (json!({"subject": "   ", "message": "m"}), "subject"),
            (json!({"subject": "s".repeat(201), "message": "m"}), "subject"),
            (json!({"subject": "s", "message": ["m"]}), "message"),
            (json!({"subject": "s", "message": "m".repeat(1001)}), "message"),
            (json!({"subject": "s", "message": "<script>only</script>"}), "message"),
        ];
        for (body, field) in cases {
            let err = conversation_input(&body, &limits()).unwrap_err();
            assert_eq!(field_of(err).as_deref(), Some(field), "{body}");
        }
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        let subject = "é".repeat(200);
        assert!(conversation_input(&json!({"subject": subject, "message": "m"}), &limits()).is_ok());
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = message_input(&json!("hello"), &limits()).unwrap_err();
        assert!(matches!(err, SupportError::Validation { field: None, .. }));
    }

    #[test]
    fn message_content_types() {
        for bad in [json!(null), json!(1), json!(true), json!([]), json!({})] {
            let err = message_input(&json!({"content": bad}), &limits()).unwrap_err();
            assert_eq!(field_of(err).as_deref(), Some("content"));
        }
    }

    #[test]
    fn message_optional_fields() {
        let input = message_input(
            &json!({"content": "hi", "isInternalNote": true, "fileIds": ["a", "b"], "senderId": "x"}),
            &limits(),
        )
        .unwrap();
        assert!(input.is_internal_note);
        assert_eq!(input.file_ids, vec!["a", "b"]);

        let err = message_input(&json!({"content": "hi", "fileIds": "a"}), &limits()).unwrap_err();
        assert_eq!(field_of(err).as_deref(), Some("fileIds"));
        let err = message_input(&json!({"content": "hi", "fileIds": [1]}), &limits()).unwrap_err();
        assert_eq!(field_of(err).as_deref(), Some("fileIds"));
        let err =
            message_input(&json!({"content": "hi", "isInternalNote": "yes"}), &limits()).unwrap_err();
        assert_eq!(field_of(err).as_deref(), Some("isInternalNote"));
    }

    #[test]
    fn null_optional_fields_read_as_absent() {
        let input = message_input(
            &json!({"content": "hi", "isInternalNote": null, "fileIds": null}),
            &limits(),
        )
        .unwrap();
        assert!(!input.is_internal_note);
        assert!(input.file_ids.is_empty());
    }

    #[test]
    fn patch_parses_present_fields_only() {
        let patch = conversation_patch(&json!({"status": "in_progress", "priority": "high", "clientId": "x"}))
            .unwrap();
        assert_eq!(patch.status, Some(ConversationStatus::InProgress));
        assert_eq!(patch.priority, Some(Priority::High));
        assert_eq!(patch.assigned_to, None);

        let clear = conversation_patch(&json!({"assignedTo": null})).unwrap();
        assert_eq!(clear.assigned_to, Some(None));

        assert!(conversation_patch(&json!({"unknown": 1})).unwrap().is_empty());
    }

    #[test]
    fn patch_names_bad_field() {
        for (body, field) in [
            (json!({"status": "archived"}), "status"),
            (json!({"status": 3}), "status"),
            (json!({"priority": "urgent"}), "priority"),
            (json!({"assignedTo": 42}), "assignedTo"),
            (json!({"assignedTo": ""}), "assignedTo"),
        ] {
            let err = conversation_patch(&body).unwrap_err();
            assert_eq!(field_of(err).as_deref(), Some(field), "{body}");
        }
    }
}
