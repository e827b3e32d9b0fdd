use serde_json::{Map, Value};

use crate::error::{FieldErrors, ShopError};

/// Backend field names that correspond to a form field, and the form name.
const KNOWN_FIELDS: &[(&str, &str)] = &[
    ("amount", "amount"),
    ("requested_amount", "amount"),
    ("approved_amount", "amount"),
    ("payment_method", "method"),
    ("reference_number", "reference"),
    ("payment_reference", "payment_reference"),
    ("reason", "reason"),
    ("notes", "notes"),
    ("status", "status"),
    ("employee", "employee"),
];

/// Keys DRF uses for messages that belong to the whole request.
const GENERAL_KEYS: &[&str] = &["error", "detail", "non_field_errors", "message"];

const GENERIC_MESSAGE: &str = "The server rejected the request";

/// Turn a non-2xx response into an error, mapping field messages where possible.
pub fn classify_failure(status: u16, body: &str) -> ShopError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let (message, fields) = match parsed.as_ref() {
        Some(Value::Object(obj)) => read_error_object(obj),
        _ => (None, FieldErrors::new()),
    };

    match status {
        401 => ShopError::Unauthorized(message.unwrap_or_else(|| "Authentication required".into())),
        403 => ShopError::Unauthorized(message.unwrap_or_else(|| "Permission denied".into())),
        400..=499 => ShopError::Rejected {
            status,
            message: message
                .or_else(|| (!fields.is_empty()).then(|| "Please correct the highlighted fields".into()))
                .unwrap_or_else(|| GENERIC_MESSAGE.into()),
            fields,
        },
        _ => ShopError::Server {
            status,
            message: message.unwrap_or_else(|| {
                let snippet: String = body.chars().take(120).collect();
                if snippet.trim().is_empty() {
                    "Internal server error".into()
                } else {
                    snippet
                }
            }),
        },
    }
}

fn read_error_object(obj: &Map<String, Value>) -> (Option<String>, FieldErrors) {
    // Wrapped form: {"error": true, "message": "...", "details": {...}}
    if let Some(Value::Object(details)) = obj.get("details") {
        let (inner, fields) = read_error_object(details);
        let outer = obj.get("message").and_then(first_message);
        return (inner.or(outer), fields);
    }

    let mut fields = FieldErrors::new();
    let mut general = None;
    let mut unmatched = Vec::new();

    for (key, value) in obj {
        let Some(text) = first_message(value) else {
            continue;
        };
        if GENERAL_KEYS.contains(&key.as_str()) {
            general.get_or_insert(text);
        } else if let Some((_, form)) = KNOWN_FIELDS.iter().find(|(wire, _)| *wire == key.as_str()) {
            fields.add(*form, text);
        } else {
            unmatched.push(format!("{key}: {text}"));
        }
    }

    let message = general.or_else(|| (!unmatched.is_empty()).then(|| unmatched.join("; ")));
    (message, fields)
}

/// First human-readable string in a DRF error value (string or list of strings).
fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_dict_maps_onto_form_fields() {
        let err = classify_failure(
            400,
            r#"{"requested_amount": ["Requested amount must be greater than zero"], "reason": ["This field is required."]}"#,
        );
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.get("amount"), Some("Requested amount must be greater than zero"));
        assert_eq!(fields.get("reason"), Some("This field is required."));
    }

    #[test]
    fn error_key_becomes_the_message() {
        match classify_failure(400, r#"{"error": "Receipt already exists for this payment"}"#) {
            ShopError::Rejected { message, fields, .. } => {
                assert_eq!(message, "Receipt already exists for this payment");
                assert!(fields.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrapped_envelope_is_unwrapped() {
        let body = r#"{"error": true, "message": "Bad request", "details": {"reference_number": ["Required"]}, "status_code": 400}"#;
        match classify_failure(400, body) {
            ShopError::Rejected { message, fields, .. } => {
                assert_eq!(message, "Bad request");
                assert_eq!(fields.get("reference"), Some("Required"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_fold_into_the_message() {
        match classify_failure(400, r#"{"service_variant": ["Invalid pk"]}"#) {
            ShopError::Rejected { message, fields, .. } => {
                assert_eq!(message, "service_variant: Invalid pk");
                assert!(fields.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_json_bodies_get_a_generic_message() {
        match classify_failure(404, "<html>Not Found</html>") {
            ShopError::Rejected { message, .. } => assert_eq!(message, GENERIC_MESSAGE),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(classify_failure(502, ""), ShopError::Server { status: 502, .. }));
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        let err = classify_failure(401, r#"{"detail": "Given token not valid for any token type"}"#);
        assert!(matches!(err, ShopError::Unauthorized(ref m) if m.contains("token")));
        assert!(!err.is_retryable());
        assert!(matches!(classify_failure(403, "{}"), ShopError::Unauthorized(_)));
    }
}
