//! Rendered payload validation

use serde_json::Value;

use crate::error::{NotifierError, Result};

/// Parse rendered template text as the JSON document to post
///
/// No schema is enforced; the template decides the message card shape.
pub fn parse_payload(rendered: &str) -> Result<Value> {
    let payload: Value = serde_json::from_str(rendered).map_err(NotifierError::PayloadError)?;
    tracing::debug!(payload = %payload, "Rendered payload");
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_payload() {
        let payload = parse_payload(r#"{"text": "Run successful", "sections": []}"#).unwrap();
        assert_eq!(payload["text"], "Run successful");
    }

    #[test]
    fn test_malformed_payload_is_fatal() {
        let err = parse_payload(r#"{"text": }"#).unwrap_err();
        assert!(matches!(err, NotifierError::PayloadError(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        assert!(parse_payload("   ").is_err());
    }
}
