use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// One schema value shared by the form handler and its tests, so the rules
/// the client renders and the rules the server enforces cannot drift apart.
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    /// Required string with a minimum character count.
    MinChars(usize),
    /// Optional string; absent, null or empty all pass.
    Optional,
    /// Required string in email shape.
    Email,
    /// Required non-empty string, any content.
    Any,
}

pub type Schema = &'static [(&'static str, FieldRule)];

/// Contact form rules, mirrored from the submission UI.
pub const CONTACT_SCHEMA: Schema = &[
    ("name", FieldRule::MinChars(2)),
    ("company", FieldRule::Optional),
    ("projectType", FieldRule::Any),
    ("email", FieldRule::Email),
    ("message", FieldRule::MinChars(10)),
];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern")
});

/// Validate a JSON object against a schema. Returns the names of the fields
/// that failed, in schema order; empty means the payload is valid.
pub fn check(schema: Schema, payload: &Value) -> Vec<&'static str> {
    let mut failed = Vec::new();
    for (field, rule) in schema {
        let value = payload.get(field);
        let text = value.and_then(Value::as_str);
        let ok = match rule {
            FieldRule::Optional => match value {
                None | Some(Value::Null) => true,
                Some(v) => v.is_string(),
            },
            FieldRule::MinChars(min) => text.is_some_and(|s| s.chars().count() >= *min),
            FieldRule::Email => text.is_some_and(|s| EMAIL_RE.is_match(s)),
            FieldRule::Any => text.is_some_and(|s| !s.is_empty()),
        };
        if !ok {
            failed.push(*field);
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_contact_payload_passes() {
        let payload = json!({
            "name": "张三",
            "company": "Acme",
            "projectType": "Website",
            "email": "a@b.com",
            "message": "need a ten-plus char message",
        });
        assert!(check(CONTACT_SCHEMA, &payload).is_empty());
    }

    #[test]
    fn company_is_optional() {
        let payload = json!({
            "name": "张三",
            "projectType": "Website",
            "email": "a@b.com",
            "message": "0123456789",
        });
        assert!(check(CONTACT_SCHEMA, &payload).is_empty());
    }

    #[test]
    fn min_chars_counts_characters_not_bytes() {
        // Two CJK characters are six bytes but satisfy MinChars(2).
        let payload = json!({
            "name": "张三",
            "projectType": "Website",
            "email": "a@b.com",
            "message": "十个字符的消息十个字符",
        });
        assert!(check(CONTACT_SCHEMA, &payload).is_empty());
    }

    #[test]
    fn malformed_email_is_reported_by_field() {
        let payload = json!({
            "name": "张三",
            "projectType": "Website",
            "email": "not-an-email",
            "message": "need a ten-plus char message",
        });
        assert_eq!(check(CONTACT_SCHEMA, &payload), vec!["email"]);
    }

    #[test]
    fn short_message_and_name_both_fail() {
        let payload = json!({
            "name": "x",
            "projectType": "Website",
            "email": "a@b.com",
            "message": "short",
        });
        assert_eq!(check(CONTACT_SCHEMA, &payload), vec!["name", "message"]);
    }

    #[test]
    fn missing_fields_fail_their_rules() {
        let payload = json!({});
        assert_eq!(
            check(CONTACT_SCHEMA, &payload),
            vec!["name", "projectType", "email", "message"]
        );
    }
}
