use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

/// Verified token payload with typed views over the claims the API relies on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claims {
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub expires_at: DateTime<Utc>,
    /// `None` when the token carries no usable `permissions` claim.
    pub permissions: Option<BTreeSet<String>>,
    pub raw: Map<String, Value>,
}

impl Claims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|set| set.contains(permission))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

impl TryFrom<Map<String, Value>> for Claims {
    type Error = AuthError;

    fn try_from(raw: Map<String, Value>) -> AuthResult<Self> {
        let exp = raw
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or_else(|| AuthError::InvalidClaims("exp claim missing or not numeric".into()))?;
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaims(format!("exp out of range: {exp}")))?;

        let audience = match raw.get("aud") {
            Some(Value::String(item)) => vec![item.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            subject: string_claim(&raw, "sub"),
            issuer: string_claim(&raw, "iss"),
            audience,
            expires_at,
            permissions: raw.get("permissions").and_then(permission_set),
            raw,
        })
    }
}

fn string_claim(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_owned)
}

// Anything other than an array of strings counts as absent.
fn permission_set(value: &Value) -> Option<BTreeSet<String>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_from(value: Value) -> AuthResult<Claims> {
        match value {
            Value::Object(map) => Claims::try_from(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn parses_permissions_and_audience_list() {
        let claims = claims_from(json!({
            "sub": "auth0|barista",
            "iss": "https://tenant.auth0.com/",
            "aud": ["coffee_shop", "https://tenant.auth0.com/userinfo"],
            "exp": 4_102_444_800i64,
            "permissions": ["get:drinks-detail", "post:drinks"]
        }))
        .unwrap();

        assert_eq!(claims.subject.as_deref(), Some("auth0|barista"));
        assert_eq!(claims.audience.len(), 2);
        assert!(claims.has_permission("post:drinks"));
        assert!(!claims.has_permission("delete:drinks"));
        assert_eq!(claims.get("sub"), Some(&json!("auth0|barista")));
    }

    #[test]
    fn absent_or_malformed_permissions_are_none() {
        let absent = claims_from(json!({ "exp": 4_102_444_800i64 })).unwrap();
        assert!(absent.permissions.is_none());

        let malformed = claims_from(json!({
            "exp": 4_102_444_800i64,
            "permissions": "get:drinks-detail"
        }))
        .unwrap();
        assert!(malformed.permissions.is_none());

        let empty = claims_from(json!({ "exp": 4_102_444_800i64, "permissions": [] })).unwrap();
        assert_eq!(empty.permissions, Some(BTreeSet::new()));
    }

    #[test]
    fn exp_is_required() {
        let err = claims_from(json!({ "sub": "x" })).unwrap_err();
        assert_eq!(err.code(), "invalid_claims");
    }
}
