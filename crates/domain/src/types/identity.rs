//! Display-only identity decoded from a credential
//!
//! The console shows who is signed in and hides admin-only screens based on
//! the role claim. None of this is a trust decision: the claims are read
//! from the JWT payload without verifying the signature, and the server
//! re-checks authorization on every call.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::credential::Credential;

/// Failure to read display claims from a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("credential is not a JWT (expected 3 segments, found {0})")]
    NotAJwt(usize),

    #[error("credential payload is not valid base64url: {0}")]
    Base64(String),

    #[error("credential payload is not a JSON object: {0}")]
    Json(String),

    #[error("credential payload has no subject claim")]
    MissingSubject,
}

/// Minimal identity reconstructed from token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject identifier (`sub`, usually the username).
    pub subject: String,

    /// Primary role, e.g. `ADMIN` or `ROLE_USER`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Numeric account identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,

    /// Expiry advertised by the token (`exp`). Informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Decode the payload segment of a JWT credential.
    ///
    /// # Errors
    /// Returns [`IdentityError`] if the credential is not a three-segment
    /// JWT, the payload is not base64url JSON, or no subject is present.
    pub fn from_credential(credential: &Credential) -> Result<Self, IdentityError> {
        let segments: Vec<&str> = credential.as_str().split('.').collect();
        if segments.len() != 3 {
            return Err(IdentityError::NotAJwt(segments.len()));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(segments[1].trim_end_matches('='))
            .map_err(|e| IdentityError::Base64(e.to_string()))?;

        let claims: Map<String, Value> =
            serde_json::from_slice(&payload).map_err(|e| IdentityError::Json(e.to_string()))?;

        Self::from_claims(&claims)
    }

    /// Build an identity from a claims object.
    ///
    /// Accepts the claim spellings the API has used over time:
    /// - subject: `sub`, `username`
    /// - role: `role`, `authority`, first entry of `roles` / `authorities`
    ///   (plain strings or `{ "authority": ... }` objects)
    /// - account id: `id`, `accountId`, `account_id` (number or numeric
    ///   string)
    ///
    /// # Errors
    /// Returns [`IdentityError::MissingSubject`] if no subject claim exists.
    pub fn from_claims(claims: &Map<String, Value>) -> Result<Self, IdentityError> {
        let subject = ["sub", "username"]
            .iter()
            .find_map(|key| claims.get(*key).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .ok_or(IdentityError::MissingSubject)?
            .to_string();

        let role = claims
            .get("role")
            .or_else(|| claims.get("authority"))
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| first_authority(claims.get("roles")))
            .or_else(|| first_authority(claims.get("authorities")));

        let account_id = ["id", "accountId", "account_id"]
            .iter()
            .find_map(|key| claims.get(*key).and_then(numeric_claim));

        let expires_at = claims
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

        Ok(Self { subject, role, account_id, expires_at })
    }

    /// Case-insensitive role check that ignores a `ROLE_` prefix on either
    /// side, so `has_role("admin")` matches `ROLE_ADMIN`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role
            .as_deref()
            .is_some_and(|own| normalize_role(own).eq_ignore_ascii_case(normalize_role(role)))
    }
}

fn normalize_role(role: &str) -> &str {
    let trimmed = role.trim();
    match trimmed.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("role_") => &trimmed[5..],
        _ => trimmed,
    }
}

fn first_authority(value: Option<&Value>) -> Option<String> {
    let first = value?.as_array()?.first()?;
    match first {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("authority").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

fn numeric_claim(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn jwt(claims: &Value) -> Credential {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        Credential::new(format!("{header}.{payload}.signature"))
    }

    #[test]
    fn decodes_standard_claims() {
        let credential = jwt(&json!({
            "sub": "librarian",
            "role": "ADMIN",
            "id": 42,
            "exp": 1_700_000_000
        }));

        let identity = Identity::from_credential(&credential).unwrap();
        assert_eq!(identity.subject, "librarian");
        assert_eq!(identity.role.as_deref(), Some("ADMIN"));
        assert_eq!(identity.account_id, Some(42));
        assert_eq!(identity.expires_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn accepts_alternate_claim_spellings() {
        let credential = jwt(&json!({
            "username": "reader",
            "authorities": [{ "authority": "ROLE_USER" }],
            "accountId": "17"
        }));

        let identity = Identity::from_credential(&credential).unwrap();
        assert_eq!(identity.subject, "reader");
        assert_eq!(identity.role.as_deref(), Some("ROLE_USER"));
        assert_eq!(identity.account_id, Some(17));
        assert!(identity.expires_at.is_none());
    }

    #[test]
    fn role_check_ignores_prefix_and_case() {
        let identity = Identity {
            subject: "a".into(),
            role: Some("ROLE_ADMIN".into()),
            account_id: None,
            expires_at: None,
        };
        assert!(identity.has_role("admin"));
        assert!(identity.has_role("ROLE_Admin"));
        assert!(!identity.has_role("user"));
    }

    #[test]
    fn opaque_token_is_not_a_jwt() {
        let result = Identity::from_credential(&Credential::new("opaque-token"));
        assert_eq!(result, Err(IdentityError::NotAJwt(1)));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let result = Identity::from_credential(&Credential::new("a.!!!.c"));
        assert!(matches!(result, Err(IdentityError::Base64(_))));
    }

    #[test]
    fn missing_subject_is_rejected() {
        let result = Identity::from_credential(&jwt(&json!({ "role": "ADMIN" })));
        assert_eq!(result, Err(IdentityError::MissingSubject));
    }
}
