//! Unverified JWT payload decoding.
//!
//! The client only reads claims to decide whether a token is worth
//! refreshing and which user it belongs to. Signatures are checked by the
//! backend, never here.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl Claims {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp
            .is_some_and(|exp| exp.saturating_mul(1000) < now.timestamp_millis())
    }
}

/// Decode the payload segment of `token`.
pub fn decode_claims(token: &str) -> ClientResult<Claims> {
    let invalid = |reason: &str| ClientError::Validation(format!("invalid token: {}", reason));

    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(invalid("expected header.payload.signature")),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| invalid("payload is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|_| invalid("payload is not a JSON object"))
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use super::*;
    use serde_json::json;

    /// Unsigned token carrying `exp` and `user_id`.
    pub fn make_token(exp: i64, user_id: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({"exp": exp, "user_id": user_id, "token_type": "access"})
                .to_string()
                .as_bytes(),
        );
        format!("{}.{}.sig", header, payload)
    }
}
