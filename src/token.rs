// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{self, Result};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum Authority {
    Name(String),
    Granted { authority: String },
}

impl From<Authority> for String {
    fn from(value: Authority) -> Self {
        match value {
            Authority::Name(name) | Authority::Granted { authority: name } => name,
        }
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: u64,
    #[serde(default)]
    authorities: Vec<Authority>,
}

/// The parts of a session token this client acts on.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SessionToken {
    raw: String,
    expiry: u64,
    authorities: Vec<String>,
    claims: Map<String, Value>,
}

impl SessionToken {
    /// Reads the claims of a token without checking its signature.
    ///
    /// The client holds no key to verify with; the server checks the token on
    /// every later request.
    pub(crate) fn decode(raw: &str) -> Result<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let claims = jsonwebtoken::decode::<Map<String, Value>>(
            raw,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .map_err(error::Token::from)?
        .claims;
        let Claims { exp, authorities } = serde_json::from_value(Value::Object(claims.clone()))?;

        Ok(Self {
            raw: raw.to_owned(),
            expiry: exp,
            authorities: authorities.into_iter().map(String::from).collect(),
            claims,
        })
    }

    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    /// Seconds since the Unix epoch.
    pub(crate) const fn expiry(&self) -> u64 {
        self.expiry
    }

    /// Authorities in the order the server listed them.
    pub(crate) fn authorities(&self) -> &[String] {
        &self.authorities
    }

    pub(crate) const fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{testing::sign, *};

    #[test]
    fn decode_string_authorities() -> Result<()> {
        let raw = sign(&json!({
            "sub": "ab1",
            "exp": 1_700_000_000_u64,
            "authorities": ["X", "ROLE_ROLE_STUDENT", "Y"],
        }));
        let token = SessionToken::decode(&raw)?;

        assert_eq!(token.raw(), raw);
        assert_eq!(token.expiry(), 1_700_000_000);
        assert_eq!(token.authorities(), ["X", "ROLE_ROLE_STUDENT", "Y"]);
        assert_eq!(token.claims().get("sub"), Some(&json!("ab1")));
        Ok(())
    }

    #[test]
    fn decode_granted_authorities() -> Result<()> {
        let raw = sign(&json!({
            "exp": 1_700_000_000_u64,
            "authorities": [{ "authority": "ROLE_USER" }, { "authority": "ROLE_ROLE_GUEST" }],
        }));

        assert_eq!(
            SessionToken::decode(&raw)?.authorities(),
            ["ROLE_USER", "ROLE_ROLE_GUEST"]
        );
        Ok(())
    }

    #[test]
    fn decode_expired_token() -> Result<()> {
        let raw = sign(&json!({ "exp": 1_u64, "authorities": [] }));

        assert_eq!(SessionToken::decode(&raw)?.expiry(), 1);
        Ok(())
    }

    #[test]
    fn decode_garbage() {
        assert!(matches!(
            SessionToken::decode("not-a-token"),
            Err(error::Error::Token(error::Token::Decode(_)))
        ));
    }

    #[test]
    fn decode_without_expiry() {
        let raw = sign(&json!({ "authorities": ["ROLE_ROLE_ADMIN"] }));

        assert!(matches!(
            SessionToken::decode(&raw),
            Err(error::Error::Json(_))
        ));
    }
}
