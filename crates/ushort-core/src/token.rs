use crate::base62;
use crate::error::CoreError;
use crate::link::LinkId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// A base62 short token standing in for a full URL.
///
/// Tokens are compared byte for byte, so lookups are case-sensitive.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(SmolStr);

impl Token {
    /// Derives the token for a store-assigned identifier.
    pub fn encode(id: LinkId) -> Self {
        Self(SmolStr::new(base62::encode(id.get())))
    }

    /// Parses untrusted input, rejecting anything outside the base62 alphabet.
    ///
    /// The value is not range checked: a well-formed token too long to encode
    /// any `u64` is simply one no link holds.
    ///
    /// # Examples
    ///
    /// ```
    /// use ushort_core::Token;
    ///
    /// assert!(Token::parse("bE4").is_ok());
    /// assert!(Token::parse("short!").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        if token.is_empty() {
            return Err(CoreError::InvalidToken("token cannot be empty".to_string()));
        }
        if !base62::is_alphabet(token) {
            return Err(CoreError::InvalidToken(format!(
                "'{token}' contains characters outside the base62 alphabet"
            )));
        }
        Ok(Self(SmolStr::new(token)))
    }

    /// Creates a `Token` without validation.
    ///
    /// Use this only for values read back from trusted storage.
    pub fn new_unchecked(token: impl AsRef<str>) -> Self {
        Self(SmolStr::new(token))
    }

    /// Decodes the identifier this token encodes.
    pub fn decode(&self) -> Result<LinkId, CoreError> {
        base62::decode(&self.0).map(LinkId::new)
    }

    /// Builds the full short URL under `base_url`.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Token").field(&self.0).finish()
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Token {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = SmolStr::deserialize(deserializer)?;
        Token::parse(&s).map_err(serde::de::Error::custom)
    }
}
