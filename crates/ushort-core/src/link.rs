use crate::token::Token;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A store-assigned, strictly increasing link identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(u64);

impl LinkId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for LinkId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a persisted link is in the two-phase create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Inserted with an id but no token yet.
    Assigned,
    /// Token set to `Token::encode(id)`; immutable from here on.
    Complete,
}

/// A persisted association between an original URL and its token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub original_url: String,
    /// `None` between insertion and token assignment.
    pub token: Option<Token>,
    pub created_at: Timestamp,
}

impl Link {
    pub fn state(&self) -> LinkState {
        match self.token {
            Some(_) => LinkState::Complete,
            None => LinkState::Assigned,
        }
    }

    /// The token this link must carry once complete.
    pub fn expected_token(&self) -> Token {
        Token::encode(self.id)
    }

    /// True when the token is unset or matches the encoding of the id.
    pub fn is_consistent(&self) -> bool {
        self.token
            .as_ref()
            .is_none_or(|token| *token == self.expected_token())
    }
}
