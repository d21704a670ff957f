use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TurnRole {
    User,
    #[serde(rename = "AI")]
    Ai,
}

impl TurnRole {
    pub fn label(self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Ai => "AI",
        }
    }
}

/// One labeled utterance in a user's conversation history.
///
/// Stored as a single line of the form `"<Role>: <text>"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Ai,
            text: text.into(),
        }
    }
}

impl fmt::Display for ConversationTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role.label(), self.text)
    }
}

impl FromStr for ConversationTurn {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (label, text) = line
            .split_once(": ")
            .ok_or_else(|| Error::MalformedPayload(format!("turn without role label: {line:?}")))?;

        let role = match label {
            "User" => TurnRole::User,
            "AI" => TurnRole::Ai,
            other => {
                return Err(Error::MalformedPayload(format!(
                    "unknown turn role {other:?}"
                )));
            }
        };

        Ok(Self {
            role,
            text: text.to_string(),
        })
    }
}
