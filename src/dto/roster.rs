use serde::Deserialize;
use validator::Validate;

use crate::{dto::validation::validate_display_name, state::club::Rank};

/// Payload used to register a new player.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlayerInput {
    /// Display name, already trimmed.
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
    /// Skill level.
    pub rank: Rank,
}

impl PlayerInput {
    /// Build an input, trimming the name.
    pub fn new(name: impl AsRef<str>, rank: Rank) -> Self {
        Self {
            name: name.as_ref().trim().to_owned(),
            rank,
        }
    }
}

/// Payload used to register a new court.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CourtInput {
    /// Display name, already trimmed.
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
}

impl CourtInput {
    /// Build an input, trimming the name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_owned(),
        }
    }
}
