use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum age accepted at registration and on profile updates.
pub const MIN_AGE: i32 = 13;
/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Publication state shared by quizzes and games. Only `Active` entries are
/// listed to regular users.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    #[default]
    Active,
    Inactive,
    Archived,
}

impl CatalogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogStatus::Active => "active",
            CatalogStatus::Inactive => "inactive",
            CatalogStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CatalogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CatalogStatus::Active),
            "inactive" => Ok(CatalogStatus::Inactive),
            "archived" => Ok(CatalogStatus::Archived),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
        }
    }
}

impl FromStr for FriendshipStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendshipStatus::Pending),
            "accepted" => Ok(FriendshipStatus::Accepted),
            other => Err(UnknownVariant {
                kind: "friendship status",
                value: other.to_string(),
            }),
        }
    }
}

/// What a ledger entry in the points history was awarded for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PointSource {
    Mission,
    Quiz,
    Game,
}

impl PointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointSource::Mission => "mission",
            PointSource::Quiz => "quiz",
            PointSource::Game => "game",
        }
    }
}

impl FromStr for PointSource {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mission" => Ok(PointSource::Mission),
            "quiz" => Ok(PointSource::Quiz),
            "game" => Ok(PointSource::Game),
            other => Err(UnknownVariant {
                kind: "point source",
                value: other.to_string(),
            }),
        }
    }
}

pub const STARTING_DEFAULT_STATUS: &str = "active";
pub const ENDING_DEFAULT_STATUS: &str = "completed";
