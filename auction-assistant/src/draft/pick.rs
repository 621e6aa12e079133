// Player roles, bids and completed sales.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Amount;
use crate::catalog::Player;

/// Fantasy football roles. Serialized as the single-letter codes used by the
/// player data feed (`P`, `D`, `C`, `A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "P")]
    Goalkeeper,
    #[serde(rename = "D")]
    Defender,
    #[serde(rename = "C")]
    Midfielder,
    #[serde(rename = "A")]
    Forward,
}

impl Role {
    /// All roles in roster display order.
    pub const ALL: [Role; 4] = [
        Role::Goalkeeper,
        Role::Defender,
        Role::Midfielder,
        Role::Forward,
    ];

    /// Parse a role code.
    ///
    /// Accepts the feed letters ("P", "D", "C", "A"), the three-letter
    /// abbreviations shown on team cards ("POR", "DIF", "CEN", "ATT") and the
    /// English names. Case-insensitive, surrounding whitespace ignored.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "P" | "POR" | "GK" | "GOALKEEPER" => Some(Role::Goalkeeper),
            "D" | "DIF" | "DEF" | "DEFENDER" => Some(Role::Defender),
            "C" | "CEN" | "MID" | "MIDFIELDER" => Some(Role::Midfielder),
            "A" | "ATT" | "FW" | "FORWARD" => Some(Role::Forward),
            _ => None,
        }
    }

    /// The single-letter feed code.
    pub fn code(&self) -> &'static str {
        match self {
            Role::Goalkeeper => "P",
            Role::Defender => "D",
            Role::Midfielder => "C",
            Role::Forward => "A",
        }
    }

    /// Human-readable role name.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Goalkeeper => "Goalkeeper",
            Role::Defender => "Defender",
            Role::Midfielder => "Midfielder",
            Role::Forward => "Forward",
        }
    }

    /// Position of this role in [`Role::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Role::Goalkeeper => 0,
            Role::Defender => 1,
            Role::Midfielder => 2,
            Role::Forward => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single bid placed during a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    /// ID of the bidding participant.
    pub participant_id: String,
    /// Display name of the bidder at the time of the bid.
    #[serde(default)]
    pub participant_name: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

/// A completed sale, as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Catalog record of the sold player, copied at assignment time.
    pub player: Player,
    /// Stable ID of the winning participant. Undo resolves the owner by this.
    pub winner_id: String,
    /// Winner display name, kept for history views only.
    pub winner_name: String,
    pub price: Amount,
    /// Every bid of the round, in the order they were placed.
    #[serde(default)]
    pub bids: Vec<Bid>,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn player_id(&self) -> &str {
        &self.player.id
    }
}
