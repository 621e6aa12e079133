// Draft operation failures. Every variant is a local, recoverable rejection:
// the state is left exactly as it was before the call.

use std::fmt;

use thiserror::Error;

use super::pick::Role;
use super::Amount;

pub type Result<T> = std::result::Result<T, DraftError>;

/// Which kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Participant,
    Player,
    LedgerEntry,
    RosterEntry,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Missing::Participant => "participant",
            Missing::Player => "player",
            Missing::LedgerEntry => "sale",
            Missing::RosterEntry => "roster entry",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("a participant named '{0}' already exists")]
    DuplicateName(String),

    #[error("{what} not found: {id}")]
    NotFound { what: Missing, id: String },

    #[error("player {0} has already been sold")]
    AlreadySold(String),

    #[error("no active participant selected")]
    NoActiveParticipant,

    #[error("no player selected")]
    NoSelection,

    #[error("bid of {amount} must be higher than {current}")]
    BidTooLow { amount: Amount, current: Amount },

    #[error("bid of {amount} exceeds remaining budget of {budget}")]
    InsufficientBudget { amount: Amount, budget: Amount },

    #[error("{} limit reached ({count}/{limit})", role.label())]
    RoleLimitReached { role: Role, count: u32, limit: u32 },

    #[error("nothing to undo")]
    EmptyLedger,
}

impl DraftError {
    pub(crate) fn not_found(what: Missing, id: &str) -> Self {
        DraftError::NotFound {
            what,
            id: id.to_string(),
        }
    }
}
