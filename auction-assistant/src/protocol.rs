// Message types exchanged between the console front end and the app actor.

use std::path::PathBuf;

use crate::analysis::{AuctionSummary, Recommendation, RoleSupply, TeamNeeds};
use crate::catalog::{CatalogQuery, Player, PlayerPage};
use crate::draft::pick::{Bid, LedgerEntry};
use crate::draft::roster::{Participant, RoleLimits};
use crate::draft::Amount;

// ---------------------------------------------------------------------------
// Front end -> app
// ---------------------------------------------------------------------------

/// A user request. Participants may be referred to by id or by name;
/// players by id or by name.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Register a participant. `None` budget uses the configured default.
    AddParticipant { name: String, budget: Option<Amount> },
    RemoveParticipant { team: String },
    DeleteTeam { team: String },
    SetActive { team: String },
    SelectPlayer { player: String },
    CancelSelection,
    PlaceBid { amount: Amount },
    AssignPlayer { team: String, price: Amount },
    UndoLast,
    UndoSale { player: String },
    ReleasePlayer { team: String, player: String },
    ToggleFavorite { player: String },
    /// Search the catalog. The configured page size always applies.
    Query(CatalogQuery),
    /// Write the rosters CSV; `None` uses the dated default file name.
    Export { path: Option<PathBuf> },
    /// Ask for a fresh state snapshot.
    Show,
    Quit,
}

// ---------------------------------------------------------------------------
// App -> front end
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Full state after a change (or on request).
    StateSnapshot(Box<AppSnapshot>),
    Notice(Notice),
    PlayerPage(PlayerPage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A one-line message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// The player up for auction, with its bids and bidding advice.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionView {
    pub player: Player,
    pub bids: Vec<Bid>,
    pub high_bid: Amount,
    pub stars: u8,
    pub recommendation: Recommendation,
    pub favorite: bool,
}

/// Everything a front end needs to redraw after a change.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    pub auction_name: String,
    pub limits: RoleLimits,
    /// Participants in creation order.
    pub participants: Vec<Participant>,
    /// Needs per participant, same order as `participants`.
    pub team_needs: Vec<TeamNeeds>,
    pub active_participant_id: Option<String>,
    pub selection: Option<SelectionView>,
    /// Sales, oldest first.
    pub ledger: Vec<LedgerEntry>,
    pub sold: Vec<String>,
    pub favorites: Vec<String>,
    pub role_supply: Vec<RoleSupply>,
    pub summary: AuctionSummary,
    pub catalog_size: usize,
}
