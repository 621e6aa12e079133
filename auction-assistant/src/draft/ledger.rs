// Append-only history of completed sales, the source of truth for undo.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::pick::LedgerEntry;

/// Completed sales in the order they happened.
///
/// Entries are only appended by an assignment. They leave the ledger through
/// undo (newest first, or a specific sale) or when the player is released
/// from a roster administratively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    pub fn push(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Remove and return the most recent sale.
    pub fn pop(&mut self) -> Option<LedgerEntry> {
        self.entries.pop()
    }

    /// The sale of a given player, if recorded.
    pub fn find(&self, player_id: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.player_id() == player_id)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.find(player_id).is_some()
    }

    /// Remove the sale of a given player regardless of its position.
    pub fn remove_player(&mut self, player_id: &str) -> Option<LedgerEntry> {
        let idx = self.entries.iter().position(|e| e.player_id() == player_id)?;
        Some(self.entries.remove(idx))
    }

    /// Drop every sale whose player is in `player_ids`. Returns how many
    /// entries were removed.
    pub fn remove_players(&mut self, player_ids: &HashSet<&str>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !player_ids.contains(e.player_id()));
        before - self.entries.len()
    }
}
