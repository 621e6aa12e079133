// Participant rosters, per-role counters and role caps.

use serde::{Deserialize, Serialize};

use super::pick::Role;
use super::Amount;

/// Maximum number of players per role a roster may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLimits {
    pub goalkeepers: u32,
    pub defenders: u32,
    pub midfielders: u32,
    pub forwards: u32,
}

impl Default for RoleLimits {
    /// Standard Serie A fantasy roster: 3 goalkeepers, 8 defenders,
    /// 8 midfielders, 6 forwards.
    fn default() -> Self {
        RoleLimits {
            goalkeepers: 3,
            defenders: 8,
            midfielders: 8,
            forwards: 6,
        }
    }
}

impl RoleLimits {
    /// Cap for a single role.
    pub fn limit(&self, role: Role) -> u32 {
        match role {
            Role::Goalkeeper => self.goalkeepers,
            Role::Defender => self.defenders,
            Role::Midfielder => self.midfielders,
            Role::Forward => self.forwards,
        }
    }

    /// Full roster size.
    pub fn total(&self) -> u32 {
        Role::ALL.iter().map(|&r| self.limit(r)).sum()
    }
}

/// Number of rostered players per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    #[serde(rename = "P", default)]
    pub goalkeepers: u32,
    #[serde(rename = "D", default)]
    pub defenders: u32,
    #[serde(rename = "C", default)]
    pub midfielders: u32,
    #[serde(rename = "A", default)]
    pub forwards: u32,
}

impl RoleCounts {
    pub fn get(&self, role: Role) -> u32 {
        match role {
            Role::Goalkeeper => self.goalkeepers,
            Role::Defender => self.defenders,
            Role::Midfielder => self.midfielders,
            Role::Forward => self.forwards,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut u32 {
        match role {
            Role::Goalkeeper => &mut self.goalkeepers,
            Role::Defender => &mut self.defenders,
            Role::Midfielder => &mut self.midfielders,
            Role::Forward => &mut self.forwards,
        }
    }

    pub fn increment(&mut self, role: Role) {
        *self.slot_mut(role) += 1;
    }

    /// Decrement a role counter, saturating at zero.
    pub fn decrement(&mut self, role: Role) {
        let slot = self.slot_mut(role);
        *slot = slot.saturating_sub(1);
    }

    pub fn total(&self) -> u32 {
        Role::ALL.iter().map(|&r| self.get(r)).sum()
    }

    /// Count the roles of an existing roster.
    pub fn from_roster<'a>(roster: impl IntoIterator<Item = &'a AcquiredPlayer>) -> Self {
        let mut counts = RoleCounts::default();
        for player in roster {
            counts.increment(player.role);
        }
        counts
    }
}

/// A player as owned by a participant: a copy of the catalog data taken at
/// assignment time, so later catalog edits never rewrite past sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquiredPlayer {
    pub player_id: String,
    pub name: String,
    pub role: Role,
    pub club: String,
    /// Price paid at auction.
    pub price: Amount,
    /// Catalog value at the time of the sale.
    pub base_value: u32,
}

/// A team taking part in the auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Stable identifier (e.g. "team_3"). Never reused within a session.
    pub id: String,
    pub name: String,
    /// Remaining budget: `initial_budget` minus the sum of roster prices.
    pub budget: Amount,
    pub initial_budget: Amount,
    /// Acquired players in purchase order.
    #[serde(default)]
    pub roster: Vec<AcquiredPlayer>,
    #[serde(default)]
    pub role_count: RoleCounts,
}

impl Participant {
    pub fn new(id: String, name: String, budget: Amount) -> Self {
        Participant {
            id,
            name,
            budget,
            initial_budget: budget,
            roster: Vec::new(),
            role_count: RoleCounts::default(),
        }
    }

    /// Total spent on the current roster.
    pub fn spent(&self) -> Amount {
        self.roster
            .iter()
            .fold(0, |total: Amount, p| total.saturating_add(p.price))
    }

    pub fn owns(&self, player_id: &str) -> bool {
        self.roster.iter().any(|p| p.player_id == player_id)
    }

    /// Free slots left for a role under the given caps.
    pub fn slots_left(&self, role: Role, limits: &RoleLimits) -> u32 {
        limits.limit(role).saturating_sub(self.role_count.get(role))
    }

    /// Charge the price and append the player to the roster. The caller
    /// has checked that the charge cannot overflow.
    pub(crate) fn acquire(&mut self, player: AcquiredPlayer) {
        self.budget -= player.price;
        self.role_count.increment(player.role);
        self.roster.push(player);
    }

    /// Remove a player from the roster and refund its price.
    ///
    /// Returns the removed entry, or `None` if the player is not on this
    /// roster (nothing is changed in that case).
    pub(crate) fn release(&mut self, player_id: &str) -> Option<AcquiredPlayer> {
        let idx = self.roster.iter().position(|p| p.player_id == player_id)?;
        let removed = self.roster.remove(idx);
        self.budget = self.budget.saturating_add(removed.price);
        self.role_count.decrement(removed.role);
        Some(removed)
    }
}
