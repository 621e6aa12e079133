// Draft state: participants, the current bidding round, sold players and the
// sales ledger.
//
// `DraftState` is a plain owned value. Every public mutator either succeeds
// completely or returns a `DraftError` without touching anything, so the
// consistency checks in `check_invariants` hold after every call.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use tracing::{info, warn};

use super::error::{DraftError, Missing, Result};
use super::ledger::Ledger;
use super::pick::{Bid, LedgerEntry, Role};
use super::roster::{AcquiredPlayer, Participant, RoleCounts, RoleLimits};
use super::Amount;
use crate::catalog::{Catalog, CatalogQuery, Player, PlayerPage};
use crate::persistence::Snapshot;

/// Prefix of generated participant ids.
const TEAM_ID_PREFIX: &str = "team_";

/// The player currently up for auction and the bids placed on it so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub player: Player,
    /// Bids in the order they were placed. Each one is strictly higher than
    /// every earlier bid.
    pub bids: Vec<Bid>,
}

impl Round {
    fn new(player: Player) -> Self {
        Round {
            player,
            bids: Vec::new(),
        }
    }

    /// The highest bid so far, or 0 when nobody has bid yet.
    pub fn high_bid(&self) -> Amount {
        self.bids.iter().map(|b| b.amount).max().unwrap_or(0).max(0)
    }

    /// The bid currently leading the round.
    pub fn leader(&self) -> Option<&Bid> {
        self.bids.iter().max_by_key(|b| b.amount)
    }
}

/// Result of a successful assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub player_id: String,
    pub player_name: String,
    pub role: Role,
    pub winner_id: String,
    pub winner_name: String,
    pub price: Amount,
    /// Set when this sale filled the winner's last free slot for the role.
    pub warning: Option<String>,
}

/// The complete state of one auction.
#[derive(Debug, Clone)]
pub struct DraftState {
    /// Participants in creation order.
    teams: Vec<Participant>,
    ledger: Ledger,
    /// Ids of players currently on some roster.
    sold: BTreeSet<String>,
    favorites: BTreeSet<String>,
    round: Option<Round>,
    /// Participant placing bids in the current round.
    active_team_id: Option<String>,
    limits: RoleLimits,
    catalog: Catalog,
    /// Sequence number for the next generated participant id.
    next_team_seq: u64,
}

impl DraftState {
    /// Create an empty auction over the given catalog.
    pub fn new(catalog: Catalog, limits: RoleLimits) -> Self {
        DraftState {
            teams: Vec::new(),
            ledger: Ledger::new(),
            sold: BTreeSet::new(),
            favorites: BTreeSet::new(),
            round: None,
            active_team_id: None,
            limits,
            catalog,
            next_team_seq: 1,
        }
    }

    // -----------------------------------------------------------------------
    // Participants
    // -----------------------------------------------------------------------

    /// Register a new participant and return its id.
    pub fn add_participant(&mut self, name: &str, budget: Amount) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DraftError::InvalidInput("participant name is empty".into()));
        }
        if budget <= 0 {
            return Err(DraftError::InvalidInput(format!(
                "budget must be positive, got {budget}"
            )));
        }
        if self.teams.iter().any(|t| t.name == name) {
            return Err(DraftError::DuplicateName(name.to_string()));
        }

        let id = format!("{TEAM_ID_PREFIX}{}", self.next_team_seq);
        self.next_team_seq += 1;
        self.teams
            .push(Participant::new(id.clone(), name.to_string(), budget));
        info!("Added participant '{}' ({}) with budget {}", name, id, budget);
        Ok(id)
    }

    /// Remove a participant. Same cascade as [`DraftState::delete_team`].
    pub fn remove_participant(&mut self, team_id: &str) -> Result<Participant> {
        self.delete_team(team_id)
    }

    /// Delete a participant: its players return to the pool, the sales of
    /// those players leave the ledger and the active reference is cleared
    /// if it pointed here.
    pub fn delete_team(&mut self, team_id: &str) -> Result<Participant> {
        let idx = self
            .team_index(team_id)
            .ok_or_else(|| DraftError::not_found(Missing::Participant, team_id))?;
        let team = self.teams.remove(idx);

        let released: HashSet<&str> = team.roster.iter().map(|p| p.player_id.as_str()).collect();
        for player_id in &released {
            self.sold.remove(*player_id);
        }
        let dropped = self.ledger.remove_players(&released);

        if self.active_team_id.as_deref() == Some(team_id) {
            self.active_team_id = None;
        }
        info!(
            "Deleted participant '{}' ({}): released {} players, dropped {} sales",
            team.name,
            team.id,
            released.len(),
            dropped
        );
        Ok(team)
    }

    /// Make a participant the bidder for the current round.
    pub fn set_active_participant(&mut self, team_id: &str) -> Result<()> {
        if self.team_index(team_id).is_none() {
            return Err(DraftError::not_found(Missing::Participant, team_id));
        }
        self.active_team_id = Some(team_id.to_string());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Bidding round
    // -----------------------------------------------------------------------

    /// Put a catalog player up for auction, discarding any previous round.
    pub fn select_player(&mut self, player_id: &str) -> Result<&Player> {
        if self.sold.contains(player_id) {
            return Err(DraftError::AlreadySold(player_id.to_string()));
        }
        let player = self
            .catalog
            .get(player_id)
            .cloned()
            .ok_or_else(|| DraftError::not_found(Missing::Player, player_id))?;
        Ok(&self.round.insert(Round::new(player)).player)
    }

    /// Abandon the current round. Budgets and rosters are untouched.
    pub fn cancel_selection(&mut self) -> Option<Round> {
        self.round.take()
    }

    /// Record a bid from the active participant. Bids never move money.
    pub fn place_bid(&mut self, amount: Amount) -> Result<&Bid> {
        let team_id = self
            .active_team_id
            .as_deref()
            .ok_or(DraftError::NoActiveParticipant)?;
        let team = self
            .team(team_id)
            .ok_or_else(|| DraftError::not_found(Missing::Participant, team_id))?;
        let round = self.round.as_ref().ok_or(DraftError::NoSelection)?;

        let current = round.high_bid();
        if amount <= current {
            return Err(DraftError::BidTooLow { amount, current });
        }
        if amount > team.budget {
            return Err(DraftError::InsufficientBudget {
                amount,
                budget: team.budget,
            });
        }

        let bid = Bid {
            participant_id: team.id.clone(),
            participant_name: team.name.clone(),
            amount,
            timestamp: Utc::now(),
        };
        let round = self.round.as_mut().ok_or(DraftError::NoSelection)?;
        round.bids.push(bid);
        Ok(&round.bids[round.bids.len() - 1])
    }

    /// Sell the selected player to `winner_id` for `price`.
    ///
    /// Role caps are checked here and only here. The winner's budget is not
    /// checked: the price is whatever the room agreed on.
    pub fn assign_player(&mut self, winner_id: &str, price: Amount) -> Result<Assignment> {
        let round = self.round.as_ref().ok_or(DraftError::NoSelection)?;
        if price <= 0 {
            return Err(DraftError::InvalidInput(format!(
                "price must be positive, got {price}"
            )));
        }
        let idx = self
            .team_index(winner_id)
            .ok_or_else(|| DraftError::not_found(Missing::Participant, winner_id))?;

        let role = round.player.role;
        let limit = self.limits.limit(role);
        let count = self.teams[idx].role_count.get(role);
        if count >= limit {
            return Err(DraftError::RoleLimitReached { role, count, limit });
        }
        if self.teams[idx].budget.checked_sub(price).is_none() {
            return Err(DraftError::InvalidInput(format!(
                "price {price} is out of range for a budget of {}",
                self.teams[idx].budget
            )));
        }

        // Validation done; from here on the sale always commits.
        let Some(round) = self.round.take() else {
            return Err(DraftError::NoSelection);
        };
        let player = round.player;
        let team = &mut self.teams[idx];
        team.acquire(AcquiredPlayer {
            player_id: player.id.clone(),
            name: player.name.clone(),
            role,
            club: player.club.clone(),
            price,
            base_value: player.base_value,
        });

        let warning = (count + 1 == limit).then(|| {
            format!(
                "{} has filled the last {} slot ({limit}/{limit})",
                team.name,
                role.label()
            )
        });
        if let Some(msg) = &warning {
            warn!("{}", msg);
        }

        let assignment = Assignment {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            role,
            winner_id: team.id.clone(),
            winner_name: team.name.clone(),
            price,
            warning,
        };
        info!(
            "Sold {} ({}) to {} for {}",
            assignment.player_name, role, assignment.winner_name, price
        );

        self.sold.insert(player.id.clone());
        self.ledger.push(LedgerEntry {
            player,
            winner_id: assignment.winner_id.clone(),
            winner_name: assignment.winner_name.clone(),
            price,
            bids: round.bids,
            timestamp: Utc::now(),
        });
        Ok(assignment)
    }

    // -----------------------------------------------------------------------
    // Undo
    // -----------------------------------------------------------------------

    /// Reverse the most recent sale.
    pub fn undo_last_action(&mut self) -> Result<LedgerEntry> {
        let entry = self.ledger.pop().ok_or(DraftError::EmptyLedger)?;
        self.reverse_sale(&entry);
        Ok(entry)
    }

    /// Reverse the sale of a specific player, wherever it sits in the ledger.
    pub fn undo_player_sale(&mut self, player_id: &str) -> Result<LedgerEntry> {
        let entry = self
            .ledger
            .remove_player(player_id)
            .ok_or_else(|| DraftError::not_found(Missing::LedgerEntry, player_id))?;
        self.reverse_sale(&entry);
        Ok(entry)
    }

    /// Take a player off a roster outside of the undo history. The price is
    /// refunded and the player's sale is dropped from the ledger.
    pub fn remove_player_from_team(
        &mut self,
        team_id: &str,
        player_id: &str,
    ) -> Result<AcquiredPlayer> {
        let idx = self
            .team_index(team_id)
            .ok_or_else(|| DraftError::not_found(Missing::Participant, team_id))?;
        let removed = self.teams[idx]
            .release(player_id)
            .ok_or_else(|| DraftError::not_found(Missing::RosterEntry, player_id))?;

        self.sold.remove(player_id);
        self.ledger.remove_players(&HashSet::from([player_id]));
        info!(
            "Released {} from {} (refunded {})",
            removed.name, self.teams[idx].name, removed.price
        );
        Ok(removed)
    }

    /// Undo the effects of a sale that has already left the ledger. The owner
    /// is found by the id recorded at sale time.
    fn reverse_sale(&mut self, entry: &LedgerEntry) {
        let player_id = entry.player_id();
        match self.teams.iter_mut().find(|t| t.id == entry.winner_id) {
            Some(team) => {
                if team.release(player_id).is_none() {
                    warn!(
                        "Undo: {} was not on the roster of {}",
                        player_id, team.name
                    );
                }
                info!(
                    "Undid sale of {} to {} for {}",
                    entry.player.name, team.name, entry.price
                );
            }
            None => warn!(
                "Undo: owner {} of {} no longer exists, releasing player only",
                entry.winner_id, player_id
            ),
        }
        self.sold.remove(player_id);
    }

    // -----------------------------------------------------------------------
    // Favorites and lookups
    // -----------------------------------------------------------------------

    /// Flip a player's favorite mark. Returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, player_id: &str) -> Result<bool> {
        if !self.catalog.contains(player_id) {
            return Err(DraftError::not_found(Missing::Player, player_id));
        }
        if self.favorites.remove(player_id) {
            Ok(false)
        } else {
            self.favorites.insert(player_id.to_string());
            Ok(true)
        }
    }

    /// Name of the participant that bought a player, from the ledger.
    pub fn sold_to(&self, player_id: &str) -> Option<&str> {
        self.ledger.find(player_id).map(|e| e.winner_name.as_str())
    }

    pub fn participants(&self) -> &[Participant] {
        &self.teams
    }

    pub fn participant(&self, team_id: &str) -> Option<&Participant> {
        self.team(team_id)
    }

    /// Resolve a participant reference: id, then exact name, then a name
    /// equal ignoring case. Names may differ only by case, so more than one
    /// case-insensitive match is rejected.
    pub fn find_participant(&self, key: &str) -> Result<Option<&Participant>> {
        let key = key.trim();
        if let Some(team) = self
            .team(key)
            .or_else(|| self.teams.iter().find(|t| t.name == key))
        {
            return Ok(Some(team));
        }

        let folded = key.to_lowercase();
        let mut matches = self.teams.iter().filter(|t| t.name.to_lowercase() == folded);
        match (matches.next(), matches.next()) {
            (Some(team), None) => Ok(Some(team)),
            (None, _) => Ok(None),
            (Some(_), Some(_)) => Err(DraftError::InvalidInput(format!(
                "'{key}' matches more than one participant, use the exact name or id"
            ))),
        }
    }

    pub fn active_participant_id(&self) -> Option<&str> {
        self.active_team_id.as_deref()
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.round.as_ref().map(|r| &r.player)
    }

    pub fn current_bids(&self) -> &[Bid] {
        self.round.as_ref().map_or(&[], |r| r.bids.as_slice())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sold(&self) -> &BTreeSet<String> {
        &self.sold
    }

    pub fn is_sold(&self, player_id: &str) -> bool {
        self.sold.contains(player_id)
    }

    pub fn favorites(&self) -> &BTreeSet<String> {
        &self.favorites
    }

    pub fn limits(&self) -> &RoleLimits {
        &self.limits
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Search the catalog with the current sold and favorite marks.
    pub fn query(&self, query: &CatalogQuery) -> PlayerPage {
        self.catalog.query(query, &self.sold, &self.favorites)
    }

    fn team(&self, team_id: &str) -> Option<&Participant> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    fn team_index(&self, team_id: &str) -> Option<usize> {
        self.teams.iter().position(|t| t.id == team_id)
    }

    // -----------------------------------------------------------------------
    // Snapshot / restore
    // -----------------------------------------------------------------------

    /// Capture everything that survives a restart. The bidding round is
    /// transient and not included.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            participants: self.teams.clone(),
            ledger: self.ledger.clone(),
            sold_players: self.sold.iter().cloned().collect(),
            favorite_players: self.favorites.iter().cloned().collect(),
            active_participant_id: self.active_team_id.clone(),
            next_participant_seq: self.next_team_seq,
        }
    }

    /// Replace the auction state with a saved snapshot.
    ///
    /// The data is taken as saved. An active participant id that no longer
    /// resolves is dropped. Returns the consistency violations found, each
    /// of which is also logged.
    pub fn restore(&mut self, snapshot: Snapshot) -> Vec<String> {
        let highest_seq = snapshot
            .participants
            .iter()
            .filter_map(|t| t.id.strip_prefix(TEAM_ID_PREFIX)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        self.teams = snapshot.participants;
        self.ledger = snapshot.ledger;
        self.sold = snapshot.sold_players.into_iter().collect();
        self.favorites = snapshot.favorite_players.into_iter().collect();
        self.round = None;
        self.next_team_seq = snapshot.next_participant_seq.max(highest_seq + 1);

        self.active_team_id = snapshot
            .active_participant_id
            .filter(|id| match self.team(id) {
                Some(_) => true,
                None => {
                    warn!("Dropping unknown active participant '{}' from saved state", id);
                    false
                }
            });

        info!(
            "Restored {} participants, {} sales, {} favorites",
            self.teams.len(),
            self.ledger.len(),
            self.favorites.len()
        );

        let violations = self.check_invariants();
        for v in &violations {
            warn!("Restored state is inconsistent: {}", v);
        }
        violations
    }

    /// Describe every way the state breaks its bookkeeping rules. Empty when
    /// budgets, role counts, rosters, sold marks and the ledger all agree.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for team in &self.teams {
            let expected = team.initial_budget.saturating_sub(team.spent());
            if team.budget != expected {
                violations.push(format!(
                    "{}: budget {} but initial budget minus spent is {}",
                    team.name, team.budget, expected
                ));
            }

            let counted = RoleCounts::from_roster(&team.roster);
            for role in Role::ALL {
                let recorded = team.role_count.get(role);
                if recorded != counted.get(role) {
                    violations.push(format!(
                        "{}: {} count is {} but roster holds {}",
                        team.name,
                        role.label(),
                        recorded,
                        counted.get(role)
                    ));
                }
                if counted.get(role) > self.limits.limit(role) {
                    violations.push(format!(
                        "{}: {} {} exceed the limit of {}",
                        team.name,
                        counted.get(role),
                        role.label(),
                        self.limits.limit(role)
                    ));
                }
            }
        }

        let mut owners: HashMap<&str, usize> = HashMap::new();
        for team in &self.teams {
            for p in &team.roster {
                *owners.entry(p.player_id.as_str()).or_default() += 1;
            }
        }
        let mut owned: Vec<(&str, usize)> = owners.iter().map(|(id, n)| (*id, *n)).collect();
        owned.sort();
        for (player_id, n) in owned {
            if n > 1 {
                violations.push(format!("{player_id} is on {n} rosters"));
            }
            if !self.sold.contains(player_id) {
                violations.push(format!("{player_id} is rostered but not marked sold"));
            }
        }
        for player_id in &self.sold {
            if !owners.contains_key(player_id.as_str()) {
                violations.push(format!("{player_id} is marked sold but on no roster"));
            }
        }

        let mut seen = HashSet::new();
        for entry in self.ledger.iter() {
            let player_id = entry.player_id();
            if !seen.insert(player_id) {
                violations.push(format!("{player_id} has more than one recorded sale"));
            }
            if !self.sold.contains(player_id) {
                violations.push(format!("sale of {player_id} refers to a player not marked sold"));
            }
        }

        violations
    }
}
