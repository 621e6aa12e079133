// Application state and orchestration logic.
//
// `AppState` owns the configuration, the draft engine and the state store.
// Commands are applied one at a time; after every command that changes saved
// state the whole auction is written back to the store. `run` wraps this in a
// single-owner task fed by an mpsc channel so front ends never touch the
// engine directly.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::analysis::{auction_summary, recommend, role_supply, star_rating, team_needs};
use crate::catalog::{CatalogQuery, PlayerPage};
use crate::config::Config;
use crate::draft::error::DraftError;
use crate::draft::state::DraftState;
use crate::export::{export_file_name, write_rosters_csv};
use crate::persistence::{load_snapshot, save_snapshot, KeyValueStore};
use crate::protocol::{AppSnapshot, Notice, SelectionView, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// What an accepted engine command did.
struct Outcome {
    message: String,
    warning: Option<String>,
    /// Whether saved state changed and must be written back.
    persist: bool,
}

impl Outcome {
    fn saved(message: String) -> Self {
        Outcome {
            message,
            warning: None,
            persist: true,
        }
    }

    fn transient(message: String) -> Self {
        Outcome {
            message,
            warning: None,
            persist: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub draft: DraftState,
    store: Box<dyn KeyValueStore>,
}

impl AppState {
    pub fn new(config: Config, draft: DraftState, store: Box<dyn KeyValueStore>) -> Self {
        AppState {
            config,
            draft,
            store,
        }
    }

    /// The store saved state is written to.
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Apply one command and return the updates to show.
    ///
    /// Rejected commands produce a single error notice and change nothing.
    pub fn handle_command(&mut self, cmd: UserCommand) -> Vec<UiUpdate> {
        match cmd {
            UserCommand::Query(query) => vec![UiUpdate::PlayerPage(self.query(query))],
            UserCommand::Export { path } => vec![UiUpdate::Notice(self.export(path))],
            UserCommand::Show => vec![self.snapshot_update()],
            UserCommand::Quit => Vec::new(),
            cmd => match self.apply(cmd) {
                Ok(outcome) => {
                    let mut updates = vec![UiUpdate::Notice(Notice::success(outcome.message))];
                    if let Some(warning) = outcome.warning {
                        updates.push(UiUpdate::Notice(Notice::warning(warning)));
                    }
                    if outcome.persist {
                        if let Err(e) = self.persist() {
                            error!("Failed to save auction state: {:#}", e);
                            updates.push(UiUpdate::Notice(Notice::error(format!(
                                "auction state not saved: {e:#}"
                            ))));
                        }
                    }
                    updates.push(self.snapshot_update());
                    updates
                }
                Err(e) => {
                    info!("Command rejected: {}", e);
                    vec![UiUpdate::Notice(Notice::error(e.to_string()))]
                }
            },
        }
    }

    /// Run an engine command.
    fn apply(&mut self, cmd: UserCommand) -> Result<Outcome, DraftError> {
        match cmd {
            UserCommand::AddParticipant { name, budget } => {
                let budget = budget.unwrap_or(self.config.auction.default_budget);
                let id = self.draft.add_participant(&name, budget)?;
                Ok(Outcome::saved(format!(
                    "Added {} ({id}) with a budget of {budget}",
                    name.trim()
                )))
            }
            UserCommand::RemoveParticipant { team } => {
                let team = self.draft.remove_participant(&self.team_id(&team)?)?;
                Ok(Outcome::saved(format!(
                    "Removed {}: {} players back in the pool",
                    team.name,
                    team.roster.len()
                )))
            }
            UserCommand::DeleteTeam { team } => {
                let team = self.draft.delete_team(&self.team_id(&team)?)?;
                Ok(Outcome::saved(format!(
                    "Deleted {}: {} players back in the pool",
                    team.name,
                    team.roster.len()
                )))
            }
            UserCommand::SetActive { team } => {
                let id = self.team_id(&team)?;
                self.draft.set_active_participant(&id)?;
                let name = self
                    .draft
                    .participant(&id)
                    .map_or(id.clone(), |t| t.name.clone());
                Ok(Outcome::saved(format!("{name} is now bidding")))
            }
            UserCommand::SelectPlayer { player } => {
                let id = self.player_id(&player)?;
                let p = self.draft.select_player(&id)?;
                Ok(Outcome::transient(format!(
                    "Up for auction: {} ({}, {}), value {}",
                    p.name,
                    p.role.label(),
                    p.club,
                    p.base_value
                )))
            }
            UserCommand::CancelSelection => Ok(match self.draft.cancel_selection() {
                Some(round) => {
                    Outcome::transient(format!("Auction of {} cancelled", round.player.name))
                }
                None => Outcome::transient("No player was up for auction".to_string()),
            }),
            UserCommand::PlaceBid { amount } => {
                let bid = self.draft.place_bid(amount)?;
                Ok(Outcome::transient(format!(
                    "{} bids {}",
                    bid.participant_name, bid.amount
                )))
            }
            UserCommand::AssignPlayer { team, price } => {
                let sale = self.draft.assign_player(&self.team_id(&team)?, price)?;
                Ok(Outcome {
                    message: format!(
                        "{} sold to {} for {}",
                        sale.player_name, sale.winner_name, sale.price
                    ),
                    warning: sale.warning,
                    persist: true,
                })
            }
            UserCommand::UndoLast => {
                let entry = self.draft.undo_last_action()?;
                Ok(Outcome::saved(format!(
                    "Undid sale of {} to {} ({} refunded)",
                    entry.player.name, entry.winner_name, entry.price
                )))
            }
            UserCommand::UndoSale { player } => {
                let id = self.player_id(&player)?;
                let entry = self.draft.undo_player_sale(&id)?;
                Ok(Outcome::saved(format!(
                    "Undid sale of {} to {} ({} refunded)",
                    entry.player.name, entry.winner_name, entry.price
                )))
            }
            UserCommand::ReleasePlayer { team, player } => {
                let team_id = self.team_id(&team)?;
                let player_id = self.player_id(&player)?;
                let released = self.draft.remove_player_from_team(&team_id, &player_id)?;
                Ok(Outcome::saved(format!(
                    "Released {} ({} refunded)",
                    released.name, released.price
                )))
            }
            UserCommand::ToggleFavorite { player } => {
                let id = self.player_id(&player)?;
                let now_favorite = self.draft.toggle_favorite(&id)?;
                let name = self
                    .draft
                    .catalog()
                    .get(&id)
                    .map_or(id.clone(), |p| p.name.clone());
                Ok(Outcome::saved(if now_favorite {
                    format!("Added {name} to favorites")
                } else {
                    format!("Removed {name} from favorites")
                }))
            }
            UserCommand::Query(_)
            | UserCommand::Export { .. }
            | UserCommand::Show
            | UserCommand::Quit => Ok(Outcome::transient(String::new())),
        }
    }

    /// Resolve a participant reference to an id. Unknown references are
    /// passed through so the engine reports them.
    fn team_id(&self, key: &str) -> Result<String, DraftError> {
        Ok(self
            .draft
            .find_participant(key)?
            .map_or_else(|| key.trim().to_string(), |t| t.id.clone()))
    }

    /// Resolve a player reference: exact id, then exact name, then a unique
    /// partial name. Sold players no longer in the catalog are found through
    /// the ledger.
    fn player_id(&self, key: &str) -> Result<String, DraftError> {
        let key = key.trim();
        if self.draft.catalog().contains(key) || self.draft.ledger().contains(key) {
            return Ok(key.to_string());
        }

        let needle = key.to_lowercase();
        let candidates: Vec<(&str, &str)> = self
            .draft
            .catalog()
            .players()
            .iter()
            .map(|p| (p.id.as_str(), p.name.as_str()))
            .chain(
                self.draft
                    .ledger()
                    .iter()
                    .filter(|e| !self.draft.catalog().contains(e.player_id()))
                    .map(|e| (e.player_id(), e.player.name.as_str())),
            )
            .collect();

        let exact: Vec<&str> = candidates
            .iter()
            .filter(|(_, name)| name.to_lowercase() == needle)
            .map(|(id, _)| *id)
            .collect();
        let matches = if exact.is_empty() {
            candidates
                .iter()
                .filter(|(_, name)| name.to_lowercase().contains(&needle))
                .map(|(id, _)| *id)
                .collect()
        } else {
            exact
        };

        match matches.as_slice() {
            [] => Ok(key.to_string()),
            [id] => Ok(id.to_string()),
            many => Err(DraftError::InvalidInput(format!(
                "'{key}' matches {} players, use the player id",
                many.len()
            ))),
        }
    }

    fn query(&self, mut query: CatalogQuery) -> PlayerPage {
        query.per_page = self.config.catalog.page_size;
        self.draft.query(&query)
    }

    fn export(&self, path: Option<PathBuf>) -> Notice {
        let path = path
            .unwrap_or_else(|| PathBuf::from(export_file_name(chrono::Local::now().date_naive())));
        match write_export(&path, &self.draft) {
            Ok(rows) => {
                info!("Exported {} roster rows to {}", rows, path.display());
                Notice::success(format!("Exported {rows} players to {}", path.display()))
            }
            Err(e) => {
                error!("Export failed: {:#}", e);
                Notice::error(format!("export failed: {e:#}"))
            }
        }
    }

    /// Write the full auction snapshot to the store.
    fn persist(&self) -> anyhow::Result<()> {
        save_snapshot(
            self.store.as_ref(),
            &self.config.storage.state_key,
            &self.draft.snapshot(),
        )
    }

    fn snapshot_update(&self) -> UiUpdate {
        UiUpdate::StateSnapshot(Box::new(self.build_snapshot()))
    }

    /// Build an `AppSnapshot` from the current application state.
    pub fn build_snapshot(&self) -> AppSnapshot {
        let draft = &self.draft;
        let limits = *draft.limits();

        let selection = draft.round().map(|round| SelectionView {
            stars: star_rating(&round.player),
            recommendation: recommend(&round.player),
            favorite: draft.favorites().contains(&round.player.id),
            high_bid: round.high_bid(),
            bids: round.bids.clone(),
            player: round.player.clone(),
        });

        AppSnapshot {
            auction_name: self.config.auction.name.clone(),
            limits,
            participants: draft.participants().to_vec(),
            team_needs: draft
                .participants()
                .iter()
                .map(|t| team_needs(t, &limits))
                .collect(),
            active_participant_id: draft.active_participant_id().map(str::to_string),
            selection,
            ledger: draft.ledger().entries().to_vec(),
            sold: draft.sold().iter().cloned().collect(),
            favorites: draft.favorites().iter().cloned().collect(),
            role_supply: role_supply(draft),
            summary: auction_summary(draft),
            catalog_size: draft.catalog().len(),
        }
    }
}

fn write_export(path: &Path, draft: &DraftState) -> anyhow::Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_rosters_csv(draft.participants(), BufWriter::new(file))
}

// ---------------------------------------------------------------------------
// Crash recovery
// ---------------------------------------------------------------------------

/// Restore the auction saved in the store, if any.
///
/// Returns `true` when saved state was found and applied. Missing or
/// unreadable state leaves the engine untouched.
pub fn recover_from_store(state: &mut AppState) -> bool {
    let Some(snapshot) = load_snapshot(state.store(), &state.config.storage.state_key) else {
        info!("No saved auction found, starting fresh");
        return false;
    };

    let violations = state.draft.restore(snapshot);
    if !violations.is_empty() {
        warn!(
            "Saved auction restored with {} inconsistencies",
            violations.len()
        );
    }
    info!(
        "Recovered auction: {} participants, {} sales",
        state.draft.participants().len(),
        state.draft.ledger().len()
    );
    true
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Commands are processed strictly in arrival order. The loop ends on
/// `UserCommand::Quit` or when either channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    while let Some(cmd) = cmd_rx.recv().await {
        if cmd == UserCommand::Quit {
            info!("Quit command received, shutting down");
            break;
        }
        for update in state.handle_command(cmd) {
            if ui_tx.send(update).await.is_err() {
                info!("UI channel closed, shutting down");
                return Ok(());
            }
        }
    }

    info!("Application event loop stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Player};
    use crate::config::{AuctionConfig, CatalogConfig, StorageConfig};
    use crate::draft::pick::Role;
    use crate::draft::roster::RoleLimits;
    use crate::persistence::MemoryStore;
    use crate::protocol::NoticeLevel;

    const STATE_KEY: &str = "test-auction-state";

    fn test_config(limits: RoleLimits) -> Config {
        Config {
            auction: AuctionConfig {
                name: "Test League".into(),
                default_budget: 500,
                role_limits: limits,
            },
            catalog: CatalogConfig {
                path: "unused.json".into(),
                page_size: 2,
            },
            storage: StorageConfig {
                db_path: ":memory:".into(),
                state_key: STATE_KEY.into(),
            },
        }
    }

    fn player(club: &str, name: &str, role: Role, value: u32) -> Player {
        Player {
            id: crate::catalog::player_id(club, name),
            name: name.into(),
            role,
            club: club.into(),
            base_value: value,
            starting_share: 75,
            tier: "B".into(),
            is_penalty_taker: false,
            is_injured: false,
            note: None,
        }
    }

    fn test_catalog() -> Catalog {
        Catalog::new(vec![
            player("Milan", "Mike Maignan", Role::Goalkeeper, 18),
            player("Milan", "Rafael Leao", Role::Forward, 33),
            player("Juventus", "Dusan Vlahovic", Role::Forward, 35),
            player("Juventus", "Kenan Yildiz", Role::Forward, 28),
            player("Atalanta", "Ederson", Role::Midfielder, 20),
        ])
    }

    fn create_test_app_state_with(limits: RoleLimits) -> AppState {
        let config = test_config(limits);
        let draft = DraftState::new(test_catalog(), limits);
        AppState::new(config, draft, Box::new(MemoryStore::new()))
    }

    fn create_test_app_state() -> AppState {
        create_test_app_state_with(RoleLimits::default())
    }

    fn notices(updates: &[UiUpdate]) -> Vec<&Notice> {
        updates
            .iter()
            .filter_map(|u| match u {
                UiUpdate::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn last_snapshot(updates: &[UiUpdate]) -> &AppSnapshot {
        updates
            .iter()
            .rev()
            .find_map(|u| match u {
                UiUpdate::StateSnapshot(s) => Some(s.as_ref()),
                _ => None,
            })
            .expect("expected a state snapshot")
    }

    fn add(state: &mut AppState, name: &str) {
        state.handle_command(UserCommand::AddParticipant {
            name: name.into(),
            budget: None,
        });
    }

    // -----------------------------------------------------------------------
    // Tests: command handling
    // -----------------------------------------------------------------------

    #[test]
    fn add_participant_uses_default_budget_and_persists() {
        let mut state = create_test_app_state();
        let updates = state.handle_command(UserCommand::AddParticipant {
            name: "Team A".into(),
            budget: None,
        });

        let n = notices(&updates);
        assert_eq!(n[0].level, NoticeLevel::Success);
        let snapshot = last_snapshot(&updates);
        assert_eq!(snapshot.participants[0].budget, 500);
        assert_eq!(snapshot.team_needs[0].total_missing, 25);

        let saved = load_snapshot(state.store(), STATE_KEY).expect("state should be saved");
        assert_eq!(saved.participants.len(), 1);
        assert_eq!(saved.next_participant_seq, 2);
    }

    #[test]
    fn rejected_command_yields_error_notice_only() {
        let mut state = create_test_app_state();
        add(&mut state, "Team A");
        let before = state.store().get(STATE_KEY).unwrap();

        let updates = state.handle_command(UserCommand::AddParticipant {
            name: "Team A".into(),
            budget: Some(300),
        });
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            UiUpdate::Notice(n) => {
                assert_eq!(n.level, NoticeLevel::Error);
                assert!(n.message.contains("already exists"));
            }
            other => panic!("expected error notice, got {other:?}"),
        }
        assert_eq!(state.store().get(STATE_KEY).unwrap(), before);
    }

    #[test]
    fn selection_and_bids_show_in_snapshot_but_are_not_saved() {
        let mut state = create_test_app_state();
        add(&mut state, "Team A");
        state.handle_command(UserCommand::SetActive {
            team: "team a".into(),
        });
        let saved_before = state.store().get(STATE_KEY).unwrap();

        state.handle_command(UserCommand::SelectPlayer {
            player: "leao".into(),
        });
        let updates = state.handle_command(UserCommand::PlaceBid { amount: 12 });

        let selection = last_snapshot(&updates).selection.as_ref().unwrap();
        assert_eq!(selection.player.name, "Rafael Leao");
        assert_eq!(selection.high_bid, 12);
        assert_eq!(selection.bids[0].participant_name, "Team A");
        assert_eq!(state.store().get(STATE_KEY).unwrap(), saved_before);
    }

    #[test]
    fn assign_by_team_name_and_last_slot_warning() {
        let limits = RoleLimits {
            forwards: 2,
            ..RoleLimits::default()
        };
        let mut state = create_test_app_state_with(limits);
        add(&mut state, "Team A");

        state.handle_command(UserCommand::SelectPlayer {
            player: "Rafael Leao".into(),
        });
        let updates = state.handle_command(UserCommand::AssignPlayer {
            team: "Team A".into(),
            price: 30,
        });
        assert_eq!(notices(&updates).len(), 1);

        state.handle_command(UserCommand::SelectPlayer {
            player: "Milan_Rafael_Leao".into(),
        });
        state.handle_command(UserCommand::SelectPlayer {
            player: "vlahovic".into(),
        });
        let updates = state.handle_command(UserCommand::AssignPlayer {
            team: "team_1".into(),
            price: 40,
        });
        let n = notices(&updates);
        assert_eq!(n.len(), 2);
        assert_eq!(n[1].level, NoticeLevel::Warning);

        let saved = load_snapshot(state.store(), STATE_KEY).unwrap();
        assert_eq!(saved.participants[0].budget, 430);
        assert_eq!(saved.ledger.len(), 2);
        assert_eq!(saved.sold_players.len(), 2);
    }

    #[test]
    fn sale_is_charged_to_the_exactly_named_team() {
        let mut state = create_test_app_state();
        add(&mut state, "Roma");
        add(&mut state, "roma");

        state.handle_command(UserCommand::SelectPlayer {
            player: "Leao".into(),
        });
        state.handle_command(UserCommand::AssignPlayer {
            team: "roma".into(),
            price: 40,
        });
        let budgets: Vec<(&str, i64)> = state
            .draft
            .participants()
            .iter()
            .map(|t| (t.name.as_str(), t.budget))
            .collect();
        assert_eq!(budgets, vec![("Roma", 500), ("roma", 460)]);

        // A reference matching both only ignoring case is refused
        state.handle_command(UserCommand::SelectPlayer {
            player: "Vlahovic".into(),
        });
        let updates = state.handle_command(UserCommand::AssignPlayer {
            team: "ROMA".into(),
            price: 10,
        });
        assert_eq!(updates.len(), 1);
        assert_eq!(notices(&updates)[0].level, NoticeLevel::Error);
        assert!(state.draft.round().is_some());
    }

    #[test]
    fn selecting_a_sold_player_is_rejected() {
        let mut state = create_test_app_state();
        add(&mut state, "Team A");
        state.handle_command(UserCommand::SelectPlayer {
            player: "Ederson".into(),
        });
        state.handle_command(UserCommand::AssignPlayer {
            team: "Team A".into(),
            price: 5,
        });

        let updates = state.handle_command(UserCommand::SelectPlayer {
            player: "Ederson".into(),
        });
        assert_eq!(notices(&updates)[0].level, NoticeLevel::Error);
        assert!(notices(&updates)[0].message.contains("already been sold"));
    }

    #[test]
    fn ambiguous_player_reference_is_rejected() {
        let mut state = create_test_app_state();
        // "an" appears in several names
        let updates = state.handle_command(UserCommand::SelectPlayer {
            player: "an".into(),
        });
        let n = notices(&updates);
        assert_eq!(n[0].level, NoticeLevel::Error);
        assert!(n[0].message.contains("use the player id"));
        assert!(state.draft.round().is_none());
    }

    #[test]
    fn undo_and_release_update_saved_state() {
        let mut state = create_test_app_state();
        add(&mut state, "Team A");
        for (player, price) in [("Maignan", 15), ("Yildiz", 25)] {
            state.handle_command(UserCommand::SelectPlayer {
                player: player.into(),
            });
            state.handle_command(UserCommand::AssignPlayer {
                team: "Team A".into(),
                price,
            });
        }

        state.handle_command(UserCommand::UndoSale {
            player: "Mike Maignan".into(),
        });
        let saved = load_snapshot(state.store(), STATE_KEY).unwrap();
        assert_eq!(saved.participants[0].budget, 475);
        assert_eq!(saved.sold_players, vec!["Juventus_Kenan_Yildiz".to_string()]);

        state.handle_command(UserCommand::ReleasePlayer {
            team: "team_1".into(),
            player: "Yildiz".into(),
        });
        let saved = load_snapshot(state.store(), STATE_KEY).unwrap();
        assert_eq!(saved.participants[0].budget, 500);
        assert!(saved.ledger.is_empty());

        let updates = state.handle_command(UserCommand::UndoLast);
        assert_eq!(notices(&updates)[0].message, "nothing to undo");
    }

    #[test]
    fn favorites_are_saved() {
        let mut state = create_test_app_state();
        let updates = state.handle_command(UserCommand::ToggleFavorite {
            player: "Ederson".into(),
        });
        assert_eq!(notices(&updates)[0].message, "Added Ederson to favorites");
        let saved = load_snapshot(state.store(), STATE_KEY).unwrap();
        assert_eq!(saved.favorite_players, vec!["Atalanta_Ederson".to_string()]);
    }

    #[test]
    fn query_uses_configured_page_size() {
        let mut state = create_test_app_state();
        let updates = state.handle_command(UserCommand::Query(CatalogQuery::default()));
        match &updates[0] {
            UiUpdate::PlayerPage(page) => {
                assert_eq!(page.players.len(), 2);
                assert_eq!(page.total, 5);
                assert_eq!(page.total_pages, 3);
                assert_eq!(page.players[0].name, "Dusan Vlahovic");
            }
            other => panic!("expected player page, got {other:?}"),
        }
    }

    #[test]
    fn export_writes_csv_file() {
        let mut state = create_test_app_state();
        add(&mut state, "Team A");
        state.handle_command(UserCommand::SelectPlayer {
            player: "Ederson".into(),
        });
        state.handle_command(UserCommand::AssignPlayer {
            team: "Team A".into(),
            price: 10,
        });

        let path = std::env::temp_dir().join("auction_app_export_test.csv");
        let _ = std::fs::remove_file(&path);
        let updates = state.handle_command(UserCommand::Export {
            path: Some(path.clone()),
        });
        assert_eq!(notices(&updates)[0].level, NoticeLevel::Success);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Team A,Ederson,C,Atalanta,10,20,2.00"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn show_returns_snapshot_with_summary() {
        let mut state = create_test_app_state();
        add(&mut state, "Team A");
        let updates = state.handle_command(UserCommand::Show);
        assert_eq!(updates.len(), 1);
        let snapshot = last_snapshot(&updates);
        assert_eq!(snapshot.auction_name, "Test League");
        assert_eq!(snapshot.summary.teams, 1);
        assert_eq!(snapshot.catalog_size, 5);
        assert_eq!(snapshot.role_supply.len(), 4);
    }

    // -----------------------------------------------------------------------
    // Tests: crash recovery
    // -----------------------------------------------------------------------

    #[test]
    fn recover_from_store_restores_saved_auction() {
        let mut state = create_test_app_state();
        add(&mut state, "Team A");
        state.handle_command(UserCommand::SelectPlayer {
            player: "Leao".into(),
        });
        state.handle_command(UserCommand::AssignPlayer {
            team: "Team A".into(),
            price: 30,
        });
        let raw = state.store().get(STATE_KEY).unwrap().unwrap();

        let store = MemoryStore::new();
        store.set(STATE_KEY, &raw).unwrap();
        let mut fresh = AppState::new(
            test_config(RoleLimits::default()),
            DraftState::new(test_catalog(), RoleLimits::default()),
            Box::new(store),
        );
        assert!(recover_from_store(&mut fresh));
        assert_eq!(fresh.draft.participants()[0].budget, 470);
        assert!(fresh.draft.is_sold("Milan_Rafael_Leao"));
    }

    #[test]
    fn recover_from_empty_store_is_fresh_start() {
        let mut state = create_test_app_state();
        assert!(!recover_from_store(&mut state));
        assert!(state.draft.participants().is_empty());
    }

    #[test]
    fn recover_ignores_corrupt_state() {
        let store = MemoryStore::new();
        store.set(STATE_KEY, "definitely not json").unwrap();
        let mut state = AppState::new(
            test_config(RoleLimits::default()),
            DraftState::new(test_catalog(), RoleLimits::default()),
            Box::new(store),
        );
        assert!(!recover_from_store(&mut state));
    }

    // -----------------------------------------------------------------------
    // Tests: event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn run_processes_commands_in_order_until_quit() {
        let state = create_test_app_state();
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);

        let handle = tokio::spawn(run(cmd_rx, ui_tx, state));

        cmd_tx
            .send(UserCommand::AddParticipant {
                name: "Team A".into(),
                budget: Some(200),
            })
            .await
            .unwrap();

        // Success notice, then the snapshot
        let update = ui_rx.recv().await.unwrap();
        assert!(matches!(update, UiUpdate::Notice(ref n) if n.level == NoticeLevel::Success));
        let update = ui_rx.recv().await.unwrap();
        match update {
            UiUpdate::StateSnapshot(s) => assert_eq!(s.participants[0].budget, 200),
            other => panic!("expected snapshot, got {other:?}"),
        }

        cmd_tx.send(UserCommand::PlaceBid { amount: 5 }).await.unwrap();
        let update = ui_rx.recv().await.unwrap();
        assert!(matches!(update, UiUpdate::Notice(ref n) if n.level == NoticeLevel::Error));

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn run_stops_when_command_channel_closes() {
        let state = create_test_app_state();
        let (cmd_tx, cmd_rx) = mpsc::channel::<UserCommand>(16);
        let (ui_tx, _ui_rx) = mpsc::channel(64);

        let handle = tokio::spawn(run(cmd_rx, ui_tx, state));
        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }
}
