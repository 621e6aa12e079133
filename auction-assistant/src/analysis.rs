// Auction analysis: player ratings and bidding advice, per-team roster needs,
// role supply and auction-wide summary figures.
//
// Everything here is read-only over the catalog and the draft state.

use serde::Serialize;

use crate::catalog::Player;
use crate::draft::pick::Role;
use crate::draft::roster::{Participant, RoleLimits};
use crate::draft::state::DraftState;
use crate::draft::Amount;

/// A sale is a bargain when the player's value exceeds the price by this
/// factor.
const BARGAIN_RATIO: f64 = 1.2;

/// Number of bargains listed in the summary.
const MAX_BEST_DEALS: usize = 3;

/// Value per point of starting share below which a player is underpriced.
const UNDERPRICED_RATIO: f64 = 0.3;

// ---------------------------------------------------------------------------
// Player rating
// ---------------------------------------------------------------------------

/// One to five stars from starting share, penalties, fitness and tier.
pub fn star_rating(player: &Player) -> u8 {
    let mut rating: i32 = 3;

    if player.starting_share >= 80 {
        rating += 1;
    } else if player.starting_share <= 40 {
        rating -= 1;
    }
    if player.is_penalty_taker {
        rating += 1;
    }
    if player.is_injured {
        rating -= 2;
    }
    match player.tier.as_str() {
        "A" => rating += 1,
        "E" => rating -= 1,
        _ => {}
    }

    rating.clamp(1, 5) as u8
}

/// Bidding advice for a player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// 1-5 stars.
    pub rating: u8,
    pub advice: String,
    /// Suggested maximum bid.
    pub suggested_price: Amount,
    /// Risk warnings, possibly empty.
    pub alerts: Vec<String>,
    /// Catalog value divided by (starting share + 1).
    pub quality_ratio: f64,
}

/// Build bidding advice for a player.
///
/// Later rules override the suggested price set by earlier ones, so tier
/// takes precedence over injury, which takes precedence over penalties.
pub fn recommend(player: &Player) -> Recommendation {
    let value = f64::from(player.base_value);
    let mut rating: i32 = 3;
    let mut advice = String::from("Average player for the role.");
    let mut suggested_price = Amount::from(player.base_value);
    let mut alerts = Vec::new();

    if player.starting_share >= 80 {
        rating += 1;
        advice = String::from("Regular starter, a steady investment.");
    } else if player.starting_share <= 40 {
        rating -= 1;
        alerts.push(String::from("Uncertain starter, may play little"));
    }

    if player.is_penalty_taker {
        rating += 1;
        suggested_price = (value * 1.15).ceil() as Amount;
        advice.push_str(" Takes penalties: real added value.");
    }

    if player.is_injured {
        rating -= 2;
        alerts.push(String::from("Currently injured, high risk"));
        suggested_price = (value * 0.8).ceil() as Amount;
    }

    match player.tier.as_str() {
        "A" => {
            rating = (rating + 1).min(5);
            advice = String::from("Top player for the role, a safe investment.");
            suggested_price = (value * 1.1).ceil() as Amount;
        }
        "E" => {
            rating = (rating - 1).max(1);
            advice = String::from("Risky pick, consider alternatives.");
            suggested_price = (value * 0.9).ceil() as Amount;
        }
        _ => {}
    }

    let quality_ratio = value / (f64::from(player.starting_share) + 1.0);
    if quality_ratio < UNDERPRICED_RATIO {
        advice.push_str(" Great value for money!");
        rating = (rating + 1).min(5);
    }

    Recommendation {
        rating: rating.clamp(1, 5) as u8,
        advice,
        suggested_price,
        alerts,
        quality_ratio,
    }
}

// ---------------------------------------------------------------------------
// Team needs
// ---------------------------------------------------------------------------

/// What a participant still has to buy and how much it can afford per player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamNeeds {
    pub team_id: String,
    pub team_name: String,
    pub budget: Amount,
    /// Open slots per role, in [`Role::ALL`] order.
    pub missing_by_role: [u32; 4],
    pub total_missing: u32,
    /// Full roster size minus players held.
    pub remaining_slots: i64,
    /// Highest bid that still leaves 1 credit for every other open slot.
    pub max_spend_per_player: Amount,
}

impl TeamNeeds {
    pub fn missing(&self, role: Role) -> u32 {
        self.missing_by_role[role.index()]
    }
}

pub fn team_needs(team: &Participant, limits: &RoleLimits) -> TeamNeeds {
    let mut missing_by_role = [0u32; 4];
    for role in Role::ALL {
        missing_by_role[role.index()] = team.slots_left(role, limits);
    }
    let total_missing: u32 = missing_by_role.iter().sum();

    let max_spend_per_player = if total_missing > 1 {
        team
            .budget
            .saturating_sub(Amount::from(total_missing - 1))
            .max(1)
    } else {
        team.budget
    };

    TeamNeeds {
        team_id: team.id.clone(),
        team_name: team.name.clone(),
        budget: team.budget,
        missing_by_role,
        total_missing,
        remaining_slots: i64::from(limits.total()) - team.roster.len() as i64,
        max_spend_per_player,
    }
}

// ---------------------------------------------------------------------------
// Role supply
// ---------------------------------------------------------------------------

/// Unsold catalog players of a role against the open roster slots for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleSupply {
    pub role: Role,
    pub available: usize,
    pub open_slots: u32,
}

impl RoleSupply {
    /// More open slots than players left to fill them.
    pub fn is_short(&self) -> bool {
        self.open_slots as usize > self.available
    }
}

/// Supply for each role, in [`Role::ALL`] order.
pub fn role_supply(state: &DraftState) -> Vec<RoleSupply> {
    Role::ALL
        .iter()
        .map(|&role| RoleSupply {
            role,
            available: state
                .catalog()
                .players()
                .iter()
                .filter(|p| p.role == role && !state.is_sold(&p.id))
                .count(),
            open_slots: state
                .participants()
                .iter()
                .map(|t| t.slots_left(role, state.limits()))
                .sum(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Auction summary
// ---------------------------------------------------------------------------

/// A single sale as shown in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleHighlight {
    pub player_name: String,
    pub winner_name: String,
    pub price: Amount,
    pub base_value: u32,
    /// Value divided by price.
    pub ratio: f64,
}

/// Auction-wide spending figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionSummary {
    pub teams: usize,
    pub players_bought: usize,
    /// Sum of every participant's initial budget.
    pub total_budget: Amount,
    pub total_spent: Amount,
    /// Share of the total budget spent, 0-100.
    pub percent_used: f64,
    pub average_spent_per_team: f64,
    pub average_price: f64,
    pub most_expensive: Option<SaleHighlight>,
    /// Up to three sales with the best value for money.
    pub best_deals: Vec<SaleHighlight>,
}

pub fn auction_summary(state: &DraftState) -> AuctionSummary {
    let teams = state.participants();
    let total_budget = teams
        .iter()
        .fold(0, |acc: Amount, t| acc.saturating_add(t.initial_budget));
    let total_spent = teams
        .iter()
        .fold(0, |acc: Amount, t| acc.saturating_add(t.spent()));
    let players_bought = state.ledger().len();

    let highlights: Vec<SaleHighlight> = state
        .ledger()
        .iter()
        .map(|e| SaleHighlight {
            player_name: e.player.name.clone(),
            winner_name: e.winner_name.clone(),
            price: e.price,
            base_value: e.player.base_value,
            ratio: f64::from(e.player.base_value) / e.price as f64,
        })
        .collect();

    // First sale wins ties
    let most_expensive = highlights
        .iter()
        .fold(None::<&SaleHighlight>, |best, h| match best {
            Some(b) if b.price >= h.price => Some(b),
            _ => Some(h),
        })
        .cloned();

    let mut best_deals: Vec<SaleHighlight> = highlights
        .into_iter()
        .filter(|h| h.ratio > BARGAIN_RATIO)
        .collect();
    best_deals.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    best_deals.truncate(MAX_BEST_DEALS);

    AuctionSummary {
        teams: teams.len(),
        players_bought,
        total_budget,
        total_spent,
        percent_used: if total_budget > 0 {
            total_spent as f64 / total_budget as f64 * 100.0
        } else {
            0.0
        },
        average_spent_per_team: if teams.is_empty() {
            0.0
        } else {
            total_spent as f64 / teams.len() as f64
        },
        average_price: if players_bought > 0 {
            total_spent as f64 / players_bought as f64
        } else {
            0.0
        },
        most_expensive,
        best_deals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn player(share: u8, tier: &str) -> Player {
        Player {
            id: "Roma_Test".into(),
            name: "Test".into(),
            role: Role::Midfielder,
            club: "Roma".into(),
            base_value: 20,
            starting_share: share,
            tier: tier.into(),
            is_penalty_taker: false,
            is_injured: false,
            note: None,
        }
    }

    fn catalog_player(id: &str, role: Role, value: u32) -> Player {
        Player {
            id: id.into(),
            name: id.into(),
            role,
            base_value: value,
            ..player(70, "C")
        }
    }

    // --- Star rating ---

    #[test]
    fn star_rating_baseline_and_bonuses() {
        assert_eq!(star_rating(&player(60, "C")), 3);
        assert_eq!(star_rating(&player(85, "C")), 4);
        assert_eq!(star_rating(&player(30, "C")), 2);

        let mut p = player(85, "A");
        p.is_penalty_taker = true;
        // 3 + 1 + 1 + 1 clamped to 5
        assert_eq!(star_rating(&p), 5);
    }

    #[test]
    fn star_rating_floor_is_one() {
        let mut p = player(10, "E");
        p.is_injured = true;
        assert_eq!(star_rating(&p), 1);
    }

    // --- Recommendation ---

    #[test]
    fn recommend_average_player() {
        let rec = recommend(&player(60, "C"));
        assert_eq!(rec.rating, 3);
        assert_eq!(rec.suggested_price, 20);
        assert!(rec.alerts.is_empty());
        assert_eq!(rec.advice, "Average player for the role.");
    }

    #[test]
    fn recommend_penalty_taker_raises_price() {
        let mut p = player(60, "C");
        p.is_penalty_taker = true;
        let rec = recommend(&p);
        assert_eq!(rec.rating, 4);
        // ceil(20 * 1.15) = 23
        assert_eq!(rec.suggested_price, 23);
        assert!(rec.advice.contains("penalties"));
    }

    #[test]
    fn recommend_injury_overrides_penalty_price() {
        let mut p = player(60, "C");
        p.is_penalty_taker = true;
        p.is_injured = true;
        let rec = recommend(&p);
        assert_eq!(rec.suggested_price, 16);
        assert_eq!(rec.rating, 2);
        assert_eq!(rec.alerts, vec!["Currently injured, high risk"]);
    }

    #[test]
    fn recommend_tier_sets_final_price() {
        let rec = recommend(&player(60, "A"));
        assert_eq!(rec.suggested_price, 22);
        assert_eq!(rec.rating, 4);
        assert!(rec.advice.starts_with("Top player"));

        let rec = recommend(&player(60, "E"));
        assert_eq!(rec.suggested_price, 18);
        assert_eq!(rec.rating, 2);
    }

    #[test]
    fn recommend_underpriced_bonus() {
        // 20 / 91 < 0.3
        let rec = recommend(&player(90, "C"));
        assert_eq!(rec.rating, 5);
        assert!(rec.advice.ends_with("Great value for money!"));
        assert!(rec.quality_ratio < 0.3);
    }

    #[test]
    fn recommend_low_share_alert() {
        let rec = recommend(&player(20, "C"));
        assert_eq!(rec.rating, 2);
        assert_eq!(rec.alerts.len(), 1);
    }

    // --- Team needs ---

    #[test]
    fn team_needs_empty_roster() {
        let team = Participant::new("team_1".into(), "Team A".into(), 500);
        let needs = team_needs(&team, &RoleLimits::default());
        assert_eq!(needs.missing_by_role, [3, 8, 8, 6]);
        assert_eq!(needs.total_missing, 25);
        assert_eq!(needs.remaining_slots, 25);
        assert_eq!(needs.max_spend_per_player, 476);
        assert_eq!(needs.missing(Role::Forward), 6);
    }

    #[test]
    fn team_needs_last_slot_spends_everything() {
        let limits = RoleLimits {
            goalkeepers: 1,
            defenders: 1,
            midfielders: 1,
            forwards: 1,
        };
        let mut state = DraftState::new(
            Catalog::new(vec![
                catalog_player("g", Role::Goalkeeper, 1),
                catalog_player("d", Role::Defender, 1),
                catalog_player("c", Role::Midfielder, 1),
            ]),
            limits,
        );
        let a = state.add_participant("Team A", 40).unwrap();
        for id in ["g", "d", "c"] {
            state.select_player(id).unwrap();
            state.assign_player(&a, 5).unwrap();
        }
        let needs = team_needs(state.participant(&a).unwrap(), &limits);
        assert_eq!(needs.total_missing, 1);
        assert_eq!(needs.max_spend_per_player, 25);
    }

    #[test]
    fn team_needs_max_spend_floor_is_one() {
        let mut team = Participant::new("team_1".into(), "Team A".into(), 500);
        team.budget = 3;
        let needs = team_needs(&team, &RoleLimits::default());
        assert_eq!(needs.max_spend_per_player, 1);
    }

    #[test]
    fn team_needs_handles_extreme_budgets() {
        let mut team = Participant::new("team_1".into(), "Team A".into(), 500);
        team.budget = Amount::MIN;
        let needs = team_needs(&team, &RoleLimits::default());
        assert_eq!(needs.max_spend_per_player, 1);
    }

    // --- Supply and summary ---

    fn sold_state() -> DraftState {
        let mut state = DraftState::new(
            Catalog::new(vec![
                catalog_player("fw_cheap", Role::Forward, 30),
                catalog_player("fw_dear", Role::Forward, 30),
                catalog_player("mid", Role::Midfielder, 12),
                catalog_player("gk", Role::Goalkeeper, 5),
            ]),
            RoleLimits::default(),
        );
        let a = state.add_participant("Team A", 500).unwrap();
        let b = state.add_participant("Team B", 500).unwrap();
        for (id, team, price) in [("fw_cheap", &a, 10), ("fw_dear", &b, 60), ("mid", &a, 10)] {
            state.select_player(id).unwrap();
            state.assign_player(team, price).unwrap();
        }
        state
    }

    #[test]
    fn role_supply_counts_unsold_and_open_slots() {
        let state = sold_state();
        let supply = role_supply(&state);
        assert_eq!(supply.len(), 4);

        let forwards = supply[Role::Forward.index()];
        assert_eq!(forwards.available, 0);
        // 6 + 6 - 2 sold
        assert_eq!(forwards.open_slots, 10);
        assert!(forwards.is_short());

        let goalkeepers = supply[Role::Goalkeeper.index()];
        assert_eq!(goalkeepers.available, 1);
        assert_eq!(goalkeepers.open_slots, 6);
    }

    #[test]
    fn auction_summary_figures() {
        let summary = auction_summary(&sold_state());
        assert_eq!(summary.teams, 2);
        assert_eq!(summary.players_bought, 3);
        assert_eq!(summary.total_budget, 1000);
        assert_eq!(summary.total_spent, 80);
        assert!((summary.percent_used - 8.0).abs() < 1e-9);
        assert!((summary.average_spent_per_team - 40.0).abs() < 1e-9);
        assert!((summary.average_price - 80.0 / 3.0).abs() < 1e-9);

        let top = summary.most_expensive.unwrap();
        assert_eq!(top.player_name, "fw_dear");
        assert_eq!(top.winner_name, "Team B");

        // fw_cheap 30/10 = 3.0, mid 12/10 = 1.2 (not above threshold)
        assert_eq!(summary.best_deals.len(), 1);
        assert_eq!(summary.best_deals[0].player_name, "fw_cheap");
    }

    #[test]
    fn auction_summary_empty() {
        let state = DraftState::new(Catalog::empty(), RoleLimits::default());
        let summary = auction_summary(&state);
        assert_eq!(summary.players_bought, 0);
        assert_eq!(summary.percent_used, 0.0);
        assert_eq!(summary.average_price, 0.0);
        assert!(summary.most_expensive.is_none());
        assert!(summary.best_deals.is_empty());
    }
}
