// Player catalog: loading the club-grouped player feed and querying it.
//
// The feed groups players under their club:
// `{"squadre": [{"nome": "Inter", "giocatori": [{"nome": ..., "ruolo": "P", ...}]}]}`
// and is flattened here into one list in feed order. Records are immutable
// once loaded.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::draft::pick::Role;

/// Starting share at or above which a player counts as a regular starter.
pub const STARTER_SHARE: u8 = 60;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A catalog player record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// `"{club}_{name}"` with whitespace runs replaced by underscores.
    pub id: String,
    pub name: String,
    pub role: Role,
    pub club: String,
    /// Reference auction value.
    pub base_value: u32,
    /// Expected share of matches started, 0-100.
    pub starting_share: u8,
    /// Fantasy tier letter, "A" (best) to "E".
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub is_penalty_taker: bool,
    #[serde(default)]
    pub is_injured: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid catalog JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Build the stable catalog id of a player.
pub fn player_id(club: &str, name: &str) -> String {
    format!("{club}_{name}")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

// ---------------------------------------------------------------------------
// Raw feed serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawFeed {
    #[serde(alias = "squadre", default)]
    clubs: Vec<RawClub>,
}

#[derive(Debug, Deserialize)]
struct RawClub {
    #[serde(alias = "nome")]
    name: String,
    #[serde(alias = "giocatori", default)]
    players: Vec<RawPlayer>,
}

/// Feed player row. Value and starting share may be fractional in some
/// exports; they are rounded on load.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    #[serde(alias = "nome")]
    name: String,
    #[serde(alias = "ruolo")]
    role: String,
    #[serde(alias = "valore", default)]
    value: f64,
    #[serde(rename = "startingShare", alias = "titolarita", default)]
    starting_share: f64,
    #[serde(alias = "fantasyTier", default)]
    tier: String,
    #[serde(rename = "penaltyTaker", alias = "rigorista", default)]
    penalty_taker: bool,
    #[serde(alias = "infortunato", default)]
    injured: bool,
    #[serde(default)]
    note: Option<String>,
}

fn player_from_raw(club: &str, raw: RawPlayer) -> Option<Player> {
    let name = raw.name.trim().to_string();
    let Some(role) = Role::from_code(&raw.role) else {
        warn!("skipping player '{}' ({}): unknown role '{}'", name, club, raw.role);
        return None;
    };
    if !raw.value.is_finite() || !raw.starting_share.is_finite() {
        warn!("skipping player '{}' ({}): non-finite value or starting share", name, club);
        return None;
    }
    Some(Player {
        id: player_id(club, &name),
        name,
        role,
        club: club.to_string(),
        base_value: raw.value.max(0.0).round() as u32,
        starting_share: raw.starting_share.clamp(0.0, 100.0).round() as u8,
        tier: raw.tier.trim().to_uppercase(),
        is_penalty_taker: raw.penalty_taker,
        is_injured: raw.injured,
        note: raw.note.filter(|n| !n.trim().is_empty()),
    })
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The read-only list of players available for the auction.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    players: Vec<Player>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// A catalog with no players (used when the feed cannot be loaded).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from player records. Records whose id was already
    /// seen are skipped.
    pub fn new(players: Vec<Player>) -> Self {
        let mut catalog = Catalog::default();
        for player in players {
            if catalog.index.contains_key(&player.id) {
                warn!("skipping duplicate catalog id '{}'", player.id);
                continue;
            }
            catalog.index.insert(player.id.clone(), catalog.players.len());
            catalog.players.push(player);
        }
        catalog
    }

    /// Load the feed from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog = Self::from_reader(std::io::BufReader::new(file)).map_err(|e| {
            CatalogError::Json {
                path: path.display().to_string(),
                source: e,
            }
        })?;
        info!("Loaded {} players from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Parse the feed from any reader.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, serde_json::Error> {
        let feed: RawFeed = serde_json::from_reader(rdr)?;
        let players = feed
            .clubs
            .into_iter()
            .flat_map(|club| {
                let club_name = club.name.trim().to_string();
                club.players
                    .into_iter()
                    .filter_map(move |raw| player_from_raw(&club_name, raw))
            })
            .collect();
        Ok(Self::new(players))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.index.get(id).map(|&i| &self.players[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Distinct club names, sorted.
    pub fn clubs(&self) -> Vec<&str> {
        let clubs: BTreeSet<&str> = self.players.iter().map(|p| p.club.as_str()).collect();
        clubs.into_iter().collect()
    }

    /// Filter, sort and paginate the catalog.
    pub fn query(
        &self,
        query: &CatalogQuery,
        sold: &BTreeSet<String>,
        favorites: &BTreeSet<String>,
    ) -> PlayerPage {
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matches: Vec<&Player> = self
            .players
            .iter()
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n) || p.club.to_lowercase().contains(n),
                None => true,
            })
            .filter(|p| query.role.map_or(true, |r| p.role == r))
            .filter(|p| query.club.as_deref().map_or(true, |c| p.club == c))
            .filter(|p| match query.status {
                None => true,
                Some(StatusFilter::Available) => !sold.contains(&p.id),
                Some(StatusFilter::Sold) => sold.contains(&p.id),
                Some(StatusFilter::Favorites) => favorites.contains(&p.id),
                Some(StatusFilter::Starters) => p.starting_share >= STARTER_SHARE,
                Some(StatusFilter::PenaltyTakers) => p.is_penalty_taker,
            })
            .collect();

        match query.sort {
            SortOrder::ValueDesc => matches.sort_by(|a, b| b.base_value.cmp(&a.base_value)),
            SortOrder::ValueAsc => matches.sort_by(|a, b| a.base_value.cmp(&b.base_value)),
            SortOrder::NameAsc => {
                matches.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            }
            SortOrder::StartingShareDesc => {
                matches.sort_by(|a, b| b.starting_share.cmp(&a.starting_share))
            }
        }

        let per_page = query.per_page.max(1);
        let total = matches.len();
        let total_pages = total.div_ceil(per_page);
        let page = query.page.clamp(1, total_pages.max(1));
        let players = matches
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        PlayerPage {
            players,
            page,
            total_pages,
            total,
        }
    }
}

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Available,
    Sold,
    Favorites,
    /// Starting share of at least [`STARTER_SHARE`].
    Starters,
    PenaltyTakers,
}

impl StatusFilter {
    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "available" => Some(StatusFilter::Available),
            "sold" => Some(StatusFilter::Sold),
            "favorites" | "fav" => Some(StatusFilter::Favorites),
            "starters" => Some(StatusFilter::Starters),
            "penalty" | "penalty-takers" => Some(StatusFilter::PenaltyTakers),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    ValueDesc,
    ValueAsc,
    NameAsc,
    StartingShareDesc,
}

impl SortOrder {
    pub fn from_key(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "value-desc" | "value" => Some(SortOrder::ValueDesc),
            "value-asc" => Some(SortOrder::ValueAsc),
            "name" | "name-asc" => Some(SortOrder::NameAsc),
            "share" | "share-desc" => Some(SortOrder::StartingShareDesc),
            _ => None,
        }
    }
}

/// Catalog search parameters. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub club: Option<String>,
    pub status: Option<StatusFilter>,
    pub sort: SortOrder,
    pub page: usize,
    pub per_page: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        CatalogQuery {
            search: None,
            role: None,
            club: None,
            status: None,
            sort: SortOrder::default(),
            page: 1,
            per_page: 25,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPage {
    pub players: Vec<Player>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}
