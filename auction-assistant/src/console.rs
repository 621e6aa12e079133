// Line-oriented console front end.
//
// Translates typed lines into UserCommand messages for the app actor and
// renders UiUpdate messages back as plain text. `help` is answered locally.

use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{CatalogQuery, PlayerPage, SortOrder, StatusFilter};
use crate::draft::pick::Role;
use crate::draft::Amount;
use crate::protocol::{AppSnapshot, Notice, NoticeLevel, SelectionView, UiUpdate, UserCommand};

pub const HELP: &str = "\
Commands:
  add <name> [$budget]        register a participant
  remove <team>               remove a participant, their players return to the pool
  delete <team>               same as remove
  active <team>               choose who bids next
  select <player>             put a player up for auction
  cancel                      withdraw the player up for auction
  bid <amount>                bid for the active participant
  assign <team> <price>       sell the player up for auction
  undo                        reverse the most recent sale
  undo-sale <player>          reverse the sale of one player
  release <team> <player>     take a player off a roster; quote a team name
                              with spaces: release \"Team A\" Leao
  fav <player>                toggle a favorite
  find [text] [role:P|D|C|A] [club:<club>] [status:available|sold|favorites|starters|penalty]
       [sort:value|value-asc|name|share] [page:<n>]
  export [path]               write all rosters to CSV
  show                        print the auction state
  help                        this text
  quit                        leave (state is already saved)";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(UserCommand),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', type 'help' for the list")]
    UnknownCommand(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{0}' is not a valid amount")]
    InvalidNumber(String),

    #[error("invalid {key} filter '{value}'")]
    InvalidFilter { key: String, value: String },
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse one console line.
pub fn parse_line(line: &str) -> Result<ConsoleInput, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = tokens.split_first() else {
        return Err(ParseError::Empty);
    };
    let rest = args.join(" ");

    let cmd = match head.to_lowercase().as_str() {
        "help" | "?" => return Ok(ConsoleInput::Help),
        "add" => parse_add(args)?,
        "remove" => UserCommand::RemoveParticipant {
            team: required(rest, "remove", "a team")?,
        },
        "delete" => UserCommand::DeleteTeam {
            team: required(rest, "delete", "a team")?,
        },
        "active" => UserCommand::SetActive {
            team: required(rest, "active", "a team")?,
        },
        "select" => UserCommand::SelectPlayer {
            player: required(rest, "select", "a player")?,
        },
        "cancel" => UserCommand::CancelSelection,
        "bid" => {
            let amount = args.first().ok_or(ParseError::MissingArgument {
                command: "bid",
                argument: "an amount",
            })?;
            UserCommand::PlaceBid {
                amount: parse_amount(amount)?,
            }
        }
        "assign" => {
            let Some((price, team)) = args.split_last().filter(|(_, team)| !team.is_empty())
            else {
                return Err(ParseError::MissingArgument {
                    command: "assign",
                    argument: "a team and a price",
                });
            };
            UserCommand::AssignPlayer {
                team: team.join(" "),
                price: parse_amount(price)?,
            }
        }
        "undo" => UserCommand::UndoLast,
        "undo-sale" => UserCommand::UndoSale {
            player: required(rest, "undo-sale", "a player")?,
        },
        "release" => {
            let Some((team, player)) = split_team(args).filter(|(_, p)| !p.is_empty()) else {
                return Err(ParseError::MissingArgument {
                    command: "release",
                    argument: "a team and a player",
                });
            };
            UserCommand::ReleasePlayer {
                team,
                player: player.join(" "),
            }
        }
        "fav" | "favorite" => UserCommand::ToggleFavorite {
            player: required(rest, "fav", "a player")?,
        },
        "find" | "list" => UserCommand::Query(parse_query(args)?),
        "export" => UserCommand::Export {
            path: (!rest.is_empty()).then(|| PathBuf::from(rest)),
        },
        "show" => UserCommand::Show,
        "quit" | "exit" => UserCommand::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(ConsoleInput::Command(cmd))
}

fn required(value: String, command: &'static str, argument: &'static str) -> Result<String, ParseError> {
    if value.is_empty() {
        Err(ParseError::MissingArgument { command, argument })
    } else {
        Ok(value)
    }
}

/// Take a leading team reference: one token, or a `"quoted name"` spanning
/// several tokens. Returns the team and the remaining tokens.
fn split_team<'a, 'b>(args: &'a [&'b str]) -> Option<(String, &'a [&'b str])> {
    let (first, rest) = args.split_first()?;
    let Some(opened) = first.strip_prefix('"') else {
        return Some((first.to_string(), rest));
    };
    if let Some(name) = opened.strip_suffix('"') {
        return Some((name.to_string(), rest));
    }
    let close = rest.iter().position(|t| t.ends_with('"'))?;
    let mut words = vec![opened];
    words.extend(&rest[..close]);
    words.push(rest[close].trim_end_matches('"'));
    Some((words.join(" "), &rest[close + 1..]))
}

/// `add <name...> [$budget]`. Only a `$`-prefixed last token is a budget,
/// so names like "Team 2" stay intact.
fn parse_add(args: &[&str]) -> Result<UserCommand, ParseError> {
    let (name, budget) = match args.split_last() {
        Some((last, name)) if last.starts_with('$') => (name.join(" "), Some(parse_amount(last)?)),
        _ => (args.join(" "), None),
    };
    Ok(UserCommand::AddParticipant {
        name: required(name, "add", "a name")?,
        budget,
    })
}

fn parse_amount(token: &str) -> Result<Amount, ParseError> {
    token
        .trim_start_matches('$')
        .parse::<Amount>()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))
}

/// `find` arguments: `key:value` filters plus free search text.
fn parse_query(args: &[&str]) -> Result<CatalogQuery, ParseError> {
    let mut query = CatalogQuery::default();
    let mut words = Vec::new();

    for &arg in args {
        let Some((key, value)) = arg.split_once(':') else {
            words.push(arg);
            continue;
        };
        let invalid = || ParseError::InvalidFilter {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key.to_lowercase().as_str() {
            "role" => query.role = Some(Role::from_code(value).ok_or_else(invalid)?),
            "club" => query.club = Some(value.replace('_', " ")),
            "status" => query.status = Some(StatusFilter::from_key(value).ok_or_else(invalid)?),
            "sort" => query.sort = SortOrder::from_key(value).ok_or_else(invalid)?,
            "page" => {
                query.page = value
                    .parse::<usize>()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(invalid)?
            }
            _ => words.push(arg),
        }
    }

    if !words.is_empty() {
        query.search = Some(words.join(" "));
    }
    Ok(query)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_update(update: &UiUpdate) -> String {
    match update {
        UiUpdate::Notice(notice) => render_notice(notice),
        UiUpdate::PlayerPage(page) => render_page(page),
        UiUpdate::StateSnapshot(snapshot) => render_snapshot(snapshot),
    }
}

fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.message)
}

fn render_page(page: &PlayerPage) -> String {
    let mut out = String::new();
    if page.total == 0 {
        out.push_str("No players match.");
        return out;
    }
    let _ = writeln!(
        out,
        "Page {}/{} ({} players)",
        page.page, page.total_pages, page.total
    );
    for p in &page.players {
        let mut flags = String::new();
        if p.is_penalty_taker {
            flags.push_str(" R");
        }
        if p.is_injured {
            flags.push_str(" INJ");
        }
        let _ = writeln!(
            out,
            "  {} {:<24} {:<14} value {:>3}  share {:>3}%  tier {}{}   [{}]",
            p.role.code(),
            p.name,
            p.club,
            p.base_value,
            p.starting_share,
            p.tier,
            flags,
            p.id
        );
    }
    out.trim_end().to_string()
}

fn render_snapshot(s: &AppSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", s.auction_name);

    if s.participants.is_empty() {
        out.push_str("No participants yet. Use 'add <name>'.\n");
    }
    for (team, needs) in s.participants.iter().zip(&s.team_needs) {
        let marker = if s.active_participant_id.as_deref() == Some(team.id.as_str()) {
            '*'
        } else {
            ' '
        };
        let missing: Vec<String> = Role::ALL
            .iter()
            .map(|r| format!("{}{}", r.code(), needs.missing(*r)))
            .collect();
        let _ = writeln!(
            out,
            "{marker} {:<8} {:<20} budget {:>4}  spent {:>4}  players {:>2}/{}  needs {}  max bid {}",
            team.id,
            team.name,
            team.budget,
            team.spent(),
            team.roster.len(),
            s.limits.total(),
            missing.join(" "),
            needs.max_spend_per_player
        );
    }

    if let Some(selection) = &s.selection {
        render_selection(&mut out, selection);
    }

    let short: Vec<&str> = s
        .role_supply
        .iter()
        .filter(|r| r.is_short())
        .map(|r| r.role.label())
        .collect();
    if !short.is_empty() {
        let _ = writeln!(out, "Short supply: {}", short.join(", "));
    }

    let summary = &s.summary;
    let _ = write!(
        out,
        "Sold {} of {} | spent {} of {} ({:.1}%) | favorites {}",
        summary.players_bought,
        s.catalog_size,
        summary.total_spent,
        summary.total_budget,
        summary.percent_used,
        s.favorites.len()
    );
    if let Some(top) = &summary.most_expensive {
        let _ = write!(
            out,
            " | top sale {} to {} for {}",
            top.player_name, top.winner_name, top.price
        );
    }
    out
}

fn render_selection(out: &mut String, sel: &SelectionView) {
    let p = &sel.player;
    let stars = "*".repeat(sel.stars as usize);
    let _ = writeln!(
        out,
        "On the block: {} ({}, {}) value {} {}{}",
        p.name,
        p.role.label(),
        p.club,
        p.base_value,
        stars,
        if sel.favorite { " [fav]" } else { "" }
    );
    let _ = writeln!(
        out,
        "  {} Suggested max {}.",
        sel.recommendation.advice, sel.recommendation.suggested_price
    );
    for alert in &sel.recommendation.alerts {
        let _ = writeln!(out, "  ! {alert}");
    }
    match sel.bids.last() {
        Some(bid) => {
            let _ = writeln!(
                out,
                "  High bid {} by {} ({} bids)",
                sel.high_bid,
                bid.participant_name,
                sel.bids.len()
            );
        }
        None => out.push_str("  No bids yet\n"),
    }
}
