// Draft engine: participants, bidding rounds, sales ledger and undo.

pub mod error;
pub mod ledger;
pub mod pick;
pub mod roster;
pub mod state;

/// Credits, as used for budgets, bids and prices.
pub type Amount = i64;
