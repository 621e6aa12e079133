// CSV export of every participant's roster.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::draft::roster::Participant;

const HEADER: [&str; 7] = ["Team", "Player", "Role", "Club", "Price", "Value", "Ratio"];

/// Default export file name for a given day.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("fantacalcio-auction-{}.csv", date.format("%Y-%m-%d"))
}

/// Write one row per rostered player, grouped by participant in order.
///
/// Ratio is value divided by price, with two decimals. Returns the number of
/// player rows written.
pub fn write_rosters_csv<W: Write>(participants: &[Participant], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)
        .context("failed to write CSV header")?;

    let mut rows = 0;
    for team in participants {
        for p in &team.roster {
            let ratio = if p.price > 0 {
                format!("{:.2}", f64::from(p.base_value) / p.price as f64)
            } else {
                String::new()
            };
            let price = p.price.to_string();
            let value = p.base_value.to_string();
            wtr.write_record([
                team.name.as_str(),
                p.name.as_str(),
                p.role.code(),
                p.club.as_str(),
                price.as_str(),
                value.as_str(),
                ratio.as_str(),
            ])
            .with_context(|| format!("failed to write CSV row for {}", p.name))?;
            rows += 1;
        }
    }

    wtr.flush().context("failed to flush CSV output")?;
    Ok(rows)
}
