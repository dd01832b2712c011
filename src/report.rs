//! Tally output: stdout summary and optional CSV.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use tracing::info;

use crate::pip::{CountTable, TopArea};

/// One-line verdict for the run
pub fn summary_line(top: &TopArea, taxon: &str, window: &str) -> String {
    match top {
        TopArea::Empty => format!(
            "No {} observations found in {} for the provided suburbs.",
            taxon, window
        ),
        TopArea::Unique { name, count } => {
            format!("Top suburb ({}): {} — {} sightings", window, name, count)
        }
        TopArea::Tied { names, count } => format!(
            "Top suburbs tied ({}): {} — {} sightings each",
            window,
            names.join(", "),
            count
        ),
    }
}

/// Tab-separated tally rows, highest count first
pub fn write_tally<W: Write>(out: &mut W, counts: &CountTable) -> Result<()> {
    for (name, count) in counts.rows() {
        writeln!(out, "{}\t{}", name, count)?;
    }
    Ok(())
}

/// Two-column CSV. Names are quoted so embedded commas survive.
pub fn write_counts_csv<W: Write>(writer: W, counts: &CountTable) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(writer);

    csv_writer.write_record(["suburb", "count"])?;
    for (name, count) in counts.rows() {
        csv_writer.write_record([name, count.to_string().as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_counts_csv_file(path: &Path, counts: &CountTable) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to open CSV for writing: {}", path.display()))?;
    write_counts_csv(file, counts)?;
    info!("Wrote counts CSV to {}", path.display());
    Ok(())
}
