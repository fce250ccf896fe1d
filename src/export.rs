use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;

use crate::charts::DashboardUpdate;
use crate::data::aggregate::{aggregate, aggregate_by_state};
use crate::data::category::Dimension;
use crate::data::filter::SexFilter;
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// JSON export of chart specs
// ---------------------------------------------------------------------------

/// Serialize a dashboard update as pretty JSON into `out`.
pub fn write_json<W: Write>(update: &DashboardUpdate, out: W) -> Result<()> {
    serde_json::to_writer_pretty(out, update).context("serializing dashboard")?;
    Ok(())
}

/// Write the dashboard to `path`, or to stdout when `path` is `None`.
pub fn export_dashboard(update: &DashboardUpdate, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_json(update, &mut out)?;
            out.flush().context("flushing export")?;
            log::info!("Wrote dashboard for {} to {}", update.filter, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_json(update, &mut out)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Text summary
// ---------------------------------------------------------------------------

/// Render every frequency table (and the per-state counts) as text tables.
pub fn summary_text(dataset: &Dataset, filter: SexFilter) -> Result<String> {
    let mut text = String::new();
    for dimension in Dimension::ALL {
        let table = aggregate(dataset, dimension, filter);
        text.push_str(&format!("{dimension} ({filter})\n"));
        if table.is_empty() {
            text.push_str("(sem candidatos)\n\n");
            continue;
        }
        let batch = table.to_record_batch()?;
        text.push_str(&pretty_format_batches(&[batch])?.to_string());
        text.push_str("\n\n");
    }

    text.push_str("UF (todos os candidatos)\n");
    for state in aggregate_by_state(dataset) {
        text.push_str(&format!("{:<4}{:>10}\n", state.code, state.count));
    }
    Ok(text)
}
