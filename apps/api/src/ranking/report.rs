//! CSV export of a ranked batch, one row per candidate in rank order.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::candidate::{round_to, RankedResult};
use crate::ranking::fusion::FitBand;

/// Separator for list-valued cells.
const LIST_SEPARATOR: &str = " | ";

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    rank: usize,
    filename: &'a str,
    final_score: u32,
    similarity: f64,
    fit_band: FitBand,
    strengths: String,
    weaknesses: String,
}

impl<'a> From<&'a RankedResult> for ReportRow<'a> {
    fn from(result: &'a RankedResult) -> Self {
        let b = &result.breakdown;
        Self {
            rank: result.rank,
            filename: &result.filename,
            final_score: b.final_score,
            similarity: round_to(b.similarity, 3),
            fit_band: b.fit_band,
            strengths: b.strengths.join(LIST_SEPARATOR),
            weaknesses: b.weaknesses.join(LIST_SEPARATOR),
        }
    }
}

/// Renders `results` as CSV with a header row.
pub fn to_csv(results: &[RankedResult]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for result in results {
        writer
            .serialize(ReportRow::from(result))
            .with_context(|| format!("Failed to write report row for '{}'", result.filename))?;
    }
    if results.is_empty() {
        writer.write_record([
            "rank",
            "filename",
            "final_score",
            "similarity",
            "fit_band",
            "strengths",
            "weaknesses",
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV report: {}", e.error()))
}
