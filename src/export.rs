use std::path::Path;

use tracing::{info, instrument};

use crate::error::Result;
use crate::io::{excel_write, pdf};
use crate::model::RoundKey;
use crate::reconcile::Tracker;
use crate::report::{self, FontMetrics};

/// Produces the PDF report for one round, or for all stored rounds.
#[instrument(level = "info", skip(tracker, font_path))]
pub fn pdf_report(
    tracker: &Tracker,
    round: Option<&RoundKey>,
    font_path: Option<&Path>,
) -> Result<Vec<u8>> {
    let report = tracker.report(round)?;
    let metrics = FontMetrics::load(font_path);
    let layout = report::layout(&report, &metrics);
    info!(page_count = layout.pages.len(), "report laid out");
    pdf::render_pdf(&layout, &metrics)
}

/// Produces a spreadsheet with the reconciled list of one round.
#[instrument(level = "info", skip(tracker))]
pub fn xlsx_report(tracker: &Tracker, round: &RoundKey) -> Result<Vec<u8>> {
    let items = tracker.list(round)?;
    excel_write::write_items(&items)
}

/// File name offered to clients downloading a report.
pub fn report_file_name(round: Option<&RoundKey>, extension: &str) -> String {
    match round {
        Some(round) => format!("ISMS_Report_{}_{}.{extension}", round.year, round.round_name),
        None => format!("ISMS_Report_all.{extension}"),
    }
}
