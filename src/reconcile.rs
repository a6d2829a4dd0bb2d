use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::io::excel_read;
use crate::model::{
    ChecklistItem, ItemStatus, ReconciledItem, RoundKey, RoundStatistic, StatusRecord,
    TOTAL_ITEMS,
};
use crate::report::{Report, ReportSection};
use crate::store::StatusStore;

/// Location of the catalog workbook. The workbook is re-read on every call so
/// edits to the file show up without a restart.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    pub path: PathBuf,
    pub sheet: String,
}

impl CatalogSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }

    pub fn load(&self) -> Result<Vec<ChecklistItem>> {
        excel_read::read_catalog(&self.path, &self.sheet)
    }
}

/// Joins catalog items with a round's records, preserving catalog order.
/// Records without a catalog entry are dropped from the result.
pub fn reconcile(catalog: &[ChecklistItem], records: &[StatusRecord]) -> Vec<ReconciledItem> {
    let by_id: HashMap<&str, &StatusRecord> = records
        .iter()
        .map(|record| (record.item_id.as_str(), record))
        .collect();
    catalog
        .iter()
        .map(|item| ReconciledItem::merge(item, by_id.get(item.id.as_str()).copied()))
        .collect()
}

/// Completion percentage for `completed` items, rounded to one decimal.
pub fn completion_percent(completed: usize) -> f64 {
    let ratio = completed as f64 / f64::from(TOTAL_ITEMS) * 100.0;
    (ratio * 10.0).round() / 10.0
}

/// Completion percentage per (year, round), ordered by year then round.
/// Rounds without any completed record are omitted.
pub fn round_statistics(records: &[StatusRecord]) -> Vec<RoundStatistic> {
    let mut completed: BTreeMap<RoundKey, usize> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|record| record.status == ItemStatus::Completed)
    {
        *completed.entry(record.round()).or_default() += 1;
    }
    completed
        .into_iter()
        .map(|(key, count)| RoundStatistic {
            label: key.label(),
            percent: completion_percent(count),
        })
        .collect()
}

/// Fields submitted when an item's status is saved.
#[derive(Debug, Clone)]
pub struct SaveItem {
    pub round: RoundKey,
    pub item_id: String,
    pub description: String,
    pub evidence_name: String,
}

impl SaveItem {
    fn validate(&self) -> Result<()> {
        let required = [
            ("year", self.round.year.as_str()),
            ("round_name", self.round.round_name.as_str()),
            ("id", self.item_id.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ToolError::InvalidRequest(format!("'{field}' must not be empty")));
            }
        }
        Ok(())
    }
}

/// Ties the catalog and the status store together.
#[derive(Debug, Clone)]
pub struct Tracker {
    catalog: CatalogSource,
    store: Arc<StatusStore>,
}

impl Tracker {
    pub fn new(catalog: CatalogSource, store: Arc<StatusStore>) -> Self {
        Self { catalog, store }
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Current view of one round: every catalog item with its status.
    #[instrument(
        level = "info",
        skip(self),
        fields(year = %round.year, round = %round.round_name)
    )]
    pub fn list(&self, round: &RoundKey) -> Result<Vec<ReconciledItem>> {
        let catalog = self.catalog.load()?;
        let records = self.store.list_round(round)?;
        let items = reconcile(&catalog, &records);
        debug!(
            catalog_count = catalog.len(),
            record_count = records.len(),
            "round reconciled"
        );
        Ok(items)
    }

    /// Stores the submitted status; the item is marked completed. Surrounding
    /// whitespace is dropped from the year, round and item id.
    #[instrument(
        level = "info",
        skip_all,
        fields(
            year = %request.round.year,
            round = %request.round.round_name,
            item_id = %request.item_id
        )
    )]
    pub fn save(&self, request: &SaveItem) -> Result<StatusRecord> {
        request.validate()?;
        let round = RoundKey::new(request.round.year.trim(), request.round.round_name.trim());
        let record = self.store.upsert(
            &round,
            request.item_id.trim(),
            &request.description,
            &request.evidence_name,
        )?;
        info!("item status saved");
        Ok(record)
    }

    /// Completion percentage of every round that has completed records.
    pub fn statistics(&self) -> Result<Vec<RoundStatistic>> {
        let records = self.store.list_all()?;
        Ok(round_statistics(&records))
    }

    /// Builds the report for one round, or for every stored round when
    /// `round` is `None`.
    ///
    /// A single round lists the full catalog. The all-rounds report holds one
    /// section per round containing only what was recorded, joined with the
    /// catalog where the item still exists.
    #[instrument(level = "info", skip(self))]
    pub fn report(&self, round: Option<&RoundKey>) -> Result<Report> {
        let catalog = self.catalog.load()?;
        let report = match round {
            Some(round) => {
                let records = self.store.list_round(round)?;
                Report::new(
                    format!("ISMS-P 이행 현황 보고서 ({})", round.label()),
                    vec![ReportSection::new(
                        round.label(),
                        reconcile(&catalog, &records),
                    )],
                )
            }
            None => {
                let by_id: HashMap<&str, (usize, &ChecklistItem)> = catalog
                    .iter()
                    .enumerate()
                    .map(|(position, item)| (item.id.as_str(), (position, item)))
                    .collect();
                let mut rounds: BTreeMap<RoundKey, Vec<(usize, ReconciledItem)>> =
                    BTreeMap::new();
                for record in self.store.list_all()? {
                    // Orphans sort after every catalog item.
                    let row = match by_id.get(record.item_id.as_str()) {
                        Some((position, item)) => {
                            (*position, ReconciledItem::merge(item, Some(&record)))
                        }
                        None => (usize::MAX, ReconciledItem::from_orphan(&record)),
                    };
                    rounds.entry(record.round()).or_default().push(row);
                }
                let sections = rounds
                    .into_iter()
                    .map(|(key, mut rows)| {
                        rows.sort_by(|lhs, rhs| {
                            lhs.0.cmp(&rhs.0).then_with(|| lhs.1.id.cmp(&rhs.1.id))
                        });
                        let items = rows.into_iter().map(|(_, item)| item).collect();
                        ReportSection::new(key.label(), items)
                    })
                    .collect();
                Report::new("ISMS-P 이행 현황 보고서 (전체)".to_string(), sections)
            }
        };
        info!(section_count = report.sections.len(), "report assembled");
        Ok(report)
    }
}
