use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of control items in the ISMS-P standard. Completion percentages
/// are always measured against this figure, even if the catalog workbook
/// carries a different number of rows.
pub const TOTAL_ITEMS: u32 = 102;

/// Identifier of a checklist item, e.g. `1.1.1`.
pub type ItemId = String;

/// One control row read from the catalog workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    pub main_category: String,
    pub sub_category: String,
    pub title: String,
    pub content: String,
}

/// Completion state of a status record.
///
/// The serialized literals are the ones the web client compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "미작성")]
    Unwritten,
    #[serde(rename = "작성완료")]
    Completed,
}

impl ItemStatus {
    /// Literal stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Unwritten => "미작성",
            ItemStatus::Completed => "작성완료",
        }
    }

    /// Parses a stored literal. Unknown values are treated as unwritten.
    pub fn from_stored(value: &str) -> Self {
        if value == ItemStatus::Completed.as_str() {
            ItemStatus::Completed
        } else {
            ItemStatus::Unwritten
        }
    }

    /// Short tag shown in the report's last column.
    pub fn display_tag(self) -> &'static str {
        match self {
            ItemStatus::Unwritten => "작업중",
            ItemStatus::Completed => "완료",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit year and round under which status is tracked.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundKey {
    pub year: String,
    pub round_name: String,
}

impl RoundKey {
    pub fn new(year: impl Into<String>, round_name: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            round_name: round_name.into(),
        }
    }

    /// Human readable label, e.g. `2025 최초`.
    pub fn label(&self) -> String {
        format!("{} {}", self.year, self.round_name)
    }
}

/// User-submitted status for one item within one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub year: String,
    pub round_name: String,
    pub item_id: ItemId,
    pub description: String,
    pub evidence_name: String,
    pub status: ItemStatus,
}

impl StatusRecord {
    pub fn round(&self) -> RoundKey {
        RoundKey::new(self.year.clone(), self.round_name.clone())
    }
}

/// Placeholder used for description and evidence when nothing was recorded.
pub const EMPTY_FIELD: &str = "-";

/// A catalog item merged with its status record, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledItem {
    pub id: ItemId,
    #[serde(rename = "main_cat")]
    pub main_category: String,
    #[serde(rename = "sub_cat")]
    pub sub_category: String,
    #[serde(rename = "item_name")]
    pub title: String,
    pub content: String,
    pub status: ItemStatus,
    pub description: String,
    pub evidence_name: String,
}

impl ReconciledItem {
    /// Merges a catalog item with its record, applying the defaults when the
    /// item has not been written yet.
    pub fn merge(item: &ChecklistItem, record: Option<&StatusRecord>) -> Self {
        let (status, description, evidence_name) = match record {
            Some(record) => (
                record.status,
                record.description.clone(),
                record.evidence_name.clone(),
            ),
            None => (
                ItemStatus::Unwritten,
                EMPTY_FIELD.to_string(),
                EMPTY_FIELD.to_string(),
            ),
        };
        Self {
            id: item.id.clone(),
            main_category: item.main_category.clone(),
            sub_category: item.sub_category.clone(),
            title: item.title.clone(),
            content: item.content.clone(),
            status,
            description,
            evidence_name,
        }
    }

    /// Builds a row for a record whose item is missing from the catalog.
    pub fn from_orphan(record: &StatusRecord) -> Self {
        Self {
            id: record.item_id.clone(),
            main_category: String::new(),
            sub_category: String::new(),
            title: String::new(),
            content: String::new(),
            status: record.status,
            description: record.description.clone(),
            evidence_name: record.evidence_name.clone(),
        }
    }
}

/// Completion percentage of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStatistic {
    pub label: String,
    pub percent: f64,
}
