use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::ChecklistItem;

/// Default name of the worksheet holding the checklist.
pub const CATALOG_SHEET: &str = "ISMS-P";

/// Zero-based row of the column header. The rows above it hold the document
/// title and are never data.
pub const HEADER_ROW: u32 = 4;

const MAIN_CATEGORY_COL: u32 = 1;
const SUB_CATEGORY_COL: u32 = 2;
const ID_COL: u32 = 3;
const TITLE_COL: u32 = 4;
const CONTENT_COL: u32 = 5;

/// Reads the checklist catalog from the given workbook sheet.
///
/// Category columns are forward-filled to undo merged cells, and only rows
/// whose identifier looks like `x.y.z` are kept. Items come back in sheet
/// order.
pub fn read_catalog(path: &Path, sheet: &str) -> Result<Vec<ChecklistItem>> {
    if !path.exists() {
        return Err(ToolError::CatalogUnavailable(path.to_path_buf()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_required_sheet(&mut workbook, sheet)?;

    let Some((_, end_col)) = range.end() else {
        return Err(ToolError::CatalogParse(format!("sheet '{sheet}' is empty")));
    };
    if end_col < CONTENT_COL {
        return Err(ToolError::CatalogParse(format!(
            "sheet '{sheet}' has {} columns, expected at least {}",
            end_col + 1,
            CONTENT_COL + 1
        )));
    }

    let items = parse_rows(&range);
    debug!(sheet, item_count = items.len(), "catalog parsed");
    Ok(items)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::CatalogParse(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn parse_rows(range: &Range<DataType>) -> Vec<ChecklistItem> {
    let (Some((start_row, _)), Some((end_row, _))) = (range.start(), range.end()) else {
        return Vec::new();
    };
    let first_data_row = (HEADER_ROW + 1).max(start_row);
    if first_data_row > end_row {
        return Vec::new();
    }
    let rows: Vec<u32> = (first_data_row..=end_row).collect();

    let column = |col: u32| -> Vec<String> {
        rows.iter()
            .map(|&row| cell_to_string(range.get_value((row, col))))
            .collect()
    };
    let main_categories = forward_fill(&column(MAIN_CATEGORY_COL));
    let sub_categories = forward_fill(&column(SUB_CATEGORY_COL));

    let mut items = Vec::new();
    for (idx, &row) in rows.iter().enumerate() {
        let id = cell_to_string(range.get_value((row, ID_COL)));
        let id = id.trim();
        if !is_item_identifier(id) {
            continue;
        }
        items.push(ChecklistItem {
            id: id.to_string(),
            main_category: main_categories[idx].clone(),
            sub_category: sub_categories[idx].clone(),
            title: cell_to_string(range.get_value((row, TITLE_COL))),
            content: cell_to_string(range.get_value((row, CONTENT_COL))),
        });
    }
    items
}

/// Replaces every blank value with the nearest non-blank value above it.
/// Leading blanks stay blank.
pub fn forward_fill(values: &[String]) -> Vec<String> {
    let mut last = String::new();
    values
        .iter()
        .map(|value| {
            if !value.trim().is_empty() {
                last = value.clone();
            }
            last.clone()
        })
        .collect()
}

/// Returns true for identifiers with at least two dot separators, which is
/// what distinguishes control items from section header rows.
pub fn is_item_identifier(id: &str) -> bool {
    !id.is_empty() && id.matches('.').count() >= 2
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
