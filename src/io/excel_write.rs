use rust_xlsxwriter::{Format, Table, TableColumn, Workbook};

use crate::error::Result;
use crate::model::ReconciledItem;

/// Sheet name used for spreadsheet exports.
pub const EXPORT_SHEET: &str = "이행현황";

const COLUMNS: [(&str, f64); 8] = [
    ("번호", 10.0),
    ("대분류", 18.0),
    ("중분류", 22.0),
    ("항목명", 28.0),
    ("상세 내용", 60.0),
    ("운영 현황", 60.0),
    ("증적 자료명", 24.0),
    ("상태", 10.0),
];

/// Writes a round's reconciled items to an in-memory `.xlsx` workbook.
pub fn write_items(items: &[ReconciledItem]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET)?;
    let wrap = Format::new().set_text_wrap();

    for (col_idx, (header, width)) in COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, *header)?;
        worksheet.set_column_width(col_idx as u16, *width)?;
    }

    for (row_idx, item) in items.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        let cells = [
            item.id.as_str(),
            item.main_category.as_str(),
            item.sub_category.as_str(),
            item.title.as_str(),
            item.content.as_str(),
            item.description.as_str(),
            item.evidence_name.as_str(),
            item.status.as_str(),
        ];
        for (col_idx, cell) in cells.iter().enumerate() {
            worksheet.write_string_with_format(row, col_idx as u16, *cell, &wrap)?;
        }
    }

    if !items.is_empty() {
        let col_end = (COLUMNS.len() as u16).saturating_sub(1);
        let row_end = items.len() as u32;
        let columns: Vec<TableColumn> = COLUMNS
            .iter()
            .map(|(header, _)| TableColumn::new().set_header(*header))
            .collect();
        let mut table = Table::new();
        table.set_autofilter(true).set_columns(&columns);
        worksheet.add_table(0, 0, row_end, col_end, &table)?;
    }

    Ok(workbook.save_to_buffer()?)
}
