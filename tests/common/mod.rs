#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use isms_tracker::io::excel_read::CATALOG_SHEET;
use isms_tracker::reconcile::{CatalogSource, Tracker};
use isms_tracker::store::StatusStore;
use rust_xlsxwriter::Workbook;

/// Columns A–F: section, main category, sub category, id, title, content.
pub type CatalogRow = [&'static str; 6];

/// A small excerpt of the standard, laid out the way the real workbook is:
/// categories only on the first row of each merged block, section header
/// rows with single-dot ids, and a blank spacer row.
pub const STANDARD_ROWS: &[CatalogRow] = &[
    ["1", "1. 관리체계 수립 및 운영", "1.1 관리체계 기반 마련", "1.1", "", ""],
    ["", "", "", "1.1.1", "경영진의 참여", "최고경영자는 정보보호 및 개인정보보호 관리체계의 수립과 운영활동 전반에 경영진의 참여가 이루어질 수 있도록 보고 및 의사결정 체계를 수립하여 운영하여야 한다."],
    ["", "", "", "1.1.2", "최고책임자의 지정", "최고경영자는 정보보호 업무를 총괄하는 정보보호 최고책임자와 개인정보보호 업무를 총괄하는 개인정보 보호책임자를 지정하여야 한다."],
    ["", "", "1.2 위험 관리", "1.2.1", "정보자산 식별", "조직의 업무특성에 따라 정보자산 분류기준을 수립하여야 한다."],
    ["", "", "", "", "", ""],
    ["2", "2. 보호대책 요구사항", "2.1 정책, 조직, 자산 관리", " 2.1.1 ", "정책의 유지관리", "정보보호 및 개인정보보호 관련 정책과 시행문서는 정기적으로 타당성을 검토하여야 한다."],
];

pub const STANDARD_IDS: [&str; 4] = ["1.1.1", "1.1.2", "1.2.1", "2.1.1"];

/// Writes a catalog workbook: four title rows, the header row, then `rows`.
/// Empty strings are left as blank cells.
pub fn write_catalog(path: &Path, sheet: &str, rows: &[CatalogRow]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).expect("sheet name");
    worksheet
        .write_string(0, 0, "ISMS-P 인증기준 세부점검항목")
        .expect("title written");
    worksheet
        .write_string(2, 0, "한국인터넷진흥원")
        .expect("subtitle written");
    let header = ["구분", "대분류", "중분류", "항목", "항목명", "인증기준"];
    for (col, text) in header.iter().enumerate() {
        worksheet
            .write_string(4, col as u16, *text)
            .expect("header written");
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, text) in row.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            worksheet
                .write_string((row_idx + 5) as u32, col as u16, *text)
                .expect("cell written");
        }
    }
    workbook.save(path).expect("catalog saved");
}

pub fn standard_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("ISMS-P.xlsx");
    write_catalog(&path, CATALOG_SHEET, STANDARD_ROWS);
    path
}

/// Tracker over the standard excerpt with an empty in-memory store.
pub fn tracker(dir: &Path) -> Tracker {
    let catalog = CatalogSource::new(standard_catalog(dir), CATALOG_SHEET);
    let store = StatusStore::open_in_memory().expect("in-memory store");
    Tracker::new(catalog, Arc::new(store))
}

/// Roboto Medium (OFL); it covers Latin only.
pub fn font_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/RobotoMedium.ttf")
}
