//! Table layout for the compliance report.
//!
//! Layout is kept separate from PDF drawing: this module decides what text
//! goes into which cell, how each cell wraps, and which rows land on which
//! page. [`crate::io::pdf`] only paints the result.

pub mod metrics;

use crate::model::ReconciledItem;

pub use metrics::FontMetrics;

/// Landscape A4.
pub const PAGE_WIDTH_MM: f32 = 297.0;
pub const PAGE_HEIGHT_MM: f32 = 210.0;
pub const MARGIN_MM: f32 = 12.0;

pub const TITLE_FONT_PT: f32 = 14.0;
pub const HEADING_FONT_PT: f32 = 10.0;
pub const HEADER_FONT_PT: f32 = 8.0;
pub const BODY_FONT_PT: f32 = 7.0;
pub const FOOTER_FONT_PT: f32 = 7.0;

/// Vertical space reserved for the title on the first page.
pub const TITLE_BLOCK_MM: f32 = 10.0;
/// Vertical space reserved for the section heading on every page.
pub const HEADING_BLOCK_MM: f32 = 7.0;
/// Vertical space reserved at the bottom for the page number.
pub const FOOTER_BLOCK_MM: f32 = 6.0;
pub const CELL_PADDING_MM: f32 = 1.5;

/// Characters kept in the summary column before the ellipsis.
pub const SUMMARY_CHARS: usize = 20;

const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.25;

/// Columns of the report table, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportColumn {
    Id,
    Category,
    Requirement,
    Summary,
    Description,
    Evidence,
    Status,
    Tag,
}

impl ReportColumn {
    pub const ALL: [ReportColumn; 8] = [
        ReportColumn::Id,
        ReportColumn::Category,
        ReportColumn::Requirement,
        ReportColumn::Summary,
        ReportColumn::Description,
        ReportColumn::Evidence,
        ReportColumn::Status,
        ReportColumn::Tag,
    ];

    pub fn header(self) -> &'static str {
        match self {
            ReportColumn::Id => "번호",
            ReportColumn::Category => "분류",
            ReportColumn::Requirement => "인증 항목",
            ReportColumn::Summary => "요약",
            ReportColumn::Description => "운영 현황 (이행 내용)",
            ReportColumn::Evidence => "증적 자료명",
            ReportColumn::Status => "상태",
            ReportColumn::Tag => "구분",
        }
    }

    pub fn width_mm(self) -> f32 {
        match self {
            ReportColumn::Id => 14.0,
            ReportColumn::Category => 32.0,
            ReportColumn::Requirement => 66.0,
            ReportColumn::Summary => 30.0,
            ReportColumn::Description => 70.0,
            ReportColumn::Evidence => 30.0,
            ReportColumn::Status => 16.0,
            ReportColumn::Tag => 12.0,
        }
    }

    /// Width available to text inside a cell of this column.
    pub fn text_width_mm(self) -> f32 {
        self.width_mm() - 2.0 * CELL_PADDING_MM
    }

    /// Unwrapped text shown in this column for `item`.
    pub fn cell_text(self, item: &ReconciledItem) -> String {
        match self {
            ReportColumn::Id => item.id.clone(),
            ReportColumn::Category => join_nonempty(&item.main_category, &item.sub_category),
            ReportColumn::Requirement => join_nonempty(&item.title, &item.content),
            ReportColumn::Summary => summarize(&item.description, SUMMARY_CHARS),
            ReportColumn::Description => item.description.clone(),
            ReportColumn::Evidence => item.evidence_name.clone(),
            ReportColumn::Status => item.status.as_str().to_string(),
            ReportColumn::Tag => item.status.display_tag().to_string(),
        }
    }
}

/// Total width of the table.
pub fn table_width_mm() -> f32 {
    ReportColumn::ALL.iter().map(|column| column.width_mm()).sum()
}

/// A report ready for layout: a title plus one section per round.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: String, sections: Vec<ReportSection>) -> Self {
        Self { title, sections }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub heading: String,
    pub items: Vec<ReconciledItem>,
}

impl ReportSection {
    pub fn new(heading: String, items: Vec<ReconciledItem>) -> Self {
        Self { heading, items }
    }
}

/// One table row with every cell already wrapped into lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<Vec<String>>,
}

impl TableRow {
    fn from_texts(texts: &[String], font_pt: f32, metrics: &FontMetrics) -> Self {
        let cells = ReportColumn::ALL
            .iter()
            .zip(texts)
            .map(|(column, text)| wrap_text(text, column.text_width_mm(), font_pt, metrics))
            .collect();
        Self { cells }
    }

    pub fn line_count(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0).max(1)
    }

    pub fn height_mm(&self, font_pt: f32) -> f32 {
        row_height_mm(self.line_count(), font_pt)
    }

    /// Splits off the first `lines` lines of every cell. `self` keeps the rest.
    fn take_lines(&mut self, lines: usize) -> TableRow {
        let cells = self
            .cells
            .iter_mut()
            .map(|cell| {
                let keep = lines.min(cell.len());
                cell.drain(..keep).collect()
            })
            .collect();
        TableRow { cells }
    }
}

/// One physical page of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Report title; only set on the first page.
    pub title: Option<String>,
    pub heading: String,
    pub rows: Vec<TableRow>,
}

/// The report broken into pages.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub title: String,
    pub header: TableRow,
    pub pages: Vec<Page>,
}

/// Lays the report out on pages. Every section starts on a new page, the
/// header row repeats on each page, and rows taller than a page continue on
/// the next one. Text is wrapped with the advance widths of `metrics`.
pub fn layout(report: &Report, metrics: &FontMetrics) -> ReportLayout {
    let header_texts: Vec<String> = ReportColumn::ALL
        .iter()
        .map(|column| column.header().to_string())
        .collect();
    let header = TableRow::from_texts(&header_texts, HEADER_FONT_PT, metrics);
    let header_height = header.height_mm(HEADER_FONT_PT);

    let mut paginator = Paginator {
        pages: Vec::new(),
        title: Some(report.title.clone()),
        header_height,
    };

    if report.sections.is_empty() {
        paginator.start_page("저장된 기록이 없습니다".to_string());
    }

    for section in &report.sections {
        let mut remaining = paginator.start_page(section.heading.clone());
        for item in &section.items {
            let texts: Vec<String> = ReportColumn::ALL
                .iter()
                .map(|column| column.cell_text(item))
                .collect();
            let mut row = TableRow::from_texts(&texts, BODY_FONT_PT, metrics);
            let full_capacity = paginator.capacity(false);

            loop {
                let height = row.height_mm(BODY_FONT_PT);
                if height <= remaining {
                    paginator.push(row);
                    remaining -= height;
                    break;
                }
                if !paginator.current_is_empty() && height <= full_capacity {
                    remaining = paginator.start_page(section.heading.clone());
                    continue;
                }
                let fit = lines_fitting(remaining, BODY_FONT_PT);
                if fit == 0 && !paginator.current_is_empty() {
                    remaining = paginator.start_page(section.heading.clone());
                    continue;
                }
                let head = row.take_lines(fit.max(1));
                paginator.push(head);
                remaining = paginator.start_page(section.heading.clone());
            }
        }
    }

    ReportLayout {
        title: report.title.clone(),
        header,
        pages: paginator.pages,
    }
}

struct Paginator {
    pages: Vec<Page>,
    title: Option<String>,
    header_height: f32,
}

impl Paginator {
    /// Opens a new page and returns the table body height available on it.
    fn start_page(&mut self, heading: String) -> f32 {
        let title = self.title.take();
        let first = title.is_some();
        self.pages.push(Page {
            title,
            heading,
            rows: Vec::new(),
        });
        self.capacity(first)
    }

    fn capacity(&self, with_title: bool) -> f32 {
        let title = if with_title { TITLE_BLOCK_MM } else { 0.0 };
        PAGE_HEIGHT_MM
            - 2.0 * MARGIN_MM
            - FOOTER_BLOCK_MM
            - HEADING_BLOCK_MM
            - title
            - self.header_height
    }

    fn current_is_empty(&self) -> bool {
        self.pages.last().is_none_or(|page| page.rows.is_empty())
    }

    fn push(&mut self, row: TableRow) {
        if let Some(page) = self.pages.last_mut() {
            page.rows.push(row);
        }
    }
}

/// Height of one text line at the given font size.
pub fn line_height_mm(font_pt: f32) -> f32 {
    font_pt * PT_TO_MM * LINE_SPACING
}

pub fn row_height_mm(lines: usize, font_pt: f32) -> f32 {
    lines as f32 * line_height_mm(font_pt) + 2.0 * CELL_PADDING_MM
}

fn lines_fitting(height: f32, font_pt: f32) -> usize {
    let usable = height - 2.0 * CELL_PADDING_MM;
    if usable <= 0.0 {
        return 0;
    }
    (usable / line_height_mm(font_pt)).floor() as usize
}

/// Printed width of `text` in millimetres.
pub fn text_width_mm(text: &str, font_pt: f32, metrics: &FontMetrics) -> f32 {
    text.chars()
        .map(|ch| metrics.advance_em(ch) * font_pt * PT_TO_MM)
        .sum()
}

/// Wraps `text` so that no line is wider than `width_mm`. Explicit line
/// breaks are kept; lines break at the last space when there is one and
/// mid-word otherwise.
pub fn wrap_text(text: &str, width_mm: f32, font_pt: f32, metrics: &FontMetrics) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut line = String::new();
        let mut width = 0.0_f32;
        // Byte offset just past the last space in `line`, and the width up to it.
        let mut break_at: Option<(usize, f32)> = None;
        let mut wrapped = false;

        for ch in paragraph.chars() {
            let advance = metrics.advance_em(ch) * font_pt * PT_TO_MM;
            while width + advance > width_mm && !line.is_empty() {
                wrapped = true;
                match break_at.take() {
                    Some((offset, width_at)) if !ch.is_whitespace() && offset < line.len() => {
                        let rest = line.split_off(offset);
                        lines.push(line.trim_end().to_string());
                        line = rest;
                        width -= width_at;
                    }
                    _ => {
                        lines.push(line.trim_end().to_string());
                        line.clear();
                        width = 0.0;
                    }
                }
            }
            if wrapped && line.is_empty() && ch.is_whitespace() {
                continue;
            }
            line.push(ch);
            width += advance;
            if ch == ' ' {
                break_at = Some((line.len(), width));
            }
        }
        lines.push(line);
    }
    lines
}

/// Shortens `text` to `max_chars` characters, appending `...` when cut.
pub fn summarize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars).collect();
    short.push_str("...");
    short
}

fn join_nonempty(first: &str, second: &str) -> String {
    match (first.trim().is_empty(), second.trim().is_empty()) {
        (false, false) => format!("{first}\n{second}"),
        (false, true) => first.to_string(),
        (true, false) => second.to_string(),
        (true, true) => String::new(),
    }
}
