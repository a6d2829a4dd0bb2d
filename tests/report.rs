mod common;

use isms_tracker::io::pdf;
use isms_tracker::model::{ItemStatus, ReconciledItem, RoundKey};
use isms_tracker::reconcile::SaveItem;
use isms_tracker::report::{
    self, BODY_FONT_PT, FontMetrics, MARGIN_MM, PAGE_WIDTH_MM, Report, ReportColumn,
    ReportSection, summarize, table_width_mm, text_width_mm, wrap_text,
};
use owned_ttf_parser::{AsFaceRef, OwnedFace};
use tempfile::tempdir;

const PT_TO_MM: f32 = 0.352_778;

fn reconciled(id: &str, description: &str, status: ItemStatus) -> ReconciledItem {
    ReconciledItem {
        id: id.to_string(),
        main_category: "1. 관리체계 수립 및 운영".into(),
        sub_category: "1.1 관리체계 기반 마련".into(),
        title: "경영진의 참여".into(),
        content: "최고경영자는 관리체계의 수립과 운영활동 전반에 참여하여야 한다.".into(),
        status,
        description: description.to_string(),
        evidence_name: "회의록".into(),
    }
}

fn single_section(items: Vec<ReconciledItem>) -> Report {
    Report::new(
        "ISMS-P 이행 현황 보고서".into(),
        vec![ReportSection::new("2025 최초".into(), items)],
    )
}

fn column_index(column: ReportColumn) -> usize {
    ReportColumn::ALL
        .iter()
        .position(|candidate| *candidate == column)
        .expect("column present")
}

/// Helvetica AFM advances for the glyphs used below, in 1/1000 em.
fn afm_width_mm(text: &str, font_pt: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|ch| match ch {
            ' ' => 278,
            'i' => 222,
            'l' => 222,
            'm' => 833,
            'w' => 722,
            'M' => 833,
            'W' => 944,
            other => panic!("no AFM width recorded for {other:?}"),
        })
        .sum();
    units as f32 / 1000.0 * font_pt * PT_TO_MM
}

/// Width measured straight from the font's hmtx table.
fn face_width_mm(face: &OwnedFace, text: &str, font_pt: f32) -> f32 {
    let face = face.as_face_ref();
    let units_per_em = f32::from(face.units_per_em());
    text.chars()
        .map(|ch| {
            let glyph = face.glyph_index(ch).expect("glyph present");
            let advance = face.glyph_hor_advance(glyph).expect("advance present");
            f32::from(advance) / units_per_em * font_pt * PT_TO_MM
        })
        .sum()
}

const WIDE_TEXTS: [&str; 4] = [
    "mmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmmm",
    "WWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWWW",
    "MMM www WWW mmm iii lll WWWWWWWWWW mmmmmmmmmm MW mw",
    "illi wWmM WWWW wwww MMMM mmmm iiii",
];

#[test]
fn table_fits_between_the_margins() {
    assert!(table_width_mm() <= PAGE_WIDTH_MM - 2.0 * MARGIN_MM);
}

#[test]
fn unbroken_text_breaks_mid_word_at_the_column_edge() {
    let width = ReportColumn::Evidence.text_width_mm();
    let text = "m".repeat(60);
    let lines = wrap_text(&text, width, BODY_FONT_PT, &FontMetrics::Helvetica);

    // 13 x 0.833 em at 7pt is 26.7mm; a 14th glyph would need 28.8mm.
    assert_eq!(lines[0], "m".repeat(13));
    assert_eq!(lines.concat(), text);
}

#[test]
fn latin_text_wraps_at_spaces() {
    let lines = wrap_text("alpha beta gamma", 15.0, BODY_FONT_PT, &FontMetrics::Helvetica);
    assert_eq!(lines, vec!["alpha beta", "gamma"]);
}

#[test]
fn explicit_line_breaks_are_kept() {
    let metrics = FontMetrics::Helvetica;
    assert_eq!(
        wrap_text("제목\n내용", 50.0, BODY_FONT_PT, &metrics),
        vec!["제목", "내용"]
    );
    assert_eq!(wrap_text("", 50.0, BODY_FONT_PT, &metrics), vec![""]);
}

#[test]
fn wide_glyphs_stay_inside_every_column_with_helvetica() {
    let metrics = FontMetrics::Helvetica;
    for column in ReportColumn::ALL {
        let width = column.text_width_mm();
        for text in WIDE_TEXTS {
            for line in wrap_text(text, width, BODY_FONT_PT, &metrics) {
                let measured = afm_width_mm(&line, BODY_FONT_PT);
                assert!(
                    measured <= width + 1e-3,
                    "{column:?}: {line:?} is {measured}mm in a {width}mm cell"
                );
            }
        }
    }
}

#[test]
fn wide_glyphs_stay_inside_every_column_with_embedded_font() {
    let font_path = common::font_fixture();
    let metrics = FontMetrics::load(Some(font_path.as_path()));
    assert!(metrics.is_embedded());
    let face = OwnedFace::from_vec(std::fs::read(&font_path).expect("font read"), 0)
        .expect("font parsed");

    for column in ReportColumn::ALL {
        let width = column.text_width_mm();
        for text in WIDE_TEXTS {
            let lines = wrap_text(text, width, BODY_FONT_PT, &metrics);
            for line in &lines {
                let measured = face_width_mm(&face, line, BODY_FONT_PT);
                assert!(
                    measured <= width + 1e-3,
                    "{column:?}: {line:?} is {measured}mm in a {width}mm cell"
                );
            }
            let rejoined: String = lines.concat().chars().filter(|c| *c != ' ').collect();
            let original: String = text.chars().filter(|c| *c != ' ').collect();
            assert_eq!(rejoined, original);
        }
    }
}

#[test]
fn wrapped_lines_never_exceed_the_column() {
    let text = "정보보호 정책 및 시행문서는 연 1회 이상 검토하고 변경 사항을 \
                CISO approval workflow 에 따라 승인받아야 한다. ReallyLongIdentifierWithoutAnySpaces";
    let width = 30.0;
    let metrics = FontMetrics::Helvetica;
    let lines = wrap_text(text, width, BODY_FONT_PT, &metrics);
    assert!(lines.len() > 1);
    for line in &lines {
        assert!(
            text_width_mm(line, BODY_FONT_PT, &metrics) <= width + 1e-3,
            "line too wide: {line}"
        );
    }
    let rejoined: String = lines.concat().chars().filter(|c| !c.is_whitespace()).collect();
    let original: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    assert_eq!(rejoined, original);
}

#[test]
fn summary_truncates_to_twenty_characters() {
    let long = "정".repeat(30);
    assert_eq!(summarize(&long, 20), format!("{}...", "정".repeat(20)));
    assert_eq!(summarize("짧은 설명", 20), "짧은 설명");
    assert_eq!(summarize("-", 20), "-");
}

#[test]
fn cells_show_both_summary_and_full_description() {
    let description = "정보보호위원회를 분기별로 개최하고 회의록을 보관함";
    let item = reconciled("1.1.1", description, ItemStatus::Completed);

    assert_eq!(ReportColumn::Description.cell_text(&item), description);
    assert_eq!(
        ReportColumn::Summary.cell_text(&item),
        summarize(description, report::SUMMARY_CHARS)
    );
    assert_eq!(
        ReportColumn::Requirement.cell_text(&item),
        "경영진의 참여\n최고경영자는 관리체계의 수립과 운영활동 전반에 참여하여야 한다."
    );
    assert_eq!(ReportColumn::Status.cell_text(&item), "작성완료");
    assert_eq!(ReportColumn::Tag.cell_text(&item), "완료");

    let pending = reconciled("1.1.2", "-", ItemStatus::Unwritten);
    assert_eq!(ReportColumn::Status.cell_text(&pending), "미작성");
    assert_eq!(ReportColumn::Tag.cell_text(&pending), "작업중");
}

#[test]
fn short_report_fits_on_one_page() {
    let items = vec![
        reconciled("1.1.1", "운영 중", ItemStatus::Completed),
        reconciled("1.1.2", "-", ItemStatus::Unwritten),
        reconciled("1.2.1", "-", ItemStatus::Unwritten),
    ];
    let layout = report::layout(&single_section(items), &FontMetrics::Helvetica);

    assert_eq!(layout.pages.len(), 1);
    let page = &layout.pages[0];
    assert_eq!(page.title.as_deref(), Some("ISMS-P 이행 현황 보고서"));
    assert_eq!(page.heading, "2025 최초");
    assert_eq!(page.rows.len(), 3);
    assert_eq!(layout.header.cells.len(), ReportColumn::ALL.len());
    assert_eq!(
        page.rows[0].cells[column_index(ReportColumn::Id)],
        vec!["1.1.1"]
    );
}

#[test]
fn many_rows_spill_onto_following_pages() {
    let items: Vec<ReconciledItem> = (1..=60)
        .map(|n| reconciled(&format!("1.{n}.1"), "운영 중", ItemStatus::Completed))
        .collect();
    let layout = report::layout(&single_section(items), &FontMetrics::Helvetica);

    assert!(layout.pages.len() > 1);
    let total_rows: usize = layout.pages.iter().map(|page| page.rows.len()).sum();
    assert_eq!(total_rows, 60);
    assert!(layout.pages[0].title.is_some());
    assert!(layout.pages[1..].iter().all(|page| page.title.is_none()));
    assert!(layout.pages.iter().all(|page| page.heading == "2025 최초"));
}

#[test]
fn oversized_row_is_split_without_losing_lines() {
    let description = "가".repeat(3000);
    let layout = report::layout(
        &single_section(vec![reconciled("1.1.1", &description, ItemStatus::Completed)]),
        &FontMetrics::Helvetica,
    );

    assert!(layout.pages.len() >= 2);
    let col = column_index(ReportColumn::Description);
    let rendered: Vec<String> = layout
        .pages
        .iter()
        .flat_map(|page| page.rows.iter())
        .flat_map(|row| row.cells[col].iter().cloned())
        .collect();
    let expected = wrap_text(
        &description,
        ReportColumn::Description.text_width_mm(),
        BODY_FONT_PT,
        &FontMetrics::Helvetica,
    );
    assert_eq!(rendered, expected);
}

#[test]
fn every_section_starts_a_new_page() {
    let report = Report::new(
        "전체".into(),
        vec![
            ReportSection::new(
                "2024 최초".into(),
                vec![reconciled("1.1.1", "a", ItemStatus::Completed)],
            ),
            ReportSection::new(
                "2025 최초".into(),
                vec![reconciled("1.1.1", "b", ItemStatus::Completed)],
            ),
        ],
    );
    let layout = report::layout(&report, &FontMetrics::Helvetica);

    let headings: Vec<&str> = layout.pages.iter().map(|page| page.heading.as_str()).collect();
    assert_eq!(headings, vec!["2024 최초", "2025 최초"]);
}

#[test]
fn empty_report_still_has_a_page() {
    let layout = report::layout(&Report::new("전체".into(), Vec::new()), &FontMetrics::Helvetica);
    assert_eq!(layout.pages.len(), 1);
    assert!(layout.pages[0].rows.is_empty());
}

#[test]
fn pdf_renders_with_fallback_font() {
    let temp_dir = tempdir().expect("temporary directory");
    let missing_font = temp_dir.path().join("NanumGothic.ttf");
    let metrics = FontMetrics::load(Some(missing_font.as_path()));
    assert!(!metrics.is_embedded());

    let items = vec![reconciled("1.1.1", "운영 중", ItemStatus::Completed)];
    let layout = report::layout(&single_section(items), &metrics);
    let bytes = pdf::render_pdf(&layout, &metrics).expect("rendered");
    assert!(bytes.starts_with(b"%PDF"));
    assert!(!contains(&bytes, b"FontFile2"));

    let metrics = FontMetrics::load(None);
    let bytes = pdf::render_pdf(&layout, &metrics).expect("rendered without font");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn pdf_embeds_the_configured_truetype_font() {
    let metrics = FontMetrics::load(Some(common::font_fixture().as_path()));
    assert!(metrics.is_embedded());

    let items = vec![
        reconciled(
            "1.1.1",
            "Information security committee meets quarterly",
            ItemStatus::Completed,
        ),
        reconciled("1.1.2", "-", ItemStatus::Unwritten),
    ];
    let layout = report::layout(&single_section(items), &metrics);
    let bytes = pdf::render_pdf(&layout, &metrics).expect("rendered");

    assert!(bytes.starts_with(b"%PDF"));
    assert!(contains(&bytes, b"FontFile2"));
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[test]
fn round_report_lists_the_whole_catalog() {
    let temp_dir = tempdir().expect("temporary directory");
    let tracker = common::tracker(temp_dir.path());
    let round = RoundKey::new("2025", "최초");
    tracker
        .save(&SaveItem {
            round: round.clone(),
            item_id: "1.2.1".into(),
            description: "자산 목록 갱신".into(),
            evidence_name: "자산 목록".into(),
        })
        .expect("save");

    let report = tracker.report(Some(&round)).expect("report");

    assert_eq!(report.sections.len(), 1);
    assert_eq!(report.sections[0].heading, "2025 최초");
    let ids: Vec<&str> = report.sections[0]
        .items
        .iter()
        .map(|item| item.id.as_str())
        .collect();
    assert_eq!(ids, common::STANDARD_IDS);
}

#[test]
fn full_report_has_one_section_per_stored_round() {
    let temp_dir = tempdir().expect("temporary directory");
    let tracker = common::tracker(temp_dir.path());
    let saves = [
        ("2025", "최초", "2.1.1"),
        ("2025", "최초", "1.1.1"),
        ("2025", "최초", "9.9.9"),
        ("2024", "최초", "1.1.2"),
    ];
    for (year, round, id) in saves {
        tracker
            .save(&SaveItem {
                round: RoundKey::new(year, round),
                item_id: id.into(),
                description: "d".into(),
                evidence_name: "e".into(),
            })
            .expect("save");
    }

    let report = tracker.report(None).expect("report");

    let headings: Vec<&str> = report
        .sections
        .iter()
        .map(|section| section.heading.as_str())
        .collect();
    assert_eq!(headings, vec!["2024 최초", "2025 최초"]);
    let ids: Vec<&str> = report.sections[1]
        .items
        .iter()
        .map(|item| item.id.as_str())
        .collect();
    // Catalog order first, orphans last.
    assert_eq!(ids, vec!["1.1.1", "2.1.1", "9.9.9"]);
    assert_eq!(report.sections[1].items[0].title, "경영진의 참여");
    assert!(report.sections[1].items[2].title.is_empty());
}
