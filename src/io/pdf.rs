use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Greyscale, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect,
};
use tracing::{debug, warn};

use crate::error::{Result, ToolError};
use crate::report::{
    BODY_FONT_PT, CELL_PADDING_MM, FOOTER_FONT_PT, FontMetrics, HEADER_FONT_PT, HEADING_BLOCK_MM,
    HEADING_FONT_PT, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, Page, ReportColumn, ReportLayout,
    TITLE_BLOCK_MM, TITLE_FONT_PT, TableRow, line_height_mm, table_width_mm,
};

const PT_TO_MM: f32 = 0.352_778;
const LAYER_NAME: &str = "table";

/// Font used for every string in the document.
struct ReportFont {
    font: IndirectFontRef,
    /// False when the built-in Helvetica fallback is in use; it can only
    /// encode Latin-1.
    embedded: bool,
}

impl ReportFont {
    /// Registers the font described by `metrics` with the document. An
    /// embedded face that printpdf rejects degrades to Helvetica.
    fn register(doc: &PdfDocumentReference, metrics: &FontMetrics) -> Result<Self> {
        if let FontMetrics::TrueType(face) = metrics {
            match doc.add_external_font(face.bytes()) {
                Ok(font) => {
                    return Ok(Self {
                        font,
                        embedded: true,
                    });
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        "font registration failed; falling back to Helvetica, Hangul text will not render"
                    );
                }
            }
        }
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| ToolError::Render(err.to_string()))?;
        Ok(Self {
            font,
            embedded: false,
        })
    }

    fn encode(&self, text: &str) -> String {
        encode_for(self.embedded, text)
    }
}

/// Text as it will be drawn: unchanged with an embedded font, otherwise with
/// everything outside Latin-1 replaced by `?`.
fn encode_for(embedded: bool, text: &str) -> String {
    if embedded {
        text.to_string()
    } else {
        text.chars()
            .map(|ch| if (ch as u32) < 0x100 { ch } else { '?' })
            .collect()
    }
}

/// Renders the laid-out report into PDF bytes.
///
/// `metrics` must be the font the layout was wrapped with.
pub fn render_pdf(layout: &ReportLayout, metrics: &FontMetrics) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        layout.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        LAYER_NAME,
    );
    let font = ReportFont::register(&doc, metrics)?;
    let total = layout.pages.len();

    for (idx, page) in layout.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if idx == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME)
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        draw_page(&layer, &font, &layout.header, page, idx + 1, total);
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|err| ToolError::Render(err.to_string()))?;
    debug!(page_count = total, byte_count = bytes.len(), "report rendered");
    Ok(bytes)
}

fn draw_page(
    layer: &PdfLayerReference,
    font: &ReportFont,
    header: &TableRow,
    page: &Page,
    number: usize,
    total: usize,
) {
    let mut top = PAGE_HEIGHT_MM - MARGIN_MM;

    if let Some(title) = &page.title {
        set_text_color(layer, 0.0);
        write_text(layer, font, title, TITLE_FONT_PT, MARGIN_MM, top - font_mm(TITLE_FONT_PT));
        top -= TITLE_BLOCK_MM;
    }

    set_text_color(layer, 0.0);
    write_text(
        layer,
        font,
        &page.heading,
        HEADING_FONT_PT,
        MARGIN_MM,
        top - font_mm(HEADING_FONT_PT),
    );
    top -= HEADING_BLOCK_MM;

    let header_height = header.height_mm(HEADER_FONT_PT);
    layer.set_fill_color(Color::Greyscale(Greyscale::new(0.5, None)));
    layer.add_rect(
        Rect::new(
            Mm(MARGIN_MM),
            Mm(top - header_height),
            Mm(MARGIN_MM + table_width_mm()),
            Mm(top),
        )
        .with_mode(PaintMode::Fill),
    );
    set_text_color(layer, 0.96);
    draw_row(layer, font, header, HEADER_FONT_PT, top);
    top -= header_height;

    set_text_color(layer, 0.0);
    for row in &page.rows {
        draw_row(layer, font, row, BODY_FONT_PT, top);
        top -= row.height_mm(BODY_FONT_PT);
    }

    write_text(
        layer,
        font,
        &format!("{number} / {total}"),
        FOOTER_FONT_PT,
        PAGE_WIDTH_MM / 2.0,
        MARGIN_MM / 2.0,
    );
}

/// Draws the cell borders and wrapped text of one row whose top edge sits at
/// `top`.
fn draw_row(layer: &PdfLayerReference, font: &ReportFont, row: &TableRow, font_pt: f32, top: f32) {
    let height = row.height_mm(font_pt);
    let bottom = top - height;
    let line_height = line_height_mm(font_pt);

    layer.set_outline_color(Color::Greyscale(Greyscale::new(0.0, None)));
    layer.set_outline_thickness(0.5);

    let mut left = MARGIN_MM;
    for (column, lines) in ReportColumn::ALL.iter().zip(&row.cells) {
        let right = left + column.width_mm();
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(left), Mm(bottom)), false),
                (Point::new(Mm(right), Mm(bottom)), false),
                (Point::new(Mm(right), Mm(top)), false),
                (Point::new(Mm(left), Mm(top)), false),
            ],
            is_closed: true,
        });

        let baseline = top - CELL_PADDING_MM - font_mm(font_pt);
        for (line_idx, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = baseline - line_idx as f32 * line_height;
            write_text(layer, font, line, font_pt, left + CELL_PADDING_MM, y);
        }
        left = right;
    }
}

fn write_text(
    layer: &PdfLayerReference,
    font: &ReportFont,
    text: &str,
    font_pt: f32,
    x: f32,
    y: f32,
) {
    layer.use_text(font.encode(text), font_pt, Mm(x), Mm(y), &font.font);
}

fn set_text_color(layer: &PdfLayerReference, grey: f32) {
    layer.set_fill_color(Color::Greyscale(Greyscale::new(grey, None)));
}

fn font_mm(font_pt: f32) -> f32 {
    font_pt * PT_TO_MM * 0.8
}
