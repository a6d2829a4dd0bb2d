//! Glyph advance widths used to wrap report text.
//!
//! Wrapping has to agree with the font the PDF is drawn in, so the metrics
//! come from the same source: the embedded TrueType face when one loads, the
//! Helvetica AFM widths otherwise.

use std::fmt;
use std::fs;
use std::path::Path;

use owned_ttf_parser::{AsFaceRef, GlyphId, OwnedFace};
use tracing::{debug, warn};

/// Helvetica advance widths (1/1000 em) for U+0020..=U+007E, from the
/// standard 14 font AFM file.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Upper bound used for Latin-1 supplement glyphs, whose widest Helvetica
/// glyph (`Æ`) is a full em.
const HELVETICA_LATIN1_MAX: u16 = 1000;

/// Advance of `?`, which replaces everything Helvetica cannot encode.
const HELVETICA_REPLACEMENT: u16 = 556;

/// Font the report is measured and drawn with.
pub enum FontMetrics {
    /// The built-in Helvetica. It only encodes Latin-1; other characters are
    /// drawn as `?`.
    Helvetica,
    /// A TrueType face embedded into the PDF.
    TrueType(TrueTypeFont),
}

impl FontMetrics {
    /// Loads the TrueType font at `path`. Falls back to Helvetica when no
    /// path is configured or the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            warn!(
                "no report font configured; falling back to Helvetica, Hangul text will not render"
            );
            return FontMetrics::Helvetica;
        };
        match TrueTypeFont::read(path) {
            Ok(font) => {
                debug!(font = %path.display(), "report font loaded");
                FontMetrics::TrueType(font)
            }
            Err(reason) => {
                warn!(
                    font = %path.display(),
                    error = %reason,
                    "falling back to Helvetica, Hangul text will not render"
                );
                FontMetrics::Helvetica
            }
        }
    }

    /// True when text is drawn with an embedded font and needs no
    /// substitution.
    pub fn is_embedded(&self) -> bool {
        matches!(self, FontMetrics::TrueType(_))
    }

    /// Advance width of `ch` in ems.
    pub fn advance_em(&self, ch: char) -> f32 {
        match self {
            FontMetrics::Helvetica => f32::from(helvetica_advance(ch)) / 1000.0,
            FontMetrics::TrueType(font) => font.advance_em(ch),
        }
    }
}

impl fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontMetrics::Helvetica => f.write_str("Helvetica"),
            FontMetrics::TrueType(font) => f
                .debug_struct("TrueType")
                .field("bytes", &font.bytes().len())
                .finish(),
        }
    }
}

fn helvetica_advance(ch: char) -> u16 {
    match ch as u32 {
        code @ 0x20..=0x7E => HELVETICA_ASCII[(code - 0x20) as usize],
        0xA0..=0xFF => HELVETICA_LATIN1_MAX,
        _ => HELVETICA_REPLACEMENT,
    }
}

/// A parsed TrueType face together with the raw bytes to embed.
pub struct TrueTypeFont {
    face: OwnedFace,
    units_per_em: f32,
    fallback_advance: f32,
}

impl TrueTypeFont {
    fn read(path: &Path) -> Result<Self, String> {
        let bytes = fs::read(path).map_err(|err| err.to_string())?;
        Self::from_bytes(bytes)
    }

    /// Parses a font from memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, String> {
        let face = OwnedFace::from_vec(bytes, 0).map_err(|err| err.to_string())?;
        let (units_per_em, fallback_advance) = {
            let face_ref = face.as_face_ref();
            let units = f32::from(face_ref.units_per_em().max(1));
            // Missing glyphs are drawn as .notdef.
            let notdef = face_ref
                .glyph_hor_advance(GlyphId(0))
                .map_or(units, f32::from);
            (units, notdef / units)
        };
        Ok(Self {
            face,
            units_per_em,
            fallback_advance,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        self.face.as_slice()
    }

    fn advance_em(&self, ch: char) -> f32 {
        let face = self.face.as_face_ref();
        face.glyph_index(ch)
            .and_then(|glyph| face.glyph_hor_advance(glyph))
            .map_or(self.fallback_advance, |advance| {
                f32::from(advance) / self.units_per_em
            })
    }
}
