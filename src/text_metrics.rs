use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static FONT_REGISTRY: Lazy<Mutex<FontRegistry>> = Lazy::new(|| Mutex::new(FontRegistry::new()));

/// Exact width of rendered text, supplied by whoever owns the fonts.
pub trait MeasureText {
    fn measure(&self, text: &str, font_size: f64) -> Option<f64>;
}

/// Measures with a system font resolved through `fontdb`.
#[derive(Debug, Clone)]
pub struct FontMeasurer {
    pub font_family: String,
}

impl FontMeasurer {
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
        }
    }
}

impl MeasureText for FontMeasurer {
    fn measure(&self, text: &str, font_size: f64) -> Option<f64> {
        measure_text_width(text, font_size, &self.font_family)
    }
}

pub fn measure_text_width(text: &str, font_size: f64, font_family: &str) -> Option<f64> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = FONT_REGISTRY.lock().ok()?;
    guard.measure(text, font_size as f32, font_family).map(f64::from)
}

/// Width guess used when nothing can be measured.
///
/// Two thirds of the font size per UTF-16 unit, plus one third for every
/// non-ASCII character, which accounts for wide scripts such as CJK.
pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    let units = text.encode_utf16().count() as f64;
    let wide = text.chars().filter(|ch| !ch.is_ascii()).count() as f64;
    font_size / 3.0 * (2.0 * units + wide)
}

/// Per-pass text width cache keyed by `(font size, text)`.
///
/// Only exact widths are stored: estimates are recomputed on every miss so a
/// later measurement always replaces them.
#[derive(Debug, Default)]
pub struct TextWidthCache {
    widths: HashMap<(u64, String), f64>,
}

impl TextWidthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&mut self, text: &str, font_size: f64, measurer: Option<&dyn MeasureText>) -> f64 {
        let key = (font_size.to_bits(), text.to_string());
        if let Some(width) = self.widths.get(&key).filter(|width| **width > 0.0) {
            return *width;
        }
        if let Some(width) = measurer.and_then(|m| m.measure(text, font_size)) {
            self.widths.insert(key, width);
            return width;
        }
        estimate_text_width(text, font_size)
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    pub fn clear(&mut self) {
        self.widths.clear();
    }
}

struct FontRegistry {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontFace>>,
}

impl FontRegistry {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let family_key = normalize_family_key(font_family);
        if !self.faces.contains_key(&family_key) {
            let face = self.load_face(font_family);
            if face.is_none() {
                log::debug!("no font face for {family_key:?}, falling back to estimates");
            }
            self.faces.insert(family_key.clone(), face);
        }
        let face = self.faces.get_mut(&family_key)?.as_mut()?;
        face.measure_width(text, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let names: Vec<&str> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\''))
            .filter(|name| !name.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                _ => Family::Name(name),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii_advances: [u16; 128],
    advance_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
            advance_cache: HashMap::new(),
        })
    }

    fn measure_width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * 0.56;
        let mut width = 0.0f32;

        if text.is_ascii() {
            for byte in text.bytes() {
                width += match self.ascii_advances[byte as usize] {
                    0 => fallback,
                    advance => advance as f32 * scale,
                };
            }
            return Some(width);
        }

        let face = Face::parse(&self.data, self.index).ok()?;
        for ch in text.chars() {
            let advance = *self.advance_cache.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            });
            width += match advance {
                Some(advance) => advance as f32 * scale,
                None => fallback,
            };
        }
        Some(width)
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_string()
    }
}
