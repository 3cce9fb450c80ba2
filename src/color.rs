use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize, Serializer};

use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Colour value
// ---------------------------------------------------------------------------

/// An 8-bit sRGB colour, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub Srgb<u8>);

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Rgb(Srgb::new(red, green, blue))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0.red, self.0.green, self.0.blue)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Palettes
// ---------------------------------------------------------------------------

/// The six categorical colours used for tectonic regions.
const TABLEAU: [Rgb; 6] = [
    Rgb::new(0x1f, 0x77, 0xb4), // blue
    Rgb::new(0xff, 0x7f, 0x0e), // orange
    Rgb::new(0x2c, 0xa0, 0x2c), // green
    Rgb::new(0xd6, 0x27, 0x28), // red
    Rgb::new(0x94, 0x67, 0xbd), // purple
    Rgb::new(0x8c, 0x56, 0x4b), // brown
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    /// One evenly spaced hue per category.
    Spectrum,
    /// Fixed six-colour categorical palette, cycling.
    Tableau,
}

/// A bounded, ordered list of colours.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Palette of the given kind sized for `categories` entries.
    pub fn for_categories(kind: PaletteKind, categories: usize) -> Self {
        match kind {
            PaletteKind::Spectrum => Self::spectrum(categories),
            PaletteKind::Tableau => Self::tableau(),
        }
    }

    /// `n` visually distinct colours using evenly spaced hues.
    pub fn spectrum(n: usize) -> Self {
        let colors = (0..n)
            .map(|i| {
                let hue = (i as f32 / n as f32) * 360.0;
                let hsl = Hsl::new(hue, 0.75, 0.55);
                let rgb: Srgb = hsl.into_color();
                Rgb(rgb.into_format::<u8>())
            })
            .collect();
        Palette { colors }
    }

    pub fn tableau() -> Self {
        Palette {
            colors: TABLEAU.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index into the palette for the `order`-th category, cycling.
    pub fn index_for(&self, order: usize) -> usize {
        if self.colors.is_empty() {
            0
        } else {
            order % self.colors.len()
        }
    }

    pub fn color(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }
}

// ---------------------------------------------------------------------------
// Colour mapping: category value → palette entry
// ---------------------------------------------------------------------------

/// One category's assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub category: CellValue,
    pub color_index: usize,
    pub color: Option<Rgb>,
}

/// Maps categories, in draw order, to palette entries. Built per call from
/// the categories at hand; nothing is shared between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    entries: Vec<LegendEntry>,
}

impl ColorMap {
    /// Assign colours to `categories` in the order given. The order is the
    /// draw order, so callers pass first-seen order, not sorted order.
    pub fn new(categories: &[CellValue], palette: &Palette) -> Self {
        let entries = categories
            .iter()
            .enumerate()
            .map(|(order, category)| {
                let color_index = palette.index_for(order);
                LegendEntry {
                    category: category.clone(),
                    color_index,
                    color: palette.color(color_index),
                }
            })
            .collect();
        ColorMap { entries }
    }

    /// Legend entries in draw order.
    pub fn legend_entries(&self) -> &[LegendEntry] {
        &self.entries
    }
}
