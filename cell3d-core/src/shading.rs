/// Illumination to character-cell appearance lookup
///
/// The output surface only has a handful of colors and four block glyphs, so
/// brightness is approximated by pairing a background color, a foreground
/// color and a partially filled glyph.

/// Fill glyph drawn in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    Quarter,
    Half,
    ThreeQuarters,
    Solid,
}

impl Glyph {
    pub fn as_char(self) -> char {
        match self {
            Glyph::Quarter => '\u{2591}',
            Glyph::Half => '\u{2592}',
            Glyph::ThreeQuarters => '\u{2593}',
            Glyph::Solid => '\u{2588}',
        }
    }
}

/// Palette of the character-cell surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellColor {
    Black,
    DarkGrey,
    Grey,
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
}

/// One discrete brightness level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shade {
    pub level: u8,
    pub glyph: Glyph,
    pub foreground: CellColor,
    pub background: CellColor,
}

impl Shade {
    /// Number of distinct brightness levels
    pub const LEVELS: u8 = 13;

    /// Fully dark shade, also used for invalid illumination
    pub const DARK: Shade = Shade {
        level: 0,
        glyph: Glyph::Solid,
        foreground: CellColor::Black,
        background: CellColor::Black,
    };

    /// Map an illumination value in (0, 1] to a shade
    ///
    /// Values at or above 1.0 give the brightest shade; negative or NaN input
    /// gives [`Shade::DARK`].
    pub fn from_illumination(lum: f32) -> Self {
        // Also rejects NaN
        if !(lum >= 0.0) {
            return Self::DARK;
        }
        let bucket = (f32::from(Self::LEVELS) * lum) as u32;
        Self::from_level(bucket.min(u32::from(Self::LEVELS - 1)) as u8)
    }

    /// Shade for a bucket index; indices past the last level are dark
    pub fn from_level(level: u8) -> Self {
        let (background, foreground) = match level {
            1..=4 => (CellColor::Black, CellColor::DarkGrey),
            5..=8 => (CellColor::DarkGrey, CellColor::Grey),
            9..=12 => (CellColor::Grey, CellColor::White),
            _ => return Self::DARK,
        };
        let glyph = match (level - 1) % 4 {
            0 => Glyph::Quarter,
            1 => Glyph::Half,
            2 => Glyph::ThreeQuarters,
            _ => Glyph::Solid,
        };
        Self {
            level,
            glyph,
            foreground,
            background,
        }
    }

    /// Ordering key: higher is brighter
    pub fn brightness(&self) -> u8 {
        self.level
    }
}

impl Default for Shade {
    fn default() -> Self {
        Self::DARK
    }
}

/// Appearance token carried by every triangle
///
/// `tint` is an optional distinguishing draw color that replaces the shade's
/// foreground when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Appearance {
    pub shade: Shade,
    pub tint: Option<CellColor>,
}

impl Appearance {
    pub fn new(shade: Shade) -> Self {
        Self { shade, tint: None }
    }

    pub fn with_tint(self, tint: CellColor) -> Self {
        Self {
            tint: Some(tint),
            ..self
        }
    }

    pub fn glyph(&self) -> Glyph {
        self.shade.glyph
    }

    pub fn foreground(&self) -> CellColor {
        self.tint.unwrap_or(self.shade.foreground)
    }

    pub fn background(&self) -> CellColor {
        self.shade.background
    }
}
