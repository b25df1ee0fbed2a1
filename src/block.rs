// block.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! GIF blocks written by the encoder
use crate::error::{Error, Result};
use pix::rgb::{Rgb, SRgb8};

/// Number of channels in a color table entry
const CHANNELS: usize = 3;

/// Maximum number of bits for a color table (256 entries)
const MAX_TABLE_BITS: u8 = 8;

/// Get the minimum number of bits needed to index `count` entries.
///
/// The result is never less than 1.  A `count` of 0 is not meaningful.
pub fn bit_width(count: usize) -> u8 {
    count.next_power_of_two().trailing_zeros().max(1) as u8
}

/// Block codes (signatures)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn signature(self) -> u8 {
        use self::BlockCode::*;
        match self {
            ImageDesc_ => b',', // (0x2C) Image separator
            Extension_ => b'!', // (0x21) Extension introducer
            Trailer_ => b';',   // (0x3B) GIF trailer
        }
    }
}

/// Extension codes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    GraphicControl_,
    Application_,
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            GraphicControl_ => 0xF9,
            Application_ => 0xFF,
        }
    }
}

/// Color table size configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    /// Number of bits per color index
    bits: u8,
}

impl ColorTableConfig {
    /// Create a config large enough for `n_colors` entries.
    pub fn new(n_colors: usize) -> Self {
        ColorTableConfig {
            bits: bit_width(n_colors),
        }
    }

    /// Get the number of bits per color index.
    pub fn len_bits(&self) -> u8 {
        self.bits
    }

    /// Get the number of table entries (always a power of two).
    pub fn n_entries(&self) -> usize {
        1 << self.bits
    }

    /// Get the table size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.n_entries() * CHANNELS
    }
}

/// GIF header (always version 89a)
#[derive(Debug, Default)]
pub struct Header {}

impl Header {
    /// Get the header bytes
    pub fn signature(&self) -> &'static [u8; 6] {
        b"GIF89a"
    }
}

/// Logical screen descriptor
#[derive(Debug, Default)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    /// Set flags for a global color table (full color resolution)
    pub fn with_color_table_config(mut self, tbl: &ColorTableConfig) -> Self {
        let size = (tbl.len_bits() - 1) & Self::COLOR_TABLE_SIZE;
        self.flags = Self::COLOR_TABLE_PRESENT | Self::COLOR_RESOLUTION | size;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    /// Background color index (always 0)
    pub fn background_color_idx(&self) -> u8 {
        0
    }
    /// Pixel aspect ratio (always 0, no aspect ratio given)
    pub fn pixel_aspect_ratio(&self) -> u8 {
        0
    }
}

/// Global color table, padded to a power of two entries
#[derive(Debug, PartialEq, Eq)]
pub struct GlobalColorTable {
    config: ColorTableConfig,
    colors: Vec<u8>,
}

impl GlobalColorTable {
    /// Create a color table from palette entries.
    ///
    /// Entries are written as RGB triples, followed by zeroed entries up to
    /// the table length.
    pub fn with_colors(colors: &[SRgb8]) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::EmptyPalette);
        }
        let config = ColorTableConfig::new(colors.len());
        if config.len_bits() > MAX_TABLE_BITS {
            return Err(Error::TooLargePalette(colors.len()));
        }
        let mut table = Vec::with_capacity(config.size_bytes());
        for clr in colors {
            table.push(u8::from(Rgb::red(*clr)));
            table.push(u8::from(Rgb::green(*clr)));
            table.push(u8::from(Rgb::blue(*clr)));
        }
        table.resize(config.size_bytes(), 0);
        Ok(GlobalColorTable {
            config,
            colors: table,
        })
    }
    pub fn config(&self) -> ColorTableConfig {
        self.config
    }
    pub fn size_bytes(&self) -> usize {
        self.colors.len()
    }
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
}

/// Graphic control extension (delay only)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphicControl {
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
}

impl GraphicControl {
    pub fn with_delay_time_cs(delay_time_cs: u16) -> Self {
        GraphicControl { delay_time_cs }
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
}

/// Netscape application extension for looping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Application {
    loop_count: u16, // zero means loop forever
}

impl Application {
    /// Application identifier and authentication code
    pub const APP_ID: &'static [u8; 11] = b"NETSCAPE2.0";

    pub fn with_loop_count(loop_count: u16) -> Self {
        Application { loop_count }
    }
    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }
}

/// Image descriptor (no local color table, never interlaced)
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
}

impl ImageDesc {
    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }
    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    /// Flags: no local color table, not interlaced
    pub fn flags(&self) -> u8 {
        0
    }
}

/// GIF trailer
#[derive(Debug, Default)]
pub struct Trailer {}
