// main.rs      gifanim command
//
// Copyright (c) 2019-2026  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{crate_version, App, Arg, ArgMatches};
use gifanim::{Animation, Encoder, Frame};
use pix::{rgb::SRgb8, Palette};
use std::error::Error;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Pixel character for palette index 0
const START_CHAR: u8 = b'!';

/// Errors in a movie file (with line numbers)
#[derive(Debug)]
enum MovieError {
    /// Color is not 6 hex digits
    InvalidColor(usize),
    /// Palette has more than 256 colors
    TooManyColors(usize),
    /// Pixel row before any palette
    MissingPalette(usize),
    /// Pixel character not in palette
    InvalidPixel(usize),
    /// Row length differs from previous rows of frame
    UnevenRow(usize),
    /// Frame larger than 65535 pixels
    TooLargeFrame(usize),
}

impl fmt::Display for MovieError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use MovieError::*;
        match self {
            InvalidColor(n) => write!(fmt, "line {n}: invalid color"),
            TooManyColors(n) => write!(fmt, "line {n}: too many colors"),
            MissingPalette(n) => write!(fmt, "line {n}: no palette"),
            InvalidPixel(n) => write!(fmt, "line {n}: pixel out of range"),
            UnevenRow(n) => write!(fmt, "line {n}: wrong row length"),
            TooLargeFrame(n) => write!(fmt, "line {n}: frame too large"),
        }
    }
}

impl Error for MovieError {}

/// Pixel rows of a frame being parsed
#[derive(Default)]
struct Rows {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl Rows {
    /// Add one row of pixel characters
    fn push_row(
        &mut self,
        line: &str,
        n_colors: usize,
        number: usize,
    ) -> Result<(), MovieError> {
        if self.height > 0 && line.len() != self.width {
            return Err(MovieError::UnevenRow(number));
        }
        for b in line.bytes() {
            if !b.is_ascii_graphic() || usize::from(b - START_CHAR) >= n_colors
            {
                return Err(MovieError::InvalidPixel(number));
            }
            self.pixels.push(b - START_CHAR);
        }
        self.width = line.len();
        self.height += 1;
        Ok(())
    }

    /// Take the rows as a frame, if there are any
    fn take_frame(
        &mut self,
        palette: Option<&Palette>,
        number: usize,
    ) -> Result<Option<Frame>, Box<dyn Error>> {
        if self.height == 0 {
            return Ok(None);
        }
        let palette = palette.ok_or(MovieError::MissingPalette(number))?;
        let too_large = |_| MovieError::TooLargeFrame(number);
        let width = u16::try_from(self.width).map_err(too_large)?;
        let height = u16::try_from(self.height).map_err(too_large)?;
        let pixels = std::mem::take(&mut self.pixels);
        self.width = 0;
        self.height = 0;
        let stride = usize::from(width);
        let frame =
            Frame::with_pixels(pixels, stride, width, height, palette.clone())?;
        Ok(Some(frame))
    }
}

/// Parse a palette line (hex RGB colors)
fn parse_palette(colors: &str, number: usize) -> Result<Palette, MovieError> {
    let colors = colors
        .split_whitespace()
        .map(|clr| parse_color(clr, number))
        .collect::<Result<Vec<_>, _>>()?;
    if colors.len() > 256 {
        return Err(MovieError::TooManyColors(number));
    }
    // set_entry merges equal colors, so reserve distinct slots first
    let mut palette = Palette::new(colors.len());
    for i in 0..colors.len() {
        palette.set_entry(SRgb8::new(i as u8, 0, 0));
    }
    for (i, clr) in colors.into_iter().enumerate() {
        palette.replace_entry(i, clr);
    }
    Ok(palette)
}

/// Parse one hex RGB color
fn parse_color(clr: &str, number: usize) -> Result<SRgb8, MovieError> {
    if clr.len() != 6 {
        return Err(MovieError::InvalidColor(number));
    }
    let rgb = u32::from_str_radix(clr, 16)
        .map_err(|_| MovieError::InvalidColor(number))?;
    let [_, red, green, blue] = rgb.to_be_bytes();
    Ok(SRgb8::new(red, green, blue))
}

/// Parse a movie file.
///
/// * `palette RRGGBB RRGGBB ...` sets the palette
/// * Rows of pixel characters (`!` is index 0, `"` index 1, etc.)
/// * A blank line ends a frame
/// * Lines starting with `# ` are comments
fn parse_movie(text: &str, delay: u16) -> Result<Animation, Box<dyn Error>> {
    let mut animation = Animation::new();
    let mut palette = None;
    let mut rows = Rows::default();
    let mut number = 0;
    for line in text.lines() {
        number += 1;
        let line = line.trim_end();
        if line.is_empty() {
            if let Some(frame) = rows.take_frame(palette.as_ref(), number)? {
                animation.push_frame(frame.with_delay_time_cs(delay));
            }
        } else if line.starts_with("# ") {
            continue;
        } else if let Some(colors) = line.strip_prefix("palette ") {
            palette = Some(parse_palette(colors, number)?);
        } else {
            let n_colors = palette
                .as_ref()
                .map(Palette::len)
                .ok_or(MovieError::MissingPalette(number))?;
            rows.push_row(line, n_colors, number)?;
        }
    }
    if let Some(frame) = rows.take_frame(palette.as_ref(), number)? {
        animation.push_frame(frame.with_delay_time_cs(delay));
    }
    Ok(animation)
}

/// Encode a movie file as a GIF
fn encode(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = Path::new(matches.value_of("movie").unwrap_or_default());
    let delay: u16 = matches.value_of("delay").unwrap_or("10").parse()?;
    let loop_count: u16 = matches.value_of("loop").unwrap_or("0").parse()?;
    let output = match matches.value_of("output") {
        Some(output) => PathBuf::from(output),
        None => path.with_extension("gif"),
    };
    let text = fs::read_to_string(path)?;
    let animation = parse_movie(&text, delay)?.with_loop_count(loop_count);
    log::info!(
        "{}: {} frame(s) -> {}",
        path.display(),
        animation.frames().len(),
        output.display()
    );
    let writer = BufWriter::new(File::create(&output)?);
    Encoder::new(writer).encode(&animation)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let matches = App::new("gifanim")
        .version(crate_version!())
        .about("Encode a text movie as an animated GIF")
        .arg(
            Arg::with_name("movie")
                .required(true)
                .help("Movie file to encode"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("Output GIF file (default: movie with .gif extension)"),
        )
        .arg(
            Arg::with_name("delay")
                .short("d")
                .long("delay")
                .takes_value(true)
                .default_value("10")
                .help("Delay between frames, in centiseconds"),
        )
        .arg(
            Arg::with_name("loop")
                .short("l")
                .long("loop")
                .takes_value(true)
                .default_value("0")
                .help("Number of times to loop (0 for forever)"),
        )
        .get_matches();
    if let Err(err) = encode(&matches) {
        let mut out = StandardStream::stderr(ColorChoice::Auto);
        let mut red = ColorSpec::new();
        red.set_fg(Some(Color::Red)).set_intense(true);
        out.set_color(&red)?;
        writeln!(out, "error: {}", err)?;
        out.reset()?;
        std::process::exit(1);
    }
    Ok(())
}
