// error.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
use std::fmt;
use std::io;
use std::num::TryFromIntError;

/// Errors encountered while encoding
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error from the output writer.
    Io(io::Error),
    /// Integer out of bounds.
    TryFromInt(TryFromIntError),
    /// [Animation](struct.Animation.html) has no frames.
    NoFrames,
    /// Logical screen larger than 65535 pixels in either dimension.
    TooLargeScreen {
        /// Required screen width
        width: u32,
        /// Required screen height
        height: u32,
    },
    /// Palette has no colors.
    EmptyPalette,
    /// Palette has more than 256 colors.
    TooLargePalette(usize),
    /// Frame palette differs from the global color table.
    DifferentPalettes,
    /// Color index outside of the LZW literal range.
    InvalidColorIndex(u8),
    /// Frame pixel buffer too small for its dimensions, or crop region
    /// outside of the frame.
    InvalidFrameDimensions,
    /// Sub-block writer was already closed.
    AlreadyClosed,
}

/// Gifanim result type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::TryFromInt(err) => err.fmt(fmt),
            Error::NoFrames => write!(fmt, "zero images"),
            Error::TooLargeScreen { width, height } => {
                write!(fmt, "logical size too large: ({width},{height})")
            }
            Error::TooLargePalette(len) => {
                write!(fmt, "palette too large: {len}")
            }
            Error::DifferentPalettes => {
                write!(fmt, "different palettes not implemented")
            }
            Error::AlreadyClosed => write!(fmt, "already closed"),
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::TryFromInt(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<TryFromIntError> for Error {
    fn from(err: TryFromIntError) -> Self {
        Error::TryFromInt(err)
    }
}
