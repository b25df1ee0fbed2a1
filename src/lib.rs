// lib.rs      gifanim crate.
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! A library for encoding palettized animations as GIF images.
//!
//! An [Animation] is a sequence of indexed [Frame]s sharing one palette.
//! [Encoder] writes it as a GIF89a stream, with a Netscape looping extension
//! when there is more than one frame.
//!
//! [Animation]: struct.Animation.html
//! [Encoder]: struct.Encoder.html
//! [Frame]: struct.Frame.html
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod encode;
mod error;
mod lzw;
mod private;

pub use crate::error::{Error, Result};
pub use crate::private::{Animation, Encoder, Frame};
