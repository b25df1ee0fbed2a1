// private.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Private module for top-level items
use crate::{encode, Error, Result};
use pix::{gray::Gray8, Palette, Raster};
use std::io::Write;

/// One frame of an animation.
///
/// A frame is a rectangle of palette indices, stored row-major.  The row
/// stride may be larger than the frame width, so a frame can be a view into
/// a larger buffer (see [crop]).
///
/// [crop]: struct.Frame.html#method.crop
#[derive(Clone)]
pub struct Frame {
    /// Left position on logical screen
    left: u16,
    /// Top position on logical screen
    top: u16,
    /// Width in pixels
    width: u16,
    /// Height in pixels
    height: u16,
    /// Distance between rows in pixel buffer
    stride: usize,
    /// Offset of top-left pixel in pixel buffer
    start: usize,
    /// Pixel buffer (palette indices)
    pixels: Vec<u8>,
    /// Palette for the frame
    palette: Palette,
    /// Delay time in centiseconds
    delay_time_cs: u16,
}

/// An animation: a sequence of frames sharing one palette.
#[derive(Clone, Default)]
pub struct Animation {
    /// All frames, in display order
    frames: Vec<Frame>,
    /// Number of times to loop (zero means loop forever)
    loop_count: u16,
}

impl Frame {
    /// Create a frame with all pixels set to index 0.
    pub fn new(width: u16, height: u16, palette: Palette) -> Self {
        let stride = usize::from(width);
        let pixels = vec![0; stride * usize::from(height)];
        Frame {
            left: 0,
            top: 0,
            width,
            height,
            stride,
            start: 0,
            pixels,
            palette,
            delay_time_cs: 0,
        }
    }

    /// Create a frame from a buffer of palette indices.
    ///
    /// * `stride`: distance between the start of each row in `pixels`.
    pub fn with_pixels(
        pixels: Vec<u8>,
        stride: usize,
        width: u16,
        height: u16,
        palette: Palette,
    ) -> Result<Self> {
        let required = match height {
            0 => Some(0),
            _ => stride
                .checked_mul(usize::from(height) - 1)
                .and_then(|n| n.checked_add(usize::from(width))),
        };
        let required = required.ok_or(Error::InvalidFrameDimensions)?;
        if stride < usize::from(width) || pixels.len() < required {
            return Err(Error::InvalidFrameDimensions);
        }
        Ok(Frame {
            left: 0,
            top: 0,
            width,
            height,
            stride,
            start: 0,
            pixels,
            palette,
            delay_time_cs: 0,
        })
    }

    /// Create a frame from an indexed raster.
    pub fn with_raster(
        raster: &Raster<Gray8>,
        palette: Palette,
    ) -> Result<Self> {
        let width = u16::try_from(raster.width())?;
        let height = u16::try_from(raster.height())?;
        let pixels = raster.as_u8_slice().to_vec();
        Frame::with_pixels(pixels, usize::from(width), width, height, palette)
    }

    /// Adjust the position on the logical screen.
    pub fn with_position(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    /// Adjust the delay time (centiseconds).
    ///
    /// A zero delay omits the graphic control extension for the frame.
    pub fn with_delay_time_cs(mut self, delay: u16) -> Self {
        self.delay_time_cs = delay;
        self
    }

    /// Crop to a region of the frame, sharing the pixel buffer.
    ///
    /// The region is in logical screen coordinates, and must be contained
    /// within the frame.
    pub fn crop(
        mut self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
    ) -> Result<Self> {
        let right = u32::from(left) + u32::from(width);
        let bottom = u32::from(top) + u32::from(height);
        let (far_right, far_bottom) = self.far_corner();
        if left < self.left
            || top < self.top
            || right > far_right
            || bottom > far_bottom
        {
            return Err(Error::InvalidFrameDimensions);
        }
        self.start += usize::from(top - self.top) * self.stride
            + usize::from(left - self.left);
        self.left = left;
        self.top = top;
        self.width = width;
        self.height = height;
        Ok(self)
    }

    /// Get the left position
    pub fn left(&self) -> u16 {
        self.left
    }

    /// Get the top position
    pub fn top(&self) -> u16 {
        self.top
    }

    /// Get the width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Get the height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Get the row stride
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Get the palette
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Get the delay time in centiseconds
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }

    /// Get the far (bottom-right) corner on the logical screen
    fn far_corner(&self) -> (u32, u32) {
        (
            u32::from(self.left) + u32::from(self.width),
            u32::from(self.top) + u32::from(self.height),
        )
    }

    /// Get one row of pixels, relative to the frame top.
    ///
    /// # Panics
    ///
    /// Panics if `y` is not less than the frame height.
    pub fn row(&self, y: u16) -> &[u8] {
        assert!(y < self.height);
        let start = self.start + usize::from(y) * self.stride;
        &self.pixels[start..start + usize::from(self.width)]
    }

    /// Get an iterator of all rows of pixels
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Get a mutable pixel, relative to the frame top-left.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is outside of the frame.
    pub fn pixel_mut(&mut self, x: u16, y: u16) -> &mut u8 {
        assert!(x < self.width && y < self.height);
        let i = self.start + usize::from(y) * self.stride + usize::from(x);
        &mut self.pixels[i]
    }
}

impl Animation {
    /// Create a new, empty animation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust the loop count (zero means loop forever).
    ///
    /// Only used when there is more than one frame.
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Add a frame.
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Add a frame.
    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Get all frames
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get the loop count
    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    /// Get the logical screen size needed to contain all frames.
    ///
    /// This can exceed the GIF limit of 65535 in either dimension.
    pub fn screen_size(&self) -> (u32, u32) {
        self.frames.iter().map(Frame::far_corner).fold(
            (0, 0),
            |(width, height), (w, h)| (width.max(w), height.max(h)),
        )
    }
}

/// GIF animation encoder
///
/// ## Encoding Example
/// ```
/// use gifanim::{Animation, Encoder, Frame};
/// use pix::{Palette, rgb::SRgb8};
/// use std::error::Error;
/// use std::io::Write;
///
/// fn encode<W: Write>(mut w: W) -> Result<(), Box<dyn Error>> {
///     let mut palette = Palette::new(2);
///     palette.set_entry(SRgb8::new(0xFF, 0, 0));
///     palette.set_entry(SRgb8::new(0xFF, 0xFF, 0));
///     let mut frame = Frame::new(4, 4, palette.clone());
///     *frame.pixel_mut(1, 1) = 1;
///     let mut next = Frame::new(4, 4, palette).with_delay_time_cs(50);
///     *next.pixel_mut(2, 2) = 1;
///     let animation = Animation::new()
///         .with_frame(frame.with_delay_time_cs(50))
///         .with_frame(next);
///     Encoder::new(&mut w).encode(&animation)?;
///     Ok(())
/// }
/// ```
pub struct Encoder<W: Write> {
    /// Writer for output data
    writer: W,
}

impl<W: Write> Encoder<W> {
    /// Create a new GIF encoder.
    ///
    /// The writer is used unbuffered; wrap it in a `BufWriter` if needed.
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    /// Encode an animation as a complete GIF.
    ///
    /// On error, any bytes already written are left in place.
    pub fn encode(self, animation: &Animation) -> Result<()> {
        encode::AnimationEnc::new(self.writer).encode(animation)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pix::rgb::SRgb8;

    const LOOP_EXT: &[u8] = &[
        0x21, 0xFF, 0x0B, b'N', b'E', b'T', b'S', b'C', b'A', b'P', b'E', b'2',
        b'.', b'0', 0x03, 0x01,
    ];

    fn black_white() -> Palette {
        let mut palette = Palette::new(2);
        palette.set_entry(SRgb8::new(0, 0, 0));
        palette.set_entry(SRgb8::new(0xFF, 0xFF, 0xFF));
        palette
    }

    fn encode(animation: &Animation) -> Result<Vec<u8>> {
        let mut out = vec![];
        Encoder::new(&mut out).encode(animation)?;
        Ok(out)
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    /// Decoded frame: rectangle, delay and pixel indices
    #[derive(Debug, PartialEq)]
    struct Decoded {
        rect: (u16, u16, u16, u16),
        delay: u16,
        pixels: Vec<u8>,
    }

    fn decode(data: &[u8]) -> ((u16, u16), Vec<u8>, Vec<Decoded>) {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(data).unwrap();
        let size = (decoder.width(), decoder.height());
        let palette = decoder.global_palette().unwrap().to_vec();
        let mut frames = vec![];
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            frames.push(Decoded {
                rect: (frame.left, frame.top, frame.width, frame.height),
                delay: frame.delay,
                pixels: frame.buffer.to_vec(),
            });
        }
        (size, palette, frames)
    }

    fn frame_pixels(frame: &Frame) -> Vec<u8> {
        frame.rows().flatten().copied().collect()
    }

    #[test]
    fn single_black_pixel() {
        let mut palette = Palette::new(1);
        palette.set_entry(SRgb8::new(0, 0, 0));
        let animation = Animation::new().with_frame(Frame::new(1, 1, palette));
        let gif = encode(&animation).unwrap();
        assert_eq!(gif, [
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // signature
            0x01, 0x00, 0x01, 0x00, 0xF0, 0x00, 0x00, // screen desc
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // global color table
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02,
            0x01, 0x28, 0x00, // image data
            0x3B, // trailer
        ]);
        let (size, palette, frames) = decode(&gif);
        assert_eq!(size, (1, 1));
        assert_eq!(&palette[..3], &[0, 0, 0]);
        assert_eq!(frames, vec![Decoded {
            rect: (0, 0, 1, 1),
            delay: 0,
            pixels: vec![0],
        }]);
    }

    #[test]
    fn two_frame_loop() {
        let mut a = Frame::new(2, 1, black_white()).with_delay_time_cs(10);
        *a.pixel_mut(1, 0) = 1;
        let mut b = Frame::new(2, 1, black_white()).with_delay_time_cs(20);
        *b.pixel_mut(0, 0) = 1;
        let animation = Animation::new()
            .with_loop_count(0xCAFE)
            .with_frame(a)
            .with_frame(b);
        let gif = encode(&animation).unwrap();
        assert_eq!(&gif[..6], b"GIF89a");
        assert_eq!(&gif[6..13], &[0x02, 0x00, 0x01, 0x00, 0xF0, 0x00, 0x00]);
        assert_eq!(&gif[13..19], &[0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&gif[19..35], LOOP_EXT);
        assert_eq!(&gif[35..38], &[0xFE, 0xCA, 0x00]);
        assert_eq!(&gif[38..46], &[0x21, 0xF9, 0x04, 0x00, 10, 0, 0, 0]);
        assert_eq!(gif.last(), Some(&0x3B));
        let (size, palette, frames) = decode(&gif);
        assert_eq!(size, (2, 1));
        assert_eq!(palette, [0, 0, 0, 0xFF, 0xFF, 0xFF]);
        assert_eq!(frames, vec![
            Decoded {
                rect: (0, 0, 2, 1),
                delay: 10,
                pixels: vec![0, 1],
            },
            Decoded {
                rect: (0, 0, 2, 1),
                delay: 20,
                pixels: vec![1, 0],
            },
        ]);
    }

    #[test]
    fn loop_extension_only_for_animations() {
        let frame = Frame::new(3, 3, black_white());
        let still = Animation::new().with_frame(frame.clone());
        assert!(!contains(&encode(&still).unwrap(), b"NETSCAPE2.0"));
        let anim = still.with_frame(frame);
        let gif = encode(&anim).unwrap();
        assert!(contains(&gif, LOOP_EXT));
    }

    #[test]
    fn zero_frames() {
        let mut out = vec![];
        match Encoder::new(&mut out).encode(&Animation::new()) {
            Err(Error::NoFrames) => (),
            r => panic!("unexpected {:?}", r),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn different_palettes() {
        let mut other = Palette::new(2);
        other.set_entry(SRgb8::new(0, 0, 0));
        other.set_entry(SRgb8::new(0xFF, 0, 0));
        let animation = Animation::new()
            .with_frame(Frame::new(2, 2, black_white()))
            .with_frame(Frame::new(2, 2, other));
        match encode(&animation) {
            Err(Error::DifferentPalettes) => (),
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn empty_palette() {
        let animation =
            Animation::new().with_frame(Frame::new(1, 1, Palette::new(4)));
        match encode(&animation) {
            Err(Error::EmptyPalette) => (),
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn screen_too_large() {
        let frame = Frame::new(2, 2, black_white()).with_position(65534, 0);
        let animation = Animation::new().with_frame(frame);
        assert_eq!(animation.screen_size(), (65536, 2));
        let mut out = vec![];
        match Encoder::new(&mut out).encode(&animation) {
            Err(Error::TooLargeScreen {
                width: 65536,
                height: 2,
            }) => (),
            r => panic!("unexpected {:?}", r),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn largest_screen() {
        let frame = Frame::new(1, 1, black_white()).with_position(65534, 65534);
        let animation = Animation::new().with_frame(frame);
        assert_eq!(animation.screen_size(), (65535, 65535));
        let out = encode(&animation).unwrap();
        assert_eq!(&out[6..10], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(out.last(), Some(&0x3B));
    }

    #[test]
    fn palette_too_large() {
        let mut palette = Palette::new(257);
        for i in 0..257u16 {
            let [lo, hi] = i.to_le_bytes();
            palette.set_entry(SRgb8::new(lo, hi, 0));
        }
        assert_eq!(palette.len(), 257);
        let animation = Animation::new().with_frame(Frame::new(1, 1, palette));
        let mut out = vec![];
        match Encoder::new(&mut out).encode(&animation) {
            Err(Error::TooLargePalette(257)) => (),
            r => panic!("unexpected {:?}", r),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn invalid_color_index() {
        let mut frame = Frame::new(2, 2, black_white());
        *frame.pixel_mut(1, 1) = 4;
        let animation = Animation::new().with_frame(frame);
        match encode(&animation) {
            Err(Error::InvalidColorIndex(4)) => (),
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn index_beyond_palette() {
        // index 3 is a padding entry of a 2-bit table
        let mut palette = Palette::new(3);
        palette.set_entry(SRgb8::new(1, 1, 1));
        palette.set_entry(SRgb8::new(2, 2, 2));
        palette.set_entry(SRgb8::new(3, 3, 3));
        let mut frame = Frame::new(2, 1, palette);
        *frame.pixel_mut(0, 0) = 3;
        let gif = encode(&Animation::new().with_frame(frame)).unwrap();
        let (_, palette, frames) = decode(&gif);
        assert_eq!(palette, [1, 1, 1, 2, 2, 2, 3, 3, 3, 0, 0, 0]);
        assert_eq!(frames[0].pixels, [3, 0]);
    }

    #[test]
    fn strided_frames() {
        // 6x4 backing buffer, two cropped 3x2 frames
        let pixels: Vec<u8> = (0..24).map(|i| (i % 7) as u8).collect();
        let palette = {
            let mut p = Palette::new(8);
            for i in 0..8u8 {
                p.set_entry(SRgb8::new(i * 30, i, 255 - i));
            }
            p
        };
        let full = Frame::with_pixels(pixels, 6, 6, 4, palette).unwrap();
        let a = full.clone().crop(0, 0, 3, 2).unwrap();
        let b = full.clone().crop(3, 2, 3, 2).unwrap().with_delay_time_cs(5);
        assert_eq!(a.row(1), &[6, 0, 1]);
        assert_eq!(b.row(0), &[1, 2, 3]);
        let animation = Animation::new()
            .with_frame(full.clone())
            .with_frame(a.clone())
            .with_frame(b.clone());
        let gif = encode(&animation).unwrap();
        let (size, _, frames) = decode(&gif);
        assert_eq!(size, (6, 4));
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].pixels, frame_pixels(&full));
        assert_eq!(frames[1].rect, (0, 0, 3, 2));
        assert_eq!(frames[1].pixels, frame_pixels(&a));
        assert_eq!(frames[2].rect, (3, 2, 3, 2));
        assert_eq!(frames[2].delay, 5);
        assert_eq!(frames[2].pixels, frame_pixels(&b));
    }

    #[test]
    fn invalid_dimensions() {
        assert!(matches!(
            Frame::with_pixels(vec![0; 5], 3, 3, 2, black_white()),
            Err(Error::InvalidFrameDimensions)
        ));
        assert!(matches!(
            Frame::with_pixels(vec![0; 6], 2, 3, 2, black_white()),
            Err(Error::InvalidFrameDimensions)
        ));
        assert!(matches!(
            Frame::with_pixels(
                vec![0; 4],
                usize::MAX / 2 + 1,
                1,
                3,
                black_white()
            ),
            Err(Error::InvalidFrameDimensions)
        ));
        let frame = Frame::new(4, 4, black_white()).with_position(2, 2);
        assert!(matches!(
            frame.clone().crop(1, 2, 2, 2),
            Err(Error::InvalidFrameDimensions)
        ));
        assert!(matches!(
            frame.crop(4, 4, 3, 1),
            Err(Error::InvalidFrameDimensions)
        ));
    }

    #[test]
    fn raster_frame() {
        let mut raster = Raster::<Gray8>::with_clear(3, 2);
        *raster.pixel_mut(2, 1) = Gray8::new(1);
        let frame = Frame::with_raster(&raster, black_white()).unwrap();
        assert_eq!(frame_pixels(&frame), [0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn large_animation() {
        // large enough for many sub-blocks and dictionary resets
        let palette = {
            let mut p = Palette::new(256);
            for i in 0..=255u8 {
                p.set_entry(SRgb8::new(i, 255 - i, i / 2));
            }
            p
        };
        let mut animation = Animation::new().with_loop_count(3);
        for f in 0..3u32 {
            let pixels: Vec<u8> = (0..200 * 150u32)
                .map(|i| (i.wrapping_mul(2_654_435_761) >> (8 + f)) as u8)
                .collect();
            let frame =
                Frame::with_pixels(pixels, 200, 200, 150, palette.clone())
                    .unwrap()
                    .with_delay_time_cs(7);
            animation.push_frame(frame);
        }
        let gif = encode(&animation).unwrap();
        let (size, _, frames) = decode(&gif);
        assert_eq!(size, (200, 150));
        assert_eq!(frames.len(), 3);
        for (decoded, frame) in frames.iter().zip(animation.frames()) {
            assert_eq!(decoded.pixels, frame_pixels(frame));
            assert_eq!(decoded.delay, 7);
        }
    }
}
