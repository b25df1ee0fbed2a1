// encode.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
use crate::block::*;
use crate::error::{Error, Result};
use crate::lzw::Compressor;
use crate::private::{Animation, Frame};
use std::io::{self, Write};

/// Maximum number of data bytes in one sub-block
const BLOCK_SZ: usize = 0xFF;

/// Push a little-endian `u16` field
fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

impl Header {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.signature())
    }
}

impl LogicalScreenDesc {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(7);
        push_u16(&mut buf, self.screen_width());
        push_u16(&mut buf, self.screen_height());
        buf.push(self.flags());
        buf.push(self.background_color_idx());
        buf.push(self.pixel_aspect_ratio());
        w.write_all(&buf)
    }
}

impl GlobalColorTable {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.colors())
    }
}

impl GraphicControl {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(8);
        buf.push(BlockCode::Extension_.signature());
        buf.push(ExtensionCode::GraphicControl_.into());
        buf.push(4); // block size
        buf.push(0); // flags
        push_u16(&mut buf, self.delay_time_cs());
        buf.push(0); // transparent color index
        buf.push(0); // block size
        w.write_all(&buf)
    }
}

impl Application {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(19);
        buf.push(BlockCode::Extension_.signature());
        buf.push(ExtensionCode::Application_.into());
        buf.push(Self::APP_ID.len() as u8); // block size
        buf.extend_from_slice(Self::APP_ID);
        buf.push(3); // block size
        buf.push(1); // sub-block ID
        push_u16(&mut buf, self.loop_count());
        buf.push(0); // block size
        w.write_all(&buf)
    }
}

impl ImageDesc {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(10);
        buf.push(BlockCode::ImageDesc_.signature());
        push_u16(&mut buf, self.left());
        push_u16(&mut buf, self.top());
        push_u16(&mut buf, self.width());
        push_u16(&mut buf, self.height());
        buf.push(self.flags());
        w.write_all(&buf)
    }
}

impl Trailer {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[BlockCode::Trailer_.signature()])
    }
}

/// State of a block writer
#[derive(Debug)]
enum State {
    /// Accepting data
    Writable,
    /// Writer failed; kind and message of the first error
    Failed(io::ErrorKind, String),
    /// Terminator has been written
    Closed,
}

/// Writer for sub-blocks of data.
///
/// Data is chunked into blocks, each starting with a one-byte length.  All
/// blocks except the last have length 255, and a zero-length block
/// terminates the sequence.  After the first error from the underlying
/// writer, every call returns that error without writing anything more.
pub(crate) struct BlockWriter<'a, W: Write> {
    /// Underlying writer
    writer: &'a mut W,
    /// Block buffer (first byte is the block length)
    buf: [u8; BLOCK_SZ + 1],
    /// Writer state
    state: State,
}

impl<'a, W: Write> BlockWriter<'a, W> {
    /// Create a new block writer
    pub fn new(writer: &'a mut W) -> Self {
        BlockWriter {
            writer,
            buf: [0; BLOCK_SZ + 1],
            state: State::Writable,
        }
    }

    /// Check that the writer is still writable
    fn check(&self) -> Result<()> {
        match &self.state {
            State::Writable => Ok(()),
            State::Failed(kind, msg) => {
                Err(io::Error::new(*kind, msg.clone()).into())
            }
            State::Closed => Err(Error::AlreadyClosed),
        }
    }

    /// Write the first `len` bytes of the buffer in one write call
    fn write_buf(&mut self, len: usize) -> Result<()> {
        let err = match self.writer.write(&self.buf[..len]) {
            Ok(n) if n == len => return Ok(()),
            Ok(_) => io::Error::new(io::ErrorKind::WriteZero, "short write"),
            Err(err) => err,
        };
        self.state = State::Failed(err.kind(), err.to_string());
        Err(err.into())
    }

    /// Append data, writing every full block.
    ///
    /// Returns the number of bytes accepted into blocks, along with the
    /// result.  On a sink failure the count includes bytes in the block
    /// which failed to write.
    pub fn append(&mut self, data: &[u8]) -> (usize, Result<()>) {
        if let Err(err) = self.check() {
            return (0, Err(err));
        }
        let mut consumed = 0;
        loop {
            let len = usize::from(self.buf[0]);
            let n = (BLOCK_SZ - len).min(data.len() - consumed);
            self.buf[len + 1..len + 1 + n]
                .copy_from_slice(&data[consumed..consumed + n]);
            self.buf[0] = (len + n) as u8;
            consumed += n;
            if len + n < BLOCK_SZ {
                return (consumed, Ok(()));
            }
            if let Err(err) = self.write_buf(BLOCK_SZ + 1) {
                return (consumed, Err(err));
            }
            self.buf[0] = 0;
        }
    }

    /// Write the last (short) block and the terminator.
    pub fn close(&mut self) -> Result<()> {
        self.check()?;
        let len = usize::from(self.buf[0]);
        let n = if len == 0 {
            1 // terminator only
        } else {
            self.buf[len + 1] = 0;
            len + 2
        };
        self.write_buf(n)?;
        self.buf[0] = 0;
        self.state = State::Closed;
        Ok(())
    }
}

/// Animation encoder
pub(crate) struct AnimationEnc<W: Write> {
    /// Writer for output data
    writer: W,
}

impl<W: Write> AnimationEnc<W> {
    /// Create a new animation encoder
    pub fn new(writer: W) -> Self {
        AnimationEnc { writer }
    }

    /// Encode an animation, including header and trailer
    pub fn encode(&mut self, animation: &Animation) -> Result<()> {
        let frames = animation.frames();
        let first = frames.first().ok_or(Error::NoFrames)?;
        let (width, height) = animation.screen_size();
        let (screen_width, screen_height) =
            match (u16::try_from(width), u16::try_from(height)) {
                (Ok(w), Ok(h)) => (w, h),
                _ => return Err(Error::TooLargeScreen { width, height }),
            };
        let table = GlobalColorTable::with_colors(first.palette().colors())?;
        debug!(
            "encoding {} frame(s), {}x{}, {}-bit color table",
            frames.len(),
            screen_width,
            screen_height,
            table.config().len_bits()
        );
        let w = &mut self.writer;
        Header::default().format(w)?;
        LogicalScreenDesc::default()
            .with_screen_width(screen_width)
            .with_screen_height(screen_height)
            .with_color_table_config(&table.config())
            .format(w)?;
        table.format(w)?;
        if frames.len() > 1 {
            Application::with_loop_count(animation.loop_count()).format(w)?;
        } else if first.delay_time_cs() > 0 {
            warn!("delay time ignored for single frame");
        }
        for (number, frame) in frames.iter().enumerate() {
            trace!(
                "frame {}: {}x{} at {},{} delay {}",
                number,
                frame.width(),
                frame.height(),
                frame.left(),
                frame.top(),
                frame.delay_time_cs()
            );
            self.encode_frame(frame, &table)?;
        }
        Trailer::default().format(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Encode one frame: graphic control, image descriptor and image data
    fn encode_frame(
        &mut self,
        frame: &Frame,
        table: &GlobalColorTable,
    ) -> Result<()> {
        let delay = frame.delay_time_cs();
        if delay > 0 {
            GraphicControl::with_delay_time_cs(delay)
                .format(&mut self.writer)?;
        }
        let local = GlobalColorTable::with_colors(frame.palette().colors())?;
        if local.colors() != table.colors() {
            return Err(Error::DifferentPalettes);
        }
        ImageDesc::default()
            .with_left(frame.left())
            .with_top(frame.top())
            .with_width(frame.width())
            .with_height(frame.height())
            .format(&mut self.writer)?;
        let min_code_bits = local.config().len_bits().max(2);
        self.writer.write_all(&[min_code_bits])?;
        self.encode_image_data(frame, min_code_bits)
    }

    /// Compress image data into sub-blocks, one row at a time
    fn encode_image_data(
        &mut self,
        frame: &Frame,
        min_code_bits: u8,
    ) -> Result<()> {
        let mut compressor = Compressor::new(min_code_bits);
        let mut blocks = BlockWriter::new(&mut self.writer);
        let mut buffer = Vec::with_capacity(usize::from(frame.width()) + 8);
        for row in frame.rows() {
            compressor.compress(row, &mut buffer)?;
            blocks.append(&buffer).1?;
            buffer.clear();
        }
        compressor.finish(&mut buffer);
        blocks.append(&buffer).1?;
        blocks.close()
    }
}
