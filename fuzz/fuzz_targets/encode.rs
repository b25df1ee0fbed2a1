// cargo fuzz run encode corpus/encode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;
use pix::{Palette, rgb::SRgb8};

use gifanim::{Animation, Encoder, Frame};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let n_colors = usize::from(data[0]) + 1;
    let width = u16::from(data[1] % 64);
    let left = u16::from(data[2]);
    let n_frames = usize::from(data[3] % 4);
    let mut palette = Palette::new(n_colors);
    for i in 0..n_colors {
        palette.set_entry(SRgb8::new(i as u8, (i * 7) as u8, (i * 13) as u8));
    }
    let pixels = &data[4..];
    let height = match width {
        0 => 0,
        _ => (pixels.len() / usize::from(width)).min(64) as u16,
    };
    let mut animation = Animation::new().with_loop_count(u16::from(data[3]));
    for f in 0..n_frames {
        let frame = Frame::with_pixels(
            pixels.to_vec(),
            usize::from(width),
            width,
            height,
            palette.clone(),
        )
        .unwrap()
        .with_position(left * f as u16, 0)
        .with_delay_time_cs(f as u16);
        animation.push_frame(frame);
    }
    let mut out = vec![];
    // invalid color indices are expected errors; panics are not
    let _ = Encoder::new(&mut out).encode(&animation);
});
