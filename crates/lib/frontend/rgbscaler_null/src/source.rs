/*
    RGBScaler

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    rgbscaler_null::source.rs

    An in-memory FrameSource producing moving color bars.
*/

use std::cell::RefCell;

use scaler_backend_trait::{FrameSize, FrameSource};

const BAR_COLORS: [[u8; 4]; 8] = [
    [0xC0, 0xC0, 0xC0, 0xFF],
    [0xC0, 0xC0, 0x00, 0xFF],
    [0x00, 0xC0, 0xC0, 0xFF],
    [0x00, 0xC0, 0x00, 0xFF],
    [0xC0, 0x00, 0xC0, 0xFF],
    [0xC0, 0x00, 0x00, 0xFF],
    [0x00, 0x00, 0xC0, 0xFF],
    [0x10, 0x10, 0x10, 0xFF],
];

#[derive(Default)]
struct PatternState {
    size: Option<FrameSize>,
    frame_number: u64,
    pixels: Vec<u8>,
}

impl PatternState {
    fn regenerate(&mut self) {
        self.pixels.clear();
        let Some(size) = self.size
        else {
            return;
        };
        let w = size.w as u64;
        self.pixels.reserve(size.w as usize * size.h as usize * 4);
        for y in 0..size.h as u64 {
            for x in 0..w {
                // Bars scroll one pixel per frame; odd rows are dimmed so scanline structure is visible.
                let bar = ((x + self.frame_number) % w) * BAR_COLORS.len() as u64 / w;
                let mut px = BAR_COLORS[bar as usize];
                if y & 1 == 1 {
                    px[0] /= 2;
                    px[1] /= 2;
                    px[2] /= 2;
                }
                self.pixels.extend_from_slice(&px);
            }
        }
    }
}

/// Frames are RGBA8, top row first. The source is mutated through a shared reference so that a
/// driver can advance it while an engine holds it.
#[derive(Default)]
pub struct TestPatternSource {
    state: RefCell<PatternState>,
}

impl TestPatternSource {
    pub fn new(w: u32, h: u32) -> Self {
        let source = Self::default();
        source.set_size(w, h);
        source
    }

    /// A source with nothing loaded, like a video element before its metadata arrives.
    pub fn unloaded() -> Self {
        Self::default()
    }

    pub fn set_size(&self, w: u32, h: u32) {
        let mut state = self.state.borrow_mut();
        state.size = Some(FrameSize::new(w, h));
        state.regenerate();
    }

    pub fn unload(&self) {
        let mut state = self.state.borrow_mut();
        state.size = None;
        state.regenerate();
    }

    /// Move on to the next frame.
    pub fn advance(&self) {
        let mut state = self.state.borrow_mut();
        state.frame_number += 1;
        state.regenerate();
    }

    pub fn frame_number(&self) -> u64 {
        self.state.borrow().frame_number
    }
}

impl FrameSource<[u8]> for TestPatternSource {
    fn frame_size(&self) -> Option<FrameSize> {
        self.state.borrow().size
    }

    fn with_frame(&self, f: &mut dyn FnMut(&[u8])) -> bool {
        let state = self.state.borrow();
        match state.size {
            Some(size) if !size.is_empty() => {
                f(&state.pixels);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_has_expected_length() {
        let source = TestPatternSource::new(16, 4);
        let mut len = 0;
        assert!(source.with_frame(&mut |px| len = px.len()));
        assert_eq!(len, 16 * 4 * 4);
    }

    #[test]
    fn unloaded_source_lends_nothing() {
        let source = TestPatternSource::unloaded();
        assert_eq!(source.frame_size(), None);
        assert!(!source.with_frame(&mut |_| panic!("no frame expected")));

        source.set_size(0, 240);
        assert!(!source.with_frame(&mut |_| panic!("no frame expected")));
    }

    #[test]
    fn advance_scrolls_bars() {
        let source = TestPatternSource::new(8, 1);
        let mut first = Vec::new();
        source.with_frame(&mut |px| first = px.to_vec());
        source.advance();
        let mut second = Vec::new();
        source.with_frame(&mut |px| second = px.to_vec());

        assert_eq!(source.frame_number(), 1);
        assert_eq!(&second[0..4], &first[4..8]);
    }
}
