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

    rgbscaler_web::source.rs

    A FrameSource over an HTML video element. The element itself is handed to
    the backend, which uploads the current frame directly.
*/

use rgbscaler_common::FrameSize;
use scaler_backend_trait::FrameSource;
use web_sys::{HtmlMediaElement, HtmlVideoElement};

pub struct VideoFrameSource {
    video: HtmlVideoElement,
}

impl VideoFrameSource {
    pub fn new(video: HtmlVideoElement) -> Self {
        Self { video }
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    /// True once the element has data for at least the current playback position.
    pub fn has_current_data(&self) -> bool {
        self.video.ready_state() >= HtmlMediaElement::HAVE_CURRENT_DATA
    }
}

impl FrameSource<HtmlVideoElement> for VideoFrameSource {
    fn frame_size(&self) -> Option<FrameSize> {
        let size = FrameSize::new(self.video.video_width(), self.video.video_height());
        (!size.is_empty()).then_some(size)
    }

    fn with_frame(&self, f: &mut dyn FnMut(&HtmlVideoElement)) -> bool {
        if !self.has_current_data() {
            log::trace!("VideoFrameSource: no current data (readyState {})", self.video.ready_state());
            return false;
        }
        f(&self.video);
        true
    }
}
