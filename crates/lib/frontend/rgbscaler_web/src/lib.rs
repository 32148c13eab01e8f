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

    rgbscaler_web::lib.rs

    Browser frontend for RGBScaler. Draws an HTML video element onto a WebGL2
    canvas, driven by requestAnimationFrame. Everything except the callback
    bookkeeping is only built for wasm32.
*/

pub mod callbacks;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub mod clock;
        pub mod player;
        pub mod source;
        pub mod surface;

        pub use clock::AnimationFrameClock;
        pub use player::ScalerPlayer;
        pub use source::VideoFrameSource;
        pub use surface::CanvasSurface;

        use wasm_bindgen::prelude::*;

        pub type WebScalerEngine = rgbscaler_engine::ScalerEngine<CanvasSurface, AnimationFrameClock>;

        #[wasm_bindgen(start)]
        pub fn start() {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));

            match console_log::init_with_level(log::Level::Warn) {
                Ok(()) => {}
                Err(e) => log::error!("Couldn't initialize logger: {}", e),
            };
        }
    }
}
