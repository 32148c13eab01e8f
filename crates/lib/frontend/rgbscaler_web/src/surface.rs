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

    rgbscaler_web::surface.rs

    A DisplaySurface over an HTML canvas element.

    The canvas width/height attributes are the backing size in device pixels.
    Its CSS width/height are the display size in CSS pixels.
*/

use std::sync::Arc;

use rgbscaler_glow::GlowBackend;
use scaler_backend_trait::{BackendError, DisplaySurface, SurfaceDimensions};
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    pixel_density: f64,
    display: SurfaceDimensions,
}

impl CanvasSurface {
    /// Wrap `canvas`, reading the current device pixel ratio from the window.
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        let pixel_density = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
        let display = SurfaceDimensions {
            w: canvas.client_width().max(0) as u32,
            h: canvas.client_height().max(0) as u32,
        };
        Self {
            canvas,
            pixel_density,
            display,
        }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl DisplaySurface for CanvasSurface {
    type Backend = GlowBackend;

    fn acquire_backend(&mut self) -> Result<GlowBackend, BackendError> {
        let context = self
            .canvas
            .get_context("webgl2")
            .map_err(|e| BackendError::Unsupported(format!("getContext failed: {:?}", e)))?
            .ok_or_else(|| BackendError::Unsupported("WebGL2 is not available".to_string()))?
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(|_| BackendError::Unsupported("Context is not a WebGL2RenderingContext".to_string()))?;

        let gl = glow::Context::from_webgl2_context(context);
        Ok(GlowBackend::new(Arc::new(gl)))
    }

    fn pixel_density(&self) -> f64 {
        self.pixel_density
    }

    fn backing_dimensions(&self) -> SurfaceDimensions {
        SurfaceDimensions {
            w: self.canvas.width(),
            h: self.canvas.height(),
        }
    }

    fn set_backing_dimensions(&mut self, dim: SurfaceDimensions) {
        self.canvas.set_width(dim.w);
        self.canvas.set_height(dim.h);
    }

    fn display_dimensions(&self) -> SurfaceDimensions {
        self.display
    }

    fn set_display_dimensions(&mut self, dim: SurfaceDimensions) {
        let style = self.canvas.style();
        if let Err(e) = style
            .set_property("width", &format!("{}px", dim.w))
            .and_then(|_| style.set_property("height", &format!("{}px", dim.h)))
        {
            log::warn!("CanvasSurface: couldn't set canvas style size: {:?}", e);
            return;
        }
        self.display = dim;
    }

    fn request_fullscreen(&self) -> Result<(), BackendError> {
        self.canvas
            .request_fullscreen()
            .map_err(|e| BackendError::Fullscreen(format!("{:?}", e)))
    }
}
