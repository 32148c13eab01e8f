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

    rgbscaler_null::surface.rs

    An off-screen DisplaySurface that hands out a shared NullBackend.
*/

use std::cell::Cell;

use crate::backend::NullBackend;
use scaler_backend_trait::{BackendError, DisplaySurface, SurfaceDimensions};

pub struct NullSurface {
    backend: NullBackend,
    supported: bool,
    pixel_density: f64,
    backing: SurfaceDimensions,
    display: SurfaceDimensions,
    fullscreen_requests: Cell<u32>,
}

impl Default for NullSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl NullSurface {
    pub fn new() -> Self {
        Self {
            backend: NullBackend::new(),
            supported: true,
            pixel_density: 1.0,
            backing: SurfaceDimensions::default(),
            display: SurfaceDimensions::default(),
            fullscreen_requests: Cell::new(0),
        }
    }

    /// A surface whose rendering context can never be acquired.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn with_pixel_density(mut self, pixel_density: f64) -> Self {
        self.pixel_density = pixel_density;
        self
    }

    /// A handle to the backend this surface produces, for inspection.
    pub fn backend(&self) -> NullBackend {
        self.backend.clone()
    }

    pub fn fullscreen_requests(&self) -> u32 {
        self.fullscreen_requests.get()
    }
}

impl DisplaySurface for NullSurface {
    type Backend = NullBackend;

    fn acquire_backend(&mut self) -> Result<NullBackend, BackendError> {
        if !self.supported {
            return Err(BackendError::Unsupported("null surface has no context".to_string()));
        }
        Ok(self.backend.clone())
    }

    fn pixel_density(&self) -> f64 {
        self.pixel_density
    }

    fn backing_dimensions(&self) -> SurfaceDimensions {
        self.backing
    }

    fn set_backing_dimensions(&mut self, dim: SurfaceDimensions) {
        self.backing = dim;
    }

    fn display_dimensions(&self) -> SurfaceDimensions {
        self.display
    }

    fn set_display_dimensions(&mut self, dim: SurfaceDimensions) {
        self.display = dim;
    }

    fn request_fullscreen(&self) -> Result<(), BackendError> {
        self.fullscreen_requests.set(self.fullscreen_requests.get() + 1);
        log::debug!("NullSurface: fullscreen requested");
        Ok(())
    }
}
