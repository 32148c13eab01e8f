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

    rgbscaler_common::display_scaler::mod.rs

    Scaler parameters: render mode selection, CRT post-process intensities and
    named presets that can be loaded from a configuration file.
*/

use crate::geometry::{AspectConfig, BoundingBox};
use serde_derive::Deserialize;

pub const DEFAULT_MASK_INTENSITY: f32 = 0.3;
pub const DEFAULT_SCANLINE_INTENSITY: f32 = 0.8;

/// Selects which fragment shader variant the pipeline is built with.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub enum RenderMode {
    /// Plain area sampling.
    #[default]
    Area,
    /// Area sampling followed by a slot mask and scanlines.
    Crt,
}

impl RenderMode {
    pub fn from_crt_flag(crt: bool) -> Self {
        if crt {
            RenderMode::Crt
        }
        else {
            RenderMode::Area
        }
    }

    pub fn is_crt(&self) -> bool {
        matches!(self, RenderMode::Crt)
    }
}

/// Intensities of the CRT post-process. Both values are kept non-negative.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawCrtParams")]
pub struct CrtParams {
    mask_intensity: f32,
    scanline_intensity: f32,
}

#[derive(Deserialize)]
struct RawCrtParams {
    #[serde(default = "default_mask")]
    mask_intensity: f32,
    #[serde(default = "default_scanline")]
    scanline_intensity: f32,
}

const fn default_mask() -> f32 {
    DEFAULT_MASK_INTENSITY
}
const fn default_scanline() -> f32 {
    DEFAULT_SCANLINE_INTENSITY
}

impl From<RawCrtParams> for CrtParams {
    fn from(raw: RawCrtParams) -> Self {
        CrtParams::new(raw.mask_intensity, raw.scanline_intensity)
    }
}

impl Default for CrtParams {
    fn default() -> Self {
        Self {
            mask_intensity: DEFAULT_MASK_INTENSITY,
            scanline_intensity: DEFAULT_SCANLINE_INTENSITY,
        }
    }
}

impl CrtParams {
    pub fn new(mask_intensity: f32, scanline_intensity: f32) -> Self {
        Self {
            mask_intensity: clamp_intensity(mask_intensity),
            scanline_intensity: clamp_intensity(scanline_intensity),
        }
    }

    pub fn mask_intensity(&self) -> f32 {
        self.mask_intensity
    }

    pub fn scanline_intensity(&self) -> f32 {
        self.scanline_intensity
    }

    pub fn set_mask_intensity(&mut self, intensity: f32) {
        self.mask_intensity = clamp_intensity(intensity);
    }

    pub fn set_scanline_intensity(&mut self, intensity: f32) {
        self.scanline_intensity = clamp_intensity(intensity);
    }
}

fn clamp_intensity(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    }
    else {
        v.max(0.0)
    }
}

/// A named set of overrides for [ScalerParams]. Fields left unset keep the base value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScalerPreset {
    pub name: String,
    pub declared_aspect_ratio: Option<f64>,
    pub pixel_aspect_ratio: Option<f64>,
    pub integer_scaling: Option<bool>,
    pub crt_mode: Option<bool>,
    pub mask_intensity: Option<f32>,
    pub scanline_intensity: Option<f32>,
}

/// Everything the engine needs to know to compute geometry and build its pipeline, apart from
/// the frame source and surface themselves.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScalerParams {
    pub bounds: BoundingBox,
    pub aspect: AspectConfig,
    pub integer_scaling: bool,
    pub render_mode: RenderMode,
    pub crt: CrtParams,
}

impl ScalerParams {
    pub fn new(bounds: BoundingBox) -> Self {
        Self {
            bounds,
            aspect: AspectConfig::default(),
            integer_scaling: false,
            render_mode: RenderMode::Area,
            crt: CrtParams::default(),
        }
    }

    pub fn with_preset(mut self, preset: &ScalerPreset) -> Self {
        preset.apply(&mut self);
        self
    }
}

impl ScalerPreset {
    pub fn apply(&self, params: &mut ScalerParams) {
        if let Some(dar) = self.declared_aspect_ratio {
            params.aspect.declared_aspect_ratio = Some(dar);
        }
        if let Some(par) = self.pixel_aspect_ratio {
            params.aspect.pixel_aspect_ratio = Some(par);
        }
        if let Some(integer) = self.integer_scaling {
            params.integer_scaling = integer;
        }
        if let Some(crt) = self.crt_mode {
            params.render_mode = RenderMode::from_crt_flag(crt);
        }
        if let Some(mask) = self.mask_intensity {
            params.crt.set_mask_intensity(mask);
        }
        if let Some(scanline) = self.scanline_intensity {
            params.crt.set_scanline_intensity(scanline);
        }
    }
}
