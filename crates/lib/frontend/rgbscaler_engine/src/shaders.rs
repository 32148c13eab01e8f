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

    rgbscaler_engine::shaders.rs

    GLSL ES 3.00 sources for the two pipeline variants. Both fragment shaders
    share the area sampling prelude; the CRT variant appends the mask and
    scanline stage.
*/

use std::borrow::Cow;

use rgbscaler_common::RenderMode;

pub const ATTR_VERTEX_POSITION: &str = "aVertexPosition";
pub const ATTR_TEXTURE_COORD: &str = "aTextureCoord";
pub const UNIFORM_SAMPLER: &str = "uSampler";
pub const UNIFORM_BASE_DIMENSION: &str = "uBaseDimension";
pub const UNIFORM_BASE_DIMENSION_I: &str = "uBaseDimensionI";
pub const UNIFORM_MASK_INTENSITY: &str = "maskIntensity";
pub const UNIFORM_SCANLINE_INTENSITY: &str = "scanlineIntensity";

pub const QUAD_VERTEX_SHADER: &str = include_str!("shaders/quad.vert");
pub const AREA_FRAGMENT_SHADER: &str = concat!(include_str!("shaders/area_sample.glsl"), include_str!("shaders/area.frag"));
pub const CRT_FRAGMENT_SHADER: &str = concat!(include_str!("shaders/area_sample.glsl"), include_str!("shaders/crt.frag"));

/// The vertex shader and both fragment variants the engine may build a pipeline from.
#[derive(Clone, Debug)]
pub struct ShaderSources {
    pub vertex: Cow<'static, str>,
    pub area_fragment: Cow<'static, str>,
    pub crt_fragment: Cow<'static, str>,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: Cow::Borrowed(QUAD_VERTEX_SHADER),
            area_fragment: Cow::Borrowed(AREA_FRAGMENT_SHADER),
            crt_fragment: Cow::Borrowed(CRT_FRAGMENT_SHADER),
        }
    }
}

impl ShaderSources {
    /// (vertex, fragment) sources for the given mode.
    pub fn for_mode(&self, mode: RenderMode) -> (&str, &str) {
        match mode {
            RenderMode::Area => (self.vertex.as_ref(), self.area_fragment.as_ref()),
            RenderMode::Crt => (self.vertex.as_ref(), self.crt_fragment.as_ref()),
        }
    }
}
