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

    rgbscaler_engine::crt.rs

    Tracks the CRT post-process intensities and pushes them to the program.
*/

use crate::pipeline::ShaderProgram;
use rgbscaler_common::CrtParams;
use scaler_backend_trait::GpuBackend;

#[derive(Copy, Clone, Debug, Default)]
pub struct CrtPostProcessState {
    params: CrtParams,
}

impl CrtPostProcessState {
    pub fn new(params: CrtParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> CrtParams {
        self.params
    }

    /// Update the intensities. Each value that changed is written to `program` as its own uniform
    /// write, if there is a program and it is a CRT variant. The program must be the one
    /// currently bound.
    pub fn set<B: GpuBackend>(
        &mut self,
        backend: Option<&B>,
        program: Option<&ShaderProgram<B>>,
        mask_intensity: f32,
        scanline_intensity: f32,
    ) {
        let new = CrtParams::new(mask_intensity, scanline_intensity);
        let mask_changed = new.mask_intensity() != self.params.mask_intensity();
        let scanline_changed = new.scanline_intensity() != self.params.scanline_intensity();
        self.params = new;

        let (Some(backend), Some(program)) = (backend, program) else {
            return;
        };
        if !program.mode().is_crt() {
            return;
        }
        let locations = program.locations();
        if mask_changed {
            backend.uniform_1f(locations.mask_intensity.as_ref(), new.mask_intensity());
        }
        if scanline_changed {
            backend.uniform_1f(locations.scanline_intensity.as_ref(), new.scanline_intensity());
        }
    }

    /// Write both intensities to a freshly bound program.
    pub fn apply<B: GpuBackend>(&self, backend: &B, program: &ShaderProgram<B>) {
        if !program.mode().is_crt() {
            return;
        }
        let locations = program.locations();
        backend.uniform_1f(locations.mask_intensity.as_ref(), self.params.mask_intensity());
        backend.uniform_1f(locations.scanline_intensity.as_ref(), self.params.scanline_intensity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pipeline::ShaderPipelineBuilder, shaders::*};
    use rgbscaler_common::RenderMode;
    use rgbscaler_null::{GlCall, NullBackend};

    fn uniform_writes(backend: &NullBackend) -> Vec<(String, f32)> {
        backend
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::Uniform1f { name, v } => Some((name, v)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn only_changed_values_are_written() {
        let backend = NullBackend::new();
        let sources = ShaderSources::default();
        let program = ShaderPipelineBuilder::new(&sources, RenderMode::Crt).build(&backend).unwrap();
        backend.clear_calls();

        let mut crt = CrtPostProcessState::default();
        crt.set(Some(&backend), Some(&program), 0.3, 0.9);
        assert_eq!(uniform_writes(&backend), vec![(UNIFORM_SCANLINE_INTENSITY.to_string(), 0.9)]);

        backend.clear_calls();
        crt.set(Some(&backend), Some(&program), 0.3, 0.9);
        assert!(uniform_writes(&backend).is_empty());
    }

    #[test]
    fn area_program_receives_no_crt_uniforms() {
        let backend = NullBackend::new();
        let sources = ShaderSources::default();
        let program = ShaderPipelineBuilder::new(&sources, RenderMode::Area).build(&backend).unwrap();
        backend.clear_calls();

        let mut crt = CrtPostProcessState::default();
        crt.set(Some(&backend), Some(&program), 0.5, 0.5);
        crt.apply(&backend, &program);
        assert!(uniform_writes(&backend).is_empty());
        assert_eq!(crt.params(), CrtParams::new(0.5, 0.5));
    }

    #[test]
    fn negative_input_clamps() {
        let mut crt = CrtPostProcessState::default();
        crt.set::<NullBackend>(None, None, -0.2, f32::NAN);
        assert_eq!(crt.params(), CrtParams::new(0.0, 0.0));
    }
}
