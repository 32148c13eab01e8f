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

    rgbscaler_engine::pipeline.rs

    Compiles and links the scaler's shader program and resolves the attribute
    and uniform locations the engine writes to.
*/

use crate::shaders::*;
use rgbscaler_common::RenderMode;
use scaler_backend_trait::{BackendError, GpuBackend, ShaderStage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Linked program has no active '{0}' attribute")]
    MissingAttribute(&'static str),
}

/// Attribute and uniform locations of a linked program. Uniforms that the driver optimized out
/// (or that the variant does not declare) are None, and writes to them are skipped.
pub struct ProgramLocations<B: GpuBackend> {
    pub vertex_position: u32,
    pub texture_coord: u32,
    pub sampler: Option<B::UniformLocation>,
    pub base_dimension: Option<B::UniformLocation>,
    pub base_dimension_i: Option<B::UniformLocation>,
    pub mask_intensity: Option<B::UniformLocation>,
    pub scanline_intensity: Option<B::UniformLocation>,
}

/// A linked program and its locations. Never modified after creation; a change of render mode
/// builds a new one.
pub struct ShaderProgram<B: GpuBackend> {
    program: B::Program,
    mode: RenderMode,
    locations: ProgramLocations<B>,
}

impl<B: GpuBackend> ShaderProgram<B> {
    pub fn program(&self) -> B::Program {
        self.program
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn locations(&self) -> &ProgramLocations<B> {
        &self.locations
    }

    /// Make this the current program and point the sampler at texture unit 0.
    pub fn bind(&self, backend: &B) {
        backend.use_program(Some(self.program));
        backend.uniform_1i(self.locations.sampler.as_ref(), 0);
    }

    pub fn set_base_dimension(&self, backend: &B, dim: [f32; 2], dim_i: [f32; 2]) {
        if let Some(loc) = self.locations.base_dimension.as_ref() {
            backend.uniform_2f(Some(loc), dim[0], dim[1]);
        }
        if let Some(loc) = self.locations.base_dimension_i.as_ref() {
            backend.uniform_2f(Some(loc), dim_i[0], dim_i[1]);
        }
    }

    /// Delete the program. Leaves the current program binding alone, so an old program can be
    /// released after its replacement has been bound.
    pub fn destroy(self, backend: &B) {
        backend.delete_program(self.program);
    }
}

/// Builds a [ShaderProgram] from a vertex/fragment source pair.
pub struct ShaderPipelineBuilder<'a> {
    vertex_source: &'a str,
    fragment_source: &'a str,
    mode: RenderMode,
}

impl<'a> ShaderPipelineBuilder<'a> {
    pub fn new(sources: &'a ShaderSources, mode: RenderMode) -> Self {
        let (vertex_source, fragment_source) = sources.for_mode(mode);
        Self {
            vertex_source,
            fragment_source,
            mode,
        }
    }

    pub fn with_sources(vertex_source: &'a str, fragment_source: &'a str, mode: RenderMode) -> Self {
        Self {
            vertex_source,
            fragment_source,
            mode,
        }
    }

    /// Compile both stages, link them and resolve locations. Any failure is logged, and every
    /// GPU object created along the way is released before the error is returned.
    pub fn build<B: GpuBackend>(&self, backend: &B) -> Result<ShaderProgram<B>, PipelineError> {
        let vertex = backend
            .compile_shader(ShaderStage::Vertex, self.vertex_source)
            .inspect_err(|e| log::error!("ShaderPipelineBuilder::build(): {}", e))?;

        let fragment = match backend.compile_shader(ShaderStage::Fragment, self.fragment_source) {
            Ok(fragment) => fragment,
            Err(e) => {
                log::error!("ShaderPipelineBuilder::build(): {}", e);
                backend.delete_shader(vertex);
                return Err(e.into());
            }
        };

        let linked = backend.link_program(vertex, fragment);
        if let Ok(program) = linked {
            backend.detach_shader(program, vertex);
            backend.detach_shader(program, fragment);
        }
        backend.delete_shader(vertex);
        backend.delete_shader(fragment);

        let program = linked.inspect_err(|e| log::error!("ShaderPipelineBuilder::build(): {}", e))?;

        match Self::resolve_locations(backend, program) {
            Ok(locations) => {
                log::debug!("ShaderPipelineBuilder::build(): Built {:?} program {:?}", self.mode, program);
                Ok(ShaderProgram {
                    program,
                    mode: self.mode,
                    locations,
                })
            }
            Err(e) => {
                log::error!("ShaderPipelineBuilder::build(): {}", e);
                backend.delete_program(program);
                Err(e)
            }
        }
    }

    fn resolve_locations<B: GpuBackend>(backend: &B, program: B::Program) -> Result<ProgramLocations<B>, PipelineError> {
        let vertex_position = backend
            .attrib_location(program, ATTR_VERTEX_POSITION)
            .ok_or(PipelineError::MissingAttribute(ATTR_VERTEX_POSITION))?;
        let texture_coord = backend
            .attrib_location(program, ATTR_TEXTURE_COORD)
            .ok_or(PipelineError::MissingAttribute(ATTR_TEXTURE_COORD))?;

        let uniform = |name: &str| {
            let loc = backend.uniform_location(program, name);
            if loc.is_none() {
                log::debug!("resolve_locations(): No active uniform '{}'", name);
            }
            loc
        };

        Ok(ProgramLocations {
            vertex_position,
            texture_coord,
            sampler: uniform(UNIFORM_SAMPLER),
            base_dimension: uniform(UNIFORM_BASE_DIMENSION),
            base_dimension_i: uniform(UNIFORM_BASE_DIMENSION_I),
            mask_intensity: uniform(UNIFORM_MASK_INTENSITY),
            scanline_intensity: uniform(UNIFORM_SCANLINE_INTENSITY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgbscaler_null::{GlCall, NullBackend};

    #[test]
    fn builds_area_program() {
        let backend = NullBackend::new();
        let sources = ShaderSources::default();
        let program = ShaderPipelineBuilder::new(&sources, RenderMode::Area).build(&backend).unwrap();

        assert_eq!(program.mode(), RenderMode::Area);
        let loc = program.locations();
        assert!(loc.base_dimension.is_some());
        assert!(loc.base_dimension_i.is_some());
        assert!(loc.sampler.is_some());
        assert!(loc.mask_intensity.is_none());
        assert!(loc.scanline_intensity.is_none());

        // Intermediate shaders are released once the program is linked.
        assert_eq!(backend.calls().iter().filter(|c| matches!(c, GlCall::DeleteShader(_))).count(), 2);
        assert_eq!(backend.live_objects(), 1);
    }

    #[test]
    fn builds_crt_program() {
        let backend = NullBackend::new();
        let sources = ShaderSources::default();
        let program = ShaderPipelineBuilder::new(&sources, RenderMode::Crt).build(&backend).unwrap();
        assert!(program.locations().mask_intensity.is_some());
        assert!(program.locations().scanline_intensity.is_some());
    }

    #[test]
    fn fragment_syntax_error_yields_no_program() {
        let backend = NullBackend::new();
        let broken = AREA_FRAGMENT_SHADER.replace("void main(void) {", "void main(void) {{");
        let result = ShaderPipelineBuilder::with_sources(QUAD_VERTEX_SHADER, &broken, RenderMode::Area).build(&backend);

        assert!(matches!(
            result,
            Err(PipelineError::Backend(BackendError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            }))
        ));
        assert!(!backend.calls().iter().any(|c| matches!(c, GlCall::LinkProgram { .. })));
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn missing_attribute_is_rejected() {
        let backend = NullBackend::new();
        let vertex = QUAD_VERTEX_SHADER.replace("aTextureCoord", "aUv");
        let result = ShaderPipelineBuilder::with_sources(&vertex, AREA_FRAGMENT_SHADER, RenderMode::Area).build(&backend);

        assert!(matches!(result, Err(PipelineError::MissingAttribute(ATTR_TEXTURE_COORD))));
        assert_eq!(backend.live_objects(), 0);
    }

    #[test]
    fn bind_selects_texture_unit_zero() {
        let backend = NullBackend::new();
        let sources = ShaderSources::default();
        let program = ShaderPipelineBuilder::new(&sources, RenderMode::Area).build(&backend).unwrap();
        backend.clear_calls();

        program.bind(&backend);
        let calls = backend.calls();
        assert!(matches!(calls[0], GlCall::UseProgram(Some(_))));
        assert_eq!(calls[1], GlCall::Uniform1i {
            name: UNIFORM_SAMPLER.to_string(),
            v: 0
        });
    }

    #[test]
    fn destroying_old_program_keeps_replacement_bound() {
        let backend = NullBackend::new();
        let sources = ShaderSources::default();
        let old = ShaderPipelineBuilder::new(&sources, RenderMode::Area).build(&backend).unwrap();
        let new = ShaderPipelineBuilder::new(&sources, RenderMode::Crt).build(&backend).unwrap();

        old.bind(&backend);
        new.bind(&backend);
        old.destroy(&backend);

        assert_eq!(backend.current_program(), Some(new.program()));
        assert_eq!(backend.live_objects(), 1);
    }
}
