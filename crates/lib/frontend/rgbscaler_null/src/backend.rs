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

    rgbscaler_null::backend.rs

    A GpuBackend that performs no rendering. Handles are plain integers, calls
    are appended to a shared log, and shader sources get a light structural
    check so that broken sources fail to compile the way they would on a real
    driver. Attribute and uniform locations are resolved from the declarations
    in the linked sources.
*/

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use scaler_backend_trait::{BackendError, BufferKind, FrameSize, GpuBackend, ShaderStage, TextureFilter};

#[derive(Clone, Debug, PartialEq)]
pub enum GlCall {
    CompileShader { id: u32, stage: ShaderStage },
    DeleteShader(u32),
    LinkProgram { id: u32, vertex: u32, fragment: u32 },
    DetachShader { program: u32, shader: u32 },
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    CreateBuffer { id: u32, kind: BufferKind, len: usize },
    BindBuffer { kind: BufferKind, id: Option<u32> },
    VertexAttrib { location: u32, components: i32 },
    DeleteBuffer(u32),
    CreateTexture { id: u32, filter: TextureFilter },
    BindTexture { unit: u32, id: Option<u32> },
    UploadRgba8 { texture: u32, w: u32, h: u32, pixels: Vec<u8> },
    UploadFrame { texture: u32, w: u32, h: u32 },
    DeleteTexture(u32),
    Uniform1i { name: String, v: i32 },
    Uniform1f { name: String, v: f32 },
    Uniform2f { name: String, v0: f32, v1: f32 },
    Viewport { w: u32, h: u32 },
    DrawIndexed { count: u32, program: Option<u32> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct NullUniformLocation {
    pub program: u32,
    pub name: String,
}

struct CompiledShader {
    stage: ShaderStage,
    source: String,
}

struct LinkedProgram {
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Default)]
struct NullState {
    next_id: u32,
    calls: Vec<GlCall>,
    live: HashSet<u32>,
    shaders: HashMap<u32, CompiledShader>,
    programs: HashMap<u32, LinkedProgram>,
    current_program: Option<u32>,
    uniforms: HashMap<(u32, String), Vec<f32>>,
    frames_uploaded: usize,
    last_viewport: Option<(u32, u32)>,
    buffer_budget: Option<usize>,
    fail_uploads: bool,
}

impl NullState {
    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.live.insert(self.next_id);
        self.next_id
    }

    fn release(&mut self, id: u32) {
        if !self.live.remove(&id) {
            log::warn!("NullBackend: release of unknown object {}", id);
        }
    }

    fn set_uniform(&mut self, location: &NullUniformLocation, values: Vec<f32>) {
        if self.current_program != Some(location.program) {
            log::warn!(
                "NullBackend: uniform '{}' written while program {} is not current",
                location.name,
                location.program
            );
        }
        self.uniforms.insert((location.program, location.name.clone()), values);
    }
}

/// A recording backend. Clones share the same state, so a test can keep a handle to a backend
/// that an engine owns.
#[derive(Clone, Default)]
pub struct NullBackend {
    state: Rc<RefCell<NullState>>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Number of shaders, programs, buffers, vertex arrays and textures not yet deleted.
    pub fn live_objects(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn frames_uploaded(&self) -> usize {
        self.state.borrow().frames_uploaded
    }

    pub fn draw_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, GlCall::DrawIndexed { .. }))
            .count()
    }

    pub fn current_program(&self) -> Option<u32> {
        self.state.borrow().current_program
    }

    /// The last value written to uniform `name` of `program`.
    pub fn uniform_value(&self, program: u32, name: &str) -> Option<Vec<f32>> {
        self.state.borrow().uniforms.get(&(program, name.to_string())).cloned()
    }

    pub fn last_viewport(&self) -> Option<(u32, u32)> {
        self.state.borrow().last_viewport
    }

    /// Let `n` more buffers be created, then fail every further request.
    pub fn fail_buffer_after(&self, n: usize) {
        self.state.borrow_mut().buffer_budget = Some(n);
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.state.borrow_mut().fail_uploads = fail;
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

/// A rough structural check standing in for a GLSL compiler.
fn check_source(source: &str) -> Result<(), String> {
    if !source.trim_start().starts_with("#version") {
        return Err("missing #version directive".to_string());
    }
    if !source.contains("void main") {
        return Err("no main() entry point".to_string());
    }
    for (open, close) in [('{', '}'), ('(', ')')] {
        let mut depth = 0i32;
        for (line_no, line) in source.lines().enumerate() {
            let code = line.split("//").next().unwrap_or_default();
            for c in code.chars() {
                if c == open {
                    depth += 1;
                }
                else if c == close {
                    depth -= 1;
                }
                if depth < 0 {
                    return Err(format!("{}: unexpected '{}'", line_no + 1, close));
                }
            }
        }
        if depth != 0 {
            return Err(format!("unbalanced '{}'", open));
        }
    }
    Ok(())
}

/// Names declared by statements such as `uniform vec2 uBaseDimension;` that start with `keyword`.
fn declared_names(source: &str, keyword: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let code = line.split("//").next().unwrap_or_default().trim();
            let mut tokens = code.trim_end_matches(';').split_whitespace();
            if tokens.next() != Some(keyword) {
                return None;
            }
            tokens.last().map(str::to_string)
        })
        .collect()
}

impl GpuBackend for NullBackend {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type Texture = u32;
    type VertexArray = u32;
    type UniformLocation = NullUniformLocation;
    type Frame = [u8];

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<u32, BackendError> {
        check_source(source).map_err(|log| BackendError::ShaderCompile { stage, log })?;
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.shaders.insert(
            id,
            CompiledShader {
                stage,
                source: source.to_string(),
            },
        );
        state.calls.push(GlCall::CompileShader { id, stage });
        Ok(id)
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.shaders.remove(&shader);
        state.release(shader);
        state.calls.push(GlCall::DeleteShader(shader));
    }

    fn link_program(&self, vertex: u32, fragment: u32) -> Result<u32, BackendError> {
        let mut state = self.state.borrow_mut();
        let (attributes, uniforms) = match (state.shaders.get(&vertex), state.shaders.get(&fragment)) {
            (Some(v), Some(f)) if v.stage == ShaderStage::Vertex && f.stage == ShaderStage::Fragment => {
                let mut uniforms = declared_names(&v.source, "uniform");
                uniforms.extend(declared_names(&f.source, "uniform"));
                (declared_names(&v.source, "in"), uniforms)
            }
            _ => return Err(BackendError::ProgramLink("invalid shader pair".to_string())),
        };
        let id = state.alloc();
        state.programs.insert(id, LinkedProgram { attributes, uniforms });
        state.calls.push(GlCall::LinkProgram { id, vertex, fragment });
        Ok(id)
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(GlCall::DetachShader { program, shader });
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.uniforms.retain(|(p, _), _| *p != program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
        state.release(program);
        state.calls.push(GlCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.current_program = program;
        state.calls.push(GlCall::UseProgram(program));
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let linked = state.programs.get(&program)?;
        linked.attributes.iter().position(|a| a == name).map(|i| i as u32)
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<NullUniformLocation> {
        let state = self.state.borrow();
        let linked = state.programs.get(&program)?;
        linked.uniforms.iter().any(|u| u == name).then(|| NullUniformLocation {
            program,
            name: name.to_string(),
        })
    }

    fn create_vertex_array(&self) -> Result<u32, BackendError> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.calls.push(GlCall::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(GlCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        state.release(vertex_array);
        state.calls.push(GlCall::DeleteVertexArray(vertex_array));
    }

    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> Result<u32, BackendError> {
        let mut state = self.state.borrow_mut();
        match state.buffer_budget {
            Some(0) => {
                return Err(BackendError::ResourceCreation {
                    kind: "buffer",
                    msg: "out of memory".to_string(),
                })
            }
            Some(n) => state.buffer_budget = Some(n - 1),
            None => {}
        }
        let id = state.alloc();
        state.calls.push(GlCall::CreateBuffer {
            id,
            kind,
            len: data.len(),
        });
        Ok(id)
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: Option<u32>) {
        self.record(GlCall::BindBuffer { kind, id: buffer });
    }

    fn vertex_attrib_f32(&self, location: u32, components: i32) {
        self.record(GlCall::VertexAttrib { location, components });
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        state.release(buffer);
        state.calls.push(GlCall::DeleteBuffer(buffer));
    }

    fn create_texture(&self, filter: TextureFilter) -> Result<u32, BackendError> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.calls.push(GlCall::CreateTexture { id, filter });
        Ok(id)
    }

    fn bind_texture(&self, unit: u32, texture: Option<u32>) {
        self.record(GlCall::BindTexture { unit, id: texture });
    }

    fn upload_rgba8(&self, texture: u32, w: u32, h: u32, pixels: &[u8]) -> Result<(), BackendError> {
        if pixels.len() != (w * h * 4) as usize {
            return Err(BackendError::Upload(format!(
                "expected {} bytes for {}x{}, got {}",
                w * h * 4,
                w,
                h,
                pixels.len()
            )));
        }
        self.record(GlCall::UploadRgba8 {
            texture,
            w,
            h,
            pixels: pixels.to_vec(),
        });
        Ok(())
    }

    fn upload_frame(&self, texture: u32, size: FrameSize, frame: &[u8]) -> Result<(), BackendError> {
        let mut state = self.state.borrow_mut();
        if state.fail_uploads {
            return Err(BackendError::Upload("frame not decodable".to_string()));
        }
        let expected = size.w as usize * size.h as usize * 4;
        if frame.len() != expected {
            return Err(BackendError::Upload(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                size.w,
                size.h,
                frame.len()
            )));
        }
        state.frames_uploaded += 1;
        state.calls.push(GlCall::UploadFrame {
            texture,
            w: size.w,
            h: size.h,
        });
        Ok(())
    }

    fn delete_texture(&self, texture: u32) {
        let mut state = self.state.borrow_mut();
        state.release(texture);
        state.calls.push(GlCall::DeleteTexture(texture));
    }

    fn uniform_1i(&self, location: Option<&NullUniformLocation>, v: i32) {
        if let Some(location) = location {
            let mut state = self.state.borrow_mut();
            state.set_uniform(location, vec![v as f32]);
            state.calls.push(GlCall::Uniform1i {
                name: location.name.clone(),
                v,
            });
        }
    }

    fn uniform_1f(&self, location: Option<&NullUniformLocation>, v: f32) {
        if let Some(location) = location {
            let mut state = self.state.borrow_mut();
            state.set_uniform(location, vec![v]);
            state.calls.push(GlCall::Uniform1f {
                name: location.name.clone(),
                v,
            });
        }
    }

    fn uniform_2f(&self, location: Option<&NullUniformLocation>, v0: f32, v1: f32) {
        if let Some(location) = location {
            let mut state = self.state.borrow_mut();
            state.set_uniform(location, vec![v0, v1]);
            state.calls.push(GlCall::Uniform2f {
                name: location.name.clone(),
                v0,
                v1,
            });
        }
    }

    fn viewport(&self, w: u32, h: u32) {
        let mut state = self.state.borrow_mut();
        state.last_viewport = Some((w, h));
        state.calls.push(GlCall::Viewport { w, h });
    }

    fn draw_indexed_triangles(&self, index_count: u32) {
        let mut state = self.state.borrow_mut();
        let program = state.current_program;
        state.calls.push(GlCall::DrawIndexed {
            count: index_count,
            program,
        });
    }
}
