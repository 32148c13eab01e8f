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

    rgbscaler_glow::lib.rs

    Implements GpuBackend over a glow context.

    The engine's shaders are written for GLSL ES 3.00. On native targets the
    version directive is rewritten to GLSL 3.30 core, which accepts the same
    in/out syntax and ignores precision qualifiers.

    Native builds are library API for hosts that own a desktop GL context
    (created by glutin, SDL or similar) and wrap it with GlowBackend::new.
    This workspace's own native frontend runs on the null backend.

    On wasm32 the frame type is an HtmlVideoElement, which is uploaded
    directly by the browser. Elsewhere frames are RGBA8 byte slices.
*/

use std::sync::Arc;

use glow::{HasContext, PixelUnpackData};
use scaler_backend_trait::{BackendError, BufferKind, FrameSize, GpuBackend, ShaderStage, TextureFilter};

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub type GlowFrame = web_sys::HtmlVideoElement;
    }
    else {
        pub type GlowFrame = [u8];
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShaderDialect {
    /// WebGL2 / OpenGL ES 3.0
    Es300,
    /// Desktop OpenGL 3.3 core
    Glsl330,
}

impl ShaderDialect {
    pub fn for_target() -> Self {
        if cfg!(target_arch = "wasm32") {
            ShaderDialect::Es300
        }
        else {
            ShaderDialect::Glsl330
        }
    }

    pub fn version_directive(&self) -> &'static str {
        match self {
            ShaderDialect::Es300 => "#version 300 es",
            ShaderDialect::Glsl330 => "#version 330 core",
        }
    }

    /// Replace the source's leading #version line with this dialect's, or add one if missing.
    pub fn patch_source(&self, source: &str) -> String {
        let trimmed = source.trim_start();
        let body = match trimmed.strip_prefix("#version") {
            Some(rest) => rest.split_once('\n').map(|(_, body)| body).unwrap_or_default(),
            None => trimmed,
        };
        format!("{}\n{}", self.version_directive(), body)
    }
}

fn buffer_target(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Vertex => glow::ARRAY_BUFFER,
        BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

pub struct GlowBackend {
    gl: Arc<glow::Context>,
    dialect: ShaderDialect,
}

impl GlowBackend {
    pub fn new(gl: Arc<glow::Context>) -> Self {
        Self::with_dialect(gl, ShaderDialect::for_target())
    }

    pub fn with_dialect(gl: Arc<glow::Context>, dialect: ShaderDialect) -> Self {
        log::debug!("GlowBackend: using shader dialect {:?}", dialect);
        Self { gl, dialect }
    }

    pub fn context(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    pub fn dialect(&self) -> ShaderDialect {
        self.dialect
    }
}

impl GpuBackend for GlowBackend {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type Texture = glow::Texture;
    type VertexArray = glow::VertexArray;
    type UniformLocation = glow::UniformLocation;
    type Frame = GlowFrame;

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<glow::Shader, BackendError> {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(shader_type)
                .map_err(|log| BackendError::ShaderCompile { stage, log })?;
            self.gl.shader_source(shader, &self.dialect.patch_source(source));
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(BackendError::ShaderCompile { stage, log });
            }
            Ok(shader)
        }
    }

    fn delete_shader(&self, shader: glow::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn link_program(&self, vertex: glow::Shader, fragment: glow::Shader) -> Result<glow::Program, BackendError> {
        unsafe {
            let program = self.gl.create_program().map_err(BackendError::ProgramLink)?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(BackendError::ProgramLink(log));
            }
            Ok(program)
        }
    }

    fn detach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn delete_program(&self, program: glow::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<glow::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn attrib_location(&self, program: glow::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(&self, program: glow::Program, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn create_vertex_array(&self) -> Result<glow::VertexArray, BackendError> {
        unsafe {
            self.gl
                .create_vertex_array()
                .map_err(|msg| BackendError::ResourceCreation {
                    kind: "vertex array",
                    msg,
                })
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<glow::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: glow::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> Result<glow::Buffer, BackendError> {
        let target = buffer_target(kind);
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|msg| BackendError::ResourceCreation { kind: "buffer", msg })?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
            Ok(buffer)
        }
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: Option<glow::Buffer>) {
        unsafe { self.gl.bind_buffer(buffer_target(kind), buffer) }
    }

    fn vertex_attrib_f32(&self, location: u32, components: i32) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, 0, 0);
            self.gl.enable_vertex_attrib_array(location);
        }
    }

    fn delete_buffer(&self, buffer: glow::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn create_texture(&self, filter: TextureFilter) -> Result<glow::Texture, BackendError> {
        let filter = match filter {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
        } as i32;
        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|msg| BackendError::ResourceCreation { kind: "texture", msg })?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
            Ok(texture)
        }
    }

    fn bind_texture(&self, unit: u32, texture: Option<glow::Texture>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn upload_rgba8(&self, texture: glow::Texture, w: u32, h: u32, pixels: &[u8]) -> Result<(), BackendError> {
        if pixels.len() != w as usize * h as usize * 4 {
            return Err(BackendError::Upload(format!(
                "{} bytes does not match a {}x{} RGBA8 image",
                pixels.len(),
                w,
                h
            )));
        }
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                w as i32,
                h as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(pixels)),
            );
        }
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn upload_frame(&self, texture: glow::Texture, size: FrameSize, frame: &[u8]) -> Result<(), BackendError> {
        self.upload_rgba8(texture, size.w, size.h, frame)
    }

    #[cfg(target_arch = "wasm32")]
    fn upload_frame(
        &self,
        texture: glow::Texture,
        _size: FrameSize,
        frame: &web_sys::HtmlVideoElement,
    ) -> Result<(), BackendError> {
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d_with_html_video(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                frame,
            );
            match self.gl.get_error() {
                glow::NO_ERROR => Ok(()),
                err => Err(BackendError::Upload(format!("GL error 0x{:04X}", err))),
            }
        }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn uniform_1i(&self, location: Option<&glow::UniformLocation>, v: i32) {
        unsafe { self.gl.uniform_1_i32(location, v) }
    }

    fn uniform_1f(&self, location: Option<&glow::UniformLocation>, v: f32) {
        unsafe { self.gl.uniform_1_f32(location, v) }
    }

    fn uniform_2f(&self, location: Option<&glow::UniformLocation>, v0: f32, v1: f32) {
        unsafe { self.gl.uniform_2_f32(location, v0, v1) }
    }

    fn viewport(&self, w: u32, h: u32) {
        unsafe { self.gl.viewport(0, 0, w as i32, h as i32) }
    }

    fn draw_indexed_triangles(&self, index_count: u32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, index_count as i32, glow::UNSIGNED_SHORT, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "#version 300 es\nprecision highp float;\nvoid main(void) {}\n";

    #[test]
    fn desktop_dialect_rewrites_version() {
        let patched = ShaderDialect::Glsl330.patch_source(SRC);
        assert!(patched.starts_with("#version 330 core\nprecision highp float;"));
        assert_eq!(patched.matches("#version").count(), 1);
    }

    #[test]
    fn es_dialect_is_unchanged() {
        assert_eq!(ShaderDialect::Es300.patch_source(SRC), SRC);
    }

    #[test]
    #[cfg(not(target_arch = "wasm32"))]
    fn native_target_uses_desktop_glsl() {
        assert_eq!(ShaderDialect::for_target(), ShaderDialect::Glsl330);

        let frame: &GlowFrame = &[0u8, 0, 255, 255];
        assert_eq!(frame.len(), 4);
    }

    #[test]
    fn engine_shaders_patch_for_desktop() {
        use rgbscaler_engine::shaders::{AREA_FRAGMENT_SHADER, CRT_FRAGMENT_SHADER, QUAD_VERTEX_SHADER};

        for src in [QUAD_VERTEX_SHADER, AREA_FRAGMENT_SHADER, CRT_FRAGMENT_SHADER] {
            let patched = ShaderDialect::Glsl330.patch_source(src);
            assert!(patched.starts_with("#version 330 core\n"));
            assert_eq!(patched.matches("#version").count(), 1);
            assert_eq!(patched.matches("void main").count(), 1);

            let body = src.split_once('\n').map(|(_, body)| body).unwrap();
            assert!(patched.ends_with(body));
        }
    }

    #[test]
    fn missing_version_is_added() {
        let patched = ShaderDialect::Glsl330.patch_source("void main(void) {}");
        assert_eq!(patched, "#version 330 core\nvoid main(void) {}");
    }
}
