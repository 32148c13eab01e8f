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

    scaler_backend_trait::lib.rs

    Defines the traits the scaler engine is written against.

    GpuBackend is a narrow, GL-shaped view of a rendering context: just the
    shader, buffer, texture, uniform and draw calls the scaler needs. Each
    backend names its own native handle types.

    DisplaySurface is the drawable target. It has a 'backing' size, which is
    the resolution in device pixels, and a 'display' size, which is the size
    the user sees in display units. These differ on high pixel density
    displays. The surface is also what produces the rendering context.

    FrameSource is the external video element that supplies frames, and
    FrameClock is the host's per-refresh callback mechanism.

    None of these are required to be Send; everything runs on the single
    rendering thread.
*/

use std::fmt::{self, Debug, Display};

pub use rgbscaler_common::FrameSize;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Rendering context unavailable: {0}")]
    Unsupported(String),
    #[error("Failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("Failed to link shader program: {0}")]
    ProgramLink(String),
    #[error("Failed to create {kind}: {msg}")]
    ResourceCreation { kind: &'static str, msg: String },
    #[error("Frame upload failed: {0}")]
    Upload(String),
    #[error("Frame request failed: {0}")]
    FrameRequest(String),
    #[error("Fullscreen request failed: {0}")]
    Fullscreen(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BufferKind {
    /// Per-vertex attribute data.
    Vertex,
    /// u16 element indices.
    Index,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SurfaceDimensions {
    pub w: u32,
    pub h: u32,
}

impl From<(u32, u32)> for SurfaceDimensions {
    fn from(t: (u32, u32)) -> Self {
        SurfaceDimensions { w: t.0, h: t.1 }
    }
}

pub trait GpuBackend {
    type Shader: Copy + Debug;
    type Program: Copy + Debug + PartialEq;
    type Buffer: Copy + Debug;
    type Texture: Copy + Debug;
    type VertexArray: Copy + Debug;
    type UniformLocation: Clone + Debug;
    /// What a frame source hands to [GpuBackend::upload_frame]. Raw RGBA8 bytes for native
    /// backends; a browser backend may accept a media element directly.
    type Frame: ?Sized;

    /// Compile a single shader stage. On failure the shader object has already been deleted.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader, BackendError>;
    fn delete_shader(&self, shader: Self::Shader);
    /// Attach both stages to a new program and link it. Shaders remain owned by the caller.
    /// On failure the program object has already been deleted.
    fn link_program(&self, vertex: Self::Shader, fragment: Self::Shader) -> Result<Self::Program, BackendError>;
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, BackendError>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    /// Create a buffer with static contents.
    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> Result<Self::Buffer, BackendError>;
    fn bind_buffer(&self, kind: BufferKind, buffer: Option<Self::Buffer>);
    /// Point attribute `location` at the currently bound vertex buffer as tightly packed f32
    /// tuples of `components` elements, and enable it.
    fn vertex_attrib_f32(&self, location: u32, components: i32);
    fn delete_buffer(&self, buffer: Self::Buffer);

    /// Create a 2D texture clamped at the edges, with no mipmaps.
    fn create_texture(&self, filter: TextureFilter) -> Result<Self::Texture, BackendError>;
    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>);
    fn upload_rgba8(&self, texture: Self::Texture, w: u32, h: u32, pixels: &[u8]) -> Result<(), BackendError>;
    /// Upload a full frame from a frame source, replacing the texture contents.
    fn upload_frame(&self, texture: Self::Texture, size: FrameSize, frame: &Self::Frame) -> Result<(), BackendError>;
    fn delete_texture(&self, texture: Self::Texture);

    fn uniform_1i(&self, location: Option<&Self::UniformLocation>, v: i32);
    fn uniform_1f(&self, location: Option<&Self::UniformLocation>, v: f32);
    fn uniform_2f(&self, location: Option<&Self::UniformLocation>, v0: f32, v1: f32);

    fn viewport(&self, w: u32, h: u32);
    /// Draw `index_count` u16 indices from the bound index buffer as a triangle list.
    fn draw_indexed_triangles(&self, index_count: u32);
}

pub trait DisplaySurface {
    type Backend: GpuBackend;

    /// Produce a rendering context for this surface. Fails with [BackendError::Unsupported] if
    /// the rendering API cannot be acquired.
    fn acquire_backend(&mut self) -> Result<Self::Backend, BackendError>;
    /// The ratio of device pixels to display units.
    fn pixel_density(&self) -> f64;
    fn backing_dimensions(&self) -> SurfaceDimensions;
    fn set_backing_dimensions(&mut self, dim: SurfaceDimensions);
    fn display_dimensions(&self) -> SurfaceDimensions;
    fn set_display_dimensions(&mut self, dim: SurfaceDimensions);
    fn request_fullscreen(&self) -> Result<(), BackendError>;
}

/// The external producer of video frames. `F` is the backend's [GpuBackend::Frame] type.
pub trait FrameSource<F: ?Sized> {
    /// Intrinsic size of the current frame, or None if nothing is loaded yet.
    fn frame_size(&self) -> Option<FrameSize>;
    /// Lend the current frame to `f`. Returns false, without calling `f`, if no frame is
    /// available right now.
    fn with_frame(&self, f: &mut dyn FnMut(&F)) -> bool;
}

/// Identifies one scheduled frame callback.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FrameHandle(pub u64);

/// The host's once-per-refresh callback mechanism.
///
/// Requesting a frame schedules a single delivery of the returned handle. The host delivers it by
/// calling the engine's `on_frame` with that handle. Cancelling a handle asks the host not to
/// deliver it, but a consumer must still tolerate late deliveries of cancelled handles.
pub trait FrameClock {
    fn request_frame(&mut self) -> Result<FrameHandle, BackendError>;
    fn cancel_frame(&mut self, handle: FrameHandle);
}
