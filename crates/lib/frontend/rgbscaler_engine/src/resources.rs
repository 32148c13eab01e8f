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

    rgbscaler_engine::resources.rs

    GPU resources that live as long as a rendering context: the full-surface
    quad and the texture that frames are uploaded into.
*/

use crate::pipeline::{ProgramLocations, ShaderProgram};
use scaler_backend_trait::{BackendError, BufferKind, FrameSource, GpuBackend, TextureFilter};

/// Quad corners in clip space, counter-clockwise from bottom left.
pub const QUAD_POSITIONS: [f32; 12] = [
    -1.0, -1.0, 1.0, //
    1.0, -1.0, 1.0, //
    1.0, 1.0, 1.0, //
    -1.0, 1.0, 1.0, //
];

/// Texture coordinates for each corner. Frames are uploaded top row first, so v = 0 is the top
/// edge of the quad.
pub const QUAD_TEXCOORDS: [f32; 8] = [
    0.0, 1.0, //
    1.0, 1.0, //
    1.0, 0.0, //
    0.0, 0.0, //
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Shown until the first real frame is uploaded.
pub const PLACEHOLDER_PIXEL: [u8; 4] = [0, 0, 255, 255];

/// The static quad shared by every render mode.
pub struct GeometryBuffers<B: GpuBackend> {
    vertex_array: B::VertexArray,
    positions: B::Buffer,
    texcoords: B::Buffer,
    indices: B::Buffer,
}

impl<B: GpuBackend> GeometryBuffers<B> {
    pub fn new(backend: &B) -> Result<Self, BackendError> {
        let vertex_array = backend.create_vertex_array()?;

        let mut created: Vec<B::Buffer> = Vec::with_capacity(3);
        let uploads: [(BufferKind, &[u8]); 3] = [
            (BufferKind::Vertex, bytemuck::cast_slice(&QUAD_POSITIONS)),
            (BufferKind::Vertex, bytemuck::cast_slice(&QUAD_TEXCOORDS)),
            (BufferKind::Index, bytemuck::cast_slice(&QUAD_INDICES)),
        ];
        for (kind, data) in uploads {
            match backend.create_buffer(kind, data) {
                Ok(buffer) => created.push(buffer),
                Err(e) => {
                    for buffer in created {
                        backend.delete_buffer(buffer);
                    }
                    backend.delete_vertex_array(vertex_array);
                    return Err(e);
                }
            }
        }

        Ok(Self {
            vertex_array,
            positions: created[0],
            texcoords: created[1],
            indices: created[2],
        })
    }

    /// Bind the quad and point the program's attributes at it.
    pub fn bind(&self, backend: &B, locations: &ProgramLocations<B>) {
        backend.bind_vertex_array(Some(self.vertex_array));

        backend.bind_buffer(BufferKind::Vertex, Some(self.positions));
        backend.vertex_attrib_f32(locations.vertex_position, 3);

        backend.bind_buffer(BufferKind::Vertex, Some(self.texcoords));
        backend.vertex_attrib_f32(locations.texture_coord, 2);

        backend.bind_buffer(BufferKind::Index, Some(self.indices));
    }

    pub fn index_count(&self) -> u32 {
        QUAD_INDICES.len() as u32
    }

    pub fn destroy(self, backend: &B) {
        backend.bind_vertex_array(None);
        backend.delete_buffer(self.positions);
        backend.delete_buffer(self.texcoords);
        backend.delete_buffer(self.indices);
        backend.delete_vertex_array(self.vertex_array);
    }
}

/// The texture frames are uploaded into.
pub struct FrameTexture<B: GpuBackend> {
    texture: B::Texture,
}

impl<B: GpuBackend> FrameTexture<B> {
    pub fn new(backend: &B) -> Result<Self, BackendError> {
        let texture = backend.create_texture(TextureFilter::Linear)?;
        backend.bind_texture(0, Some(texture));
        if let Err(e) = backend.upload_rgba8(texture, 1, 1, &PLACEHOLDER_PIXEL) {
            backend.delete_texture(texture);
            return Err(e);
        }
        Ok(Self { texture })
    }

    pub fn texture(&self) -> B::Texture {
        self.texture
    }

    pub fn bind(&self, backend: &B) {
        backend.bind_texture(0, Some(self.texture));
    }

    /// Replace the texture contents with the source's current frame. Returns Ok(false) if the
    /// source had no frame to give.
    pub fn upload(&self, backend: &B, source: &dyn FrameSource<B::Frame>) -> Result<bool, BackendError> {
        let size = match source.frame_size() {
            Some(size) if !size.is_empty() => size,
            _ => return Ok(false),
        };

        self.bind(backend);
        let mut result = Ok(());
        let lent = source.with_frame(&mut |frame| {
            result = backend.upload_frame(self.texture, size, frame);
        });
        result.map(|_| lent)
    }

    pub fn destroy(self, backend: &B) {
        backend.bind_texture(0, None);
        backend.delete_texture(self.texture);
    }
}

/// Everything the engine allocates on a context. The program is optional: a failed shader build
/// leaves the buffers and texture in place but disables drawing.
pub struct GpuResources<B: GpuBackend> {
    pub buffers: GeometryBuffers<B>,
    pub texture: FrameTexture<B>,
    pub program: Option<ShaderProgram<B>>,
}

impl<B: GpuBackend> GpuResources<B> {
    pub fn new(backend: &B) -> Result<Self, BackendError> {
        let buffers = GeometryBuffers::new(backend)?;
        let texture = match FrameTexture::new(backend) {
            Ok(texture) => texture,
            Err(e) => {
                buffers.destroy(backend);
                return Err(e);
            }
        };
        Ok(Self {
            buffers,
            texture,
            program: None,
        })
    }

    /// Swap in a new program, releasing the old one.
    pub fn replace_program(&mut self, backend: &B, program: Option<ShaderProgram<B>>) {
        if let Some(old) = std::mem::replace(&mut self.program, program) {
            old.destroy(backend);
        }
    }

    pub fn destroy(mut self, backend: &B) {
        backend.use_program(None);
        self.replace_program(backend, None);
        self.buffers.destroy(backend);
        self.texture.destroy(backend);
    }
}
