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

    rgbscaler_engine::lib.rs

    The RGBScaler engine. Renders frames from a FrameSource onto a
    DisplaySurface through any GpuBackend, scaled with area sampling and
    optionally passed through a CRT slot mask and scanline stage.
*/

pub mod crt;
pub mod engine;
pub mod pipeline;
pub mod render_loop;
pub mod resources;
pub mod shaders;

pub use crt::CrtPostProcessState;
pub use engine::{EngineStatus, FrameOf, ScalerEngine, ScalerError, SharedFrameSource};
pub use pipeline::{PipelineError, ProgramLocations, ShaderPipelineBuilder, ShaderProgram};
pub use render_loop::{LoopState, LoopStats, RenderLoop, TickOutcome};
pub use resources::{FrameTexture, GeometryBuffers, GpuResources};
pub use shaders::ShaderSources;
