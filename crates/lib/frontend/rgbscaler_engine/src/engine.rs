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

    rgbscaler_engine::engine.rs

    ScalerEngine ties a display surface, a frame source and a frame clock
    together. GPU state is built the first time both a surface and a source
    are present, and fully rebuilt whenever either is attached again.

    Geometry is recomputed by explicit calls: any setter that changes an input
    to the calculation calls resize() itself, and the host calls resize() or
    frame_source_loaded() when the surface bounds or the source size change
    underneath us.
*/

use std::rc::Rc;

use crate::{
    crt::CrtPostProcessState,
    pipeline::{PipelineError, ShaderPipelineBuilder, ShaderProgram},
    render_loop::{LoopStats, RenderLoop, TickOutcome},
    resources::GpuResources,
    shaders::ShaderSources,
};
use rgbscaler_common::{compute_geometry, AspectConfig, BoundingBox, RenderMode, ScaleGeometry, ScalerParams};
use scaler_backend_trait::{
    BackendError,
    DisplaySurface,
    FrameClock,
    FrameHandle,
    FrameSource,
    GpuBackend,
    SurfaceDimensions,
};
use thiserror::Error;

/// The frame type a surface's backend uploads from.
pub type FrameOf<S> = <<S as DisplaySurface>::Backend as GpuBackend>::Frame;
pub type SharedFrameSource<S> = Rc<dyn FrameSource<FrameOf<S>>>;

#[derive(Error, Debug)]
pub enum ScalerError {
    #[error("Rendering context is not supported: {0}")]
    UnsupportedContext(BackendError),
    #[error(transparent)]
    ShaderBuild(#[from] PipelineError),
    #[error("Failed to allocate GPU resources: {0}")]
    Resource(BackendError),
    #[error("No display surface is attached")]
    NoSurface,
    #[error("{0}")]
    Fullscreen(BackendError),
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EngineStatus {
    /// Waiting for a surface and a frame source.
    #[default]
    Detached,
    /// GPU resources and a program are in place.
    Ready,
    /// The surface could not provide a rendering context.
    Unsupported,
    /// Buffers and texture exist, but there is no program to draw with.
    BuildFailed,
    /// Buffers or texture could not be created.
    ResourceFailed,
}

struct Gpu<B: GpuBackend> {
    backend: B,
    resources: GpuResources<B>,
}

impl<B: GpuBackend> Gpu<B> {
    fn program(&self) -> Option<&ShaderProgram<B>> {
        self.resources.program.as_ref()
    }
}

pub struct ScalerEngine<S: DisplaySurface, C: FrameClock> {
    params: ScalerParams,
    sources: ShaderSources,
    surface: Option<S>,
    source: Option<SharedFrameSource<S>>,
    gpu: Option<Gpu<S::Backend>>,
    status: EngineStatus,
    geometry: Option<ScaleGeometry>,
    crt: CrtPostProcessState,
    render_loop: RenderLoop<C>,
}

impl<S: DisplaySurface, C: FrameClock> ScalerEngine<S, C> {
    pub fn new(params: ScalerParams, clock: C) -> Self {
        Self::with_sources(params, clock, ShaderSources::default())
    }

    pub fn with_sources(params: ScalerParams, clock: C, sources: ShaderSources) -> Self {
        Self {
            params,
            sources,
            surface: None,
            source: None,
            gpu: None,
            status: EngineStatus::Detached,
            geometry: None,
            crt: CrtPostProcessState::new(params.crt),
            render_loop: RenderLoop::new(clock),
        }
    }

    pub fn attach_surface(&mut self, surface: S) -> Result<(), ScalerError> {
        log::debug!("ScalerEngine::attach_surface()");
        self.cancel_render();
        self.teardown_gpu();
        self.surface = Some(surface);
        self.initialize_if_ready()
    }

    pub fn attach_frame_source(&mut self, source: SharedFrameSource<S>) -> Result<(), ScalerError> {
        log::debug!("ScalerEngine::attach_frame_source()");
        self.source = Some(source);
        self.initialize_if_ready()
    }

    fn initialize_if_ready(&mut self) -> Result<(), ScalerError> {
        if self.surface.is_none() || self.source.is_none() {
            return Ok(());
        }
        self.initialize()
    }

    /// Build GPU state from scratch on the attached surface.
    fn initialize(&mut self) -> Result<(), ScalerError> {
        self.teardown_gpu();

        let surface = self.surface.as_mut().ok_or(ScalerError::NoSurface)?;
        let backend = match surface.acquire_backend() {
            Ok(backend) => backend,
            Err(e) => {
                log::error!("ScalerEngine::initialize(): {}", e);
                self.render_loop.stop();
                self.status = EngineStatus::Unsupported;
                return Err(ScalerError::UnsupportedContext(e));
            }
        };

        let resources = match GpuResources::new(&backend) {
            Ok(resources) => resources,
            Err(e) => {
                log::error!("ScalerEngine::initialize(): {}", e);
                self.render_loop.stop();
                self.status = EngineStatus::ResourceFailed;
                return Err(ScalerError::Resource(e));
            }
        };

        self.gpu = Some(Gpu { backend, resources });
        self.rebuild_program()?;
        log::debug!("ScalerEngine::initialize(): GPU resources ready");
        Ok(())
    }

    /// Replace the active program with one built for the current render mode, then reapply
    /// CRT intensities and geometry to it.
    fn rebuild_program(&mut self) -> Result<(), ScalerError> {
        let Some(gpu) = self.gpu.as_mut()
        else {
            return Ok(());
        };

        let mode = self.params.render_mode;
        match ShaderPipelineBuilder::new(&self.sources, mode).build(&gpu.backend) {
            Ok(program) => {
                program.bind(&gpu.backend);
                gpu.resources.buffers.bind(&gpu.backend, program.locations());
                gpu.resources.texture.bind(&gpu.backend);
                self.crt.apply(&gpu.backend, &program);
                gpu.resources.replace_program(&gpu.backend, Some(program));
                self.status = EngineStatus::Ready;
            }
            Err(e) => {
                gpu.resources.replace_program(&gpu.backend, None);
                self.render_loop.stop();
                self.status = EngineStatus::BuildFailed;
                self.geometry = None;
                return Err(e.into());
            }
        }
        self.resize();
        Ok(())
    }

    /// Recompute output geometry and apply it to the surface, viewport and program. Does nothing
    /// until there is a program and the source has a frame size.
    pub fn resize(&mut self) -> Option<ScaleGeometry> {
        let gpu = self.gpu.as_ref()?;
        let program = gpu.program()?;
        let surface = self.surface.as_mut()?;
        let frame = self.source.as_ref()?.frame_size().filter(|size| !size.is_empty())?;

        let geometry = match compute_geometry(
            frame,
            &self.params.aspect,
            &self.params.bounds,
            surface.pixel_density(),
            self.params.integer_scaling,
        ) {
            Ok(geometry) => geometry,
            Err(e) => {
                log::warn!("ScalerEngine::resize(): {}", e);
                return None;
            }
        };

        surface.set_backing_dimensions(SurfaceDimensions {
            w: geometry.device_w,
            h: geometry.device_h,
        });
        surface.set_display_dimensions(SurfaceDimensions {
            w: geometry.display_w,
            h: geometry.display_h,
        });
        gpu.backend.viewport(geometry.device_w, geometry.device_h);

        let (dim, dim_i) = frame.base_dimensions();
        program.set_base_dimension(&gpu.backend, dim, dim_i);

        if self.geometry != Some(geometry) {
            log::debug!(
                "ScalerEngine::resize(): frame {}x{} -> device {}x{}, display {}x{} (scale {:.3}, aspect {:.4})",
                frame.w,
                frame.h,
                geometry.device_w,
                geometry.device_h,
                geometry.display_w,
                geometry.display_h,
                geometry.scale_factor,
                geometry.aspect
            );
        }
        self.geometry = Some(geometry);
        Some(geometry)
    }

    pub fn request_fullscreen(&self) -> Result<(), ScalerError> {
        let surface = self.surface.as_ref().ok_or(ScalerError::NoSurface)?;
        surface.request_fullscreen().map_err(ScalerError::Fullscreen)
    }

    /// Start the render loop. Draws a frame immediately if one is available. Does nothing unless
    /// the engine is [EngineStatus::Ready].
    pub fn render(&mut self) {
        if self.status != EngineStatus::Ready {
            log::debug!("ScalerEngine::render(): not ready ({:?})", self.status);
            return;
        }
        let gpu = &self.gpu;
        let source = &self.source;
        self.render_loop.start(&mut || draw_frame(gpu.as_ref(), source.as_deref()));
    }

    /// Stop the render loop. Safe to call at any time.
    pub fn cancel_render(&mut self) {
        self.render_loop.stop();
    }

    /// Entry point for the host when the frame clock delivers `handle`.
    pub fn on_frame(&mut self, handle: FrameHandle) -> TickOutcome {
        let gpu = &self.gpu;
        let source = &self.source;
        self.render_loop
            .on_frame(handle, &mut || draw_frame(gpu.as_ref(), source.as_deref()))
    }

    pub fn set_crt_params(&mut self, mask_intensity: f32, scanline_intensity: f32) {
        let backend = self.gpu.as_ref().map(|gpu| &gpu.backend);
        let program = self.gpu.as_ref().and_then(|gpu| gpu.program());
        self.crt.set(backend, program, mask_intensity, scanline_intensity);
        self.params.crt = self.crt.params();
    }

    pub fn set_bounding_box(&mut self, bounds: BoundingBox) -> Option<ScaleGeometry> {
        self.params.bounds = bounds;
        self.resize()
    }

    pub fn set_aspect(&mut self, aspect: AspectConfig) -> Option<ScaleGeometry> {
        self.params.aspect = aspect;
        self.resize()
    }

    pub fn set_integer_scaling(&mut self, integer_scaling: bool) -> Option<ScaleGeometry> {
        self.params.integer_scaling = integer_scaling;
        self.resize()
    }

    /// Switch between the area and CRT fragment variants. Rebuilds the program; buffers and
    /// texture are kept.
    pub fn set_crt_mode(&mut self, enabled: bool) -> Result<(), ScalerError> {
        let mode = RenderMode::from_crt_flag(enabled);
        let current = self.gpu.as_ref().and_then(|gpu| gpu.program()).map(|p| p.mode());
        self.params.render_mode = mode;
        if current == Some(mode) {
            return Ok(());
        }
        log::debug!("ScalerEngine::set_crt_mode(): switching to {:?}", mode);
        self.rebuild_program()
    }

    /// The source's metadata changed, such as a new video being loaded.
    pub fn frame_source_loaded(&mut self) -> Option<ScaleGeometry> {
        self.cancel_render();
        self.resize()
    }

    /// Stop rendering and release the surface, the source and all GPU resources.
    pub fn detach(&mut self) {
        self.cancel_render();
        self.teardown_gpu();
        self.surface = None;
        self.source = None;
        self.status = EngineStatus::Detached;
    }

    fn teardown_gpu(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            log::debug!("ScalerEngine: releasing GPU resources");
            gpu.resources.destroy(&gpu.backend);
        }
        self.geometry = None;
    }

    pub fn geometry(&self) -> Option<ScaleGeometry> {
        self.geometry
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.render_loop.is_running()
    }

    pub fn stats(&self) -> &LoopStats {
        self.render_loop.stats()
    }

    pub fn params(&self) -> &ScalerParams {
        &self.params
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.render_loop.pending()
    }
}

impl<S: DisplaySurface, C: FrameClock> Drop for ScalerEngine<S, C> {
    fn drop(&mut self) {
        self.detach();
    }
}

fn draw_frame<B: GpuBackend>(gpu: Option<&Gpu<B>>, source: Option<&dyn FrameSource<B::Frame>>) -> TickOutcome {
    let (Some(gpu), Some(source)) = (gpu, source)
    else {
        return TickOutcome::Skipped;
    };
    if gpu.program().is_none() {
        return TickOutcome::Skipped;
    }

    match gpu.resources.texture.upload(&gpu.backend, source) {
        Ok(true) => {}
        Ok(false) => return TickOutcome::Skipped,
        Err(e) => {
            log::trace!("draw_frame(): {}", e);
            return TickOutcome::Skipped;
        }
    }
    gpu.backend.draw_indexed_triangles(gpu.resources.buffers.index_count());
    TickOutcome::Drawn
}
