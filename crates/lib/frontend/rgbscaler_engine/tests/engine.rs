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

    rgbscaler_engine::tests::engine.rs

    Drives ScalerEngine end to end against the null backend, surface, clock
    and pattern source.
*/

use std::{borrow::Cow, rc::Rc};

use rgbscaler_common::{AspectConfig, BoundingBox, CrtParams, RenderMode, ScalerParams};
use rgbscaler_engine::{
    shaders::{AREA_FRAGMENT_SHADER, CRT_FRAGMENT_SHADER, UNIFORM_BASE_DIMENSION, UNIFORM_BASE_DIMENSION_I, UNIFORM_MASK_INTENSITY, UNIFORM_SCANLINE_INTENSITY},
    EngineStatus,
    ScalerEngine,
    ScalerError,
    ShaderSources,
    TickOutcome,
};
use rgbscaler_null::{GlCall, ManualFrameClock, NullBackend, NullSurface, TestPatternSource};
use scaler_backend_trait::{DisplaySurface, SurfaceDimensions};

type Engine = ScalerEngine<NullSurface, ManualFrameClock>;

struct Rig {
    engine: Engine,
    gl: NullBackend,
    clock: ManualFrameClock,
    source: Rc<TestPatternSource>,
}

fn params() -> ScalerParams {
    ScalerParams::new(BoundingBox::new(960.0, 720.0))
}

fn rig_with(params: ScalerParams, surface: NullSurface, sources: ShaderSources) -> (Rig, Result<(), ScalerError>) {
    let clock = ManualFrameClock::new();
    let gl = surface.backend();
    let source = Rc::new(TestPatternSource::new(320, 240));
    let mut engine = Engine::with_sources(params, clock.clone(), sources);

    engine.attach_surface(surface).unwrap();
    let result = engine.attach_frame_source(source.clone());
    (
        Rig {
            engine,
            gl,
            clock,
            source,
        },
        result,
    )
}

fn rig(params: ScalerParams) -> Rig {
    let (rig, result) = rig_with(params, NullSurface::new(), ShaderSources::default());
    result.unwrap();
    rig
}

#[test]
fn attach_builds_and_sizes_surface() {
    let rig = rig(params());
    assert_eq!(rig.engine.status(), EngineStatus::Ready);

    let geometry = rig.engine.geometry().unwrap();
    assert_eq!((geometry.device_w, geometry.device_h), (960, 720));

    let surface = rig.engine.surface().unwrap();
    assert_eq!(surface.backing_dimensions(), SurfaceDimensions { w: 960, h: 720 });
    assert_eq!(surface.display_dimensions(), SurfaceDimensions { w: 960, h: 720 });
    assert_eq!(rig.gl.last_viewport(), Some((960, 720)));

    let program = rig.gl.current_program().unwrap();
    assert_eq!(rig.gl.uniform_value(program, UNIFORM_BASE_DIMENSION), Some(vec![320.0, 240.0]));
    assert_eq!(
        rig.gl.uniform_value(program, UNIFORM_BASE_DIMENSION_I),
        Some(vec![1.0 / 320.0, 1.0 / 240.0])
    );
}

#[test]
fn source_attached_first_waits_for_surface() {
    let clock = ManualFrameClock::new();
    let surface = NullSurface::new();
    let gl = surface.backend();
    let mut engine = Engine::new(params(), clock);

    engine.attach_frame_source(Rc::new(TestPatternSource::new(320, 240))).unwrap();
    assert_eq!(engine.status(), EngineStatus::Detached);
    assert_eq!(gl.live_objects(), 0);

    engine.attach_surface(surface).unwrap();
    assert_eq!(engine.status(), EngineStatus::Ready);
}

#[test]
fn high_density_surface() {
    let (rig, result) = rig_with(
        params(),
        NullSurface::new().with_pixel_density(2.0),
        ShaderSources::default(),
    );
    result.unwrap();

    let geometry = rig.engine.geometry().unwrap();
    assert_eq!((geometry.device_w, geometry.device_h), (1920, 1440));
    assert_eq!((geometry.display_w, geometry.display_h), (960, 720));
    assert_eq!(rig.gl.last_viewport(), Some((1920, 1440)));
}

#[test]
fn broken_fragment_shader_disables_drawing() {
    let sources = ShaderSources {
        area_fragment: Cow::Owned(AREA_FRAGMENT_SHADER.replace("void main(void) {", "void main(void) {{")),
        ..Default::default()
    };
    let (mut rig, result) = rig_with(params(), NullSurface::new(), sources);

    assert!(matches!(result, Err(ScalerError::ShaderBuild(_))));
    assert_eq!(rig.engine.status(), EngineStatus::BuildFailed);
    assert!(rig.engine.resize().is_none());

    rig.engine.render();
    assert!(!rig.engine.is_playing());
    assert_eq!(rig.clock.requested(), 0);
    assert_eq!(rig.gl.draw_count(), 0);
    assert_eq!(rig.gl.frames_uploaded(), 0);
}

#[test]
fn crt_params_apply_while_stopped() {
    let mut p = params();
    p.render_mode = RenderMode::Crt;
    let mut rig = rig(p);
    let program = rig.gl.current_program().unwrap();

    rig.engine.set_crt_params(0.5, 0.9);
    assert!(!rig.engine.is_playing());
    assert_eq!(rig.gl.uniform_value(program, UNIFORM_MASK_INTENSITY), Some(vec![0.5]));
    assert_eq!(rig.gl.uniform_value(program, UNIFORM_SCANLINE_INTENSITY), Some(vec![0.9]));
    assert_eq!(rig.engine.params().crt, CrtParams::new(0.5, 0.9));

    rig.engine.render();
    let draws: Vec<_> = rig
        .gl
        .calls()
        .into_iter()
        .filter(|c| matches!(c, GlCall::DrawIndexed { .. }))
        .collect();
    assert_eq!(draws, vec![GlCall::DrawIndexed {
        count: 6,
        program: Some(program)
    }]);
    assert_eq!(rig.gl.uniform_value(program, UNIFORM_MASK_INTENSITY), Some(vec![0.5]));
}

#[test]
fn cancel_before_render_is_harmless() {
    let mut rig = rig(params());
    rig.engine.cancel_render();
    rig.engine.cancel_render();
    assert!(!rig.engine.is_playing());
    assert_eq!(rig.clock.requested(), 0);
    assert_eq!(rig.gl.draw_count(), 0);
}

#[test]
fn render_twice_keeps_one_pending_tick() {
    let mut rig = rig(params());
    rig.engine.render();
    rig.engine.render();
    assert!(rig.engine.is_playing());
    assert_eq!(rig.clock.outstanding().len(), 1);
    assert_eq!(rig.gl.draw_count(), 1);
}

#[test]
fn ticks_upload_then_draw() {
    let mut rig = rig(params());
    rig.engine.render();
    for _ in 0..5 {
        rig.source.advance();
        let handle = rig.clock.take_due().unwrap();
        assert_eq!(rig.engine.on_frame(handle), TickOutcome::Drawn);
    }
    assert_eq!(rig.gl.frames_uploaded(), 6);
    assert_eq!(rig.gl.draw_count(), 6);
    assert_eq!(rig.engine.stats().frames_drawn, 6);

    // Each draw is immediately preceded by its upload.
    let calls = rig.gl.calls();
    for (i, call) in calls.iter().enumerate() {
        if matches!(call, GlCall::DrawIndexed { .. }) {
            assert!(matches!(calls[i - 1], GlCall::UploadFrame { w: 320, h: 240, .. }));
        }
    }
}

#[test]
fn tick_queued_at_cancel_never_draws() {
    let mut rig = rig(params());
    rig.engine.render();
    let queued = rig.clock.take_due().unwrap();
    rig.engine.cancel_render();

    assert_eq!(rig.engine.on_frame(queued), TickOutcome::Ignored);
    assert_eq!(rig.gl.draw_count(), 1);
    assert!(rig.clock.outstanding().is_empty());
    assert_eq!(rig.engine.pending_frame(), None);
}

#[test]
fn unsupported_context_is_reported() {
    let (rig, result) = rig_with(params(), NullSurface::unsupported(), ShaderSources::default());
    let mut engine = rig.engine;

    assert!(matches!(result, Err(ScalerError::UnsupportedContext(_))));
    assert_eq!(engine.status(), EngineStatus::Unsupported);
    assert!(engine.resize().is_none());
    engine.render();
    assert!(!engine.is_playing());
    assert_eq!(rig.clock.requested(), 0);
    assert_eq!(rig.gl.live_objects(), 0);
    assert_eq!(rig.gl.draw_count(), 0);

    // A capable surface brings rendering back.
    engine.attach_surface(NullSurface::new()).unwrap();
    assert_eq!(engine.status(), EngineStatus::Ready);
}

#[test]
fn missing_frames_skip_but_keep_ticking() {
    let mut rig = rig(params());
    rig.source.unload();
    rig.engine.render();
    assert_eq!(rig.engine.stats().ticks_skipped, 1);

    let handle = rig.clock.take_due().unwrap();
    assert_eq!(rig.engine.on_frame(handle), TickOutcome::Skipped);
    assert!(rig.engine.is_playing());

    rig.source.set_size(320, 240);
    let handle = rig.clock.take_due().unwrap();
    assert_eq!(rig.engine.on_frame(handle), TickOutcome::Drawn);
    assert_eq!(rig.gl.draw_count(), 1);
}

#[test]
fn failed_upload_skips_tick() {
    let mut rig = rig(params());
    rig.gl.set_fail_uploads(true);
    rig.engine.render();
    assert_eq!(rig.gl.draw_count(), 0);
    assert_eq!(rig.clock.outstanding().len(), 1);

    rig.gl.set_fail_uploads(false);
    let handle = rig.clock.take_due().unwrap();
    assert_eq!(rig.engine.on_frame(handle), TickOutcome::Drawn);
}

#[test]
fn crt_mode_switch_rebuilds_program_only() {
    let mut rig = rig(params());
    let old = rig.gl.current_program().unwrap();
    let buffers_before = rig
        .gl
        .calls()
        .iter()
        .filter(|c| matches!(c, GlCall::CreateBuffer { .. }))
        .count();

    rig.engine.set_crt_mode(true).unwrap();
    let new = rig.gl.current_program().unwrap();
    assert_ne!(old, new);
    assert_eq!(rig.engine.params().render_mode, RenderMode::Crt);

    let calls = rig.gl.calls();
    assert!(calls.contains(&GlCall::DeleteProgram(old)));
    assert_eq!(
        calls.iter().filter(|c| matches!(c, GlCall::CreateBuffer { .. })).count(),
        buffers_before
    );
    assert_eq!(rig.gl.uniform_value(new, UNIFORM_MASK_INTENSITY), Some(vec![0.3]));
    assert_eq!(rig.gl.uniform_value(new, UNIFORM_BASE_DIMENSION), Some(vec![320.0, 240.0]));

    // The next draw uses the new program.
    rig.engine.render();
    let draws: Vec<_> = rig
        .gl
        .calls()
        .into_iter()
        .filter(|c| matches!(c, GlCall::DrawIndexed { .. }))
        .collect();
    assert_eq!(draws, vec![GlCall::DrawIndexed {
        count: 6,
        program: Some(new)
    }]);
    rig.engine.cancel_render();

    // Asking for the mode already in use does nothing.
    rig.gl.clear_calls();
    rig.engine.set_crt_mode(true).unwrap();
    assert!(!rig.gl.calls().iter().any(|c| matches!(c, GlCall::LinkProgram { .. })));
}

#[test]
fn failed_mode_switch_stops_playback() {
    let sources = ShaderSources {
        crt_fragment: Cow::Owned(CRT_FRAGMENT_SHADER.replace("void main(void) {", "void main(void) {{")),
        ..Default::default()
    };
    let (mut rig, result) = rig_with(params(), NullSurface::new(), sources);
    result.unwrap();

    rig.engine.render();
    let queued = rig.clock.outstanding()[0];

    assert!(matches!(rig.engine.set_crt_mode(true), Err(ScalerError::ShaderBuild(_))));
    assert_eq!(rig.engine.status(), EngineStatus::BuildFailed);
    assert!(!rig.engine.is_playing());
    assert!(rig.clock.outstanding().is_empty());
    assert_eq!(rig.engine.on_frame(queued), TickOutcome::Ignored);

    let requested = rig.clock.requested();
    rig.engine.render();
    assert_eq!(rig.clock.requested(), requested);
    assert_eq!(rig.gl.draw_count(), 1);

    // Going back to the working variant restores rendering.
    rig.engine.set_crt_mode(false).unwrap();
    rig.engine.render();
    assert!(rig.engine.is_playing());
    assert_eq!(rig.gl.draw_count(), 2);
}

#[test]
fn input_changes_recompute_geometry() {
    let mut rig = rig(params());

    rig.source.set_size(256, 224);
    let geometry = rig.engine.frame_source_loaded().unwrap();
    assert_eq!((geometry.device_w, geometry.device_h), (823, 720));

    let geometry = rig.engine.set_integer_scaling(true).unwrap();
    assert_eq!((geometry.device_w, geometry.device_h), (768, 672));
    assert_eq!(geometry.scale_factor, 3.0);

    let geometry = rig.engine.set_aspect(AspectConfig::declared(4.0 / 3.0)).unwrap();
    assert_eq!((geometry.device_w, geometry.device_h), (896, 672));

    let geometry = rig.engine.set_bounding_box(BoundingBox::new(500.0, 400.0)).unwrap();
    assert_eq!((geometry.device_w, geometry.device_h), (299, 224));
    assert_eq!(rig.gl.last_viewport(), Some((299, 224)));
    assert_eq!(
        rig.engine.surface().unwrap().backing_dimensions(),
        SurfaceDimensions { w: 299, h: 224 }
    );
}

#[test]
fn frame_source_loaded_stops_playback() {
    let mut rig = rig(params());
    rig.engine.render();
    assert!(rig.engine.is_playing());

    rig.engine.frame_source_loaded();
    assert!(!rig.engine.is_playing());
    assert!(rig.clock.outstanding().is_empty());
}

#[test]
fn fullscreen_is_delegated() {
    let rig = rig(params());
    rig.engine.request_fullscreen().unwrap();
    assert_eq!(rig.engine.surface().unwrap().fullscreen_requests(), 1);

    let detached = Engine::new(params(), ManualFrameClock::new());
    assert!(matches!(detached.request_fullscreen(), Err(ScalerError::NoSurface)));
}

#[test]
fn reattaching_source_rebuilds_gpu_state() {
    let mut rig = rig(params());
    let first = rig.gl.current_program().unwrap();
    rig.engine.attach_frame_source(rig.source.clone()).unwrap();

    assert_ne!(rig.gl.current_program(), Some(first));
    assert!(rig.gl.calls().contains(&GlCall::DeleteProgram(first)));
    assert_eq!(rig.gl.live_objects(), 6);
}

#[test]
fn detach_and_drop_release_everything() {
    let mut rig = rig(params());
    rig.engine.render();
    rig.engine.detach();
    assert_eq!(rig.engine.status(), EngineStatus::Detached);
    assert_eq!(rig.gl.live_objects(), 0);
    assert!(rig.clock.outstanding().is_empty());

    let rig = self::rig(params());
    let gl = rig.gl.clone();
    assert!(gl.live_objects() > 0);
    drop(rig);
    assert_eq!(gl.live_objects(), 0);
}
