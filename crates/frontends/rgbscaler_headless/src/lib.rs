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
*/

//! RGBScaler headless front-end main library component.
//!
//! Runs the scaler engine for a fixed number of frames against the null backend, an in-memory
//! surface and a test pattern source, stepping the frame clock by hand. No window or GPU is
//! needed; the result is a report of the computed geometry and what the render loop did.

#![forbid(unsafe_code)]

use std::{
    fmt::{self, Display},
    rc::Rc,
    time::{Duration, Instant},
};

use rgbscaler_common::{RenderMode, ScaleGeometry};
use rgbscaler_config::ConfigFileParams;
use rgbscaler_engine::{EngineStatus, LoopStats, ScalerEngine};
use rgbscaler_null::{ManualFrameClock, NullSurface, TestPatternSource};

pub struct HeadlessReport {
    pub render_mode: RenderMode,
    pub status: EngineStatus,
    pub geometry: Option<ScaleGeometry>,
    pub stats: LoopStats,
    pub frames_uploaded: usize,
    pub draw_calls: usize,
    pub elapsed: Duration,
}

impl Display for HeadlessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Engine status:   {:?}", self.status)?;
        writeln!(f, "Render mode:     {:?}", self.render_mode)?;
        match &self.geometry {
            Some(g) => {
                writeln!(f, "Device size:     {}x{}", g.device_w, g.device_h)?;
                writeln!(f, "Display size:    {}x{}", g.display_w, g.display_h)?;
                writeln!(f, "Aspect ratio:    {:.4}", g.aspect)?;
                writeln!(f, "Scale factor:    {:.4}", g.scale_factor)?;
            }
            None => writeln!(f, "Geometry:        (none)")?,
        }
        writeln!(
            f,
            "Ticks:           {} ({} drawn, {} skipped, {} stale)",
            self.stats.ticks, self.stats.frames_drawn, self.stats.ticks_skipped, self.stats.stale_ticks
        )?;
        writeln!(f, "Frames uploaded: {}", self.frames_uploaded)?;
        writeln!(f, "Draw calls:      {}", self.draw_calls)?;
        write!(f, "Elapsed:         {:.3}ms", self.elapsed.as_secs_f64() * 1000.0)
    }
}

pub fn run_headless(config: &ConfigFileParams) -> Result<HeadlessReport, anyhow::Error> {
    let params = config.scaler_params()?;
    let headless = &config.headless;

    log::debug!(
        "run_headless(): {} frames of {}x{} at pixel density {}",
        headless.frames,
        headless.frame_width,
        headless.frame_height,
        headless.pixel_density
    );

    let surface = NullSurface::new().with_pixel_density(headless.pixel_density);
    let gl = surface.backend();
    let clock = ManualFrameClock::new();
    let source = Rc::new(TestPatternSource::new(headless.frame_width, headless.frame_height));

    let mut engine: ScalerEngine<NullSurface, ManualFrameClock> = ScalerEngine::new(params, clock.clone());
    engine.attach_surface(surface)?;
    engine.attach_frame_source(source.clone())?;

    let start = Instant::now();
    if headless.frames > 0 {
        engine.render();
        for _ in 1..headless.frames {
            let Some(handle) = clock.take_due()
            else {
                log::warn!("run_headless(): render loop stopped early");
                break;
            };
            source.advance();
            engine.on_frame(handle);
        }
        engine.cancel_render();
    }
    let elapsed = start.elapsed();

    Ok(HeadlessReport {
        render_mode: engine.params().render_mode,
        status: engine.status(),
        geometry: engine.geometry(),
        stats: *engine.stats(),
        frames_uploaded: gl.frames_uploaded(),
        draw_calls: gl.draw_count(),
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgbscaler_config::{read_config, CmdLineArgs, DEFAULT_CONFIG};

    fn config(args: CmdLineArgs) -> ConfigFileParams {
        read_config(DEFAULT_CONFIG, args).unwrap()
    }

    #[test]
    fn renders_requested_frames() {
        let report = run_headless(&config(CmdLineArgs {
            frames: Some(10),
            ..Default::default()
        }))
        .unwrap();

        assert_eq!(report.status, EngineStatus::Ready);
        assert_eq!(report.stats.frames_drawn, 10);
        assert_eq!(report.frames_uploaded, 10);
        assert_eq!(report.draw_calls, 10);
        let geometry = report.geometry.unwrap();
        assert_eq!((geometry.device_w, geometry.device_h), (960, 720));
    }

    #[test]
    fn zero_frames_draws_nothing() {
        let report = run_headless(&config(CmdLineArgs {
            frames: Some(0),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(report.draw_calls, 0);
        assert!(report.geometry.is_some());
    }

    #[test]
    fn preset_and_density_reach_the_engine() {
        let report = run_headless(&config(CmdLineArgs {
            frames: Some(2),
            preset: Some("arcade".to_string()),
            pixel_density: Some(2.0),
            ..Default::default()
        }))
        .unwrap();

        assert_eq!(report.render_mode, RenderMode::Crt);
        let geometry = report.geometry.unwrap();
        assert_eq!((geometry.device_w, geometry.device_h), (1920, 1440));
        assert_eq!((geometry.display_w, geometry.display_h), (960, 720));
    }

    #[test]
    fn report_prints() {
        let report = run_headless(&config(CmdLineArgs {
            frames: Some(1),
            ..Default::default()
        }))
        .unwrap();
        let text = report.to_string();
        assert!(text.contains("Device size:     960x720"));
    }
}
