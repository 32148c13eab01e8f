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

    rgbscaler_engine::render_loop.rs

    The per-refresh cycle. The loop itself knows nothing about the GPU; it is
    handed a tick function that uploads and draws, and owns the frame clock
    and the single pending frame handle.

    A tick is only run for the handle the loop is currently waiting on. Any
    other delivered handle (cancelled, or superseded by a restart) is counted
    and dropped, so a callback already queued by the host at the moment of
    cancellation never draws.
*/

use scaler_backend_trait::{FrameClock, FrameHandle};
use web_time::{Duration, Instant};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
}

/// What happened on a tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TickOutcome {
    /// A frame was uploaded and drawn.
    Drawn,
    /// The source or context was unavailable; nothing was drawn.
    Skipped,
    /// The delivered handle was not the pending one.
    Ignored,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct LoopStats {
    pub ticks: u64,
    pub frames_drawn: u64,
    pub ticks_skipped: u64,
    pub stale_ticks: u64,
    pub last_tick: Option<Instant>,
    pub last_interval: Option<Duration>,
}

impl LoopStats {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Ignored => {
                self.stale_ticks += 1;
                return;
            }
            TickOutcome::Drawn => self.frames_drawn += 1,
            TickOutcome::Skipped => self.ticks_skipped += 1,
        }
        self.ticks += 1;

        let now = Instant::now();
        self.last_interval = self.last_tick.map(|last| now.duration_since(last));
        self.last_tick = Some(now);
    }
}

pub struct RenderLoop<C: FrameClock> {
    clock: C,
    state: LoopState,
    pending: Option<FrameHandle>,
    stats: LoopStats,
}

impl<C: FrameClock> RenderLoop<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: LoopState::Stopped,
            pending: None,
            stats: LoopStats::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run one tick immediately and schedule the next. Does nothing if already running.
    pub fn start(&mut self, tick: &mut dyn FnMut() -> TickOutcome) {
        if self.is_running() {
            log::trace!("RenderLoop::start(): already running");
            return;
        }
        log::debug!("RenderLoop::start(): starting");
        self.state = LoopState::Running;
        self.run_tick(tick);
    }

    /// Handle a tick delivered by the host.
    pub fn on_frame(&mut self, handle: FrameHandle, tick: &mut dyn FnMut() -> TickOutcome) -> TickOutcome {
        if !self.is_running() || self.pending != Some(handle) {
            log::trace!("RenderLoop::on_frame(): ignoring stale handle {:?}", handle);
            self.stats.record(TickOutcome::Ignored);
            return TickOutcome::Ignored;
        }
        self.pending = None;
        self.run_tick(tick)
    }

    /// Revoke the pending tick, if any. Safe to call at any time.
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.clock.cancel_frame(handle);
        }
        if self.is_running() {
            log::debug!("RenderLoop::stop(): stopped");
        }
        self.state = LoopState::Stopped;
    }

    fn run_tick(&mut self, tick: &mut dyn FnMut() -> TickOutcome) -> TickOutcome {
        let outcome = tick();
        if outcome == TickOutcome::Skipped {
            log::trace!("RenderLoop: tick skipped");
        }
        self.stats.record(outcome);

        match self.clock.request_frame() {
            Ok(handle) => self.pending = Some(handle),
            Err(e) => {
                log::error!("RenderLoop: failed to schedule next frame: {}", e);
                self.pending = None;
                self.state = LoopState::Stopped;
            }
        }
        outcome
    }
}

impl<C: FrameClock> Drop for RenderLoop<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
