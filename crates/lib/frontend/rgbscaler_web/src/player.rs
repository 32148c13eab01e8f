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

    rgbscaler_web::player.rs

    The JavaScript-facing player handle. Owns the engine and wires the video
    element's media events to it; the page's controls call the exported
    methods.
*/

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use rgbscaler_common::{AspectConfig, BoundingBox, ScalerParams};
use rgbscaler_config::{read_config_string, DEFAULT_CONFIG};
use rgbscaler_engine::ScalerError;
use scaler_backend_trait::FrameHandle;
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{Event, HtmlCanvasElement, HtmlVideoElement};

use crate::{clock::AnimationFrameClock, source::VideoFrameSource, surface::CanvasSurface, WebScalerEngine};

type EventClosure = Closure<dyn FnMut(Event)>;

fn to_js(e: impl ToString) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Run `f` on the engine if it is still alive and not already borrowed.
fn with_engine<R>(engine: &Weak<RefCell<WebScalerEngine>>, f: impl FnOnce(&mut WebScalerEngine) -> R) -> Option<R> {
    let engine = engine.upgrade()?;
    let result = match engine.try_borrow_mut() {
        Ok(mut engine) => Some(f(&mut engine)),
        Err(_) => {
            log::warn!("ScalerPlayer: engine busy, event dropped");
            None
        }
    };
    result
}

#[wasm_bindgen]
pub struct ScalerPlayer {
    engine: Rc<RefCell<WebScalerEngine>>,
    video: HtmlVideoElement,
    playing: Rc<Cell<bool>>,
    listeners: Vec<(&'static str, EventClosure)>,
}

#[wasm_bindgen]
impl ScalerPlayer {
    /// Create a player drawing `video` onto `canvas`, configured from the built-in defaults
    /// and the page's query parameters.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, video: HtmlVideoElement) -> Result<ScalerPlayer, JsValue> {
        Self::with_config(canvas, video, DEFAULT_CONFIG)
    }

    /// Create a player from TOML configuration text. Query parameters still override it.
    pub fn with_config(canvas: HtmlCanvasElement, video: HtmlVideoElement, toml: &str) -> Result<ScalerPlayer, JsValue> {
        let config = read_config_string(toml).map_err(to_js)?;
        let params = config.scaler_params().map_err(to_js)?;
        Self::create(canvas, video, params).map_err(to_js)
    }

    pub fn play(&mut self) {
        if let Err(e) = self.video.play() {
            log::error!("ScalerPlayer::play(): {:?}", e);
            return;
        }
        self.playing.set(true);
        self.engine.borrow_mut().render();
    }

    pub fn pause(&mut self) {
        if let Err(e) = self.video.pause() {
            log::warn!("ScalerPlayer::pause(): {:?}", e);
        }
        self.playing.set(false);
        self.engine.borrow_mut().cancel_render();
    }

    /// Play if paused, pause if playing. Returns whether the player is now playing.
    pub fn toggle_play(&mut self) -> bool {
        if self.playing.get() {
            self.pause();
        }
        else {
            self.play();
        }
        self.playing.get()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Seek to `percent` (0-100) of the video's duration.
    pub fn seek(&self, percent: f64) {
        let duration = self.video.duration();
        if duration.is_finite() && duration > 0.0 {
            self.video.set_current_time(duration * percent.clamp(0.0, 100.0) / 100.0);
        }
    }

    /// Current playback position as a percentage of the duration.
    pub fn seek_position(&self) -> f64 {
        let duration = self.video.duration();
        if duration.is_finite() && duration > 0.0 {
            self.video.current_time() * 100.0 / duration
        }
        else {
            0.0
        }
    }

    /// Hold the video while the seek bar is dragged. Rendering continues so the seek target
    /// stays visible.
    pub fn begin_seek(&self) {
        if let Err(e) = self.video.pause() {
            log::warn!("ScalerPlayer::begin_seek(): {:?}", e);
        }
    }

    pub fn end_seek(&self) {
        if self.playing.get() {
            if let Err(e) = self.video.play() {
                log::error!("ScalerPlayer::end_seek(): {:?}", e);
            }
        }
    }

    pub fn volume(&self) -> f64 {
        self.video.volume()
    }

    pub fn set_volume(&self, volume: f64) {
        self.video.set_volume(volume.clamp(0.0, 1.0));
    }

    /// Returns whether the video is now muted.
    pub fn toggle_mute(&self) -> bool {
        let muted = !self.video.muted();
        self.video.set_muted(muted);
        muted
    }

    pub fn fullscreen(&self) -> Result<(), JsValue> {
        self.engine.borrow().request_fullscreen().map_err(to_js)
    }

    pub fn set_crt_params(&mut self, mask_intensity: f32, scanline_intensity: f32) {
        self.engine.borrow_mut().set_crt_params(mask_intensity, scanline_intensity);
    }

    pub fn set_crt_mode(&mut self, enabled: bool) -> Result<(), JsValue> {
        self.engine.borrow_mut().set_crt_mode(enabled).map_err(to_js)
    }

    pub fn set_integer_scaling(&mut self, integer_scaling: bool) {
        self.engine.borrow_mut().set_integer_scaling(integer_scaling);
    }

    pub fn set_bounding_box(&mut self, max_width: f64, max_height: f64) {
        self.engine
            .borrow_mut()
            .set_bounding_box(BoundingBox::new(max_width, max_height));
    }

    pub fn set_aspect(&mut self, declared_aspect_ratio: Option<f64>, pixel_aspect_ratio: Option<f64>) {
        self.engine.borrow_mut().set_aspect(AspectConfig {
            declared_aspect_ratio,
            pixel_aspect_ratio,
        });
    }

    /// Recompute the canvas size from the current inputs.
    pub fn resize(&mut self) {
        self.engine.borrow_mut().resize();
    }
}

impl ScalerPlayer {
    fn create(canvas: HtmlCanvasElement, video: HtmlVideoElement, params: ScalerParams) -> Result<ScalerPlayer, ScalerError> {
        let engine = Rc::new_cyclic(|weak: &Weak<RefCell<WebScalerEngine>>| {
            let clock = AnimationFrameClock::new();
            let weak = weak.clone();
            clock.set_target(Some(Rc::new(move |handle: FrameHandle| {
                with_engine(&weak, |engine| engine.on_frame(handle));
            })));
            RefCell::new(WebScalerEngine::new(params, clock))
        });

        {
            let mut engine = engine.borrow_mut();
            engine.attach_surface(CanvasSurface::new(canvas))?;
            engine.attach_frame_source(Rc::new(VideoFrameSource::new(video.clone())))?;
        }

        let mut player = ScalerPlayer {
            engine,
            video,
            playing: Rc::new(Cell::new(false)),
            listeners: Vec::new(),
        };
        player.install_listeners();
        Ok(player)
    }

    fn install_listeners(&mut self) {
        let weak = Rc::downgrade(&self.engine);
        let playing = Rc::clone(&self.playing);
        let video = self.video.clone();
        self.listen(
            "loadedmetadata",
            Closure::wrap(Box::new(move |_event: Event| {
                log::debug!("ScalerPlayer: video metadata loaded");
                if let Err(e) = video.pause() {
                    log::warn!("ScalerPlayer: {:?}", e);
                }
                playing.set(false);
                with_engine(&weak, |engine| engine.frame_source_loaded());
            }) as Box<dyn FnMut(_)>),
        );

        let weak = Rc::downgrade(&self.engine);
        let playing = Rc::clone(&self.playing);
        self.listen(
            "ended",
            Closure::wrap(Box::new(move |_event: Event| {
                playing.set(false);
                with_engine(&weak, |engine| engine.cancel_render());
            }) as Box<dyn FnMut(_)>),
        );
    }

    fn listen(&mut self, event: &'static str, closure: EventClosure) {
        match self
            .video
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        {
            Ok(()) => self.listeners.push((event, closure)),
            Err(e) => log::error!("ScalerPlayer: couldn't listen for '{}': {:?}", event, e),
        }
    }
}

impl Drop for ScalerPlayer {
    fn drop(&mut self) {
        for (event, closure) in self.listeners.drain(..) {
            let _ = self
                .video
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}
