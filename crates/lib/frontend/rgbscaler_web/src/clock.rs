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

    rgbscaler_web::clock.rs

    A FrameClock backed by window.requestAnimationFrame.

    Each request registers a one-shot callback that forwards its FrameHandle
    to the installed frame target, normally the player's engine. The clock
    owns every callback it registers, so cancelled ones are released.
*/

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use scaler_backend_trait::{BackendError, FrameClock, FrameHandle};
use wasm_bindgen::{closure::Closure, JsCast};

use crate::callbacks::PendingCallbacks;

pub type FrameTarget = Rc<dyn Fn(FrameHandle)>;

type FrameCallback = Closure<dyn FnMut(f64)>;

#[derive(Default)]
struct ClockState {
    target: Option<FrameTarget>,
    callbacks: PendingCallbacks<FrameCallback>,
}

#[derive(Default)]
pub struct AnimationFrameClock {
    next_handle: u64,
    state: Rc<RefCell<ClockState>>,
}

impl AnimationFrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the function that receives delivered handles. Callbacks that fire while no target
    /// is installed are dropped.
    pub fn set_target(&self, target: Option<FrameTarget>) {
        self.state.borrow_mut().target = target;
    }

    fn deliver(state: &Weak<RefCell<ClockState>>, handle: FrameHandle) {
        let Some(state) = state.upgrade()
        else {
            return;
        };
        let target = {
            let mut state = state.borrow_mut();
            state.callbacks.deliver(handle);
            state.target.clone()
        };
        if let Some(target) = target {
            target(handle);
        }
    }
}

impl FrameClock for AnimationFrameClock {
    fn request_frame(&mut self) -> Result<FrameHandle, BackendError> {
        let window = web_sys::window().ok_or_else(|| BackendError::FrameRequest("No window".to_string()))?;

        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);

        let state = Rc::downgrade(&self.state);
        let callback: FrameCallback = Closure::once(move |_timestamp: f64| Self::deliver(&state, handle));

        let id = window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| BackendError::FrameRequest(format!("{:?}", e)))?;
        self.state.borrow_mut().callbacks.insert(handle, id, callback);
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let Some((id, callback)) = self.state.borrow_mut().callbacks.cancel(handle)
        else {
            return;
        };
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.cancel_animation_frame(id) {
                log::warn!("AnimationFrameClock: cancelAnimationFrame failed: {:?}", e);
            }
        }
        drop(callback);
    }
}
