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

    rgbscaler_null::clock.rs

    A FrameClock that is advanced by hand.
*/

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use scaler_backend_trait::{BackendError, FrameClock, FrameHandle};

#[derive(Default)]
struct ClockState {
    next_handle: u64,
    outstanding: VecDeque<FrameHandle>,
    requested: usize,
    cancelled: Vec<FrameHandle>,
    failing: bool,
}

/// Frame requests queue up until the driver takes them with [ManualFrameClock::take_due] and
/// delivers them to the engine. Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualFrameClock {
    state: Rc<RefCell<ClockState>>,
}

impl ManualFrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the oldest outstanding handle, as a host would when its refresh fires.
    pub fn take_due(&self) -> Option<FrameHandle> {
        self.state.borrow_mut().outstanding.pop_front()
    }

    pub fn outstanding(&self) -> Vec<FrameHandle> {
        self.state.borrow().outstanding.iter().copied().collect()
    }

    /// Total number of successful frame requests.
    pub fn requested(&self) -> usize {
        self.state.borrow().requested
    }

    pub fn cancelled(&self) -> Vec<FrameHandle> {
        self.state.borrow().cancelled.clone()
    }

    /// Make every following request fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().failing = failing;
    }
}

impl FrameClock for ManualFrameClock {
    fn request_frame(&mut self) -> Result<FrameHandle, BackendError> {
        let mut state = self.state.borrow_mut();
        if state.failing {
            return Err(BackendError::FrameRequest("clock stopped".to_string()));
        }
        state.next_handle += 1;
        let handle = FrameHandle(state.next_handle);
        state.outstanding.push_back(handle);
        state.requested += 1;
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        state.outstanding.retain(|h| *h != handle);
        state.cancelled.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_fifo() {
        let mut clock = ManualFrameClock::new();
        let a = clock.request_frame().unwrap();
        let b = clock.request_frame().unwrap();
        assert_ne!(a, b);
        assert_eq!(clock.take_due(), Some(a));
        assert_eq!(clock.outstanding(), vec![b]);
    }

    #[test]
    fn cancel_removes_outstanding() {
        let mut clock = ManualFrameClock::new();
        let a = clock.request_frame().unwrap();
        clock.cancel_frame(a);
        assert!(clock.outstanding().is_empty());
        assert_eq!(clock.cancelled(), vec![a]);
        assert_eq!(clock.take_due(), None);
    }
}
