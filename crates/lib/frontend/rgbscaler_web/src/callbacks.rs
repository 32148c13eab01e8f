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

    rgbscaler_web::callbacks.rs

    Bookkeeping for one-shot host callbacks such as requestAnimationFrame.
*/

use std::collections::HashMap;

use scaler_backend_trait::FrameHandle;

/// Callbacks registered with the host, keyed by the [FrameHandle] they deliver. `C` owns the
/// callback; dropping it releases it.
pub struct PendingCallbacks<C> {
    outstanding: HashMap<FrameHandle, (i32, C)>,
    delivered: Option<C>,
}

impl<C> Default for PendingCallbacks<C> {
    fn default() -> Self {
        Self {
            outstanding: HashMap::new(),
            delivered: None,
        }
    }
}

impl<C> PendingCallbacks<C> {
    /// Track `callback`, registered with the host under `host_id`.
    pub fn insert(&mut self, handle: FrameHandle, host_id: i32, callback: C) {
        self.outstanding.insert(handle, (host_id, callback));
    }

    /// Record that the host fired `handle`. Its callback may still be on the stack, so it is
    /// kept until the next delivery replaces it. Returns false if `handle` was not pending.
    pub fn deliver(&mut self, handle: FrameHandle) -> bool {
        match self.outstanding.remove(&handle) {
            Some((_, callback)) => {
                self.delivered = Some(callback);
                true
            }
            None => false,
        }
    }

    /// Stop tracking `handle`, returning its host id and callback for the caller to revoke and
    /// drop.
    pub fn cancel(&mut self, handle: FrameHandle) -> Option<(i32, C)> {
        self.outstanding.remove(&handle)
    }

    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn cancelled_callbacks_are_released() {
        let callback = Rc::new(());
        let mut pending = PendingCallbacks::default();
        pending.insert(FrameHandle(1), 7, Rc::clone(&callback));
        assert_eq!(Rc::strong_count(&callback), 2);

        let (host_id, released) = pending.cancel(FrameHandle(1)).unwrap();
        assert_eq!(host_id, 7);
        drop(released);
        assert_eq!(Rc::strong_count(&callback), 1);
        assert!(pending.is_empty());
        assert!(pending.cancel(FrameHandle(1)).is_none());
    }

    #[test]
    fn delivered_callback_lives_until_next_delivery() {
        let first = Rc::new(());
        let second = Rc::new(());
        let mut pending = PendingCallbacks::default();
        pending.insert(FrameHandle(1), 1, Rc::clone(&first));
        pending.insert(FrameHandle(2), 2, Rc::clone(&second));

        assert!(pending.deliver(FrameHandle(1)));
        assert_eq!(Rc::strong_count(&first), 2);
        assert_eq!(pending.len(), 1);

        assert!(pending.deliver(FrameHandle(2)));
        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(Rc::strong_count(&second), 2);
        assert!(pending.is_empty());
    }

    #[test]
    fn late_delivery_of_cancelled_handle_is_ignored() {
        let mut pending = PendingCallbacks::default();
        pending.insert(FrameHandle(3), 3, ());
        pending.cancel(FrameHandle(3));
        assert!(!pending.deliver(FrameHandle(3)));
    }
}
