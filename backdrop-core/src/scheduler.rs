//! Display-synchronized frame scheduling.
//!
//! Effects never loop on their own. Each frame step asks the scheduler for
//! the *next* frame, the same chain a browser builds with
//! `requestAnimationFrame`. [`FrameScheduler`] is driven by the host, which
//! calls [`FrameScheduler::tick`] once per repaint; tests call it directly
//! to single-step frames.

use std::{
    cell::RefCell,
    collections::HashSet,
    rc::Rc,
};

/// A callback to run on the next frame.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Handle to a requested frame, used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

pub trait Scheduler {
    /// Queues `callback` to run on the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Prevents a requested frame from running. Unknown or already-run
    /// handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

#[derive(Default)]
struct FrameQueue {
    next_id: u64,
    frame: u64,
    pending: Vec<(FrameHandle, FrameCallback)>,
    /// Handles taken off the queue by the running tick that have not run yet.
    in_flight: HashSet<FrameHandle>,
}

/// Single-threaded, host-driven [`Scheduler`].
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    queue: Rc<RefCell<FrameQueue>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every callback that was pending when the tick began.
    ///
    /// Callbacks requested while ticking are deferred to the next tick. A
    /// callback cancelled by another callback of the same tick does not
    /// run. Returns the number of callbacks that ran.
    pub fn tick(&self) -> usize {
        let batch = {
            let mut q = self.queue.borrow_mut();
            q.frame += 1;
            let batch = std::mem::take(&mut q.pending);
            q.in_flight = batch.iter().map(|(h, _)| *h).collect();
            batch
        };

        let mut ran = 0;
        for (handle, callback) in batch {
            let live = self.queue.borrow_mut().in_flight.remove(&handle);
            if live {
                callback();
                ran += 1;
            }
        }
        self.queue.borrow_mut().in_flight.clear();
        ran
    }

    /// Number of ticks run so far.
    pub fn frame(&self) -> u64 {
        self.queue.borrow().frame
    }

    /// Number of callbacks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }
}

impl Scheduler for FrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let mut q = self.queue.borrow_mut();
        let handle = FrameHandle(q.next_id);
        q.next_id += 1;
        q.pending.push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let mut q = self.queue.borrow_mut();
        q.pending.retain(|(h, _)| *h != handle);
        q.in_flight.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn tick_runs_pending_callbacks_once() {
        let sched = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let h = Rc::clone(&hits);
            sched.request_frame(Box::new(move || h.set(h.get() + 1)));
        }

        assert_eq!(sched.pending(), 3);
        assert_eq!(sched.tick(), 3);
        assert_eq!(hits.get(), 3);
        assert_eq!(sched.tick(), 0);
        assert_eq!(sched.frame(), 2);
    }

    #[test]
    fn callbacks_requested_during_tick_run_next_tick() {
        let sched = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));

        let inner_sched = sched.clone();
        let h = Rc::clone(&hits);
        sched.request_frame(Box::new(move || {
            h.set(h.get() + 1);
            let h2 = Rc::clone(&h);
            inner_sched.request_frame(Box::new(move || h2.set(h2.get() + 10)));
        }));

        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(sched.pending(), 1);

        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn cancelled_frame_never_runs() {
        let sched = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let handle = sched.request_frame(Box::new(move || h.set(h.get() + 1)));

        sched.cancel_frame(handle);
        sched.cancel_frame(handle);

        assert_eq!(sched.tick(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn cancel_from_earlier_callback_in_same_tick_wins() {
        let sched = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<Cell<Option<FrameHandle>>> = Rc::new(Cell::new(None));

        let s = sched.clone();
        let v = Rc::clone(&victim);
        sched.request_frame(Box::new(move || {
            if let Some(handle) = v.get() {
                s.cancel_frame(handle);
            }
        }));
        let h = Rc::clone(&hits);
        victim.set(Some(
            sched.request_frame(Box::new(move || h.set(h.get() + 1))),
        ));

        assert_eq!(sched.tick(), 1);
        assert_eq!(hits.get(), 0);
    }
}
