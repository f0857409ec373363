//! The request-frame chain shared by both effects.
//!
//! A running loop owns the surface, the viewport binding and the handle of
//! the one frame it has requested. Each frame catches the surface up with
//! the viewport, runs the effect's step and, if the loop is still running
//! afterwards, requests the next frame.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use tracing::{debug, warn};

use crate::{
    error::SurfaceResult,
    scheduler::{FrameHandle, Scheduler},
    surface::Surface,
    viewport::{Viewport, ViewportBinding},
};

/// One effect's per-frame update-and-draw logic.
pub(crate) trait FrameStep<S> {
    fn frame(&mut self, surface: &mut S) -> SurfaceResult<()>;
}

struct LoopCore<S, T> {
    name: &'static str,
    surface: Rc<RefCell<S>>,
    state: Rc<RefCell<T>>,
    scheduler: Rc<dyn Scheduler>,
    binding: RefCell<Option<ViewportBinding>>,
    handle: Cell<Option<FrameHandle>>,
    running: Cell<bool>,
}

pub(crate) struct FrameLoop<S: Surface + 'static, T: FrameStep<S> + 'static> {
    core: Rc<LoopCore<S, T>>,
}

impl<S: Surface + 'static, T: FrameStep<S> + 'static> FrameLoop<S, T> {
    /// Binds `surface` to `viewport` and requests the first frame.
    pub(crate) fn start(
        name: &'static str,
        surface: S,
        state: Rc<RefCell<T>>,
        viewport: &Viewport,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        let surface = Rc::new(RefCell::new(surface));
        let binding = ViewportBinding::activate(viewport, &surface);
        let size = viewport.size();

        let core = Rc::new(LoopCore {
            name,
            surface,
            state,
            scheduler,
            binding: RefCell::new(Some(binding)),
            handle: Cell::new(None),
            running: Cell::new(true),
        });
        request_next(&core);

        debug!(effect = name, width = size.width, height = size.height, "effect started");
        Self { core }
    }

    /// Cancels the pending frame and detaches the resize listener.
    pub(crate) fn stop(&self) {
        if halt(&self.core) {
            debug!(effect = self.core.name, "effect stopped");
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.core.running.get()
    }

    pub(crate) fn surface(&self) -> &Rc<RefCell<S>> {
        &self.core.surface
    }
}

impl<S: Surface + 'static, T: FrameStep<S> + 'static> Drop for FrameLoop<S, T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Marks the loop stopped and releases its handles. Returns `false` if it
/// was already stopped.
fn halt<S, T>(core: &LoopCore<S, T>) -> bool {
    if !core.running.replace(false) {
        return false;
    }
    if let Some(handle) = core.handle.take() {
        core.scheduler.cancel_frame(handle);
    }
    if let Some(mut binding) = core.binding.borrow_mut().take() {
        binding.deactivate();
    }
    true
}

fn request_next<S, T>(core: &Rc<LoopCore<S, T>>)
where
    S: Surface + 'static,
    T: FrameStep<S> + 'static,
{
    let weak = Rc::downgrade(core);
    let handle = core.scheduler.request_frame(Box::new(move || {
        if let Some(core) = weak.upgrade() {
            run_frame(&core);
        }
    }));
    core.handle.set(Some(handle));
}

fn run_frame<S, T>(core: &Rc<LoopCore<S, T>>)
where
    S: Surface + 'static,
    T: FrameStep<S> + 'static,
{
    if !core.running.get() {
        return;
    }
    core.handle.set(None);

    let result = {
        let mut surface = core.surface.borrow_mut();
        if let Some(binding) = core.binding.borrow().as_ref() {
            binding.sync(&mut *surface);
        }
        core.state.borrow_mut().frame(&mut *surface)
    };

    match result {
        Ok(()) if core.running.get() => request_next(core),
        Ok(()) => {}
        Err(err) => {
            warn!(effect = core.name, error = %err, "surface unavailable, stopping effect");
            halt(core);
        }
    }
}
