//! Live viewport size and the binding that keeps surfaces in sync with it.
//!
//! A [`Viewport`] is a cheap, cloneable handle to shared single-threaded
//! state. The host calls [`Viewport::resize`] whenever its window changes
//! size; every subscribed listener is invoked synchronously, in
//! registration order, with no debouncing.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use glam::Vec2;
use tracing::warn;

use crate::surface::Surface;

/// Size of the viewport in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when there is nothing to draw on.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Geometric center of the viewport; this is where the attractor sits.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Half-open containment test against `[0, width) x [0, height)`.
    ///
    /// `NaN` coordinates are never contained.
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x < self.width as f32 && pos.y >= 0.0 && pos.y < self.height as f32
    }

    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Identifier returned by [`Viewport::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ResizeListener = Rc<RefCell<dyn FnMut(ViewportSize)>>;

struct ViewportState {
    size: ViewportSize,
    next_id: u64,
    listeners: Vec<(ListenerId, ResizeListener)>,
}

/// Observable handle to the current viewport size.
#[derive(Clone)]
pub struct Viewport {
    state: Rc<RefCell<ViewportState>>,
}

impl Viewport {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            state: Rc::new(RefCell::new(ViewportState {
                size,
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn size(&self) -> ViewportSize {
        self.state.borrow().size
    }

    /// Records the new size and notifies every listener.
    ///
    /// Listeners may subscribe or unsubscribe from inside the callback.
    /// A listener removed by an earlier listener in the same broadcast is
    /// not called.
    pub fn resize(&self, size: ViewportSize) {
        let snapshot: Vec<(ListenerId, ResizeListener)> = {
            let mut state = self.state.borrow_mut();
            state.size = size;
            state
                .listeners
                .iter()
                .map(|(id, l)| (*id, Rc::clone(l)))
                .collect()
        };

        for (id, listener) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            // A listener that resizes the viewport from inside itself would
            // re-enter here; skip it rather than panic on the double borrow.
            if let Ok(mut f) = listener.try_borrow_mut() {
                (&mut *f)(size);
            }
        }
    }

    pub fn subscribe(&self, listener: impl FnMut(ViewportSize) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, Rc::new(RefCell::new(listener))));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(lid, _)| *lid != id);
        state.listeners.len() != before
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.state.borrow().listeners.iter().any(|(lid, _)| *lid == id)
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

/// Keeps one surface's backing size equal to the live viewport size.
///
/// Activation sizes the surface immediately. Every later resize is applied
/// synchronously from the viewport's broadcast. The listener only holds a
/// weak reference, so a dropped surface simply stops being resized.
///
/// A broadcast that arrives while the surface is borrowed cannot be applied
/// on the spot; [`ViewportBinding::sync`] catches it up before the next
/// frame draws.
pub struct ViewportBinding {
    viewport: Viewport,
    listener: Option<ListenerId>,
}

impl ViewportBinding {
    pub fn activate<S: Surface + 'static>(viewport: &Viewport, surface: &Rc<RefCell<S>>) -> Self {
        surface.borrow_mut().set_size(viewport.size());

        let weak: Weak<RefCell<S>> = Rc::downgrade(surface);
        let listener = viewport.subscribe(move |size| {
            let Some(surface) = weak.upgrade() else {
                return;
            };
            match surface.try_borrow_mut() {
                Ok(mut surface) => surface.set_size(size),
                Err(_) => warn!(
                    width = size.width,
                    height = size.height,
                    "surface busy during resize, deferring to next frame"
                ),
            };
        });

        Self {
            viewport: viewport.clone(),
            listener: Some(listener),
        }
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Applies the current viewport size to `surface` if it has fallen
    /// behind. Returns `true` when the surface was resized.
    pub fn sync<S: Surface + ?Sized>(&self, surface: &mut S) -> bool {
        let size = self.viewport.size();
        if surface.size() == size {
            return false;
        }
        surface.set_size(size);
        true
    }

    /// Detaches the resize listener. Safe to call more than once.
    pub fn deactivate(&mut self) {
        if let Some(id) = self.listener.take() {
            self.viewport.unsubscribe(id);
        }
    }
}

impl Drop for ViewportBinding {
    fn drop(&mut self) {
        self.deactivate();
    }
}
