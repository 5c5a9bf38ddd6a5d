//! Interaction events and the hooks a shell uses to observe them.

use std::fmt;
use std::sync::Arc;

use dashgrid_core::Breakpoint;

/// Events emitted by grid-bearing components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// A drag gesture started on an item.
    DragStart { item_id: String },
    /// A drag gesture was released.
    DragStop { item_id: String },
    /// A resize gesture started on an item.
    ResizeStart { item_id: String },
    /// A resize gesture was released.
    ResizeStop { item_id: String },
    /// The committed layout for a breakpoint changed.
    LayoutChanged { breakpoint: Breakpoint },
}

/// Callback receiving every forwarded event.
pub type EventHandler = Arc<dyn Fn(&GridEvent) + Send + Sync>;

/// Callback receiving a boolean gesture flag.
pub type FlagSetter = Arc<dyn Fn(bool) + Send + Sync>;

/// Externally owned callbacks a component forwards its gestures to.
///
/// `set_dragging`/`set_resizing` let a shell track "a gesture is in
/// progress" without subscribing to every event.
#[derive(Clone, Default)]
pub struct InteractionHooks {
    on_event: Option<EventHandler>,
    set_dragging: Option<FlagSetter>,
    set_resizing: Option<FlagSetter>,
}

impl InteractionHooks {
    /// Hooks that drop every event.
    pub fn none() -> Self {
        Self::default()
    }

    /// Receive every event unchanged.
    pub fn on_event(mut self, handler: impl Fn(&GridEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(handler));
        self
    }

    /// Receive drag start/stop as a flag.
    pub fn set_dragging(mut self, setter: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.set_dragging = Some(Arc::new(setter));
        self
    }

    /// Receive resize start/stop as a flag.
    pub fn set_resizing(mut self, setter: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.set_resizing = Some(Arc::new(setter));
        self
    }

    /// Forward an event to whichever hooks are present.
    pub fn forward(&self, event: &GridEvent) {
        match event {
            GridEvent::DragStart { .. } => self.flag(&self.set_dragging, true),
            GridEvent::DragStop { .. } => self.flag(&self.set_dragging, false),
            GridEvent::ResizeStart { .. } => self.flag(&self.set_resizing, true),
            GridEvent::ResizeStop { .. } => self.flag(&self.set_resizing, false),
            GridEvent::LayoutChanged { .. } => {}
        }
        if let Some(handler) = &self.on_event {
            handler(event);
        }
    }

    fn flag(&self, setter: &Option<FlagSetter>, value: bool) {
        if let Some(setter) = setter {
            setter(value);
        }
    }
}

impl fmt::Debug for InteractionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionHooks")
            .field("on_event", &self.on_event.is_some())
            .field("set_dragging", &self.set_dragging.is_some())
            .field("set_resizing", &self.set_resizing.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_forward_sets_flags_and_passes_event_through() {
        let dragging = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let flag = Arc::clone(&dragging);
        let log = Arc::clone(&seen);
        let hooks = InteractionHooks::none()
            .set_dragging(move |v| flag.store(v, Ordering::SeqCst))
            .on_event(move |e| log.lock().push(e.clone()));

        hooks.forward(&GridEvent::DragStart { item_id: "a".into() });
        assert!(dragging.load(Ordering::SeqCst));
        hooks.forward(&GridEvent::DragStop { item_id: "a".into() });
        assert!(!dragging.load(Ordering::SeqCst));

        // Resize events reach the handler even without a resize setter
        hooks.forward(&GridEvent::ResizeStart { item_id: "a".into() });
        assert_eq!(seen.lock().len(), 3);
        assert_eq!(seen.lock()[0], GridEvent::DragStart { item_id: "a".into() });
    }
}
