//! Change notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geocanvas_types::cartesian::Rect;
use geocanvas_types::crs::Crs;
use nalgebra::Matrix3;
use parking_lot::RwLock;

/// Change of the canvas state.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// Objective CRS of the canvas was replaced.
    ObjectiveCrsChanged {
        /// Previous objective CRS.
        old: Arc<Crs>,
        /// New objective CRS.
        new: Arc<Crs>,
    },
    /// Objective-to-display transform changed.
    TransformChanged {
        /// Previous transform.
        old: Matrix3<f64>,
        /// New transform.
        new: Matrix3<f64>,
    },
    /// Display-to-device transform changed.
    DeviceTransformChanged {
        /// Previous transform.
        old: Matrix3<f64>,
        /// New transform.
        new: Matrix3<f64>,
    },
    /// Display bounds of the canvas changed.
    DisplayBoundsChanged {
        /// Previous bounds.
        old: Rect,
        /// New bounds.
        new: Rect,
    },
    /// Visible time range changed.
    TemporalRangeChanged {
        /// Previous range.
        old: Option<(DateTime<Utc>, DateTime<Utc>)>,
        /// New range.
        new: Option<(DateTime<Utc>, DateTime<Utc>)>,
    },
    /// Visible elevation range changed.
    ElevationRangeChanged {
        /// Previous range.
        old: Option<(f64, f64)>,
        /// New range.
        new: Option<(f64, f64)>,
    },
}

/// Identifies a subscription in a [`ListenerList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// List of callbacks notified about events of type `E`.
///
/// Callbacks are called in the order of subscription, outside of any internal lock, so a callback may subscribe or
/// unsubscribe listeners.
pub struct ListenerList<E> {
    listeners: RwLock<Vec<(ListenerHandle, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E> Default for ListenerList<E> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E> std::fmt::Debug for ListenerList<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl<E> ListenerList<E> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callback. The returned handle can be used to remove it.
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> ListenerHandle {
        let handle = ListenerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((handle, Arc::new(callback)));
        handle
    }

    /// Removes a callback. Returns false if there was no callback with this handle.
    pub fn unsubscribe(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.listeners.write();
        let len = listeners.len();
        listeners.retain(|(h, _)| *h != handle);
        listeners.len() != len
    }

    /// Returns true if at least one callback is subscribed.
    pub fn has_subscribers(&self) -> bool {
        !self.listeners.read().is_empty()
    }

    /// Calls every callback with the event built by `event`. The event is not built if there are no subscribers.
    pub fn notify(&self, event: impl FnOnce() -> E) {
        let callbacks: Vec<_> = self
            .listeners
            .read()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        if callbacks.is_empty() {
            return;
        }

        let event = event();
        for callback in callbacks {
            callback(&event);
        }
    }
}
