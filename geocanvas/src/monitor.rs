use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative flag telling an in-flight render pass that its result is outdated.
///
/// The canvas raises the flag every time the view changes. Renderers should check
/// [`stop_requested`](RenderingMonitor::stop_requested) between units of work and abort early if it is set. Nothing
/// is interrupted forcibly.
#[derive(Debug, Default)]
pub struct RenderingMonitor {
    rendering: AtomicBool,
    stop_requested: AtomicBool,
}

impl RenderingMonitor {
    /// Creates a monitor with no render pass running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the beginning of a render pass and clears a previous stop request.
    pub fn start(&self) {
        self.stop_requested.store(false, Ordering::Release);
        self.rendering.store(true, Ordering::Release);
    }

    /// Marks the end of a render pass.
    pub fn finish(&self) {
        self.rendering.store(false, Ordering::Release);
    }

    /// Returns true between [`start`](Self::start) and [`finish`](Self::finish).
    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::Acquire)
    }

    /// Advises the current render pass to stop. Does nothing if no pass is running.
    pub fn request_stop(&self) {
        if self.is_rendering() {
            self.stop_requested.store(true, Ordering::Release);
        }
    }

    /// Returns true if the current render pass was advised to stop.
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}
