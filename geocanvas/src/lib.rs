//! Geocanvas is a referenced 2d canvas: it keeps track of the coordinate systems involved in drawing geographic data
//! on a display and of the transforms between them.
//!
//! # Coordinate systems of a canvas
//!
//! * The *objective* CRS is the space where the data is defined, e.g. [`Crs::WGS84`](geocanvas_types::crs::Crs) or
//!   Web Mercator. It may have extra time and height axes.
//! * The *display* CRS is derived from the horizontal part of the objective CRS through the view transform, which
//!   accumulates pan, zoom and rotation. It is measured in display pixels with the vertical axis pointing down.
//! * The *device* CRS is derived from the display CRS through a fixed transform, e.g. a HiDPI scale factor.
//!
//! The [`Canvas`] struct implements two capabilities:
//!
//! * [`CrsChain`] gives access to the three systems and transforms between them. Transforms from the data
//!   coordinate systems into the objective CRS are created by an [`OperationFactory`] and cached until the objective
//!   CRS changes.
//! * [`ViewportController`] changes the visible region: shows an area, moves, zooms and rotates the view, and records
//!   the visible time and elevation ranges.
//!
//! Every change is reported to the listeners subscribed with [`Canvas::subscribe`] and advises a running render pass
//! to stop through the canvas [`RenderingMonitor`].
//!
//! ```
//! use geocanvas::{CanvasBuilder, CanvasEvent, CrsChain, ViewportController};
//! use geocanvas_types::cartesian::Rect;
//! use geocanvas_types::crs::Crs;
//! use geocanvas_types::Envelope;
//!
//! let canvas = CanvasBuilder::new()
//!     .with_objective_crs(Crs::WGS84)
//!     .with_display_bounds(Rect::new(0.0, 0.0, 800.0, 600.0))
//!     .build()
//!     .unwrap();
//!
//! canvas.subscribe(|event| {
//!     if let CanvasEvent::ObjectiveCrsChanged { new, .. } = event {
//!         println!("Objective CRS is now {new}");
//!     }
//! });
//!
//! let area = Envelope::from_rect(Rect::new(-10.0, -10.0, 10.0, 10.0), None).unwrap();
//! canvas.set_visible_area(&area).unwrap();
//! canvas.set_objective_crs(Crs::EPSG3857).unwrap();
//!
//! let visible = canvas.visible_envelope().unwrap();
//! assert!(visible.contains(&[0.0, 0.0]));
//! ```

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod affine;
pub mod cache;
mod canvas;
mod chain;
mod config;
pub mod error;
mod listener;
mod monitor;
pub mod operation;
pub mod transform;
mod viewport;

pub use canvas::{Canvas, CanvasBuilder};
pub use chain::{ChainLevel, CrsChain};
pub use config::CanvasConfiguration;
pub use error::CanvasError;
pub use listener::{CanvasEvent, ListenerHandle, ListenerList};
pub use monitor::RenderingMonitor;
pub use operation::{DefaultOperationFactory, OperationFactory};
pub use transform::MathTransform;
pub use viewport::ViewportController;

pub use geocanvas_types;
