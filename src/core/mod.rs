//! Core library modules for routepick
//!
//! The selection-and-dispatch workflow: catalog, state machine, compute
//! client, presenter, and the session loop that ties them together.

pub mod catalog;
pub mod client;
pub mod error;
pub mod notify;
pub mod presenter;
pub mod selection;
pub mod session;
pub mod surface;

// Re-export main types for internal use
pub use catalog::{AirportCatalog, Point};
pub use client::{
    ClientConfig, ComputeClient, ComputeRequest, ComputeResponse, ResponseShape, RouteSummary,
};
pub use session::{Session, SessionEvent, SessionReport};
