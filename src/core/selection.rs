//! Selection state machine
//!
//! Turns two independent point activations into exactly one compute request.
//!
//! ```text
//! Empty --pick--> SourceChosen --pick(other)--> Locked --settle--> Complete
//!   ^                                                                 |
//!   +------------------------------ reset ----------------------------+
//! ```
//!
//! `reset()` is accepted from every phase and starts a new generation, which
//! is how late responses to an abandoned selection are recognised.

use std::sync::Arc;

use log::{debug, info};

use crate::core::catalog::{AirportCatalog, Point};
use crate::core::client::ComputeRequest;
use crate::core::error::{Error, Result};
use crate::core::notify::Notifier;

/// Where the selection currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    SourceChosen,
    /// Both endpoints chosen, request in flight
    Locked,
    /// Both endpoints chosen, request answered
    Complete,
}

/// The user's current pair of points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub source: Option<Point>,
    pub destination: Option<Point>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.destination.is_none()
    }
}

/// A request to send, tagged with the selection generation it came from
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTicket {
    pub generation: u64,
    pub request: ComputeRequest,
}

/// Result of an accepted pick
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// First point chosen, waiting for the destination
    SourceSet(Point),
    /// Selection completed; the ticket must be dispatched exactly once
    Dispatch(DispatchTicket),
}

/// Owns the selection for one session
pub struct SelectionStateMachine {
    catalog: Arc<AirportCatalog>,
    selection: Selection,
    phase: Phase,
    generation: u64,
    demo_negative_cycle: bool,
    notifier: Notifier,
}

impl SelectionStateMachine {
    pub fn new(catalog: Arc<AirportCatalog>, notifier: Notifier) -> Self {
        Self {
            catalog,
            selection: Selection::default(),
            phase: Phase::Empty,
            generation: 0,
            demo_negative_cycle: false,
            notifier,
        }
    }

    /// Ask the service to inject a negative cycle into every dispatched request
    pub fn with_demo_negative_cycle(mut self, enabled: bool) -> Self {
        self.demo_negative_cycle = enabled;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn catalog(&self) -> &AirportCatalog {
        &self.catalog
    }

    /// Whether a ticket of this generation still belongs to the live selection
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Activate a point by id
    pub fn pick(&mut self, id: u32) -> Result<PickOutcome> {
        let point = match self.catalog.get(id) {
            Ok(point) => point.clone(),
            Err(e) => return Err(self.reject(e)),
        };
        self.pick_point(point)
    }

    /// Activate a point by id or name
    pub fn pick_by_name(&mut self, token: &str) -> Result<PickOutcome> {
        let point = match self.catalog.resolve(token) {
            Ok(point) => point.clone(),
            Err(e) => return Err(self.reject(e)),
        };
        self.pick_point(point)
    }

    fn pick_point(&mut self, point: Point) -> Result<PickOutcome> {
        let source_id = self.selection.source.as_ref().map(|s| s.id);
        match (self.phase, source_id) {
            (Phase::Empty, _) | (Phase::SourceChosen, None) => {
                info!("Source set: {} ({})", point.name, point.id);
                self.notifier.info(format!(
                    "Source set: {}. Now choose destination",
                    point.name
                ));
                self.selection.source = Some(point.clone());
                self.phase = Phase::SourceChosen;
                Ok(PickOutcome::SourceSet(point))
            }
            (Phase::SourceChosen, Some(source_id)) => {
                if source_id == point.id {
                    return Err(self.reject(Error::SamePoint(point.id)));
                }

                info!("Destination set: {} ({})", point.name, point.id);
                self.notifier.info(format!(
                    "Destination set: {}. Generating routes...",
                    point.name
                ));
                let request = ComputeRequest {
                    source_id,
                    destination_id: point.id,
                    demo_negative_cycle: self.demo_negative_cycle,
                };
                self.selection.destination = Some(point);
                self.phase = Phase::Locked;

                Ok(PickOutcome::Dispatch(DispatchTicket {
                    generation: self.generation,
                    request,
                }))
            }
            (Phase::Locked, _) => Err(self.reject(Error::RequestInFlight)),
            (Phase::Complete, _) => Err(self.reject(Error::SelectionComplete)),
        }
    }

    /// Mark the in-flight request as answered. Returns false for stale tickets.
    pub fn settle(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            debug!(
                "Ignoring settle for generation {} (current is {})",
                generation, self.generation
            );
            return false;
        }
        if self.phase == Phase::Locked {
            self.phase = Phase::Complete;
        }
        true
    }

    /// Clear the selection and start a new generation
    pub fn reset(&mut self) {
        self.selection = Selection::default();
        self.phase = Phase::Empty;
        self.generation += 1;
        debug!("Selection reset, generation {}", self.generation);
        self.notifier.info("Selection cleared. Choose a source");
    }

    fn reject(&self, error: Error) -> Error {
        debug!("Pick rejected in phase {:?}: {}", self.phase, error);
        self.notifier.warn(error.to_string());
        error
    }
}
