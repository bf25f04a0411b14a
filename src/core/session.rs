//! Session event loop
//!
//! One task owns the selection. Point activations, resets and compute
//! responses are handled one at a time in arrival order; the network call is
//! the only thing that runs concurrently, and its result comes back to this
//! same loop. Responses are matched against the selection generation that
//! produced them, so a reply to a selection the user has since reset is
//! dropped instead of presented.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use tokio::sync::mpsc;

use crate::core::catalog::Point;
use crate::core::client::{ComputeClient, ComputeResponse, RouteSummary};
use crate::core::notify::{Notice, Notifier};
use crate::core::presenter::{Presentation, ResultPresenter};
use crate::core::selection::{DispatchTicket, Phase, PickOutcome, SelectionStateMachine};

/// Input to the session loop
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A point was activated on the map surface
    Activate(u32),
    /// A point was named instead of clicked
    ActivateByName(String),
    Reset,
    /// Report the current selection
    Status,
}

/// What happened over the lifetime of a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    /// Requests sent to the compute service
    pub dispatched: usize,
    /// Outcomes handed to the presenter, in order
    pub presented: Vec<Presentation>,
    /// Responses dropped because the selection was reset meanwhile
    pub stale: usize,
    /// Route details of the results that were opened
    pub routes: Vec<RouteSummary>,
}

type InFlight = BoxFuture<'static, (u64, ComputeResponse)>;

pub struct Session {
    machine: SelectionStateMachine,
    client: ComputeClient,
    presenter: ResultPresenter,
    notifier: Notifier,
}

impl Session {
    pub fn new(
        machine: SelectionStateMachine,
        client: ComputeClient,
        presenter: ResultPresenter,
        notifier: Notifier,
    ) -> Self {
        Self {
            machine,
            client,
            presenter,
            notifier,
        }
    }

    pub fn machine(&self) -> &SelectionStateMachine {
        &self.machine
    }

    /// Process events until the sender closes and nothing is left in flight
    pub async fn run(&mut self, mut events: mpsc::Receiver<SessionEvent>) -> SessionReport {
        let mut report = SessionReport::default();
        let mut pending: FuturesUnordered<InFlight> = FuturesUnordered::new();
        let mut events_open = true;

        loop {
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event, &mut pending, &mut report),
                    None => {
                        debug!("Event stream closed, {} request(s) in flight", pending.len());
                        events_open = false;
                    }
                },
                Some((generation, response)) = pending.next(), if !pending.is_empty() => {
                    self.handle_response(generation, response, &mut report);
                }
                else => break,
            }
        }

        report
    }

    fn handle_event(
        &mut self,
        event: SessionEvent,
        pending: &mut FuturesUnordered<InFlight>,
        report: &mut SessionReport,
    ) {
        debug!("Session event {:?} in phase {:?}", event, self.machine.phase());
        let outcome = match event {
            SessionEvent::Activate(id) => self.machine.pick(id),
            SessionEvent::ActivateByName(name) => self.machine.pick_by_name(&name),
            SessionEvent::Reset => {
                if self.machine.phase() == Phase::Locked {
                    // The old request keeps running; its reply will be stale.
                    self.notifier.send(Notice::Idle);
                }
                self.machine.reset();
                return;
            }
            SessionEvent::Status => {
                self.notifier.info(self.describe());
                return;
            }
        };

        match outcome {
            Ok(PickOutcome::Dispatch(ticket)) => {
                report.dispatched += 1;
                pending.push(self.dispatch(ticket));
            }
            Ok(PickOutcome::SourceSet(_)) => {}
            // Already reported to the user by the state machine
            Err(e) => debug!("Pick rejected: {e}"),
        }
    }

    fn dispatch(&self, ticket: DispatchTicket) -> InFlight {
        let selection = self.machine.selection();
        let label = match (&selection.source, &selection.destination) {
            (Some(s), Some(d)) => format!("Computing routes {} → {}", s.name, d.name),
            _ => "Computing routes".to_string(),
        };
        self.notifier.send(Notice::Busy(label));

        let client = self.client.clone();
        Box::pin(async move {
            let response = client.submit(&ticket.request).await;
            (ticket.generation, response)
        })
    }

    fn handle_response(
        &mut self,
        generation: u64,
        response: ComputeResponse,
        report: &mut SessionReport,
    ) {
        if !self.machine.settle(generation) {
            warn!(
                "Discarding stale response for generation {} (current {}): {:?}",
                generation,
                self.machine.generation(),
                response
            );
            report.stale += 1;
            return;
        }

        self.notifier.send(Notice::Idle);
        let presentation = self.presenter.present(&response);
        if !matches!(presentation, Presentation::Failed(_)) {
            if let Some(summary) = response.summary().filter(|s| s.has_routes()) {
                report.routes.push(summary.clone());
            }
        }
        report.presented.push(presentation);
    }

    fn describe(&self) -> String {
        let selection = self.machine.selection();
        let name = |p: &Option<Point>| {
            p.as_ref()
                .map(|p| format!("{} ({})", p.name, p.id))
                .unwrap_or_else(|| "-".to_string())
        };
        let phase = match self.machine.phase() {
            Phase::Empty => "choose a source",
            Phase::SourceChosen => "choose a destination",
            Phase::Locked => "computing",
            Phase::Complete => "done, reset to restart",
        };
        format!(
            "Source: {}, destination: {} [{}]",
            name(&selection.source),
            name(&selection.destination),
            phase
        )
    }
}
