//! The lifecycle controller.
//!
//! Exclusive owner of state swaps and of the shared per-instance
//! context. Dispatch resolves the transition table; transitions run
//! exit and enter hooks behind a fail-soft boundary: a faulting hook
//! is logged and the swap completes anyway, because leaving the
//! machine without a settled state would be worse than a partially
//! failed side effect. Dispatch is synchronous and events are handled
//! strictly in arrival order; multi-step transitions re-enter
//! `transition` from within an enter hook.

use std::rc::Rc;

use panelkit_animation::{
    run_flip, setup_ghost, EffectSink, FlipCleanup, FrameQueue, GhostHandle, TransitionEndSignal,
    VisualEffect,
};
use panelkit_common::{PanelKitError, Result};
use panelkit_dom::{attrs, PanelNode, PanelNodes, Rect};
use tracing::{debug, error, trace, warn};

use crate::config::PanelConfig;
use crate::input::{route_input, PanelInput};
use crate::machine::{transition_for, CloseInitiator, PanelEvent, PanelState};
use crate::PanelId;

/// The single mutable record of one panel instance, shared by the
/// controller and every hook it runs.
#[derive(Debug)]
pub struct PanelContext {
    /// Instance identity; diagnostics only.
    pub id: PanelId,
    /// The active state. Never absent once the machine is seeded.
    pub state: PanelState,
    /// Who started the current closing sequence; meaningful only in
    /// the closing family, cleared on entering `Open` or `Closed`.
    pub close_initiator: Option<CloseInitiator>,
    /// Immutable configuration.
    pub config: PanelConfig,
    /// Resolved structural nodes.
    pub nodes: PanelNodes,
    /// At most one tracked ghost clone.
    pub ghost: Option<GhostHandle>,
    /// At most one outstanding FLIP "before" rectangle.
    pub pending_flip_rect: Option<Rect>,
    /// Pending FLIP cleanup, consumed by the completion notification.
    pub flip_cleanup: Option<FlipCleanup>,
    /// The confirmed-active flag as sampled on the previous update.
    pub was_active: bool,
    /// Single-fire completion tracking for the enter animation.
    pub transition_signal: TransitionEndSignal,
}

/// One panel instance's lifecycle controller.
pub struct PanelController {
    context: PanelContext,
    queue: Rc<FrameQueue>,
    sink: Rc<dyn EffectSink>,
}

impl PanelController {
    /// Build and seed a controller for a panel root.
    ///
    /// Fatal when the overlay or panel-content node is missing: the
    /// instance refuses to activate. The machine is seeded into
    /// `Closed`.
    pub fn new(root: &Rc<PanelNode>, sink: Rc<dyn EffectSink>) -> Result<Self> {
        let nodes = PanelNodes::resolve(root).map_err(|e| {
            error!(error = %e, "Panel refused to activate");
            PanelKitError::dom_with_source("panel structure incomplete", e)
        })?;
        let config = PanelConfig::from_root(root);
        let id = PanelId::new();
        let was_active = nodes.active_flag();

        debug!(panel = ?id, ?config, "Panel instance created");

        let mut controller = Self {
            context: PanelContext {
                id,
                state: PanelState::Closed,
                close_initiator: None,
                config,
                nodes,
                ghost: None,
                pending_flip_rect: None,
                flip_cleanup: None,
                was_active,
                transition_signal: TransitionEndSignal::new(),
            },
            queue: Rc::new(FrameQueue::new()),
            sink,
        };
        controller.seed();
        Ok(controller)
    }

    /// The seed transition into `Closed`, traced like any other swap.
    fn seed(&mut self) {
        debug!(
            panel = ?self.context.id,
            from = "(seeded)",
            to = PanelState::Closed.name(),
            "Panel transition"
        );
        if let Err(e) = self.enter_state(PanelState::Closed, None) {
            error!(
                panel = ?self.context.id,
                category = e.category(),
                error = %e,
                "Enter hook failed; state swap stands"
            );
        }
    }

    // ==================== Dispatch ====================

    /// Dispatch an event against the current state.
    ///
    /// Unhandled (state, event) pairs are a logged no-op: the remote
    /// side may emit confirmations the machine has already superseded.
    pub fn dispatch(&mut self, event: PanelEvent) {
        let state = self.context.state;
        trace!(panel = ?self.context.id, state = state.name(), event = event.name(), "Dispatch");

        match transition_for(state, event) {
            Some(target) => {
                if let Some(who) = target.initiator {
                    self.context.close_initiator = Some(who);
                }
                self.transition(state, target.next);
            }
            None => {
                debug!(
                    panel = ?self.context.id,
                    state = state.name(),
                    event = event.name(),
                    "Event unhandled in this state"
                );
            }
        }
    }

    /// Dispatch by external event name, case-insensitively.
    pub fn dispatch_named(&mut self, name: &str) {
        match PanelEvent::parse(name) {
            Some(event) => self.dispatch(event),
            None => warn!(panel = ?self.context.id, name, "Unknown panel event"),
        }
    }

    /// Route a raw input through the config gates.
    pub fn handle_input(&mut self, input: PanelInput) {
        if let Some(event) = route_input(&self.context.config, input) {
            self.dispatch(event);
        }
    }

    // ==================== Transitions ====================

    /// Swap states: exit the old state, set the new one, enter it.
    /// Hook faults are terminal here; the swap always completes.
    fn transition(&mut self, from: PanelState, to: PanelState) {
        debug!(
            panel = ?self.context.id,
            from = from.name(),
            to = to.name(),
            initiator = self.context.close_initiator.map(|i| i.name()),
            "Panel transition"
        );

        if let Err(e) = self.exit_state(from) {
            error!(
                panel = ?self.context.id,
                category = e.category(),
                error = %e,
                "Exit hook failed; continuing swap"
            );
        }

        self.context.state = to;

        if let Err(e) = self.enter_state(to, Some(from)) {
            error!(
                panel = ?self.context.id,
                category = e.category(),
                error = %e,
                "Enter hook failed; state swap stands"
            );
        }
    }

    fn exit_state(&mut self, state: PanelState) -> Result<()> {
        trace!(state = state.name(), "Exit");
        Ok(())
    }

    fn enter_state(&mut self, state: PanelState, from: Option<PanelState>) -> Result<()> {
        match state {
            PanelState::Closed => self.enter_closed(),
            PanelState::Opening => self.enter_opening(),
            PanelState::OpeningServerArrived => Ok(()),
            PanelState::Open => self.enter_open(from),
            PanelState::Closing => self.enter_closing(),
            PanelState::ClosingWaitingForServer | PanelState::ClosingWaitingForServerToOpen => {
                trace!(state = state.name(), "Awaiting remote confirmation");
                Ok(())
            }
        }
    }

    fn enter_closed(&mut self) -> Result<()> {
        self.context.close_initiator = None;
        self.context.transition_signal.disarm();
        Ok(())
    }

    fn enter_opening(&mut self) -> Result<()> {
        if let Some(loading) = &self.context.nodes.loading {
            self.sink.apply(VisualEffect::ShowLoading(loading.id()));
        } else {
            debug!("no loading node; opening without placeholder");
        }
        self.sink
            .apply(VisualEffect::ShowPanel(self.context.nodes.content.id()));

        if self.context.nodes.container.is_some() {
            if self.context.transition_signal.arm() {
                trace!("transition-end signal armed");
            }
        }
        Ok(())
    }

    fn enter_open(&mut self, from: Option<PanelState>) -> Result<()> {
        self.context.close_initiator = None;

        // A confirmation that arrives with no local open in flight
        // shows the panel directly: there was no optimistic enter
        // animation to complete.
        if from == Some(PanelState::Closed) {
            self.sink
                .apply(VisualEffect::ShowPanel(self.context.nodes.content.id()));

            if let Some(target) = self.context.nodes.root.attribute(attrs::FOCUS_TARGET) {
                let node = self
                    .context
                    .nodes
                    .root
                    .find(&|n| n.attribute("id").as_deref() == Some(target.as_str()))
                    .ok_or_else(|| {
                        PanelKitError::NotFound(format!("focus target '{target}'"))
                    })?;
                self.sink.apply(VisualEffect::FocusFirstElement(node.id()));
            }
        }
        Ok(())
    }

    fn enter_closing(&mut self) -> Result<()> {
        self.context.transition_signal.disarm();

        // A fresh setup discards tracking of any stale ghost; removing
        // the stale clone from the tree stays the animation engine's
        // job, driven by its own fade-completion callback.
        let ghost = setup_ghost(&self.context.nodes, &self.queue);
        if ghost.is_none() {
            debug!(
                duration_ms = self.context.config.duration_ms,
                "no ghost; close runs on the configured duration"
            );
        }
        self.context.ghost = ghost;

        // Transient pass-through: never observed as a resting state.
        self.transition(PanelState::Closing, PanelState::ClosingWaitingForServer);
        Ok(())
    }

    // ==================== Host update cycle ====================

    /// Host "before update" tick: capture the FLIP "before" rectangle
    /// when a loading/content swap may follow this update.
    pub fn before_update(&mut self) {
        if !matches!(self.context.state, PanelState::Open | PanelState::Opening) {
            return;
        }
        if let (Some(loading), Some(_inner)) =
            (&self.context.nodes.loading, &self.context.nodes.inner)
        {
            let rect = loading.layout_rect();
            trace!(?rect, "Captured pre-update geometry");
            self.context.pending_flip_rect = Some(rect);
        }
    }

    /// Host "after update" tick: derive the implied remote event from
    /// the confirmed-active flag, then run the current state's update
    /// hook. The pending FLIP rectangle never survives past the one
    /// update that follows its capture.
    pub fn after_update(&mut self) {
        let active = self.context.nodes.active_flag();
        let was_active = self.context.was_active;
        self.context.was_active = active;

        if active != was_active {
            let implied = if active {
                PanelEvent::ServerRequestsOpen
            } else {
                PanelEvent::ServerRequestsClose
            };
            debug!(panel = ?self.context.id, event = implied.name(), "Implied remote event");
            self.dispatch(implied);
        }

        self.on_update();
        self.context.pending_flip_rect = None;
    }

    /// Per-state update hook. Only `OpeningServerArrived` has update
    /// work: consuming the pre-update geometry for the FLIP
    /// correction.
    fn on_update(&mut self) {
        if self.context.state != PanelState::OpeningServerArrived {
            return;
        }
        match self.context.pending_flip_rect.take() {
            Some(before) => {
                if let Some(cleanup) = run_flip(
                    &self.context.nodes,
                    before,
                    &self.queue,
                    self.sink.as_ref(),
                ) {
                    self.context.flip_cleanup = Some(cleanup);
                }
            }
            None => trace!("no pre-update geometry; FLIP skipped"),
        }
    }

    // ==================== Completion notifications ====================

    /// The panel enter transition finished. Consumes the single-fire
    /// signal; a notification with no armed signal is a no-op.
    pub fn notify_open_transition_end(&mut self) {
        if self.context.transition_signal.consume() {
            self.dispatch(PanelEvent::PanelOpenTransitionEnd);
        } else {
            trace!(panel = ?self.context.id, "Transition end with no armed signal");
        }
    }

    /// The ghost fade finished; the animation engine has removed the
    /// clone, so tracking is dropped.
    pub fn notify_ghost_complete(&mut self) {
        if self.context.ghost.take().is_some() {
            trace!(panel = ?self.context.id, "Ghost tracking cleared");
        }
    }

    /// The FLIP play-back transition finished; temporary styles are
    /// stripped.
    pub fn notify_flip_complete(&mut self) {
        if let Some(cleanup) = self.context.flip_cleanup.take() {
            cleanup.complete();
        }
    }

    // ==================== Accessors & teardown ====================

    /// The active state.
    pub fn state(&self) -> PanelState {
        self.context.state
    }

    /// Read access to the shared context.
    pub fn context(&self) -> &PanelContext {
        &self.context
    }

    /// The frame queue the host drains once per frame.
    pub fn frame_queue(&self) -> Rc<FrameQueue> {
        self.queue.clone()
    }

    /// Tear down when the panel leaves the document: pending frame
    /// tasks dropped, signals detached, ghost and FLIP handles
    /// cleared.
    pub fn shutdown(&mut self) {
        self.queue.clear();
        self.context.transition_signal.disarm();
        self.context.ghost = None;
        self.context.pending_flip_rect = None;
        if let Some(cleanup) = self.context.flip_cleanup.take() {
            cleanup.complete();
        }
        debug!(panel = ?self.context.id, "Panel instance torn down");
    }
}

impl std::fmt::Debug for PanelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelController")
            .field("id", &self.context.id)
            .field("state", &self.context.state)
            .finish_non_exhaustive()
    }
}
