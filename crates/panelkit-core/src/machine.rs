//! States, events, and the transition table.
//!
//! The table is a pure function from (state, event) to an optional
//! target, so every row is unit-testable without touching the DOM or
//! the effect sink. Omitted pairs mean the event is ignored in that
//! state; the controller logs those and leaves the state unchanged.

use std::fmt;

/// The seven lifecycle states of a panel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelState {
    /// Panel is closed and settled.
    Closed,
    /// Optimistically opening; the enter animation is running and the
    /// remote process has not confirmed yet.
    Opening,
    /// Remote confirmation arrived before the enter animation
    /// finished; the animation still completes on its own signal.
    OpeningServerArrived,
    /// Panel is open and settled.
    Open,
    /// Transient pass-through while the close side effects run; never
    /// observed as a resting state.
    Closing,
    /// Content is already hidden; awaiting the remote close
    /// confirmation.
    ClosingWaitingForServer,
    /// A fresh open was requested while awaiting the close
    /// confirmation; the intent is held, not dropped.
    ClosingWaitingForServerToOpen,
}

impl PanelState {
    /// State name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            PanelState::Closed => "closed",
            PanelState::Opening => "opening",
            PanelState::OpeningServerArrived => "opening-server-arrived",
            PanelState::Open => "open",
            PanelState::Closing => "closing",
            PanelState::ClosingWaitingForServer => "closing-waiting-for-server",
            PanelState::ClosingWaitingForServerToOpen => "closing-waiting-for-server-to-open",
        }
    }

    /// Whether this is one of the closing-family states, the only
    /// span where the close initiator is meaningful.
    pub fn is_closing_family(&self) -> bool {
        matches!(
            self,
            PanelState::Closing
                | PanelState::ClosingWaitingForServer
                | PanelState::ClosingWaitingForServerToOpen
        )
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The inbound event vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelEvent {
    /// User gesture: open the panel.
    RequestOpen,
    /// User gesture: close the panel.
    RequestClose,
    /// Remote confirmation: the panel should be open.
    ServerRequestsOpen,
    /// Remote confirmation: the panel should be closed.
    ServerRequestsClose,
    /// The panel enter animation finished.
    PanelOpenTransitionEnd,
}

impl PanelEvent {
    /// External event name.
    pub fn name(&self) -> &'static str {
        match self {
            PanelEvent::RequestOpen => "REQUEST_OPEN",
            PanelEvent::RequestClose => "REQUEST_CLOSE",
            PanelEvent::ServerRequestsOpen => "SERVER_REQUESTS_OPEN",
            PanelEvent::ServerRequestsClose => "SERVER_REQUESTS_CLOSE",
            PanelEvent::PanelOpenTransitionEnd => "PANEL_OPEN_TRANSITION_END",
        }
    }

    /// Case-insensitive mapping from the external event name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "REQUEST_OPEN" => Some(PanelEvent::RequestOpen),
            "REQUEST_CLOSE" => Some(PanelEvent::RequestClose),
            "SERVER_REQUESTS_OPEN" => Some(PanelEvent::ServerRequestsOpen),
            "SERVER_REQUESTS_CLOSE" => Some(PanelEvent::ServerRequestsClose),
            "PANEL_OPEN_TRANSITION_END" => Some(PanelEvent::PanelOpenTransitionEnd),
            _ => None,
        }
    }
}

impl fmt::Display for PanelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which actor started the current closing sequence. Read by
/// diagnostics, never by transition logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseInitiator {
    User,
    Remote,
}

impl CloseInitiator {
    pub fn name(&self) -> &'static str {
        match self {
            CloseInitiator::User => "user",
            CloseInitiator::Remote => "remote",
        }
    }
}

/// One resolved cell of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTarget {
    /// The state to enter.
    pub next: PanelState,
    /// Close-initiator recorded by this transition, if any.
    pub initiator: Option<CloseInitiator>,
}

/// The transition table. `None` means the event is ignored in this
/// state — deliberately tolerant, because the remote side may emit
/// confirmations the local machine has already superseded.
pub fn transition_for(state: PanelState, event: PanelEvent) -> Option<TransitionTarget> {
    use CloseInitiator::{Remote, User};
    use PanelEvent::*;
    use PanelState::*;

    let to = |next| {
        Some(TransitionTarget {
            next,
            initiator: None,
        })
    };
    let close_to = |next, who| {
        Some(TransitionTarget {
            next,
            initiator: Some(who),
        })
    };

    match (state, event) {
        (Closed, RequestOpen) => to(Opening),
        (Closed, ServerRequestsOpen) => to(Open),

        (Opening, RequestClose) => close_to(Closing, User),
        (Opening, ServerRequestsOpen) => to(OpeningServerArrived),
        (Opening, ServerRequestsClose) => close_to(Closing, Remote),
        (Opening, PanelOpenTransitionEnd) => to(Open),

        (OpeningServerArrived, RequestClose) => close_to(Closing, User),
        (OpeningServerArrived, ServerRequestsClose) => close_to(Closing, Remote),
        (OpeningServerArrived, PanelOpenTransitionEnd) => to(Open),

        (Open, RequestClose) => close_to(Closing, User),
        (Open, ServerRequestsClose) => close_to(Closed, Remote),

        (ClosingWaitingForServer, RequestOpen) => to(ClosingWaitingForServerToOpen),
        (ClosingWaitingForServer, ServerRequestsClose) => close_to(Closed, Remote),

        (ClosingWaitingForServerToOpen, ServerRequestsClose) => close_to(Opening, Remote),

        _ => None,
    }
}
