//! Input routing.
//!
//! The host forwards raw inputs (escape keydown, backdrop clicks); the
//! panel's configuration decides whether each becomes a close request.

use tracing::trace;

use crate::config::PanelConfig;
use crate::machine::PanelEvent;

/// Raw inputs the host forwards to a panel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelInput {
    /// Escape pressed while the panel holds the focus scope.
    EscapeKey,
    /// Click landed on the backdrop overlay.
    OverlayClick,
}

/// Map an input to the event it implies under this configuration.
pub fn route_input(config: &PanelConfig, input: PanelInput) -> Option<PanelEvent> {
    match input {
        PanelInput::EscapeKey if config.escape_closes => Some(PanelEvent::RequestClose),
        PanelInput::OverlayClick if config.overlay_closes => Some(PanelEvent::RequestClose),
        _ => {
            trace!(?input, "Input ignored by config");
            None
        }
    }
}
