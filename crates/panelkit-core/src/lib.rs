//! # Panelkit Core
//!
//! The optimistic panel lifecycle engine. A panel reacts instantly to
//! the user's open/close gesture while the authoritative confirmation
//! arrives later from a remote process; this crate reconciles the two
//! racing sources of truth into one consistent visible state.
//!
//! ## Design Goals
//!
//! 1. **Deterministic reconciliation**: a closed transition table maps
//!    every (state, event) pair to exactly one outcome
//! 2. **Fail-soft hooks**: a faulting entry/exit hook never strands the
//!    machine between states
//! 3. **Testable core**: the table is a pure function; side effects are
//!    commands on an external sink
//! 4. **Structured logging**: full tracing support
//!
//! ## Architecture
//!
//! ```text
//! PanelRegistry
//!    └── PanelController          (one per panel instance)
//!           ├── PanelContext      (state, initiator, ghost, geometry)
//!           ├── transition_for    (pure state x event table)
//!           ├── ghost / FLIP      (panelkit-animation)
//!           └── EffectSink        (host CSS/animation engine)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

pub mod config;
pub mod controller;
pub mod input;
pub mod machine;
pub mod registry;

pub use config::{PanelConfig, SlideFrom};
pub use controller::{PanelContext, PanelController};
pub use input::{route_input, PanelInput};
pub use machine::{transition_for, CloseInitiator, PanelEvent, PanelState, TransitionTarget};
pub use registry::PanelRegistry;

// Embedder-facing ambient surface.
pub use panelkit_common::{init_logging, LogConfig, LogFormat, PanelKitError, Result};

/// Unique identifier for a panel instance. Immutable for the
/// instance's lifetime; diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(u64);

impl PanelId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for PanelId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_id_uniqueness() {
        let a = PanelId::new();
        let b = PanelId::new();
        assert_ne!(a, b);
        assert_ne!(a.raw(), b.raw());
    }
}
