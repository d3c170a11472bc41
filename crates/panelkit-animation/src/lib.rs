//! # Panelkit Animation
//!
//! Animation coordination for the Panelkit panel engine: the
//! visual-effect command vocabulary the lifecycle core emits, the
//! frame-deferral queue, single-fire transition-end tracking, the ghost
//! content-swap coordinator, and the FLIP geometry engine.
//!
//! ## Architecture
//!
//! ```text
//! Lifecycle core
//!    ├── VisualEffect ──► EffectSink (CSS/animation engine, external)
//!    ├── FrameQueue      (defer one scheduling tick, host-drained)
//!    ├── TransitionEndSignal (panel enter animation completion)
//!    ├── ghost::setup_ghost  (close-time content swap)
//!    └── flip::run_flip      (loading → content geometry correction)
//! ```
//!
//! The engine never executes visuals itself; it issues commands and
//! mutates the panel subtree, and the host's animation engine does the
//! rest.

pub mod flip;
pub mod ghost;

pub use flip::{run_flip, FlipCleanup, FlipTransform, FLIP_INSTANT_CLASS, FLIP_PLAY_CLASS};
pub use ghost::{setup_ghost, GhostHandle};

use panelkit_dom::NodeId;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use tracing::trace;

// ==================== Visual effects ====================

/// A visual-effect command bound to a node target.
///
/// Commands are idempotent and fire-and-forget: the core may issue the
/// same command multiple times and never observes its execution beyond
/// the completion signals it separately tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualEffect {
    /// Reveal the loading placeholder.
    ShowLoading(NodeId),
    /// Play the panel enter animation.
    ShowPanel(NodeId),
    /// Hide the loading placeholder.
    HideLoading(NodeId),
    /// Fade out a detached ghost clone; the executing engine removes
    /// the clone in its own completion callback.
    FadeOutGhost(NodeId),
    /// Move focus to the first focusable element under the target.
    FocusFirstElement(NodeId),
}

impl VisualEffect {
    /// Command name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            VisualEffect::ShowLoading(_) => "show-loading",
            VisualEffect::ShowPanel(_) => "show-panel",
            VisualEffect::HideLoading(_) => "hide-loading",
            VisualEffect::FadeOutGhost(_) => "fade-out-ghost",
            VisualEffect::FocusFirstElement(_) => "focus-first-element",
        }
    }

    /// The node the command is bound to.
    pub fn target(&self) -> NodeId {
        match self {
            VisualEffect::ShowLoading(id)
            | VisualEffect::ShowPanel(id)
            | VisualEffect::HideLoading(id)
            | VisualEffect::FadeOutGhost(id)
            | VisualEffect::FocusFirstElement(id) => *id,
        }
    }
}

/// Sink for visual-effect commands, implemented by the host's
/// CSS/animation engine.
pub trait EffectSink {
    /// Execute one command. Must tolerate repeat invocations.
    fn apply(&self, effect: VisualEffect);
}

/// Sink that discards every command.
#[derive(Debug, Default)]
pub struct NullSink;

impl EffectSink for NullSink {
    fn apply(&self, _effect: VisualEffect) {}
}

/// Sink that records every command, for tests and tracing hosts.
#[derive(Debug, Default)]
pub struct RecordingSink {
    effects: RefCell<Vec<VisualEffect>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the commands applied so far.
    pub fn recorded(&self) -> Vec<VisualEffect> {
        self.effects.borrow().clone()
    }

    /// Whether a command was applied at least once.
    pub fn saw(&self, effect: VisualEffect) -> bool {
        self.effects.borrow().contains(&effect)
    }

    /// Drop all recorded commands.
    pub fn clear(&self) {
        self.effects.borrow_mut().clear();
    }
}

impl EffectSink for RecordingSink {
    fn apply(&self, effect: VisualEffect) {
        trace!(command = effect.name(), target = ?effect.target(), "Effect recorded");
        self.effects.borrow_mut().push(effect);
    }
}

// ==================== Frame queue ====================

/// A deferred operation run on the next host frame.
pub type FrameTask = Box<dyn FnOnce(&dyn EffectSink)>;

/// One-tick deferral queue: the "next animation frame" primitive.
///
/// Ghost and FLIP operations defer exactly one step each so the host
/// commits layout and styles before a transition is enabled or a
/// measurement is consumed. The host drains the queue once per frame
/// via [`FrameQueue::run_frame`]. Tasks deferred while a frame runs
/// execute on the following frame.
#[derive(Default)]
pub struct FrameQueue {
    tasks: RefCell<VecDeque<FrameTask>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer a task to the next frame.
    pub fn defer(&self, task: impl FnOnce(&dyn EffectSink) + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run every task deferred before this call. Returns how many ran.
    pub fn run_frame(&self, sink: &dyn EffectSink) -> usize {
        let due = self.tasks.borrow().len();
        for _ in 0..due {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(sink),
                None => break,
            }
        }
        trace!(ran = due, "Frame tasks drained");
        due
    }

    /// Number of tasks waiting for the next frame.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Drop all pending tasks. Used at instance teardown.
    pub fn clear(&self) {
        self.tasks.borrow_mut().clear();
    }
}

impl std::fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.tasks.borrow().len())
            .finish()
    }
}

// ==================== Transition-end signal ====================

/// Single-fire completion tracking for the panel enter animation.
///
/// Armed at most once per opening sequence; consuming the signal
/// auto-unsubscribes, so a second completion notification from the
/// host is a no-op. Detached when a close begins.
#[derive(Debug, Default)]
pub struct TransitionEndSignal {
    armed: Cell<bool>,
}

impl TransitionEndSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the signal. Returns false if it was already armed (the
    /// existing subscription stands; there is never more than one).
    pub fn arm(&self) -> bool {
        if self.armed.get() {
            return false;
        }
        self.armed.set(true);
        true
    }

    /// Detach without firing.
    pub fn disarm(&self) {
        self.armed.set(false);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    /// Consume the signal: true exactly once per arming.
    pub fn consume(&self) -> bool {
        let was_armed = self.armed.get();
        self.armed.set(false);
        was_armed
    }
}
