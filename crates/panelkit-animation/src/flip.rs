//! FLIP geometry correction.
//!
//! First-Last-Invert-Play: when server-confirmed content replaces the
//! loading placeholder mid-open, the before/after layout rectangles
//! are measured and the inverse transform is applied instantly, then
//! released over a short transition, so the differently-sized swap
//! never visibly jumps.

use std::rc::Rc;

use panelkit_dom::{PanelNode, PanelNodes, Rect};
use tracing::{debug, trace};

use crate::{EffectSink, FrameQueue, VisualEffect};

/// Class holding transitions off while the inverted transform lands.
pub const FLIP_INSTANT_CLASS: &str = "panel-flip-instant";
/// Class enabling the short play-back transition to identity.
pub const FLIP_PLAY_CLASS: &str = "panel-flip-play";

/// The invert-step transform mapping the "after" box onto the
/// "before" box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipTransform {
    pub sx: f32,
    pub sy: f32,
    pub dx: f32,
    pub dy: f32,
}

impl FlipTransform {
    /// Compute the correction between two measured rectangles.
    ///
    /// Returns `None` when the boxes differ by less than one layout
    /// unit in both dimensions: there is no visible jump to correct.
    /// Zero "after" dimensions contribute a scale factor of 1.
    pub fn between(before: Rect, after: Rect) -> Option<FlipTransform> {
        let dw = (before.width - after.width).abs();
        let dh = (before.height - after.height).abs();
        if dw < 1.0 && dh < 1.0 {
            return None;
        }

        let sx = if after.width == 0.0 {
            1.0
        } else {
            before.width / after.width
        };
        let sy = if after.height == 0.0 {
            1.0
        } else {
            before.height / after.height
        };

        let (bcx, bcy) = before.center();
        let (acx, acy) = after.center();

        Some(FlipTransform {
            sx,
            sy,
            dx: bcx - acx,
            dy: bcy - acy,
        })
    }

    /// CSS transform for the content node's invert step.
    pub fn css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}, {})",
            self.dx, self.dy, self.sx, self.sy
        )
    }

    /// CSS transform for the loading element: the inverse scale keeps
    /// it at its pre-swap size while it fades.
    pub fn inverse_scale_css(&self) -> String {
        let ix = if self.sx == 0.0 { 1.0 } else { 1.0 / self.sx };
        let iy = if self.sy == 0.0 { 1.0 } else { 1.0 / self.sy };
        format!("scale({}, {})", ix, iy)
    }
}

/// Handle for stripping the temporary FLIP styles once the play-back
/// transition completes. Invoked by the animation engine from its own
/// transition-end observation; consuming it makes the cleanup
/// single-fire.
#[derive(Debug)]
pub struct FlipCleanup {
    content: Rc<PanelNode>,
    loading: Rc<PanelNode>,
}

impl FlipCleanup {
    /// Strip the transition class and every temporary property.
    pub fn complete(self) {
        self.content.remove_class(FLIP_PLAY_CLASS);
        self.content.remove_style("transform");
        self.loading.remove_style("transform");
        trace!(content = ?self.content.id(), "FLIP styles stripped");
    }
}

/// Run the FLIP correction for a loading → content swap.
///
/// `before` is the loading element's rectangle captured just before
/// the update that swapped content in. Emits hide-loading, measures
/// the content node's "after" rectangle, applies the inverted
/// transform with transitions disabled, and defers the play step one
/// frame so the invert lands in a committed layout first.
///
/// Returns `None` (applying nothing) when the loading or inner node is
/// missing or when the rectangles differ by less than one unit in both
/// axes.
pub fn run_flip(
    nodes: &PanelNodes,
    before: Rect,
    queue: &FrameQueue,
    sink: &dyn EffectSink,
) -> Option<FlipCleanup> {
    let (Some(loading), Some(content)) = (&nodes.loading, &nodes.inner) else {
        debug!("FLIP skipped: loading or inner node missing");
        return None;
    };

    sink.apply(VisualEffect::HideLoading(loading.id()));

    let after = content.layout_rect();
    let Some(transform) = FlipTransform::between(before, after) else {
        trace!(?before, ?after, "FLIP skipped: sub-unit delta");
        return None;
    };

    debug!(
        sx = transform.sx,
        sy = transform.sy,
        dx = transform.dx,
        dy = transform.dy,
        "FLIP invert"
    );

    // Invert: land the old geometry instantly, transitions off.
    loading.set_style("transform", &transform.inverse_scale_css());
    content.add_class(FLIP_INSTANT_CLASS);
    content.set_style("transform", &transform.css());

    // Play: one frame later, re-enable transitions and release to
    // identity so CSS interpolates the correction.
    let play_content = content.clone();
    queue.defer(move |_sink| {
        play_content.remove_class(FLIP_INSTANT_CLASS);
        play_content.add_class(FLIP_PLAY_CLASS);
        play_content.set_style("transform", "none");
    });

    Some(FlipCleanup {
        content: content.clone(),
        loading: loading.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingSink;
    use panelkit_dom::{attrs, parts};

    fn panel_fixture() -> PanelNodes {
        let root = PanelNode::new("div");
        let overlay = PanelNode::new("div");
        overlay.set_attribute(attrs::PART, parts::OVERLAY);
        let content = PanelNode::new("div");
        content.set_attribute(attrs::PART, parts::CONTENT);
        let container = PanelNode::new("div");
        container.set_attribute(attrs::PART, parts::CONTAINER);
        let loading = PanelNode::new("div");
        loading.set_attribute(attrs::PART, parts::LOADING);
        let inner = PanelNode::new("div");
        inner.set_attribute(attrs::PART, parts::INNER);

        container.append_child(loading);
        container.append_child(inner);
        content.append_child(container);
        root.append_child(overlay);
        root.append_child(content);
        PanelNodes::resolve(&root).unwrap()
    }

    #[test]
    fn test_transform_between_rects() {
        let before = Rect::new(0.0, 0.0, 200.0, 100.0);
        let after = Rect::new(0.0, 0.0, 400.0, 300.0);
        let t = FlipTransform::between(before, after).unwrap();
        assert_eq!(t.sx, 0.5);
        assert!((t.sy - 1.0 / 3.0).abs() < 1e-6);
        // Centers: (100, 50) vs (200, 150).
        assert_eq!(t.dx, -100.0);
        assert_eq!(t.dy, -100.0);
    }

    #[test]
    fn test_sub_unit_delta_skips() {
        let before = Rect::new(0.0, 0.0, 200.0, 100.0);
        let after = Rect::new(5.0, 5.0, 200.5, 100.9);
        assert!(FlipTransform::between(before, after).is_none());
    }

    #[test]
    fn test_one_axis_over_unit_runs() {
        let before = Rect::new(0.0, 0.0, 200.0, 100.0);
        let after = Rect::new(0.0, 0.0, 200.5, 140.0);
        assert!(FlipTransform::between(before, after).is_some());
    }

    #[test]
    fn test_zero_after_dimensions_guarded() {
        let before = Rect::new(0.0, 0.0, 200.0, 100.0);
        let after = Rect::new(0.0, 0.0, 0.0, 0.0);
        let t = FlipTransform::between(before, after).unwrap();
        assert_eq!(t.sx, 1.0);
        assert_eq!(t.sy, 1.0);
    }

    #[test]
    fn test_run_flip_invert_then_play() {
        let nodes = panel_fixture();
        let queue = FrameQueue::new();
        let sink = RecordingSink::new();

        let loading = nodes.loading.clone().unwrap();
        let inner = nodes.inner.clone().unwrap();
        loading.set_layout_rect(Rect::new(0.0, 0.0, 200.0, 100.0));
        inner.set_layout_rect(Rect::new(0.0, 0.0, 400.0, 200.0));

        let before = loading.layout_rect();
        let cleanup = run_flip(&nodes, before, &queue, &sink).unwrap();

        // Invert applied synchronously: hide-loading issued, transforms
        // set, transitions held off.
        assert!(sink.saw(VisualEffect::HideLoading(loading.id())));
        assert!(inner.has_class(FLIP_INSTANT_CLASS));
        assert!(inner.style("transform").is_some());
        assert_eq!(
            loading.style("transform").as_deref(),
            Some("scale(2, 2)")
        );

        // Play step lands on the next frame.
        queue.run_frame(&sink);
        assert!(!inner.has_class(FLIP_INSTANT_CLASS));
        assert!(inner.has_class(FLIP_PLAY_CLASS));
        assert_eq!(inner.style("transform").as_deref(), Some("none"));

        // Completion strips every temporary.
        cleanup.complete();
        assert!(!inner.has_class(FLIP_PLAY_CLASS));
        assert!(inner.style("transform").is_none());
        assert!(loading.style("transform").is_none());
    }

    #[test]
    fn test_run_flip_noop_boundary_applies_nothing() {
        let nodes = panel_fixture();
        let queue = FrameQueue::new();
        let sink = RecordingSink::new();

        let loading = nodes.loading.clone().unwrap();
        let inner = nodes.inner.clone().unwrap();
        loading.set_layout_rect(Rect::new(0.0, 0.0, 300.0, 200.0));
        inner.set_layout_rect(Rect::new(0.0, 0.0, 300.2, 200.4));

        let before = loading.layout_rect();
        assert!(run_flip(&nodes, before, &queue, &sink).is_none());
        assert!(!inner.has_class(FLIP_INSTANT_CLASS));
        assert!(!inner.has_class(FLIP_PLAY_CLASS));
        assert!(inner.style("transform").is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_run_flip_without_loading_node_degrades() {
        let nodes = panel_fixture();
        let queue = FrameQueue::new();
        let sink = RecordingSink::new();

        let mut nodes = nodes;
        nodes.loading = None;

        assert!(run_flip(&nodes, Rect::zero(), &queue, &sink).is_none());
        assert!(sink.recorded().is_empty());
    }
}
