//! Ghost content swaps.
//!
//! A close must feel instantaneous: the live main-content subtree is
//! detached in the same frame an inert clone takes its place, so the
//! container is immediately free for new content (a subsequent
//! optimistic open's loading view) while the clone animates out on its
//! own.

use std::rc::Rc;

use panelkit_dom::{attrs, PanelNode, PanelNodes};
use tracing::{debug, error, warn};

use crate::{FrameQueue, VisualEffect};

/// Tracking handle for the at-most-one ghost clone of a panel
/// instance. Dropping the handle drops tracking only; removing the
/// clone from the tree is the animation engine's job, performed in its
/// own fade-completion callback.
#[derive(Debug)]
pub struct GhostHandle {
    node: Rc<PanelNode>,
}

impl GhostHandle {
    /// The ghost clone node.
    pub fn node(&self) -> &Rc<PanelNode> {
        &self.node
    }
}

/// Swap the live main-content node for an inert fading clone.
///
/// Returns `None` when there is no live content to ghost; the close
/// then runs on the configured duration alone. The clone is appended
/// where the original sat, the original is detached, and the fade-out
/// command is deferred one frame so the host commits the swap before
/// the fade starts.
pub fn setup_ghost(nodes: &PanelNodes, queue: &FrameQueue) -> Option<GhostHandle> {
    let Some(live) = nodes.live_content() else {
        debug!("no live content to ghost");
        return None;
    };

    let ghost = live.deep_clone();
    // The clone must never read as live content to the host re-render.
    ghost.remove_attribute(attrs::LIVE);
    ghost.set_class_list(live.class_list());

    let attach_point = attachment_point(nodes, &live);
    live.detach();
    attach_point.append_child(ghost.clone());

    let ghost_id = ghost.id();
    queue.defer(move |sink| sink.apply(VisualEffect::FadeOutGhost(ghost_id)));

    debug!(ghost = ?ghost_id, "Ghost swap complete");
    Some(GhostHandle { node: ghost })
}

/// Where the clone goes: the container the live node sits in, falling
/// back to the panel content box. The content box always exists, so
/// the ladder is total.
fn attachment_point(nodes: &PanelNodes, live: &Rc<PanelNode>) -> Rc<PanelNode> {
    if let Some(parent) = live.parent() {
        return parent;
    }
    error!("expected ghost container is missing; falling back");
    if let Some(container) = &nodes.container {
        return container.clone();
    }
    warn!("attaching ghost to panel content");
    nodes.content.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingSink;
    use panelkit_dom::parts;

    fn panel_with_live_content() -> PanelNodes {
        let root = PanelNode::new("div");
        let overlay = PanelNode::new("div");
        overlay.set_attribute(attrs::PART, parts::OVERLAY);
        let content = PanelNode::new("div");
        content.set_attribute(attrs::PART, parts::CONTENT);
        let container = PanelNode::new("div");
        container.set_attribute(attrs::PART, parts::CONTAINER);

        let live = PanelNode::new("div");
        live.set_attribute(attrs::LIVE, "");
        live.add_class("panel-body");
        live.append_child(PanelNode::new("p"));

        container.append_child(live);
        content.append_child(container);
        root.append_child(overlay);
        root.append_child(content);
        PanelNodes::resolve(&root).unwrap()
    }

    #[test]
    fn test_ghost_swap_replaces_live_content() {
        let nodes = panel_with_live_content();
        let queue = FrameQueue::new();
        let live = nodes.live_content().unwrap();

        let handle = setup_ghost(&nodes, &queue).unwrap();
        let ghost = handle.node();

        // Original detached, clone in its place.
        assert!(live.parent().is_none());
        let container = nodes.container.clone().unwrap();
        assert_eq!(container.children().len(), 1);
        assert!(PanelNode::is_same(&container.children()[0], ghost));

        // The clone is a distinct node without the live marker, with
        // the visual classes carried over.
        assert!(!PanelNode::is_same(ghost, &live));
        assert!(!ghost.has_attribute(attrs::LIVE));
        assert!(ghost.has_class("panel-body"));
        assert_eq!(ghost.children().len(), 1);

        // Container is free again for fresh content.
        assert!(nodes.live_content().is_none());
    }

    #[test]
    fn test_ghost_fade_is_deferred_one_frame() {
        let nodes = panel_with_live_content();
        let queue = FrameQueue::new();
        let sink = RecordingSink::new();

        let handle = setup_ghost(&nodes, &queue).unwrap();
        let fade = VisualEffect::FadeOutGhost(handle.node().id());
        assert!(!sink.saw(fade));

        queue.run_frame(&sink);
        assert!(sink.saw(fade));
    }

    #[test]
    fn test_no_live_content_is_a_noop() {
        let nodes = panel_with_live_content();
        nodes.live_content().unwrap().detach();

        let queue = FrameQueue::new();
        assert!(setup_ghost(&nodes, &queue).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_detached_live_node_falls_back_to_container() {
        let nodes = panel_with_live_content();
        let live = nodes.live_content().unwrap();

        // Simulate a re-render that already pulled the live node out of
        // the tree between resolution and close. live_content() no
        // longer sees it, so drive the fallback directly.
        live.detach();
        let point = attachment_point(&nodes, &live);
        assert!(PanelNode::is_same(
            &point,
            nodes.container.as_ref().unwrap()
        ));
    }
}
