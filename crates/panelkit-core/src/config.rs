//! Panel configuration.
//!
//! Read once from `data-*` attributes on the panel root when the
//! instance enters the document; immutable afterwards. Every field has
//! a default, so a bare panel root configures a working modal;
//! malformed values fall back to the field default with a warning
//! rather than refusing to activate.

use panelkit_dom::PanelNode;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration attribute names on the panel root.
pub mod config_attrs {
    pub const DURATION_MS: &str = "data-duration-ms";
    pub const ESCAPE_CLOSES: &str = "data-escape-closes";
    pub const OVERLAY_CLOSES: &str = "data-overlay-closes";
    pub const MODAL: &str = "data-modal";
    pub const SLIDE_FROM: &str = "data-slide-from";
}

/// Edge a drawer panel slides in from. Only meaningful for non-modal
/// panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideFrom {
    Left,
    #[default]
    Right,
    Top,
    Bottom,
}

impl SlideFrom {
    /// Parse from an attribute value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" => Some(SlideFrom::Left),
            "right" => Some(SlideFrom::Right),
            "top" => Some(SlideFrom::Top),
            "bottom" => Some(SlideFrom::Bottom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlideFrom::Left => "left",
            SlideFrom::Right => "right",
            SlideFrom::Top => "top",
            SlideFrom::Bottom => "bottom",
        }
    }
}

/// Immutable per-instance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Enter/exit animation duration in milliseconds.
    pub duration_ms: u64,

    /// Close the panel when Escape is pressed.
    pub escape_closes: bool,

    /// Close the panel when the backdrop overlay is clicked.
    pub overlay_closes: bool,

    /// Centered modal rather than an edge drawer.
    pub modal: bool,

    /// Edge a drawer slides from.
    pub slide_from: SlideFrom,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            duration_ms: 300,
            escape_closes: true,
            overlay_closes: true,
            modal: false,
            slide_from: SlideFrom::Right,
        }
    }
}

impl PanelConfig {
    /// Read configuration from the panel root's data attributes.
    pub fn from_root(root: &PanelNode) -> Self {
        let defaults = Self::default();
        Self {
            duration_ms: parse_attr(
                root,
                config_attrs::DURATION_MS,
                defaults.duration_ms,
                |v| v.trim().parse().ok(),
            ),
            escape_closes: parse_attr(
                root,
                config_attrs::ESCAPE_CLOSES,
                defaults.escape_closes,
                parse_bool,
            ),
            overlay_closes: parse_attr(
                root,
                config_attrs::OVERLAY_CLOSES,
                defaults.overlay_closes,
                parse_bool,
            ),
            modal: parse_attr(root, config_attrs::MODAL, defaults.modal, parse_bool),
            slide_from: parse_attr(
                root,
                config_attrs::SLIDE_FROM,
                defaults.slide_from,
                |v| SlideFrom::parse(v),
            ),
        }
    }

    /// Deserialize from JSON, for embedders that configure panels
    /// outside the markup.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn parse_attr<T>(
    root: &PanelNode,
    attr: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> T {
    match root.attribute(attr) {
        None => default,
        Some(raw) => match parse(&raw) {
            Some(value) => value,
            None => {
                warn!(attr, raw, "Malformed config attribute; using default");
                default
            }
        },
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::default();
        assert_eq!(config.duration_ms, 300);
        assert!(config.escape_closes);
        assert!(config.overlay_closes);
        assert!(!config.modal);
        assert_eq!(config.slide_from, SlideFrom::Right);
    }

    #[test]
    fn test_from_root_reads_attributes() {
        let root = PanelNode::new("div");
        root.set_attribute(config_attrs::DURATION_MS, "450");
        root.set_attribute(config_attrs::ESCAPE_CLOSES, "false");
        root.set_attribute(config_attrs::MODAL, "true");
        root.set_attribute(config_attrs::SLIDE_FROM, "bottom");

        let config = PanelConfig::from_root(&root);
        assert_eq!(config.duration_ms, 450);
        assert!(!config.escape_closes);
        assert!(config.overlay_closes);
        assert!(config.modal);
        assert_eq!(config.slide_from, SlideFrom::Bottom);
    }

    #[test]
    fn test_malformed_attributes_fall_back() {
        let root = PanelNode::new("div");
        root.set_attribute(config_attrs::DURATION_MS, "soon");
        root.set_attribute(config_attrs::OVERLAY_CLOSES, "yep");
        root.set_attribute(config_attrs::SLIDE_FROM, "diagonal");

        let config = PanelConfig::from_root(&root);
        assert_eq!(config, PanelConfig::default());
    }

    #[test]
    fn test_slide_from_parsing() {
        assert_eq!(SlideFrom::parse("left"), Some(SlideFrom::Left));
        assert_eq!(SlideFrom::parse(" TOP "), Some(SlideFrom::Top));
        assert_eq!(SlideFrom::parse("sideways"), None);
        assert_eq!(SlideFrom::Bottom.as_str(), "bottom");
    }

    #[test]
    fn test_from_json() {
        let config =
            PanelConfig::from_json(r#"{"duration_ms": 200, "modal": true, "slide_from": "left"}"#)
                .unwrap();
        assert_eq!(config.duration_ms, 200);
        assert!(config.modal);
        assert_eq!(config.slide_from, SlideFrom::Left);
        // Unlisted fields take their defaults.
        assert!(config.escape_closes);
    }
}
