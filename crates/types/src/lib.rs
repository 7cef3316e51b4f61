//! Shared type definitions for the pagewire link-propagation engine.
//!
//! These types describe the declarative link graph attached to rendered page
//! elements and the actions the engine derives from it. They are plain value
//! objects: entries and snapshots are constructed once per render or per
//! interaction and replaced wholesale, never edited in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Point-in-time mapping from element identifier to its current field value.
///
/// Built fresh for every interaction and shared read-only by all actions
/// dispatched from that interaction. Plain JSON map so it can be posted to
/// remote endpoints without further conversion.
pub type Snapshot = serde_json::Map<String, Value>;

/// Snapshot key that marks a task payload as a variable-driven re-run.
///
/// Inserted into the payload of a [`ResolvedAction::Rerun`] so the receiving
/// task endpoint treats the request as triggered by a linked-field change
/// rather than an explicit user submission.
pub const FORCED_RUN_FIELD: &str = "__forced_run";

/// Severity levels for user-visible notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        };
        f.write_str(label)
    }
}

/// Type tag attached to a rendered element.
///
/// Only consulted when the element is the target of a bare-identifier link:
/// tasks are re-run, fields are refreshed or cleared, and anything else is
/// reported as an unhandled link target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    /// Backend task whose output renders into the element.
    Task,
    /// Interactive input field.
    Field,
    /// Any other declared tag, preserved verbatim for error reporting.
    Other(String),
}

impl From<String> for ElementKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "task" => ElementKind::Task,
            "field" => ElementKind::Field,
            _ => ElementKind::Other(raw),
        }
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Task => "task".into(),
            ElementKind::Field => "field".into(),
            ElementKind::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Task => f.write_str("task"),
            ElementKind::Field => f.write_str("field"),
            ElementKind::Other(raw) => f.write_str(raw),
        }
    }
}

/// Target of a structured link.
///
/// The markup-level declaration overloads one `element` string with both
/// concrete element identifiers and the reserved presentation roles; parsing
/// is the only place those reserved strings exist. Everything downstream
/// matches on the variant, so a typo in a role name surfaces as a concrete
/// (and reportable) element target instead of a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LinkTarget {
    /// A concrete element identifier within the same container.
    Element(String),
    /// Positioned popup anchored near the triggering input.
    Popup,
    /// Modal dialog.
    Modal,
    /// Tab activation.
    Tab,
}

impl From<String> for LinkTarget {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "popup" => LinkTarget::Popup,
            "modal" => LinkTarget::Modal,
            "tab" => LinkTarget::Tab,
            _ => LinkTarget::Element(raw),
        }
    }
}

impl From<LinkTarget> for String {
    fn from(target: LinkTarget) -> Self {
        match target {
            LinkTarget::Element(id) => id,
            LinkTarget::Popup => "popup".into(),
            LinkTarget::Modal => "modal".into(),
            LinkTarget::Tab => "tab".into(),
        }
    }
}

/// One declared outbound link from a rendered element.
///
/// A bare identifier means "refresh that element using its existing
/// configuration"; the structured form additionally carries the URL and
/// query parameters to use when the interaction fires, which may differ
/// from whatever the target currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    /// Bare element identifier.
    Bare(String),
    /// Structured target with explicit URL and parameters.
    Structured(StructuredLink),
}

/// Structured link payload: target plus literal URL and query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredLink {
    /// Concrete element identifier or reserved presentation role.
    pub element: LinkTarget,
    /// URL to fetch when the interaction fires. Empty means "no change".
    #[serde(default)]
    pub url: String,
    /// Query parameters (`k=v&k2=v2`) sent along with the URL.
    #[serde(default)]
    pub params: String,
}

/// Link-graph metadata owned by exactly one rendered element.
///
/// Registered when the element renders and replaced wholesale on re-render.
/// Entries are never pruned: resolving against an entry whose element no
/// longer exists must end in a safe no-op, so stale entries are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkGraphEntry {
    /// Type tag consulted by bare-identifier links pointing at this element.
    #[serde(default = "default_kind")]
    pub kind: ElementKind,
    /// Fields with deferred rendering get a full reload instead of a clear.
    #[serde(default)]
    pub delayed: bool,
    /// URL the element currently shows; compared against a structured
    /// link's declared URL to detect content changes.
    #[serde(default)]
    pub url: String,
    /// Stored task parameters as a JSON object literal. May be empty.
    #[serde(default)]
    pub params: String,
    /// Declared outbound links, in declaration order.
    #[serde(default)]
    pub links: Vec<Link>,
}

fn default_kind() -> ElementKind {
    ElementKind::Other(String::new())
}

impl Default for ElementKind {
    fn default() -> Self {
        default_kind()
    }
}

/// Concrete behavior derived from one declared link during resolution.
///
/// Actions are produced in link-declaration order and dispatched
/// fire-and-forget: completion order across asynchronous targets is
/// unspecified.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAction {
    /// Re-run a backend task with the interaction payload.
    ///
    /// The payload is the merged snapshot over the task's stored parameters,
    /// with [`FORCED_RUN_FIELD`] set so the endpoint treats the run as
    /// variable-driven.
    Rerun {
        /// Identifier of the task element to re-run.
        target: String,
        /// Task endpoint, from the target's stored configuration.
        url: String,
        /// Request payload for the task endpoint.
        payload: Snapshot,
    },
    /// Fully re-fetch and re-render a delayed field using its stored
    /// configuration.
    Reload {
        target: String,
        url: String,
        params: String,
    },
    /// Empty the field's displayed value, then signal a value change on it
    /// so its own listeners fire in turn.
    ClearAndNotify { target: String },
    /// Fetch the given URL and replace the target element's content,
    /// re-arming interaction bindings on the inserted subtree.
    ReplaceContent {
        target: String,
        url: String,
        params: String,
    },
    /// Open a positioned popup near the triggering input.
    ShowPopup {
        trigger: String,
        url: String,
        params: String,
    },
    /// Open a modal dialog.
    ShowModal { url: String, params: String },
    /// Activate a tab.
    ActivateTab {
        target: String,
        url: String,
        params: String,
    },
    /// A bare link pointed at an element whose type tag supports no
    /// behavior. Reportable, never fatal to the rest of the entry.
    UnhandledLink { description: String },
}

/// Uniform JSON response envelope for remote task and content endpoints.
///
/// `data != "ok"` is the universal failure signal regardless of HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// `"ok"` on success, anything else on failure.
    pub data: String,
    /// Endpoint-specific result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    /// Human-readable failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Whether the envelope signals success.
    pub fn is_ok(&self) -> bool {
        self.data == "ok"
    }

    /// The failure description, or a generic fallback when the endpoint
    /// omitted one.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| format!("remote endpoint reported '{}'", self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_deserializes_bare_and_structured_forms() {
        let links: Vec<Link> = serde_json::from_value(json!([
            "sel2",
            {"element": "popup", "url": "/frag/a", "params": "k=1"}
        ]))
        .unwrap();

        assert_eq!(links[0], Link::Bare("sel2".into()));
        assert_eq!(
            links[1],
            Link::Structured(StructuredLink {
                element: LinkTarget::Popup,
                url: "/frag/a".into(),
                params: "k=1".into(),
            })
        );
    }

    #[test]
    fn link_target_reserves_role_strings() {
        assert_eq!(LinkTarget::from("popup".to_string()), LinkTarget::Popup);
        assert_eq!(LinkTarget::from("modal".to_string()), LinkTarget::Modal);
        assert_eq!(LinkTarget::from("tab".to_string()), LinkTarget::Tab);
        assert_eq!(
            LinkTarget::from("tabs".to_string()),
            LinkTarget::Element("tabs".into())
        );
    }

    #[test]
    fn element_kind_preserves_unknown_tags() {
        let kind = ElementKind::from("widget".to_string());
        assert_eq!(kind, ElementKind::Other("widget".into()));
        assert_eq!(String::from(kind), "widget");
    }

    #[test]
    fn envelope_failure_detection() {
        let ok: Envelope = serde_json::from_value(json!({"data": "ok", "results": {}})).unwrap();
        assert!(ok.is_ok());

        let failed: Envelope =
            serde_json::from_value(json!({"data": "error", "error": "no such task"})).unwrap();
        assert!(!failed.is_ok());
        assert_eq!(failed.error_message(), "no such task");
    }
}
