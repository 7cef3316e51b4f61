//! Link resolution.
//!
//! Given the element that changed and the snapshot taken for the
//! interaction, resolution walks the element's declared links in order and
//! classifies each into a concrete [`ResolvedAction`]. Resolution itself is
//! pure: it performs no I/O and never fails. An element with no registry,
//! no entry, or no links resolves to an empty sequence — an expected
//! outcome, not a fault.

use pagewire_types::{
    ElementKind, FORCED_RUN_FIELD, Link, LinkGraphEntry, LinkTarget, ResolvedAction, Snapshot,
    StructuredLink,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::store::RegistryIndex;

/// Resolve the declared links of `element` into dispatchable actions.
///
/// Actions are returned in link-declaration order. The snapshot is read,
/// never modified; the payload attached to a re-run action is a fresh map.
pub fn resolve_links(
    index: &RegistryIndex,
    registry: &str,
    element: &str,
    snapshot: &Snapshot,
) -> Vec<ResolvedAction> {
    let Some(entry) = index.lookup(registry, element) else {
        debug!(registry, element, "no link graph entry; interaction has no declared effects");
        return Vec::new();
    };
    if entry.links.is_empty() {
        return Vec::new();
    }

    entry
        .links
        .iter()
        .map(|link| match link {
            Link::Bare(target) => resolve_bare_link(index, registry, target, snapshot),
            Link::Structured(link) => resolve_structured_link(element, &entry, link),
        })
        .collect()
}

/// Classify a bare-identifier link by the target element's type tag.
fn resolve_bare_link(
    index: &RegistryIndex,
    registry: &str,
    target: &str,
    snapshot: &Snapshot,
) -> ResolvedAction {
    let Some(target_entry) = index.lookup(registry, target) else {
        return ResolvedAction::UnhandledLink {
            description: format!("link '{target}' points at an unregistered element"),
        };
    };

    match &target_entry.kind {
        ElementKind::Task => ResolvedAction::Rerun {
            target: target.to_string(),
            url: target_entry.url.clone(),
            payload: task_payload(&target_entry, target, snapshot),
        },
        ElementKind::Field if target_entry.delayed => ResolvedAction::Reload {
            target: target.to_string(),
            url: target_entry.url.clone(),
            params: target_entry.params.clone(),
        },
        ElementKind::Field => ResolvedAction::ClearAndNotify {
            target: target.to_string(),
        },
        ElementKind::Other(tag) => ResolvedAction::UnhandledLink {
            description: format!("link '{target}' targets unsupported element type '{tag}'"),
        },
    }
}

/// Classify a structured link: URL change detection first, then role.
fn resolve_structured_link(
    element: &str,
    entry: &LinkGraphEntry,
    link: &StructuredLink,
) -> ResolvedAction {
    let changed = entry.url != link.url && !link.url.is_empty();
    if changed {
        // Role targets name no concrete element; changed content renders
        // into the owning element's content area.
        let target = match &link.element {
            LinkTarget::Element(id) => id.clone(),
            _ => element.to_string(),
        };
        return ResolvedAction::ReplaceContent {
            target,
            url: link.url.clone(),
            params: link.params.clone(),
        };
    }

    match &link.element {
        LinkTarget::Popup => ResolvedAction::ShowPopup {
            trigger: element.to_string(),
            url: link.url.clone(),
            params: link.params.clone(),
        },
        LinkTarget::Modal => ResolvedAction::ShowModal {
            url: link.url.clone(),
            params: link.params.clone(),
        },
        LinkTarget::Tab => ResolvedAction::ActivateTab {
            target: element.to_string(),
            url: link.url.clone(),
            params: link.params.clone(),
        },
        LinkTarget::Element(id) => ResolvedAction::ReplaceContent {
            target: id.clone(),
            url: link.url.clone(),
            params: link.params.clone(),
        },
    }
}

/// Build the request payload for a task re-run: the task's stored
/// parameters, the interaction snapshot merged over them, and the
/// forced-run marker on top.
fn task_payload(entry: &LinkGraphEntry, target: &str, snapshot: &Snapshot) -> Snapshot {
    let mut payload = parse_stored_params(&entry.params, target);
    for (key, value) in snapshot {
        payload.insert(key.clone(), value.clone());
    }
    payload.insert(FORCED_RUN_FIELD.to_string(), Value::String("1".into()));
    payload
}

/// Parse an entry's stored parameter payload into a JSON object.
///
/// Anything that is not a JSON object degrades to an empty set with a
/// warning; the re-run proceeds regardless.
fn parse_stored_params(raw: &str, target: &str) -> Snapshot {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Snapshot::new();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!(element = target, "stored task parameters are not a JSON object; using an empty set");
            Snapshot::new()
        }
    }
}
