//! Interaction binding.
//!
//! The binder turns raw per-control signals (change, input, click) into the
//! uniform "this element changed" call that drives the snapshot → resolve →
//! dispatch pipeline. Each bound element owns its own debouncer, sized for
//! its control flavor: selection-style controls get a short window so they
//! feel instantaneous, free-form inputs get the default window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pagewire_types::Snapshot;
use pagewire_util::{DEFAULT_DEBOUNCE, Debouncer, SELECTION_DEBOUNCE};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dispatch::{PageHost, dispatch_all};
use crate::resolve::resolve_links;
use crate::snapshot::{FieldReader, collect_field_values};
use crate::store::RegistryIndex;

/// Flavor of interactive control an element renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Text,
    Select,
    Checkbox,
    Radio,
    Button,
    Editor,
}

/// Raw interaction signals a control can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Change,
    Input,
    Click,
}

impl ControlKind {
    /// Signals this control flavor listens for.
    pub fn signals(self) -> &'static [SignalKind] {
        match self {
            ControlKind::Text => &[SignalKind::Input, SignalKind::Change],
            ControlKind::Editor => &[SignalKind::Input],
            ControlKind::Select | ControlKind::Checkbox | ControlKind::Radio => &[SignalKind::Change],
            ControlKind::Button => &[SignalKind::Click],
        }
    }

    /// Quiet window applied before the pipeline runs for this control.
    pub fn debounce_window(self) -> Duration {
        match self {
            ControlKind::Select | ControlKind::Checkbox | ControlKind::Radio => SELECTION_DEBOUNCE,
            _ => DEFAULT_DEBOUNCE,
        }
    }
}

/// Run the pipeline for one interaction immediately, bypassing debounce.
///
/// Snapshots the container's current field values (merged with `overrides`),
/// resolves the changed element's links, and dispatches the resulting
/// actions fire-and-forget. Returns the dispatch handles for callers that
/// want to await quiescence.
pub fn run_interaction(
    index: &RegistryIndex,
    reader: &dyn FieldReader,
    host: &Arc<dyn PageHost>,
    registry: &str,
    element: &str,
    overrides: Option<&Snapshot>,
) -> Vec<JoinHandle<()>> {
    let snapshot = collect_field_values(reader, Some(registry), true, overrides);
    let actions = resolve_links(index, registry, element, &snapshot);
    dispatch_all(actions, host)
}

/// Owns the bound handlers for one page and drives the pipeline.
///
/// A runtime holds the registry index, the field reader, and the host, plus
/// one debouncer per bound element. Signals for unbound elements are
/// dropped silently.
pub struct PageRuntime {
    index: RegistryIndex,
    reader: Arc<dyn FieldReader>,
    host: Arc<dyn PageHost>,
    handlers: HashMap<(String, String), Debouncer<Option<Snapshot>>>,
}

impl PageRuntime {
    pub fn new(index: RegistryIndex, reader: Arc<dyn FieldReader>, host: Arc<dyn PageHost>) -> Self {
        Self {
            index,
            reader,
            host,
            handlers: HashMap::new(),
        }
    }

    /// The shared registry index this runtime resolves against.
    pub fn index(&self) -> &RegistryIndex {
        &self.index
    }

    /// Attach a debounced interaction handler for `element`.
    ///
    /// Rebinding replaces the previous handler (and cancels anything it had
    /// pending), matching the upsert semantics of entry registration.
    pub fn bind(&mut self, registry: &str, element: &str, control: ControlKind) {
        let index = self.index.clone();
        let reader = Arc::clone(&self.reader);
        let host = Arc::clone(&self.host);
        let registry_name = registry.to_string();
        let element_id = element.to_string();

        let debouncer = Debouncer::new(control.debounce_window(), move |overrides: Option<Snapshot>| {
            run_interaction(
                &index,
                reader.as_ref(),
                &host,
                &registry_name,
                &element_id,
                overrides.as_ref(),
            );
        });
        self.handlers.insert((registry.to_string(), element.to_string()), debouncer);
    }

    /// Deliver a raw change signal for `element`.
    pub fn signal(&mut self, registry: &str, element: &str) {
        self.signal_with_overrides(registry, element, None);
    }

    /// Deliver a raw change signal carrying extra values to merge over the
    /// live snapshot when the debounce window closes.
    pub fn signal_with_overrides(&mut self, registry: &str, element: &str, overrides: Option<Snapshot>) {
        match self.handlers.get_mut(&(registry.to_string(), element.to_string())) {
            Some(handler) => handler.call(overrides),
            None => debug!(registry, element, "signal for unbound element dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RecordingHost;
    use crate::snapshot::StaticFieldReader;
    use pagewire_types::{ElementKind, Link, LinkGraphEntry};
    use serde_json::json;

    #[test]
    fn selection_controls_use_the_short_window() {
        assert_eq!(ControlKind::Select.debounce_window(), SELECTION_DEBOUNCE);
        assert_eq!(ControlKind::Checkbox.debounce_window(), SELECTION_DEBOUNCE);
        assert_eq!(ControlKind::Radio.debounce_window(), SELECTION_DEBOUNCE);
        assert_eq!(ControlKind::Text.debounce_window(), DEFAULT_DEBOUNCE);
        assert_eq!(ControlKind::Button.debounce_window(), DEFAULT_DEBOUNCE);
    }

    #[test]
    fn controls_declare_their_signals() {
        assert_eq!(ControlKind::Button.signals(), &[SignalKind::Click]);
        assert_eq!(ControlKind::Select.signals(), &[SignalKind::Change]);
        assert!(ControlKind::Text.signals().contains(&SignalKind::Input));
    }

    fn linked_pair_index() -> RegistryIndex {
        let index = RegistryIndex::new();
        index.register(
            "grid_main",
            "sel1",
            LinkGraphEntry {
                kind: ElementKind::Field,
                links: vec![Link::Bare("sel2".into())],
                ..Default::default()
            },
        );
        index.register(
            "grid_main",
            "sel2",
            LinkGraphEntry {
                kind: ElementKind::Field,
                ..Default::default()
            },
        );
        index
    }

    #[tokio::test(start_paused = true)]
    async fn signal_burst_runs_the_pipeline_once() {
        let host = Arc::new(RecordingHost::new());
        let generic: Arc<dyn PageHost> = host.clone();
        let reader = StaticFieldReader::new();
        reader.set("sel1", json!("x"), Some("grid_main"));

        let mut runtime = PageRuntime::new(linked_pair_index(), Arc::new(reader), generic);
        runtime.bind("grid_main", "sel1", ControlKind::Select);

        runtime.signal("grid_main", "sel1");
        runtime.signal("grid_main", "sel1");
        runtime.signal("grid_main", "sel1");

        tokio::time::sleep(Duration::from_millis(200)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(host.events(), vec!["clear sel2".to_string(), "changed sel2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn signals_for_unbound_elements_are_dropped() {
        let host = Arc::new(RecordingHost::new());
        let generic: Arc<dyn PageHost> = host.clone();
        let reader = StaticFieldReader::new();

        let mut runtime = PageRuntime::new(linked_pair_index(), Arc::new(reader), generic);
        runtime.signal("grid_main", "nobody");

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(host.events().is_empty());
    }

    #[tokio::test]
    async fn run_interaction_merges_overrides_into_the_snapshot() {
        let host = Arc::new(RecordingHost::new());
        let generic: Arc<dyn PageHost> = host.clone();
        let reader = StaticFieldReader::new();
        reader.set("sel1", json!("stale"), Some("grid_main"));

        let index = RegistryIndex::new();
        index.register(
            "grid_main",
            "sel1",
            LinkGraphEntry {
                kind: ElementKind::Field,
                links: vec![Link::Bare("chart1".into())],
                ..Default::default()
            },
        );
        index.register(
            "grid_main",
            "chart1",
            LinkGraphEntry {
                kind: ElementKind::Task,
                url: "/tasks/chart1".into(),
                ..Default::default()
            },
        );

        let mut overrides = Snapshot::new();
        overrides.insert("sel1".into(), json!("fresh"));

        let handles = run_interaction(&index, &reader, &generic, "grid_main", "sel1", Some(&overrides));
        crate::dispatch::await_dispatch(handles).await;

        let events = host.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("\"sel1\":\"fresh\""));
    }
}
