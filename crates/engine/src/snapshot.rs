//! Field value snapshots.
//!
//! The engine never inspects rendered widgets itself; a [`FieldReader`]
//! supplied by the surrounding application reads the current value of every
//! interactive field. [`collect_field_values`] turns one such read into the
//! immutable [`Snapshot`] shared by all actions of a single interaction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pagewire_types::Snapshot;
use serde_json::Value;

/// Read access to the current values of interactive fields.
///
/// Implementations must be total: a field that cannot be read is omitted
/// from the result, never an error.
pub trait FieldReader: Send + Sync {
    /// Current field values, optionally restricted to one container scope.
    ///
    /// `live_only` restricts the result to field values; when `false`,
    /// implementations may also include field metadata (labels, raw markup)
    /// wanted by save/persist flows. Interaction handling always passes
    /// `true`.
    fn read_fields(&self, scope: Option<&str>, live_only: bool) -> Snapshot;
}

/// Build the snapshot for one interaction.
///
/// Reads live values through `reader`, then merges `overrides` on top,
/// last-writer-wins on identical keys. The result is built fresh on every
/// call and is safe to serialize as a JSON object.
pub fn collect_field_values(
    reader: &dyn FieldReader,
    scope: Option<&str>,
    live_only: bool,
    overrides: Option<&Snapshot>,
) -> Snapshot {
    let mut snapshot = reader.read_fields(scope, live_only);
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            snapshot.insert(key.clone(), value.clone());
        }
    }
    snapshot
}

/// In-memory [`FieldReader`] used by tests and the simulation CLI.
///
/// Values are stored per element with an optional owning container; clones
/// share the same underlying values, so a simulation can keep updating
/// fields while a runtime holds its own handle.
#[derive(Debug, Clone, Default)]
pub struct StaticFieldReader {
    values: Arc<Mutex<Snapshot>>,
    scopes: Arc<Mutex<HashMap<String, String>>>,
}

impl StaticFieldReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field's current value, optionally tagging its container.
    pub fn set(&self, element: &str, value: Value, scope: Option<&str>) {
        self.values
            .lock()
            .expect("field values lock")
            .insert(element.to_string(), value);
        if let Some(scope) = scope {
            self.scopes
                .lock()
                .expect("field scopes lock")
                .insert(element.to_string(), scope.to_string());
        }
    }
}

impl FieldReader for StaticFieldReader {
    fn read_fields(&self, scope: Option<&str>, _live_only: bool) -> Snapshot {
        let values = self.values.lock().expect("field values lock");
        let scopes = self.scopes.lock().expect("field scopes lock");
        values
            .iter()
            .filter(|(element, _)| match scope {
                // Fields without a recorded container are visible in every scope.
                Some(scope) => scopes.get(*element).is_none_or(|owner| owner == scope),
                None => true,
            })
            .map(|(element, value)| (element.clone(), value.clone()))
            .collect()
    }
}
