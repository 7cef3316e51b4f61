//! Action dispatch.
//!
//! The router executes resolved actions against the surrounding application
//! through the [`PageHost`] seam. Dispatch is fire-and-forget per action:
//! each action runs as its own detached task, spawned in declaration order,
//! with no completion ordering across them. A failed action is reported to
//! the user through `notify` and never blocks, retries, or rolls back its
//! siblings.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use pagewire_types::{Envelope, ResolvedAction, Severity};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

/// Side-effecting operations the surrounding application must expose.
///
/// The engine picks the operation and hands it the snapshot-derived payload,
/// target identifier, and URL/params; everything visual or transport-level
/// happens behind this trait. `render_into` must re-arm interaction bindings
/// on the subtree it inserts.
#[async_trait]
pub trait PageHost: Send + Sync {
    /// POST `payload` to a remote endpoint and decode the JSON envelope.
    async fn fetch_json(&self, url: &str, params: &str, payload: &Value) -> Result<Envelope>;

    /// Replace `element`'s content with server-rendered markup from
    /// `url`+`params`, re-arming interaction bindings on completion.
    async fn render_into(&self, element: &str, url: &str, params: &str) -> Result<()>;

    /// Empty the field's displayed value.
    async fn clear_field(&self, element: &str) -> Result<()>;

    /// Signal a value-changed event on the field so its own listeners fire.
    async fn emit_changed(&self, element: &str) -> Result<()>;

    /// Open a positioned popup near the triggering input.
    async fn show_popup(&self, trigger: &str, url: &str, params: &str) -> Result<()>;

    /// Open a modal dialog.
    async fn open_modal(&self, url: &str, params: &str) -> Result<()>;

    /// Activate a tab.
    async fn activate_tab(&self, target: &str, url: &str, params: &str) -> Result<()>;

    /// Report a user-visible message.
    fn notify(&self, message: &str, severity: Severity);
}

/// Dispatch every action as its own detached task, in declaration order.
///
/// The returned handles are for callers that want to await quiescence (tests,
/// the simulation CLI); dropping them leaves the tasks running.
pub fn dispatch_all(actions: Vec<ResolvedAction>, host: &Arc<dyn PageHost>) -> Vec<JoinHandle<()>> {
    actions
        .into_iter()
        .map(|action| {
            let host = Arc::clone(host);
            tokio::spawn(async move {
                dispatch_one(action, host.as_ref()).await;
            })
        })
        .collect()
}

/// Execute one action, routing any failure into a danger notification.
async fn dispatch_one(action: ResolvedAction, host: &dyn PageHost) {
    match action {
        ResolvedAction::Rerun { target, url, payload } => {
            match host.fetch_json(&url, "", &Value::Object(payload)).await {
                Ok(envelope) if envelope.is_ok() => {
                    debug!(element = %target, "task re-run accepted");
                }
                Ok(envelope) => {
                    host.notify(
                        &format!("task '{}' failed: {}", target, envelope.error_message()),
                        Severity::Danger,
                    );
                }
                Err(error) => {
                    host.notify(&format!("task '{target}' failed: {error}"), Severity::Danger);
                }
            }
        }
        ResolvedAction::Reload { target, url, params } => {
            if let Err(error) = host.render_into(&target, &url, &params).await {
                host.notify(&format!("field '{target}' reload failed: {error}"), Severity::Danger);
            }
        }
        ResolvedAction::ClearAndNotify { target } => {
            if let Err(error) = host.clear_field(&target).await {
                host.notify(&format!("field '{target}' clear failed: {error}"), Severity::Danger);
                return;
            }
            if let Err(error) = host.emit_changed(&target).await {
                host.notify(
                    &format!("field '{target}' change signal failed: {error}"),
                    Severity::Danger,
                );
            }
        }
        ResolvedAction::ReplaceContent { target, url, params } => {
            if let Err(error) = host.render_into(&target, &url, &params).await {
                host.notify(
                    &format!("content replacement for '{target}' failed: {error}"),
                    Severity::Danger,
                );
            }
        }
        ResolvedAction::ShowPopup { trigger, url, params } => {
            if let Err(error) = host.show_popup(&trigger, &url, &params).await {
                host.notify(&format!("popup for '{trigger}' failed: {error}"), Severity::Danger);
            }
        }
        ResolvedAction::ShowModal { url, params } => {
            if let Err(error) = host.open_modal(&url, &params).await {
                host.notify(&format!("modal failed: {error}"), Severity::Danger);
            }
        }
        ResolvedAction::ActivateTab { target, url, params } => {
            if let Err(error) = host.activate_tab(&target, &url, &params).await {
                host.notify(&format!("tab activation for '{target}' failed: {error}"), Severity::Danger);
            }
        }
        ResolvedAction::UnhandledLink { description } => {
            host.notify(&description, Severity::Danger);
        }
    }
}

/// A host that accepts every operation without side effects. Allows tests
/// and previews to exercise the pipeline end to end.
pub struct NoopHost;

#[async_trait]
impl PageHost for NoopHost {
    async fn fetch_json(&self, _url: &str, _params: &str, _payload: &Value) -> Result<Envelope> {
        Ok(Envelope {
            data: "ok".into(),
            results: None,
            error: None,
        })
    }

    async fn render_into(&self, _element: &str, _url: &str, _params: &str) -> Result<()> {
        Ok(())
    }

    async fn clear_field(&self, _element: &str) -> Result<()> {
        Ok(())
    }

    async fn emit_changed(&self, _element: &str) -> Result<()> {
        Ok(())
    }

    async fn show_popup(&self, _trigger: &str, _url: &str, _params: &str) -> Result<()> {
        Ok(())
    }

    async fn open_modal(&self, _url: &str, _params: &str) -> Result<()> {
        Ok(())
    }

    async fn activate_tab(&self, _target: &str, _url: &str, _params: &str) -> Result<()> {
        Ok(())
    }

    fn notify(&self, _message: &str, _severity: Severity) {}
}

/// A host that records every operation it receives, in call order.
///
/// `fail_fetches` makes `fetch_json` return an error envelope so failure
/// reporting can be asserted.
#[derive(Default)]
pub struct RecordingHost {
    pub fail_fetches: bool,
    events: std::sync::Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_fetches: true,
            ..Default::default()
        }
    }

    fn record(&self, event: String) {
        self.events.lock().expect("event lock").push(event);
    }

    /// Everything recorded so far, in call order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("event lock").clone()
    }
}

#[async_trait]
impl PageHost for RecordingHost {
    async fn fetch_json(&self, url: &str, params: &str, payload: &Value) -> Result<Envelope> {
        self.record(format!("fetch {url} {params} {payload}"));
        if self.fail_fetches {
            Ok(Envelope {
                data: "error".into(),
                results: None,
                error: Some("backend rejected the run".into()),
            })
        } else {
            Ok(Envelope {
                data: "ok".into(),
                results: None,
                error: None,
            })
        }
    }

    async fn render_into(&self, element: &str, url: &str, params: &str) -> Result<()> {
        self.record(format!("render {element} {url} {params}"));
        Ok(())
    }

    async fn clear_field(&self, element: &str) -> Result<()> {
        self.record(format!("clear {element}"));
        Ok(())
    }

    async fn emit_changed(&self, element: &str) -> Result<()> {
        self.record(format!("changed {element}"));
        Ok(())
    }

    async fn show_popup(&self, trigger: &str, url: &str, params: &str) -> Result<()> {
        self.record(format!("popup {trigger} {url} {params}"));
        Ok(())
    }

    async fn open_modal(&self, url: &str, params: &str) -> Result<()> {
        self.record(format!("modal {url} {params}"));
        Ok(())
    }

    async fn activate_tab(&self, target: &str, url: &str, params: &str) -> Result<()> {
        self.record(format!("tab {target} {url} {params}"));
        Ok(())
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.record(format!("notify[{severity}] {message}"));
    }
}

/// Await a batch of dispatch handles. Panicked tasks are ignored; dispatch
/// is fire-and-forget and one action's fate never affects another's.
pub async fn await_dispatch(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewire_types::{FORCED_RUN_FIELD, Snapshot};
    use serde_json::json;

    fn rerun_action() -> ResolvedAction {
        let mut payload = Snapshot::new();
        payload.insert("sel1".into(), json!("x"));
        payload.insert(FORCED_RUN_FIELD.into(), json!("1"));
        ResolvedAction::Rerun {
            target: "chart1".into(),
            url: "/tasks/chart1".into(),
            payload,
        }
    }

    #[tokio::test]
    async fn rerun_posts_payload_with_marker() {
        let host = Arc::new(RecordingHost::new());
        let generic: Arc<dyn PageHost> = host.clone();

        await_dispatch(dispatch_all(vec![rerun_action()], &generic)).await;

        let events = host.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].starts_with("fetch /tasks/chart1"));
        assert!(events[0].contains(FORCED_RUN_FIELD));
    }

    #[tokio::test]
    async fn envelope_failure_is_reported_as_danger() {
        let host = Arc::new(RecordingHost::failing());
        let generic: Arc<dyn PageHost> = host.clone();

        await_dispatch(dispatch_all(vec![rerun_action()], &generic)).await;

        let events = host.events();
        assert_eq!(events.len(), 2);
        assert!(events[1].starts_with("notify[danger]"));
        assert!(events[1].contains("backend rejected the run"));
    }

    #[tokio::test]
    async fn clear_and_notify_clears_before_signalling() {
        let host = Arc::new(RecordingHost::new());
        let generic: Arc<dyn PageHost> = host.clone();

        let action = ResolvedAction::ClearAndNotify { target: "sel2".into() };
        await_dispatch(dispatch_all(vec![action], &generic)).await;

        assert_eq!(host.events(), vec!["clear sel2".to_string(), "changed sel2".to_string()]);
    }

    #[tokio::test]
    async fn unhandled_link_notifies_danger() {
        let host = Arc::new(RecordingHost::new());
        let generic: Arc<dyn PageHost> = host.clone();

        let action = ResolvedAction::UnhandledLink {
            description: "link 'w1' targets unsupported element type 'widget'".into(),
        };
        await_dispatch(dispatch_all(vec![action], &generic)).await;

        let events = host.events();
        assert!(events[0].starts_with("notify[danger]"));
        assert!(events[0].contains("widget"));
    }

    #[tokio::test]
    async fn failed_action_does_not_block_siblings() {
        let host = Arc::new(RecordingHost::failing());
        let generic: Arc<dyn PageHost> = host.clone();

        let actions = vec![
            rerun_action(),
            ResolvedAction::ClearAndNotify { target: "sel2".into() },
        ];
        await_dispatch(dispatch_all(actions, &generic)).await;

        let events = host.events();
        assert!(events.iter().any(|event| event == "clear sel2"));
        assert!(events.iter().any(|event| event == "changed sel2"));
        assert!(events.iter().any(|event| event.starts_with("notify[danger]")));
    }

    #[tokio::test]
    async fn presentation_actions_route_to_their_operations() {
        let host = Arc::new(RecordingHost::new());
        let generic: Arc<dyn PageHost> = host.clone();

        let actions = vec![
            ResolvedAction::ShowPopup {
                trigger: "btn1".into(),
                url: "/frag/a".into(),
                params: "k=1".into(),
            },
            ResolvedAction::ShowModal {
                url: "/frag/b".into(),
                params: String::new(),
            },
            ResolvedAction::ActivateTab {
                target: "btn1".into(),
                url: "/frag/c".into(),
                params: String::new(),
            },
            ResolvedAction::ReplaceContent {
                target: "panel2".into(),
                url: "/frag/d".into(),
                params: String::new(),
            },
        ];
        await_dispatch(dispatch_all(actions, &generic)).await;

        let events = host.events();
        assert!(events.contains(&"popup btn1 /frag/a k=1".to_string()));
        assert!(events.contains(&"modal /frag/b ".to_string()));
        assert!(events.contains(&"tab btn1 /frag/c ".to_string()));
        assert!(events.contains(&"render panel2 /frag/d ".to_string()));
    }
}
