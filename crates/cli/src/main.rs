use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use pagewire_api::PageClient;
use pagewire_engine::{
    PageHost, RegistryIndex, StaticFieldReader, await_dispatch, parse_page_file, resolve_links,
    run_interaction,
};
use pagewire_types::{Envelope, Severity, Snapshot};
use pagewire_util::join_url_params;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "pagewire", about = "Inspect and simulate page link graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every element's resolved actions for an empty snapshot.
    Inspect {
        /// Page definition file (YAML or JSON).
        page: PathBuf,
    },
    /// Replay an interaction script against a logging host.
    ///
    /// Debounce is bypassed: each script step runs the pipeline immediately
    /// and waits for its dispatched actions to settle so output stays in
    /// step order.
    Simulate {
        /// Page definition file (YAML or JSON).
        page: PathBuf,
        /// JSON array of steps: {"registry", "element", "value"}.
        script: PathBuf,
        /// Execute task re-runs against this base URL instead of logging only.
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { page } => inspect(&page),
        Command::Simulate { page, script, base_url } => simulate(&page, &script, base_url).await,
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn inspect(page_path: &PathBuf) -> Result<()> {
    let bundle = parse_page_file(page_path)?;
    for (page_name, page) in &bundle.pages {
        println!("page {page_name}");
        let index = RegistryIndex::new();
        page.register_into(&index);
        for registry in index.registry_names() {
            println!("  container {registry}");
            for element in index.element_ids(&registry) {
                let actions = resolve_links(&index, &registry, &element, &Snapshot::new());
                if actions.is_empty() {
                    println!("    {element}: no declared effects");
                    continue;
                }
                println!("    {element}:");
                for action in actions {
                    println!("      {action:?}");
                }
            }
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ScriptStep {
    registry: String,
    element: String,
    value: Value,
}

async fn simulate(page_path: &PathBuf, script_path: &PathBuf, base_url: Option<String>) -> Result<()> {
    let bundle = parse_page_file(page_path)?;
    let script_content = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read script: {}", script_path.display()))?;
    let steps: Vec<ScriptStep> =
        serde_json::from_str(&script_content).context("script must be a JSON array of steps")?;

    let index = RegistryIndex::new();
    for page in bundle.pages.values() {
        page.register_into(&index);
    }

    let client = match base_url {
        Some(base_url) => Some(PageClient::new(base_url)?),
        None => None,
    };
    let host: Arc<dyn PageHost> = Arc::new(LoggingHost { client });
    let reader = StaticFieldReader::new();

    for (step_number, step) in steps.iter().enumerate() {
        if index.lookup(&step.registry, &step.element).is_none() {
            return Err(anyhow!(
                "step {}: element '{}' is not registered in '{}'",
                step_number + 1,
                step.element,
                step.registry
            ));
        }
        info!(step = step_number + 1, element = %step.element, value = %step.value, "interaction");
        reader.set(&step.element, step.value.clone(), Some(&step.registry));

        let mut overrides = Snapshot::new();
        overrides.insert(step.element.clone(), step.value.clone());

        let handles = run_interaction(&index, &reader, &host, &step.registry, &step.element, Some(&overrides));
        await_dispatch(handles).await;
    }
    Ok(())
}

/// Host that logs every operation; task re-runs go over HTTP when a base
/// URL was supplied, and succeed vacuously otherwise.
struct LoggingHost {
    client: Option<PageClient>,
}

#[async_trait]
impl PageHost for LoggingHost {
    async fn fetch_json(&self, url: &str, params: &str, payload: &Value) -> Result<Envelope> {
        match &self.client {
            Some(client) => client.fetch_json(url, params, payload).await,
            None => {
                debug!(url, "no base url configured; task re-run assumed ok");
                println!("fetch  {} payload={payload}", join_url_params(url, params));
                Ok(Envelope {
                    data: "ok".into(),
                    results: None,
                    error: None,
                })
            }
        }
    }

    async fn render_into(&self, element: &str, url: &str, params: &str) -> Result<()> {
        println!("render {element} <- {}", join_url_params(url, params));
        Ok(())
    }

    async fn clear_field(&self, element: &str) -> Result<()> {
        println!("clear  {element}");
        Ok(())
    }

    async fn emit_changed(&self, element: &str) -> Result<()> {
        println!("signal {element}");
        Ok(())
    }

    async fn show_popup(&self, trigger: &str, url: &str, params: &str) -> Result<()> {
        println!("popup  near {trigger} <- {}", join_url_params(url, params));
        Ok(())
    }

    async fn open_modal(&self, url: &str, params: &str) -> Result<()> {
        println!("modal  <- {}", join_url_params(url, params));
        Ok(())
    }

    async fn activate_tab(&self, target: &str, url: &str, params: &str) -> Result<()> {
        println!("tab    {target} <- {}", join_url_params(url, params));
        Ok(())
    }

    fn notify(&self, message: &str, severity: Severity) {
        println!("notify [{severity}] {message}");
    }
}
