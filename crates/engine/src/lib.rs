//! # Pagewire Engine
//!
//! The pagewire engine keeps a page of independently rendered interactive
//! elements consistent: when one element's value changes, every element
//! declared as linked to it is refreshed, re-run, or repositioned without
//! the page author writing manual wiring for each pair.
//!
//! ## Key pieces
//!
//! - **`store`**: named link-graph registries, one per rendered container
//! - **`snapshot`**: point-in-time field value collection and override merge
//! - **`resolve`**: pure classification of declared links into actions
//! - **`dispatch`**: fire-and-forget execution through the [`PageHost`] seam
//! - **`binder`**: debounced signal handling driving the whole pipeline
//! - **`model`**: declarative page definitions that populate the store
//!
//! ## Usage
//!
//! ```rust
//! use pagewire_engine::parse_page_file;
//!
//! let temp_dir = tempfile::tempdir()?;
//! let page_path = temp_dir.path().join("page.yaml");
//! std::fs::write(&page_path, r#"
//! page: "orders"
//! containers:
//!   - name: "grid_main"
//!     elements:
//!       - id: "sel1"
//!         kind: "field"
//!         links: ["sel2"]
//!       - id: "sel2"
//!         kind: "field"
//! "#)?;
//!
//! let bundle = parse_page_file(&page_path)?;
//! for (name, page) in &bundle.pages {
//!     println!("page {name}: {} containers", page.containers.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

pub mod binder;
pub mod dispatch;
pub mod model;
pub mod resolve;
pub mod snapshot;
pub mod store;

// Re-export commonly used items for convenience
pub use binder::{ControlKind, PageRuntime, SignalKind, run_interaction};
pub use dispatch::{NoopHost, PageHost, RecordingHost, await_dispatch, dispatch_all};
pub use model::{ContainerSpec, ElementSpec, PageBundle, PageSpec};
pub use resolve::resolve_links;
pub use snapshot::{FieldReader, StaticFieldReader, collect_field_values};
pub use store::RegistryIndex;

/// Load a page definition file with automatic format detection.
///
/// Both YAML and JSON bodies are accepted (YAML is a superset here). A
/// multi-page document with pages under a `pages` key is tried first so
/// bundles are never silently accepted as single pages with ignored fields;
/// a plain single-page document falls back to the name in its `page` field,
/// or `"default"`.
///
/// # Errors
///
/// Fails when the file cannot be read, when neither document form parses,
/// or when a parsed page violates structural constraints (duplicate element
/// ids, empty names).
pub fn parse_page_file(file_path: impl AsRef<Path>) -> Result<PageBundle> {
    let file_path = file_path.as_ref();
    let file_content = fs::read(file_path)
        .with_context(|| format!("Failed to read page definition: {}", file_path.display()))?;
    let content_string = String::from_utf8_lossy(&file_content);

    #[derive(Deserialize)]
    struct MultiPageDocument {
        pages: IndexMap<String, PageSpec>,
    }

    if let Ok(multi_page_document) = serde_yaml::from_str::<MultiPageDocument>(&content_string) {
        let bundle = PageBundle {
            pages: multi_page_document.pages,
        };
        for (name, page) in &bundle.pages {
            page.validate().with_context(|| format!("invalid page '{name}'"))?;
        }
        return Ok(bundle);
    }

    if let Ok(page_specification) = serde_yaml::from_str::<PageSpec>(&content_string) {
        page_specification.validate()?;
        let page_name = page_specification.page.clone().unwrap_or_else(|| "default".to_string());
        let mut pages = IndexMap::new();
        pages.insert(page_name, page_specification);
        return Ok(PageBundle { pages });
    }

    anyhow::bail!(
        "Unsupported page document format. Expected one of:\n\
         - Single page definition with 'page' and 'containers' fields\n\
         - Multi-page document with pages under a 'pages' key\n\
         "
    );
}
