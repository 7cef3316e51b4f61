//! Page definition documents.
//!
//! A page definition declares the containers a page renders, the interactive
//! elements inside each container, and each element's outbound links. It is
//! the declarative source the runtime registers into the link graph store;
//! the engine never watches rendered markup itself.

use anyhow::{Result, bail};
use indexmap::IndexMap;
use pagewire_types::{ElementKind, Link, LinkGraphEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::binder::ControlKind;
use crate::store::RegistryIndex;

/// A bundle of independently named pages.
#[derive(Debug, Clone, Default)]
pub struct PageBundle {
    pub pages: IndexMap<String, PageSpec>,
}

/// One page: an ordered set of rendered containers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSpec {
    /// Page name; bundles key pages by name instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Containers in render order. Each owns one link-graph registry.
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

/// An independently rendered container (grid, panel) with its own registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Registry name for this container's elements.
    pub name: String,
    /// Elements in declaration order.
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

/// One interactive element and its declared link graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Element identifier, unique within the container.
    pub id: String,
    /// Type tag consulted by bare links targeting this element.
    #[serde(default)]
    pub kind: ElementKind,
    /// Deferred-rendering fields reload instead of clearing.
    #[serde(default)]
    pub delayed: bool,
    /// URL the element currently shows.
    #[serde(default)]
    pub url: String,
    /// Stored task parameters (JSON object literal).
    #[serde(default)]
    pub params: String,
    /// Outbound links in declaration order.
    #[serde(default)]
    pub links: Vec<Link>,
    /// Control flavor, for binding. Absent for non-input elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlKind>,
}

impl ElementSpec {
    /// The link-graph entry this element registers when it renders.
    pub fn to_entry(&self) -> LinkGraphEntry {
        LinkGraphEntry {
            kind: self.kind.clone(),
            delayed: self.delayed,
            url: self.url.clone(),
            params: self.params.clone(),
            links: self.links.clone(),
        }
    }
}

impl PageSpec {
    /// Check structural constraints: non-empty container names and element
    /// ids, and no duplicate element id within a container.
    pub fn validate(&self) -> Result<()> {
        for container in &self.containers {
            if container.name.trim().is_empty() {
                bail!("container with an empty name");
            }
            let mut seen: HashSet<&str> = HashSet::new();
            for element in &container.elements {
                if element.id.trim().is_empty() {
                    bail!("element with an empty id in container '{}'", container.name);
                }
                if !seen.insert(element.id.as_str()) {
                    bail!(
                        "duplicate element id '{}' in container '{}'",
                        element.id,
                        container.name
                    );
                }
            }
        }
        Ok(())
    }

    /// Register every element's entry into `index`, one registry per
    /// container. Returns the number of entries registered.
    pub fn register_into(&self, index: &RegistryIndex) -> usize {
        let mut registered = 0;
        for container in &self.containers {
            for element in &container.elements {
                index.register(&container.name, &element.id, element.to_entry());
                registered += 1;
            }
        }
        registered
    }
}
