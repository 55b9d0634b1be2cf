//! Node payloads.
//!
//! The engine treats payloads as opaque. The only thing it ever asks of them
//! is the text that search runs against, exposed through [`NodeAttributes`].

use serde::{Deserialize, Serialize};

/// Read-only view of the searchable fields of a payload.
///
/// Every method has a default so payloads only implement what they carry.
pub trait NodeAttributes {
    fn title(&self) -> Option<&str> {
        None
    }

    fn path(&self) -> Option<&str> {
        None
    }

    fn description(&self) -> Option<&str> {
        None
    }

    /// Link domain (external-link nodes)
    fn domain(&self) -> Option<&str> {
        None
    }

    /// URLs aggregated into an external-link node
    fn urls(&self) -> &[String] {
        &[]
    }
}

impl NodeAttributes for () {}

/// Display attributes a markdown scanner attaches to a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub outgoing_links: usize,
    #[serde(default)]
    pub incoming_links: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub broken_links: Vec<String>,
    /// Injected by the renderer; never persisted with positions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl DocumentPayload {
    /// Payload for a document node.
    pub fn document(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Payload for an aggregated external-link node.
    pub fn external<I, S>(domain: impl Into<String>, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain: Some(domain.into()),
            urls: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn has_broken_links(&self) -> bool {
        !self.broken_links.is_empty()
    }
}

impl NodeAttributes for DocumentPayload {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    fn urls(&self) -> &[String] {
        &self.urls
    }
}
