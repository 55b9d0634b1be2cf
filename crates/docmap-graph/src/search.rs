//! Search matching.
//!
//! Case-insensitive substring match of a free-text query against the
//! searchable fields of a node:
//!
//! | kind           | fields                                   |
//! |----------------|------------------------------------------|
//! | `Document`     | title, path (falls back to id), description |
//! | `ExternalLink` | domain (falls back to id), urls          |
//!
//! An empty or whitespace-only query matches everything. A query with several
//! words matches when every word is found in some field.

use docmap_types::{GraphNode, NodeAttributes, NodeKind};

/// Normalised query: lower-cased, split on whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    terms: Vec<String>,
}

impl SearchQuery {
    pub fn new(query: &str) -> Self {
        Self {
            raw: query.to_string(),
            terms: query.split_whitespace().map(str::to_lowercase).collect(),
        }
    }

    /// Query as typed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// A non-empty query is in effect
    pub fn is_active(&self) -> bool {
        !self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Match decisions for one query.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    query: SearchQuery,
}

impl SearchIndex {
    pub fn new(query: &str) -> Self {
        Self {
            query: SearchQuery::new(query),
        }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = SearchQuery::new(query);
        tracing::debug!(query = %query, terms = self.query.terms.len(), "search query set");
    }

    pub fn is_active(&self) -> bool {
        self.query.is_active()
    }

    pub fn matches_node<P: NodeAttributes>(&self, node: &GraphNode<P>) -> bool {
        matches(&node.id, node.kind, &node.payload, &self.query)
    }

    pub fn matches_parts<P: NodeAttributes>(&self, id: &str, kind: NodeKind, payload: &P) -> bool {
        matches(id, kind, payload, &self.query)
    }
}

/// Does the node `(id, kind, payload)` match `query`?
pub fn matches<P: NodeAttributes>(id: &str, kind: NodeKind, payload: &P, query: &SearchQuery) -> bool {
    if !query.is_active() {
        return true;
    }

    let fields: Vec<String> = match kind {
        NodeKind::Document => [
            payload.title(),
            Some(payload.path().unwrap_or(id)),
            payload.description(),
        ]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect(),
        NodeKind::ExternalLink => std::iter::once(payload.domain().unwrap_or(id))
            .chain(payload.urls().iter().map(String::as_str))
            .map(str::to_lowercase)
            .collect(),
    };

    query
        .terms
        .iter()
        .all(|term| fields.iter().any(|field| field.contains(term.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmap_types::DocumentPayload;

    fn doc(id: &str, title: &str, description: &str) -> GraphNode<DocumentPayload> {
        GraphNode::document(
            id,
            DocumentPayload::document(title, id).with_description(description),
        )
    }

    fn external(domain: &str, urls: &[&str]) -> GraphNode<DocumentPayload> {
        GraphNode::external(domain, DocumentPayload::external(domain, urls.iter().copied()))
    }

    #[test]
    fn empty_query_matches_everything() {
        for query in ["", "   ", "\t\n"] {
            let index = SearchIndex::new(query);
            assert!(!index.is_active());
            assert!(index.matches_node(&doc("a.md", "Alpha", "")));
            assert!(index.matches_node(&external("x.org", &[])));
        }
    }

    #[test]
    fn document_fields_case_insensitive() {
        let node = doc("guides/setup.md", "Getting Started", "Install the CLI");
        assert!(SearchIndex::new("getting").matches_node(&node));
        assert!(SearchIndex::new("SETUP").matches_node(&node));
        assert!(SearchIndex::new("cli").matches_node(&node));
        assert!(!SearchIndex::new("deploy").matches_node(&node));
    }

    #[test]
    fn external_fields() {
        let node = external("github.com", &["https://github.com/rust-lang/rust"]);
        assert!(SearchIndex::new("GitHub").matches_node(&node));
        assert!(SearchIndex::new("rust-lang").matches_node(&node));
        assert!(!SearchIndex::new("gitlab").matches_node(&node));
    }

    #[test]
    fn kinds_only_search_their_own_fields() {
        // A document's description is not searched for an external node
        let mut payload = DocumentPayload::external("x.org", ["https://x.org"]);
        payload.description = Some("secret".into());
        let node = GraphNode::external("x.org", payload);
        assert!(!SearchIndex::new("secret").matches_node(&node));
    }

    #[test]
    fn every_term_must_match_some_field() {
        let node = doc("api.md", "API Reference", "endpoints and errors");
        assert!(SearchIndex::new("api errors").matches_node(&node));
        assert!(!SearchIndex::new("api billing").matches_node(&node));
    }

    #[test]
    fn bare_payload_falls_back_to_id() {
        let node = GraphNode::document("notes/todo.md", ());
        assert!(SearchIndex::new("todo").matches_node(&node));
        let link = GraphNode::external("docs.rs", ());
        assert!(SearchIndex::new("docs.rs").matches_node(&link));
    }
}
