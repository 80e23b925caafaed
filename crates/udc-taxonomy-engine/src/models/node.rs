use serde::{Deserialize, Serialize};

/// A classification entry as stored in canonical and addendum files.
///
/// A missing `children` key deserializes to an empty list, and an empty list is
/// omitted on save, so leaves round-trip without a `children: []` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub code: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }

    /// Builder-style helper for constructing small trees in code and tests
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Visit this node and every descendant in depth-first pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Codes of this node and all descendants, pre-order
    pub fn codes(&self) -> Vec<&str> {
        let mut codes = Vec::new();
        self.walk(&mut |n| codes.push(n.code.as_str()));
        codes
    }
}

/// One `d.add(..)` entry scraped from a classification page.
///
/// Lives between scraping and [`crate::hierarchy::build`], and in the crawl
/// journal while a crawl is unfinished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub external_id: String,
    pub external_parent_id: String,
    pub code: String,
    pub title: String,
}

impl RawRecord {
    pub fn new(
        external_id: impl Into<String>,
        external_parent_id: impl Into<String>,
        code: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            external_parent_id: external_parent_id.into(),
            code: code.into(),
            title: title.into(),
        }
    }

    /// Parent ids the source uses for "no parent"
    pub fn has_top_level_parent(&self) -> bool {
        matches!(self.external_parent_id.as_str(), "" | "0" | "-1")
    }
}
