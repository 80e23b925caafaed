//! In-memory classification index.
//!
//! Nodes live in an arena (`Vec<Slot>`); parent and child links are indices
//! into it, so the tree can be walked in both directions without shared
//! ownership. The flat index maps every code to its slot.

use std::collections::HashMap;
use std::path::Path;

use crate::extensions::{ExtensionError, ExtensionStore};
use crate::io::{self, IoError};
use crate::models::Node;
use crate::parsing::{CompositeError, tokenize};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid code part: {0}")]
    UnknownCode(String),
    #[error("duplicate code in classification data: {0}")]
    DuplicateCode(String),
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error(transparent)]
    Load(#[from] IoError),
    #[error(transparent)]
    Extension(#[from] ExtensionError),
}

#[derive(Debug, Clone)]
struct Slot {
    code: String,
    title: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Codec {
    slots: Vec<Slot>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

/// Borrowed view of one indexed node.
#[derive(Clone, Copy)]
pub struct Entry<'a> {
    codec: &'a Codec,
    slot: usize,
}

impl<'a> Entry<'a> {
    pub fn code(&self) -> &'a str {
        &self.codec.slots[self.slot].code
    }

    pub fn title(&self) -> &'a str {
        &self.codec.slots[self.slot].title
    }

    pub fn parent(&self) -> Option<Entry<'a>> {
        self.codec.slots[self.slot]
            .parent
            .map(|slot| self.codec.entry(slot))
    }

    pub fn children(&self) -> Vec<Entry<'a>> {
        self.codec.entries(&self.codec.slots[self.slot].children)
    }

    pub fn has_children(&self) -> bool {
        !self.codec.slots[self.slot].children.is_empty()
    }

    /// Owned copy of this node and its whole subtree
    pub fn to_node(&self) -> Node {
        Node {
            code: self.code().to_string(),
            title: self.title().to_string(),
            children: self.children().iter().map(Entry::to_node).collect(),
        }
    }
}

impl std::fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("code", &self.code())
            .field("title", &self.title())
            .finish()
    }
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.codec, other.codec) && self.slot == other.slot
    }
}

impl Codec {
    /// Indexes an already-merged forest. Every code must be unique.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, CodecError> {
        let mut codec = Self::default();
        for node in nodes {
            let slot = codec.insert(node, None)?;
            codec.roots.push(slot);
        }
        Ok(codec)
    }

    /// Loads the canonical file, merges every addendum in `extensions`, and
    /// indexes the result.
    pub fn load(canonical_path: &Path, extensions: &ExtensionStore) -> Result<Self, CodecError> {
        let canonical = io::load_nodes(canonical_path)?;
        let merged = extensions.load_merged(canonical)?;
        let codec = Self::from_nodes(merged)?;
        log::info!(
            "Loaded {} classification codes from {}",
            codec.len(),
            canonical_path.display()
        );
        Ok(codec)
    }

    fn insert(&mut self, node: Node, parent: Option<usize>) -> Result<usize, CodecError> {
        if self.index.contains_key(&node.code) {
            return Err(CodecError::DuplicateCode(node.code));
        }

        let slot = self.slots.len();
        self.index.insert(node.code.clone(), slot);
        self.slots.push(Slot {
            code: node.code,
            title: node.title,
            parent,
            children: Vec::with_capacity(node.children.len()),
        });

        for child in node.children {
            let child_slot = self.insert(child, Some(slot))?;
            self.slots[slot].children.push(child_slot);
        }
        Ok(slot)
    }

    fn entry(&self, slot: usize) -> Entry<'_> {
        Entry { codec: self, slot }
    }

    fn entries(&self, slots: &[usize]) -> Vec<Entry<'_>> {
        slots.iter().map(|&slot| self.entry(slot)).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn roots(&self) -> Vec<Entry<'_>> {
        self.entries(&self.roots)
    }

    pub fn get(&self, code: &str) -> Option<Entry<'_>> {
        self.index.get(code).map(|&slot| self.entry(slot))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Title for an exact code.
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.get(code).map(|entry| entry.title())
    }

    /// Direct children of `code`, in file order.
    pub fn children(&self, code: &str) -> Option<Vec<Entry<'_>>> {
        self.get(code).map(|entry| entry.children())
    }

    /// Path from the root down to `code`, inclusive at both ends.
    pub fn ancestry(&self, code: &str) -> Option<Vec<Entry<'_>>> {
        let mut cur = self.get(code);
        let mut path = Vec::new();
        while let Some(entry) = cur {
            path.push(entry);
            cur = entry.parent();
        }
        if path.is_empty() {
            return None;
        }
        path.reverse();
        Some(path)
    }

    /// Case-insensitive substring match over titles.
    ///
    /// Results come back in depth-first order of the loaded forest. That order
    /// is stable for a given input but carries no ranking.
    pub fn search(&self, term: &str) -> Vec<Entry<'_>> {
        let needle = term.to_lowercase();
        (0..self.slots.len())
            .filter(|&slot| self.slots[slot].title.to_lowercase().contains(&needle))
            .map(|slot| self.entry(slot))
            .collect()
    }

    /// Resolves every part of a composite expression, failing on the first
    /// part that is not indexed.
    pub fn parse_composite(&self, expr: &str) -> Result<Vec<Entry<'_>>, CodecError> {
        tokenize(expr)?
            .into_iter()
            .map(|token| self.get(&token).ok_or(CodecError::UnknownCode(token)))
            .collect()
    }

    pub fn validate(&self, expr: &str) -> Result<(), CodecError> {
        self.parse_composite(expr).map(|_| ())
    }

    /// Owned copy of the whole forest, suitable for [`io::save_nodes`].
    pub fn to_nodes(&self) -> Vec<Node> {
        self.roots().iter().map(Entry::to_node).collect()
    }
}
