//! Rebuilds a classification forest from flat scraped records.
//!
//! Edges come from two sources, tried in order for every record:
//!
//! 1. **Inferred**: the code's structural parent ([`infer_parent`]) when that
//!    code is among the records.
//! 2. **Fallback**: the parent id the page supplied, unless it is a top-level
//!    sentinel or the code is one that must stay a root ([`should_be_root`]).
//!
//! A record with neither becomes a root. Each record gets at most one parent
//! and edges are never reassigned; an edge that would close a cycle is
//! refused, so the result is always a forest.

use std::collections::{HashMap, HashSet};

use crate::models::{Node, RawRecord};
use crate::parsing::{infer_parent, should_be_root};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Inferred,
    Fallback,
}

/// A parent/child link chosen while building, kept so callers can audit
/// which attachments came from the code grammar and which from page ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub child: String,
    pub parent: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hierarchy {
    pub roots: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Hierarchy {
    pub fn edge_for(&self, child: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.child == child)
    }

    pub fn fallback_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Fallback)
    }
}

/// Builds the forest. Child and root order follow input order; the first
/// record for a code wins and later duplicates are dropped.
pub fn build(records: Vec<RawRecord>) -> Hierarchy {
    let records = dedupe(records);
    let n = records.len();

    let mut by_code: HashMap<&str, usize> = HashMap::with_capacity(n);
    let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(n);
    for (i, record) in records.iter().enumerate() {
        by_code.insert(record.code.as_str(), i);
        by_id.entry(record.external_id.as_str()).or_insert(i);
    }

    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut edges = Vec::new();

    for (i, record) in records.iter().enumerate() {
        let inferred = infer_parent(&record.code)
            .and_then(|code| by_code.get(code.as_str()).copied())
            .filter(|&p| p != i && !creates_cycle(&parent, i, p));

        let chosen = match inferred {
            Some(p) => Some((p, EdgeKind::Inferred)),
            None if !record.has_top_level_parent() && !should_be_root(&record.code) => by_id
                .get(record.external_parent_id.as_str())
                .copied()
                .filter(|&p| p != i && !creates_cycle(&parent, i, p))
                .map(|p| (p, EdgeKind::Fallback)),
            None => None,
        };

        let Some((p, kind)) = chosen else {
            continue;
        };
        if kind == EdgeKind::Fallback {
            log::debug!(
                "Attached {} under {} using the page's parent id",
                record.code,
                records[p].code
            );
        }
        parent[i] = Some(p);
        children[p].push(i);
        edges.push(Edge {
            child: record.code.clone(),
            parent: records[p].code.clone(),
            kind,
        });
    }

    let roots = (0..n)
        .filter(|&i| parent[i].is_none())
        .map(|i| materialize(i, &records, &children))
        .collect();

    Hierarchy { roots, edges }
}

fn dedupe(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.code.clone());
            if !fresh {
                log::warn!(
                    "Dropping duplicate record for code {} (id {})",
                    record.code,
                    record.external_id
                );
            }
            fresh
        })
        .collect()
}

/// True when making `candidate` the parent of `child` would loop back to
/// `child` through edges already placed.
fn creates_cycle(parent: &[Option<usize>], child: usize, candidate: usize) -> bool {
    let mut cur = Some(candidate);
    while let Some(i) = cur {
        if i == child {
            return true;
        }
        cur = parent[i];
    }
    false
}

fn materialize(i: usize, records: &[RawRecord], children: &[Vec<usize>]) -> Node {
    Node {
        code: records[i].code.clone(),
        title: records[i].title.clone(),
        children: children[i]
            .iter()
            .map(|&c| materialize(c, records, children))
            .collect(),
    }
}
