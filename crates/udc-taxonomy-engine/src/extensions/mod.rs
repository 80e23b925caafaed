//! Locally authored addendum files layered over the canonical classification.
//!
//! Addenda live beside the canonical file in the data directory, named
//! `udc_addendum_<name>.yaml`, and use the canonical node schema. Across the
//! canonical data and every addendum each code must appear exactly once; a
//! single collision rejects the whole load or update.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use relative_path::RelativePathBuf;

use crate::io::{self, IoError};
use crate::models::Node;

pub const ADDENDUM_PREFIX: &str = "udc_addendum_";
pub const ADDENDUM_SUFFIX: &str = ".yaml";
pub const DEFAULT_ADDENDUM: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("code {code} from {file} overlaps an existing classification")]
    Overlap { code: String, file: String },
    #[error("addendum file not found: {0}")]
    NotFound(String),
    #[error("invalid addendum name: {0}")]
    InvalidName(String),
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Applies the addendum naming convention to a caller-supplied name.
///
/// `"tools"` → `"udc_addendum_tools.yaml"`; an already-normalized name is
/// returned unchanged and an empty name means [`DEFAULT_ADDENDUM`].
pub fn normalize_name(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_ADDENDUM } else { name };

    let mut file_name = String::with_capacity(
        ADDENDUM_PREFIX.len() + name.len() + ADDENDUM_SUFFIX.len(),
    );
    if !name.starts_with(ADDENDUM_PREFIX) {
        file_name.push_str(ADDENDUM_PREFIX);
    }
    file_name.push_str(name);
    if !name.ends_with(ADDENDUM_SUFFIX) {
        file_name.push_str(ADDENDUM_SUFFIX);
    }
    file_name
}

pub fn is_addendum_file(file_name: &str) -> bool {
    file_name.starts_with(ADDENDUM_PREFIX) && file_name.ends_with(ADDENDUM_SUFFIX)
}

#[derive(Debug, Clone)]
pub struct ExtensionStore {
    data_dir: PathBuf,
    canonical_path: PathBuf,
}

impl ExtensionStore {
    /// `canonical_file` is resolved against `data_dir` when relative.
    pub fn new(data_dir: impl Into<PathBuf>, canonical_file: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.into();
        let canonical_path = data_dir.join(canonical_file);
        Self {
            data_dir,
            canonical_path,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn canonical_path(&self) -> &Path {
        &self.canonical_path
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.data_dir.join(normalize_name(name))
    }

    /// Addendum file names in the data directory, sorted. A data directory
    /// that does not exist yet simply has none.
    pub fn list(&self) -> Result<Vec<String>, ExtensionError> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }
        Ok(io::scan_file_names(&self.data_dir, is_addendum_file)?)
    }

    /// Reads every addendum and checks it against `canonical` and the
    /// addenda before it. Returns the addendum nodes to append as extra
    /// top-level entries, or the first overlap found.
    pub fn load_addenda(&self, canonical: &[Node]) -> Result<Vec<Node>, ExtensionError> {
        let mut seen = collect_codes(canonical);
        let mut addenda = Vec::new();

        for file in self.list()? {
            let nodes = self.read(&file)?;
            for node in &nodes {
                claim(node, &mut seen, &file)?;
            }
            log::debug!("Merging {} top-level entries from {file}", nodes.len());
            addenda.extend(nodes);
        }

        Ok(addenda)
    }

    /// `canonical` followed by every addendum entry.
    pub fn load_merged(&self, canonical: Vec<Node>) -> Result<Vec<Node>, ExtensionError> {
        let addenda = self.load_addenda(&canonical)?;
        let mut merged = canonical;
        merged.extend(addenda);
        Ok(merged)
    }

    /// Appends `nodes` to the named addendum, creating it if needed.
    ///
    /// The new codes (and their descendants) are checked against the
    /// canonical file, every addendum including the target, and each other.
    /// The target file is rewritten whole. Returns the normalized file name.
    pub fn add(&self, name: &str, nodes: &[Node]) -> Result<String, ExtensionError> {
        let file = self.checked_name(name)?;

        let canonical = io::load_nodes(&self.canonical_path)?;
        let mut seen = collect_codes(&canonical);
        for existing in self.list()? {
            for node in self.read(&existing)? {
                claim(&node, &mut seen, &existing)?;
            }
        }
        for node in nodes {
            claim(node, &mut seen, &file)?;
        }

        let mut updated = if self.path_of(&file).exists() {
            self.read(&file)?
        } else {
            Vec::new()
        };
        updated.extend_from_slice(nodes);

        let content = io::render_nodes(&updated)?;
        io::write_file(&RelativePathBuf::from(file.as_str()), &self.data_dir, &content)?;
        log::info!("Wrote {} entries to {file}", updated.len());
        Ok(file)
    }

    /// Removes the named addendum. Returns the normalized file name.
    pub fn delete(&self, name: &str) -> Result<String, ExtensionError> {
        let file = self.checked_name(name)?;
        let path = self.path_of(&file);
        if !path.exists() {
            return Err(ExtensionError::NotFound(file));
        }
        fs::remove_file(&path).map_err(IoError::Io)?;
        log::info!("Deleted {file}");
        Ok(file)
    }

    fn checked_name(&self, name: &str) -> Result<String, ExtensionError> {
        if name.contains(['/', '\\']) {
            return Err(ExtensionError::InvalidName(name.to_string()));
        }
        Ok(normalize_name(name))
    }

    fn read(&self, file: &str) -> Result<Vec<Node>, ExtensionError> {
        let relative_path = RelativePathBuf::from(file);
        let content = io::read_file(&relative_path, &self.data_dir)?;
        Ok(io::parse_nodes(&content, &self.data_dir.join(file))?)
    }
}

fn collect_codes(nodes: &[Node]) -> HashSet<String> {
    let mut codes = HashSet::new();
    for node in nodes {
        node.walk(&mut |n| {
            codes.insert(n.code.clone());
        });
    }
    codes
}

/// Registers `node` and its descendants, failing on the first code that is
/// already taken.
fn claim(node: &Node, seen: &mut HashSet<String>, file: &str) -> Result<(), ExtensionError> {
    for code in node.codes() {
        if !seen.insert(code.to_string()) {
            return Err(ExtensionError::Overlap {
                code: code.to_string(),
                file: file.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_data_dir, create_test_file, sample_nodes};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn store_with_canonical() -> (TempDir, ExtensionStore) {
        let data_dir = create_test_data_dir();
        let store = ExtensionStore::new(data_dir.path(), "udc_full.yaml");
        io::save_nodes(store.canonical_path(), &sample_nodes()).unwrap();
        (data_dir, store)
    }

    #[rstest]
    #[case("tools", "udc_addendum_tools.yaml")]
    #[case("udc_addendum_tools", "udc_addendum_tools.yaml")]
    #[case("tools.yaml", "udc_addendum_tools.yaml")]
    #[case("udc_addendum_tools.yaml", "udc_addendum_tools.yaml")]
    #[case("", "udc_addendum_default.yaml")]
    fn test_normalize_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(normalize_name(name), expected);
    }

    #[test]
    fn test_list_only_matches_convention() {
        let (data_dir, store) = store_with_canonical();
        create_test_file(&data_dir, "udc_addendum_b.yaml", "");
        create_test_file(&data_dir, "udc_addendum_a.yaml", "");
        create_test_file(&data_dir, "notes.yaml", "");
        create_test_file(&data_dir, "udc_addendum_c.json", "");

        assert_eq!(
            store.list().unwrap(),
            vec!["udc_addendum_a.yaml", "udc_addendum_b.yaml"]
        );
    }

    #[test]
    fn test_list_without_data_dir() {
        let store = ExtensionStore::new("/this/path/does/not/exist", "udc_full.yaml");
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_disjoint_addendum_merges() {
        let (data_dir, store) = store_with_canonical();
        create_test_file(
            &data_dir,
            "udc_addendum_local.yaml",
            "- code: '9'\n  title: Local history\n  children:\n    - code: '90'\n      title: Archaeology\n",
        );

        let merged = store.load_merged(sample_nodes()).unwrap();

        assert_eq!(merged.len(), sample_nodes().len() + 1);
        assert_eq!(merged.last().unwrap().codes(), vec!["9", "90"]);
    }

    #[test]
    fn test_overlap_with_canonical_fails() {
        let (data_dir, store) = store_with_canonical();
        create_test_file(
            &data_dir,
            "udc_addendum_bad.yaml",
            "- code: '0'\n  title: Clash\n",
        );

        let err = store.load_merged(sample_nodes()).unwrap_err();

        assert!(matches!(
            &err,
            ExtensionError::Overlap { code, file } if code == "0" && file == "udc_addendum_bad.yaml"
        ));
    }

    #[test]
    fn test_overlap_between_addenda_fails() {
        let (data_dir, store) = store_with_canonical();
        create_test_file(&data_dir, "udc_addendum_a.yaml", "- code: '9'\n  title: A\n");
        create_test_file(
            &data_dir,
            "udc_addendum_b.yaml",
            "- code: '8'\n  title: B\n  children:\n    - code: '9'\n      title: Nested clash\n",
        );

        let err = store.load_addenda(&sample_nodes()).unwrap_err();

        assert!(matches!(err, ExtensionError::Overlap { code, .. } if code == "9"));
    }

    #[test]
    fn test_add_creates_then_appends() {
        let (_data_dir, store) = store_with_canonical();

        let file = store.add("tools", &[Node::new("9", "Tools")]).unwrap();
        assert_eq!(file, "udc_addendum_tools.yaml");

        store.add("tools", &[Node::new("8", "More tools")]).unwrap();

        let saved = io::load_nodes(&store.path_of("tools")).unwrap();
        assert_eq!(
            saved,
            vec![Node::new("9", "Tools"), Node::new("8", "More tools")]
        );
    }

    #[test]
    fn test_add_rejects_overlap_and_leaves_file_alone() {
        let (_data_dir, store) = store_with_canonical();
        store.add("tools", &[Node::new("9", "Tools")]).unwrap();
        let before = std::fs::read_to_string(store.path_of("tools")).unwrap();

        let canonical_clash = store.add("tools", &[Node::new("001.1", "Clash")]);
        let addendum_clash = store.add("other", &[Node::new("9", "Clash")]);
        let batch_clash = store.add("other", &[Node::new("7", "A"), Node::new("7", "B")]);

        assert!(matches!(canonical_clash, Err(ExtensionError::Overlap { .. })));
        assert!(matches!(addendum_clash, Err(ExtensionError::Overlap { .. })));
        assert!(matches!(batch_clash, Err(ExtensionError::Overlap { .. })));
        assert_eq!(std::fs::read_to_string(store.path_of("tools")).unwrap(), before);
        assert!(!store.path_of("other").exists());
    }

    #[test]
    fn test_add_requires_canonical_file() {
        let data_dir = create_test_data_dir();
        let store = ExtensionStore::new(data_dir.path(), "udc_full.yaml");

        let result = store.add("tools", &[Node::new("9", "Tools")]);

        assert!(matches!(result, Err(ExtensionError::Io(IoError::NotFound(_)))));
    }

    #[test]
    fn test_delete() {
        let (_data_dir, store) = store_with_canonical();
        store.add("tools", &[Node::new("9", "Tools")]).unwrap();

        assert_eq!(store.delete("tools").unwrap(), "udc_addendum_tools.yaml");
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.delete("tools"),
            Err(ExtensionError::NotFound(_))
        ));
    }

    #[test]
    fn test_names_with_paths_are_rejected() {
        let (_data_dir, store) = store_with_canonical();

        assert!(matches!(
            store.delete("../udc_full"),
            Err(ExtensionError::InvalidName(_))
        ));
        assert!(matches!(
            store.add("nested/tools", &[Node::new("9", "Tools")]),
            Err(ExtensionError::InvalidName(_))
        ));
    }
}
