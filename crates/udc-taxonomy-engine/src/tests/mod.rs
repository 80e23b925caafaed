use crate::models::Node;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary data directory
pub fn create_test_data_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a file with content inside the data directory
pub fn create_test_file(data_dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = data_dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

/// A small slice of the main table plus one auxiliary
pub fn sample_nodes() -> Vec<Node> {
    vec![
        Node::new("0", "Science and Knowledge").with_children(vec![
            Node::new("00", "Prolegomena").with_children(vec![
                Node::new("000", "General"),
                Node::new("001", "Science and knowledge in general")
                    .with_children(vec![Node::new("001.1", "Concepts of science")]),
            ]),
        ]),
        Node::new("=1", "Indo-European languages")
            .with_children(vec![Node::new("=11", "Germanic languages")]),
    ]
}
