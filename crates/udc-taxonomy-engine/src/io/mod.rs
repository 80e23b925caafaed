use crate::models::Node;
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed node file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Failed to serialize nodes: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("Invalid data directory: {0}")]
    InvalidDataDir(String),
}

/// Read a file relative to the data directory
pub fn read_file(relative_path: &RelativePath, data_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(data_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write a file relative to the data directory, replacing any previous content
pub fn write_file(
    relative_path: &RelativePath,
    data_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(data_root);
    write_path(&absolute_path, content)
}

fn write_path(path: &Path, content: &str) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(path, content).map_err(IoError::Io)
}

/// Parse a node list in the shared canonical/addendum schema.
///
/// An empty document is an empty list rather than an error.
pub fn parse_nodes(content: &str, path: &Path) -> Result<Vec<Node>, IoError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(content).map_err(|source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn render_nodes(nodes: &[Node]) -> Result<String, IoError> {
    serde_yaml::to_string(nodes).map_err(IoError::Serialize)
}

/// Load a node file from an absolute or working-directory-relative path
pub fn load_nodes(path: &Path) -> Result<Vec<Node>, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_nodes(&content, path)
}

/// Save a node list, overwriting the whole file
pub fn save_nodes(path: &Path, nodes: &[Node]) -> Result<(), IoError> {
    let content = render_nodes(nodes)?;
    write_path(path, &content)
}

/// File names (not paths) directly inside `dir` accepted by `filter`, sorted
pub fn scan_file_names(dir: &Path, filter: impl Fn(&str) -> bool) -> Result<Vec<String>, IoError> {
    if !dir.exists() {
        return Err(IoError::InvalidDataDir("data directory not found".to_string()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(IoError::Io)? {
        let entry = entry.map_err(IoError::Io)?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str()
            && filter(name)
        {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}

/// Checks that `path` is an existing directory before anything reads from it
pub fn validate_data_dir(path: &Path) -> Result<(), IoError> {
    if !path.is_dir() {
        return Err(IoError::InvalidDataDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
