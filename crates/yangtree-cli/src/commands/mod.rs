//! Command implementations

pub mod check;
pub mod config;
pub mod tree;

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;
use yangtree_core::config::CONFIG_FILE_NAMES;
use yangtree_core::{ConfigLoader, EngineConfiguration, SchemaDocument};

use crate::FeatureArgs;

const DOCUMENT_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Load the configuration and apply command-line overrides
pub fn resolve_config(
    custom: Option<&Path>,
    features: &FeatureArgs,
) -> Result<EngineConfiguration> {
    let mut config = ConfigLoader::load(custom, None)?;
    if let Some(supported) = &features.supported_features {
        config.supported_features = Some(supported.clone());
    }
    if features.prune {
        config.remove_nodes_not_satisfying_if_feature = Some(true);
    }
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Expand files and directories into the sorted list of documents to build
///
/// Directories are searched recursively; configuration files are skipped.
pub fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut files)?;
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("Path not found: {}", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if is_document(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_document(path: &Path) -> bool {
    let is_config = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name));
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext));
    has_extension && !is_config
}

/// Read every document, in parallel, keeping input order
pub fn load_documents(files: &[PathBuf]) -> Result<Vec<SchemaDocument>> {
    let documents = files
        .par_iter()
        .map(|path| SchemaDocument::load(path))
        .collect::<yangtree_core::Result<Vec<_>>>()?;
    debug!("Loaded {} documents", documents.len());
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_documents_skips_config_and_other_files() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(temp.path().join("b.yaml"), "").unwrap();
        fs::write(nested.join("a.json"), "").unwrap();
        fs::write(temp.path().join("yangtree.yaml"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let files = collect_documents(&[temp.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.yaml", "a.json"]);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = collect_documents(&[temp.path().join("missing.yaml")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_feature_overrides() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(".yangtreerc.json");
        fs::write(&config_path, r#"{ "parallel": false }"#).unwrap();

        let features = FeatureArgs {
            supported_features: Some(vec!["m:F1".to_string()]),
            prune: true,
        };
        let config = resolve_config(Some(&config_path), &features).unwrap();
        assert_eq!(config.supported_features(), Some(&["m:F1".to_string()][..]));
        assert!(config.remove_nodes_not_satisfying_if_feature());
        assert!(!config.parallel());
    }
}
