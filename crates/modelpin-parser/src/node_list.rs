//! `;`-separated node name lists.
//!
//! Used by `input_fp16_nodes` and by the contents of the compress-weight
//! configuration file.

use std::path::Path;

use log::{info, warn};

use crate::{error::Result, key::DirectiveKey, op_name_map::read_directive_file};

/// Splits a `;`-separated node list.
///
/// Names are taken verbatim, so empty entries are preserved; they never
/// match a graph node.
pub fn parse_node_list(spec: &str) -> Vec<String> {
    if spec.is_empty() {
        return Vec::new();
    }
    spec.split(';').map(str::to_string).collect()
}

/// Reads the compress-weight configuration file.
///
/// Only the first whitespace-delimited token of the file is used; it is a
/// `;`-separated node list.
///
/// # Errors
///
/// Fails with `IoFailure` when the file cannot be read.
pub fn load_compress_weight_conf(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = read_directive_file(DirectiveKey::CompressWeightConf, path)?;

    let Some(first) = text.split_whitespace().next() else {
        warn!(path = path.display().to_string(); "Compress weight configuration is empty");
        return Ok(Vec::new());
    };

    let nodes = parse_node_list(first);
    info!(path = path.display().to_string(), nodes = nodes.len(); "Loaded compress weight configuration");
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_node_list() {
        assert_eq!(parse_node_list("a;b;c"), vec!["a", "b", "c"]);
        assert_eq!(parse_node_list("a"), vec!["a"]);
        assert!(parse_node_list("").is_empty());
    }

    #[test]
    fn test_load_uses_first_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compress.cfg");
        fs::write(&path, "\n  conv1;fc2 ignored;tail\n").unwrap();

        assert_eq!(load_compress_weight_conf(&path).unwrap(), vec!["conv1", "fc2"]);
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.cfg");
        fs::write(&path, "   \n").unwrap();

        assert!(load_compress_weight_conf(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_compress_weight_conf(dir.path().join("nope.cfg")).unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::IoFailure));
        assert_eq!(err.parameter(), Some("compress_weight_conf"));
    }
}
