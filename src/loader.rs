//! Artifact loader: reads a file, a directory of files, or an in-memory
//! mapping into a canonical `serde_yaml::Value` document.
//!
//! The directory form recursively walks for YAML-like extensions and
//! deep-merges every file it finds into one document. Merge semantics match
//! the reference implementation's `merge_dict`: recurse into nested
//! mappings, and at a leaf either replace (later wins) or extend
//! (concatenate sequences, union sets) depending on a caller-supplied flag.

use serde_yaml::Value;
use walkdir::WalkDir;

use crate::error::TaskCoreError;

/// Where an artifact document comes from.
#[derive(Debug, Clone)]
pub enum Definition {
    /// A single YAML file.
    File(std::path::PathBuf),
    /// A directory of YAML files, recursively merged.
    Directory(std::path::PathBuf),
    /// A document already in memory (used as-is).
    InMemory(Value),
}

const YAML_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Load a `Definition` into a canonical document.
///
/// `extend` controls how leaf sequence/mapping conflicts are resolved when
/// a directory's files are merged together; see [`merge`].
pub fn load(definition: &Definition, extend: bool) -> Result<Value, TaskCoreError> {
    match definition {
        Definition::File(path) => load_file(path),
        Definition::Directory(path) => load_directory(path, extend),
        Definition::InMemory(value) => Ok(value.clone()),
    }
}

fn load_file(path: &std::path::Path) -> Result<Value, TaskCoreError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        TaskCoreError::invalid_file_data(path.display().to_string(), e.to_string())
    })?;
    serde_yaml::from_str(&text).map_err(Into::into)
}

fn load_directory(path: &std::path::Path, extend: bool) -> Result<Value, TaskCoreError> {
    if !path.is_dir() {
        return Err(TaskCoreError::invalid_file_data(
            path.display().to_string(),
            "not a directory",
        ));
    }

    let mut merged = Value::Mapping(Default::default());
    let mut files: Vec<_> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| YAML_EXTENSIONS.contains(&ext))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    for file in files {
        let doc = load_file(&file)?;
        merge(&mut merged, &doc, extend)?;
    }
    Ok(merged)
}

/// Deep-merge `incoming` into `base`, mutating `base` in place.
///
/// For every key in `incoming`: if `base` lacks the key, insert it; if both
/// sides are mappings, recurse; otherwise, in `extend` mode, concatenate
/// sequences (YAML has no native set, so every sequence is treated as a
/// list — duplicates are preserved, matching `+=`/`.extend()` on a Python
/// `list`), falling back to replace for scalars; in replace mode
/// (`extend = false`), the incoming value always wins. Merging a
/// non-mapping `incoming` into a mapping `base` is an error — mirrors
/// `merge_dict` raising when `to_merge` isn't a dict.
pub fn merge(base: &mut Value, incoming: &Value, extend: bool) -> Result<(), TaskCoreError> {
    let incoming_mapping = match incoming {
        Value::Mapping(m) => m,
        Value::Null => return Ok(()),
        _ => {
            return Err(TaskCoreError::invalid_file_data(
                "<merge>",
                "cannot merge a non-mapping document into a mapping",
            ))
        }
    };

    let base_mapping = match base {
        Value::Mapping(m) => m,
        _ => {
            return Err(TaskCoreError::invalid_file_data(
                "<merge>",
                "merge target is not a mapping",
            ))
        }
    };

    for (key, value) in incoming_mapping {
        match base_mapping.get_mut(key) {
            None => {
                base_mapping.insert(key.clone(), value.clone());
            }
            Some(existing) if matches!(existing, Value::Mapping(_)) && matches!(value, Value::Mapping(_)) => {
                merge(existing, value, extend)?;
            }
            Some(existing) if extend && matches!(existing, Value::Sequence(_)) => {
                if let Value::Sequence(incoming_seq) = value {
                    if let Value::Sequence(existing_seq) = existing {
                        existing_seq.extend(incoming_seq.clone());
                    }
                } else {
                    *existing = value.clone();
                }
            }
            Some(existing) => {
                *existing = value.clone();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let mut base = yaml("a: 1\nb: [1, 2]\n");
        let empty = yaml("{}");
        let before = base.clone();
        merge(&mut base, &empty, false).unwrap();
        assert_eq!(base, before);
    }

    #[test]
    fn merge_replace_overwrites_scalars() {
        let mut base = yaml("a: 1\n");
        let incoming = yaml("a: 2\n");
        merge(&mut base, &incoming, false).unwrap();
        assert_eq!(base["a"], Value::from(2));
    }

    #[test]
    fn merge_extend_concatenates_sequences() {
        let mut base = yaml("items: [a, b]\n");
        let incoming = yaml("items: [b, c]\n");
        merge(&mut base, &incoming, true).unwrap();
        let items: Vec<String> = base["items"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(items, vec!["a", "b", "b", "c"]);
    }

    #[test]
    fn merge_recurses_into_nested_mappings() {
        let mut base = yaml("nested:\n  x: 1\n  y: 2\n");
        let incoming = yaml("nested:\n  y: 3\n  z: 4\n");
        merge(&mut base, &incoming, false).unwrap();
        assert_eq!(base["nested"]["x"], Value::from(1));
        assert_eq!(base["nested"]["y"], Value::from(3));
        assert_eq!(base["nested"]["z"], Value::from(4));
    }

    #[test]
    fn merge_non_mapping_into_mapping_fails() {
        let mut base = yaml("a: 1\n");
        let incoming = Value::Sequence(vec![Value::from(1)]);
        assert!(merge(&mut base, &incoming, false).is_err());
    }

    #[test]
    fn load_in_memory_is_passthrough() {
        let v = yaml("a: 1\n");
        let def = Definition::InMemory(v.clone());
        let loaded = load(&def, false).unwrap();
        assert_eq!(loaded, v);
    }

    #[test]
    fn load_unknown_file_is_invalid_file_data() {
        let def = Definition::File("/no/such/file.yaml".into());
        let err = load(&def, false).unwrap_err();
        assert!(matches!(err, TaskCoreError::InvalidFileData { .. }));
    }
}
