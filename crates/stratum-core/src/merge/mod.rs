//! Deep override merging of per-source snapshots.

use std::sync::Arc;

use crate::config::{ConfigMap, ConfigValue};
use crate::error::Result;
use crate::snapshot::Snapshot;

/// Combines the snapshots of every source into one.
///
/// Implementations receive the snapshots in registration order; a later
/// snapshot must win over an earlier one.
pub trait Merger: Send + Sync {
    /// Merges `snapshots` into a single snapshot.
    fn merge(&self, snapshots: &[Arc<Snapshot>]) -> Result<Snapshot>;
}

/// Default merger: decodes each snapshot as a JSON object and folds them
/// left to right with [`deep_merge`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMerger;

impl Merger for JsonMerger {
    fn merge(&self, snapshots: &[Arc<Snapshot>]) -> Result<Snapshot> {
        let mut merged = ConfigMap::new();

        for (index, snapshot) in snapshots.iter().enumerate() {
            if snapshot.is_empty() {
                continue;
            }

            let overlay = ConfigMap::from_slice(&format!("snapshot #{index}"), snapshot.data())?;
            deep_merge(&mut merged, overlay);
        }

        Ok(Snapshot::new(merged.to_vec()?))
    }
}

/// Merges an overlay configuration into a base configuration using a recursive "Deep Merge" strategy.
///
/// # Rules
/// 1. If a key exists in `overlay` but not in `base`, it is added to `base`.
/// 2. If a key exists in both:
///    a. If BOTH values are Objects (`ConfigValue::Object`), they are merged recursively.
///    b. Otherwise, the value from `overlay` overwrites the value in `base`.
/// 3. Arrays are NOT merged; the overlay array replaces the base array completely.
pub fn deep_merge(base: &mut ConfigMap, overlay: ConfigMap) {
    for (key, overlay_val) in overlay.into_inner() {
        match base.as_inner_mut().get_mut(&key) {
            Some(base_val) => merge_values(base_val, overlay_val),
            None => {
                base.as_inner_mut().insert(key, overlay_val);
            },
        }
    }
}

fn merge_values(base: &mut ConfigValue, overlay: ConfigValue) {
    match (base, overlay) {
        (ConfigValue::Object(base_map), ConfigValue::Object(overlay_map)) => {
            for (key, overlay_inner_val) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_inner_val) => merge_values(base_inner_val, overlay_inner_val),
                    None => {
                        base_map.insert(key, overlay_inner_val);
                    },
                }
            }
        },
        (base_val, overlay_val) => *base_val = overlay_val,
    }
}

/// Merges `overlay` into `base` without replacing anything already present.
///
/// Used where the first writer should win, such as folding per-flag
/// fragments of the command-line source.
pub fn fill_missing(base: &mut ConfigMap, overlay: ConfigMap) {
    for (key, overlay_val) in overlay.into_inner() {
        match base.as_inner_mut().get_mut(&key) {
            Some(base_val) => fill_values(base_val, overlay_val),
            None => {
                base.as_inner_mut().insert(key, overlay_val);
            },
        }
    }
}

fn fill_values(base: &mut ConfigValue, overlay: ConfigValue) {
    if let (ConfigValue::Object(base_map), ConfigValue::Object(overlay_map)) = (base, overlay) {
        for (key, overlay_inner_val) in overlay_map {
            match base_map.get_mut(&key) {
                Some(base_inner_val) => fill_values(base_inner_val, overlay_inner_val),
                None => {
                    base_map.insert(key, overlay_inner_val);
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(json: &str) -> Arc<Snapshot> {
        Arc::new(Snapshot::from(json))
    }

    #[test]
    fn test_deep_merge_simple() {
        let mut base = ConfigMap::from_json(r#"{"a": 1, "b": 2}"#).unwrap();
        let overlay = ConfigMap::from_json(r#"{"b": 3, "c": 4}"#).unwrap();

        deep_merge(&mut base, overlay);

        assert_eq!(base.get("a").unwrap().as_i64(), Some(1));
        assert_eq!(base.get("b").unwrap().as_i64(), Some(3));
        assert_eq!(base.get("c").unwrap().as_i64(), Some(4));
    }

    #[test]
    fn test_deep_merge_type_change() {
        let mut base = ConfigMap::from_json(r#"{"logging": "INFO"}"#).unwrap();
        let overlay = ConfigMap::from_json(r#"{"logging": {"level": "DEBUG"}}"#).unwrap();

        deep_merge(&mut base, overlay);

        assert!(base.get("logging.level").is_some());
        assert_eq!(base.get("logging").unwrap().as_str(), None);
    }

    #[test]
    fn test_array_replacement() {
        let mut base = ConfigMap::from_json(r#"{"items": [1, 2]}"#).unwrap();
        let overlay = ConfigMap::from_json(r#"{"items": [3, 4, 5]}"#).unwrap();

        deep_merge(&mut base, overlay);

        let items = base.get("items").unwrap().as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_i64(), Some(3));
    }

    #[test]
    fn test_fill_missing_keeps_first_writer() {
        let mut base = ConfigMap::from_json(r#"{"a": {"b": 1}}"#).unwrap();
        let overlay = ConfigMap::from_json(r#"{"a": {"b": 2, "c": 3}}"#).unwrap();

        fill_missing(&mut base, overlay);

        assert_eq!(base.get("a.b").unwrap().as_i64(), Some(1));
        assert_eq!(base.get("a.c").unwrap().as_i64(), Some(3));
    }

    #[test]
    fn test_json_merger_later_wins() {
        let merged = JsonMerger
            .merge(&[
                snap(r#"{"x": {"y": "a", "z": "kept"}}"#),
                snap(r#"{"x": {"y": "b"}}"#),
            ])
            .unwrap();

        let map = ConfigMap::from_slice("merged", merged.data()).unwrap();
        assert_eq!(map.get("x.y").unwrap().as_str(), Some("b"));
        assert_eq!(map.get("x.z").unwrap().as_str(), Some("kept"));
    }

    #[test]
    fn test_json_merger_skips_empty_inputs() {
        let merged = JsonMerger
            .merge(&[snap(""), snap("null"), snap(r#"{"k": 1}"#)])
            .unwrap();

        assert_eq!(merged.data(), br#"{"k":1}"#);
    }

    #[test]
    fn test_json_merger_no_inputs() {
        let merged = JsonMerger.merge(&[]).unwrap();
        assert_eq!(merged.data(), b"{}");
    }

    #[test]
    fn test_json_merger_rejects_undecodable_input() {
        let err = JsonMerger
            .merge(&[snap(r#"{"k": 1}"#), snap("k: [unclosed")])
            .unwrap_err();

        assert!(err.is_decode_error());
    }
}
