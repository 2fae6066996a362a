//! Layering of YAML configuration documents.
//!
//! `.stepforge/config.local.yml` is laid over `.stepforge/config.yml`
//! before the result is parsed. Merge rules:
//!
//! - Mappings are merged key by key, recursively
//! - Sequences and scalars in the overlay replace the base value
//! - A `null` in the overlay deletes the key from the base
//! - An empty (null) document leaves the base unchanged

use serde_yaml::{Mapping, Value};

/// Lay `overlay` over `base`, returning the combined value.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let (Value::Mapping(base_map), Value::Mapping(overlay_map)) = (base, overlay) else {
        return overlay.clone();
    };

    let mut merged = base_map.clone();
    for (key, value) in overlay_map {
        if value.is_null() {
            merged.remove(key);
            continue;
        }
        let combined = match base_map.get(key) {
            Some(existing) => deep_merge(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    Value::Mapping(merged)
}

/// Merge documents in order; later documents take precedence.
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .filter(|doc| !doc.is_null())
        .fold(Value::Mapping(Mapping::new()), |acc, doc| deep_merge(&acc, doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn local_option_overrides_project_option() {
        let base = yaml(
            r#"
steps:
  fetch_zlib:
    kind: fetch
    options:
      version: "1.2.5"
      github_owner: madler
"#,
        );
        let overlay = yaml(
            r#"
steps:
  fetch_zlib:
    options:
      version: "1.2.13"
"#,
        );

        let result = deep_merge(&base, &overlay);
        let step = &result["steps"]["fetch_zlib"];
        assert_eq!(step["kind"], "fetch");
        assert_eq!(step["options"]["version"], "1.2.13");
        assert_eq!(step["options"]["github_owner"], "madler");
    }

    #[test]
    fn sequences_are_replaced() {
        let base = yaml("depends_on: [fetch_a, fetch_b]");
        let overlay = yaml("depends_on: [fetch_c]");

        let result = deep_merge(&base, &overlay);
        let deps = result["depends_on"].as_sequence().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0], "fetch_c");
    }

    #[test]
    fn null_deletes_key() {
        let base = yaml("options:\n  generator: Ninja\n  make: ninja");
        let overlay = yaml("options:\n  generator: null");

        let result = deep_merge(&base, &overlay);
        assert!(result["options"].get("generator").is_none());
        assert_eq!(result["options"]["make"], "ninja");
    }

    #[test]
    fn scalar_overlay_replaces_mapping() {
        let base = yaml("skip_if:\n  type: output_exists");
        let overlay = yaml("skip_if: disabled");

        let result = deep_merge(&base, &overlay);
        assert_eq!(result["skip_if"], "disabled");
    }

    #[test]
    fn merge_configs_applies_in_order() {
        let configs = vec![yaml("a: 1\nb: 2"), yaml("b: 3\nc: 4"), yaml("c: 5")];

        let result = merge_configs(&configs);
        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 3);
        assert_eq!(result["c"], 5);
    }

    #[test]
    fn empty_document_is_ignored() {
        let configs = vec![yaml("settings:\n  work_dir: deps"), yaml("")];

        let result = merge_configs(&configs);
        assert_eq!(result["settings"]["work_dir"], "deps");
    }

    #[test]
    fn merge_nothing_yields_empty_mapping() {
        let result = merge_configs(&[]);
        assert!(result.as_mapping().unwrap().is_empty());
    }
}
