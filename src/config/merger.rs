//! Deep merge for configuration layers and JSON data.
//!
//! Used both to layer `config.local.yml` over `config.yml` and by the
//! `transform.merge` step.
//!
//! # Merge Rules
//!
//! - Objects are merged recursively
//! - Arrays are replaced entirely (not merged)
//! - Null values in overlay delete the corresponding key from base
//! - Scalars in overlay replace scalars in base

use serde_json::{Map, Value};

/// Deep merge two values.
///
/// Later values override earlier values at the point of conflict.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Object(result)
        }

        // Overlay is not an object, or base is not an object: overlay wins
        (_, overlay) => overlay.clone(),
    }
}

/// Merge multiple values in order (later overrides earlier).
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .fold(Value::Object(Map::new()), |acc, config| deep_merge(&acc, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn deep_merge_replaces_at_conflict_point() {
        let base = yaml(
            r#"
workflows:
  release:
    description: "Cut a release"
    steps:
      - name: build
        type: shell
"#,
        );
        let overlay = yaml(
            r#"
workflows:
  release:
    description: "Cut a local release"
"#,
        );

        let result = deep_merge(&base, &overlay);

        assert_eq!(
            result["workflows"]["release"]["description"],
            "Cut a local release"
        );
        assert_eq!(result["workflows"]["release"]["steps"][0]["name"], "build");
    }

    #[test]
    fn local_steps_replace_project_steps() {
        let base = yaml(
            "workflows:\n  ci:\n    steps:\n      - {name: lint, type: shell}\n      - {name: test, type: shell}\n",
        );
        let overlay = yaml("workflows:\n  ci:\n    steps:\n      - {name: quick, type: echo}\n");

        let result = deep_merge(&base, &overlay);
        let steps = result["workflows"]["ci"]["steps"].as_array().unwrap();

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0]["name"], "quick");
    }

    #[test]
    fn null_removes_inherited_param() {
        let base = json!({"url": "https://example.com", "timeout": 5});
        let overlay = json!({"timeout": null});

        let result = deep_merge(&base, &overlay);

        assert_eq!(result, json!({"url": "https://example.com"}));
    }

    #[test]
    fn scalar_overlay_replaces_object_base() {
        let result = deep_merge(&json!({"user": {"id": 1}}), &json!({"user": "anonymous"}));
        assert_eq!(result["user"], "anonymous");
    }

    #[test]
    fn non_object_base_is_replaced() {
        assert_eq!(deep_merge(&json!([1, 2]), &json!({"a": 1})), json!({"a": 1}));
        assert_eq!(deep_merge(&json!({"a": 1}), &json!(7)), json!(7));
    }

    #[test]
    fn layers_apply_in_order() {
        let layers = vec![
            yaml("app_name: base\nsettings:\n  continue_on_error: false"),
            yaml("settings:\n  continue_on_error: true"),
            yaml("app_name: local"),
        ];

        let result = merge_configs(&layers);

        assert_eq!(result["app_name"], "local");
        assert_eq!(result["settings"]["continue_on_error"], true);
    }

    #[test]
    fn merge_empty_configs_returns_empty() {
        let result = merge_configs(&[]);
        assert!(result.as_object().unwrap().is_empty());
    }
}
