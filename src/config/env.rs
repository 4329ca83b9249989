//! Process-environment resolver.
//!
//! Values can be plain strings, comma-separated lists, JSON documents
//! (optionally base64-encoded), JSON files named by the variable, or YAML
//! files with `${VAR_NAME}` placeholders.

use std::env;
use std::path::Path;
use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;

use crate::error::ConfigError;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}").expect("valid placeholder pattern"));

/// Raw value of `name`, if set.
pub fn get(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Raw value of `name`, or `default` when unset.
pub fn get_or(name: &str, default: &str) -> String {
    get(name).unwrap_or_else(|| default.to_string())
}

/// True when `value` decodes as base64 and re-encodes to the exact original
/// string.
///
/// Best-effort heuristic: short alphanumeric strings can round-trip by
/// accident, so callers must tolerate either outcome.
pub fn is_base64(value: &str) -> bool {
    match BASE64.decode(value) {
        Ok(bytes) => BASE64.encode(&bytes) == value,
        Err(_) => false,
    }
}

/// Decode a string (base64-unwrapped when detected) into a JSON value.
fn value_to_dict(value: &str) -> Result<serde_json::Value, ConfigError> {
    let text = if is_base64(value) {
        let bytes = BASE64.decode(value).map_err(|e| ConfigError::Parse {
            reason: format!("base64 decode failed: {e}"),
        })?;
        String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
            reason: format!("decoded value is not UTF-8: {e}"),
        })?
    } else {
        value.to_string()
    };

    serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
        reason: format!("invalid JSON: {e}"),
    })
}

/// JSON value of `name`: base64-decoded when detected, then parsed.
pub fn get_dict(name: &str) -> Result<Option<serde_json::Value>, ConfigError> {
    match get(name) {
        Some(value) => match value_to_dict(&value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(ConfigError::Parse { reason }) => Err(ConfigError::Parse {
                reason: format!("variable '{name}': {reason}"),
            }),
            Err(other) => Err(other),
        },
        None => Ok(None),
    }
}

/// Comma-separated values of `name`; empty when unset or empty.
pub fn get_list(name: &str) -> Vec<String> {
    match get(name) {
        Some(value) if !value.is_empty() => value.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Like [`get_list`], but partitions items by a prefix marker: items without
/// the marker, and items with the marker stripped.
pub fn get_list_partitioned(name: &str, marker: &str) -> (Vec<String>, Vec<String>) {
    let mut plain = Vec::new();
    let mut marked = Vec::new();

    for item in get_list(name) {
        match item.strip_prefix(marker) {
            Some(rest) => marked.push(rest.to_string()),
            None => plain.push(item),
        }
    }

    (plain, marked)
}

/// JSON configuration named by `name`.
///
/// The variable's value is a file path. When the variable is unset, the
/// sibling `{name}_RAW` is interpreted as an inline JSON document. A path
/// that does not exist yields `Ok(None)`.
pub fn get_config(name: &str) -> Result<Option<serde_json::Value>, ConfigError> {
    let Some(filename) = get(name) else {
        return get_dict(&format!("{name}_RAW"));
    };

    let path = Path::new(&filename);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        reason: format!("failed to read '{filename}': {e}"),
    })?;

    serde_json::from_str(&content).map(Some).map_err(|e| ConfigError::Parse {
        reason: format!("invalid JSON in '{filename}': {e}"),
    })
}

/// Load a YAML document, substituting `${VAR_NAME}` placeholders in string
/// values with the corresponding environment variable.
///
/// Placeholders for unset variables are left as their literal text.
pub fn parse_yaml(path: &Path) -> Result<serde_yaml::Value, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileMissing {
            path: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        reason: format!("failed to read '{}': {e}", path.display()),
    })?;

    let doc: serde_yaml::Value = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
        reason: format!("invalid YAML in '{}': {e}", path.display()),
    })?;

    Ok(substitute_env_vars(doc))
}

fn substitute_env_vars(node: serde_yaml::Value) -> serde_yaml::Value {
    match node {
        serde_yaml::Value::String(s) => serde_yaml::Value::String(replace_placeholders(&s)),
        serde_yaml::Value::Sequence(seq) => {
            serde_yaml::Value::Sequence(seq.into_iter().map(substitute_env_vars).collect())
        }
        serde_yaml::Value::Mapping(map) => serde_yaml::Value::Mapping(
            map.into_iter()
                .map(|(key, value)| (key, substitute_env_vars(value)))
                .collect(),
        ),
        other => other,
    }
}

fn replace_placeholders(value: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(value, |caps: &regex::Captures<'_>| {
            env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// True when `NODE_ENV` marks a development environment.
pub fn is_development_mode() -> bool {
    get_or("NODE_ENV", "").to_lowercase().starts_with("dev")
}

/// True when the variable names a path that exists on disk.
pub fn path_exists(name: &str) -> bool {
    get(name).is_some_and(|p| Path::new(&p).exists())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    fn set_var(name: &str, value: &str) {
        unsafe { env::set_var(name, value) }
    }

    fn remove_var(name: &str) {
        unsafe { env::remove_var(name) }
    }

    #[test]
    #[serial]
    fn get_or_falls_back_when_unset() {
        remove_var("MISSING_VAR");
        assert_eq!(get_or("MISSING_VAR", "fallback"), "fallback");
    }

    #[test]
    #[serial]
    fn get_list_splits_on_commas() {
        set_var("CSV_VAR", "a,b,c");
        assert_eq!(get_list("CSV_VAR"), vec!["a", "b", "c"]);

        remove_var("CSV_VAR");
        assert!(get_list("CSV_VAR").is_empty());
    }

    #[test]
    #[serial]
    fn get_list_partitioned_strips_marker() {
        set_var("CSV_VAR", "a,b,marker_x,marker_y");
        let (plain, marked) = get_list_partitioned("CSV_VAR", "marker_");
        assert_eq!(plain, vec!["a", "b"]);
        assert_eq!(marked, vec!["x", "y"]);
        remove_var("CSV_VAR");
    }

    #[test]
    fn is_base64_round_trips_only() {
        let encoded = BASE64.encode(r#"{"key": "value"}"#);
        assert!(is_base64(&encoded));
        assert!(!is_base64("definitely not base64!"));
    }

    #[test]
    #[serial]
    fn get_dict_parses_plain_and_encoded_json() {
        set_var("DICT_VAR", r#"{"enabled": true}"#);
        let value = get_dict("DICT_VAR").unwrap().unwrap();
        assert_eq!(value["enabled"], true);

        set_var("DICT_VAR", &BASE64.encode(r#"{"enabled": false}"#));
        let value = get_dict("DICT_VAR").unwrap().unwrap();
        assert_eq!(value["enabled"], false);

        set_var("DICT_VAR", "not json");
        assert!(get_dict("DICT_VAR").is_err());

        remove_var("DICT_VAR");
        assert!(get_dict("DICT_VAR").unwrap().is_none());
    }

    #[test]
    #[serial]
    fn get_config_falls_back_to_raw_sibling() {
        remove_var("SOME_CONFIG");
        set_var("SOME_CONFIG_RAW", r#"{"mode": "raw"}"#);
        let value = get_config("SOME_CONFIG").unwrap().unwrap();
        assert_eq!(value["mode"], "raw");
        remove_var("SOME_CONFIG_RAW");
    }

    #[test]
    #[serial]
    fn get_config_missing_path_is_not_an_error() {
        set_var("SOME_CONFIG", "/nonexistent/config.json");
        assert!(get_config("SOME_CONFIG").unwrap().is_none());
        remove_var("SOME_CONFIG");
    }

    #[test]
    #[serial]
    fn get_config_rejects_invalid_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json at all").unwrap();

        set_var("SOME_CONFIG", file.path().to_str().unwrap());
        assert!(matches!(
            get_config("SOME_CONFIG"),
            Err(ConfigError::Parse { .. })
        ));
        remove_var("SOME_CONFIG");
    }

    #[test]
    #[serial]
    fn parse_yaml_substitutes_known_variables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "endpoint: ${{YAML_TEST_HOST}}/api\nnested:\n  - ${{YAML_TEST_HOST}}\n").unwrap();

        set_var("YAML_TEST_HOST", "https://example.test");
        let doc = parse_yaml(file.path()).unwrap();
        assert_eq!(
            doc["endpoint"].as_str().unwrap(),
            "https://example.test/api"
        );
        assert_eq!(
            doc["nested"][0].as_str().unwrap(),
            "https://example.test"
        );
        remove_var("YAML_TEST_HOST");
    }

    #[test]
    #[serial]
    fn parse_yaml_leaves_unset_placeholders_literal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "value: ${{UNSET_VAR}}\n").unwrap();

        remove_var("UNSET_VAR");
        let doc = parse_yaml(file.path()).unwrap();
        assert_eq!(doc["value"].as_str().unwrap(), "${UNSET_VAR}");
    }

    #[test]
    fn parse_yaml_missing_file_errors() {
        let result = parse_yaml(Path::new("/nonexistent/file.yaml"));
        assert!(matches!(result, Err(ConfigError::FileMissing { .. })));
    }

    #[test]
    #[serial]
    fn development_mode_matches_dev_prefix() {
        set_var("NODE_ENV", "Development");
        assert!(is_development_mode());

        set_var("NODE_ENV", "production");
        assert!(!is_development_mode());

        remove_var("NODE_ENV");
        assert!(!is_development_mode());
    }
}
