//! Configuration loading from disk.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::schema::FactoryConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FactoryConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<FactoryConfig, ConfigError> {
    let config: FactoryConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Flatten nested tables into dotted keys.
///
/// Scalars are rendered with `to_string`, arrays of scalars are joined with
/// commas. Tables nested inside arrays have no dotted form and are skipped.
pub fn flatten_properties(table: &toml::Table) -> HashMap<String, String> {
    let mut out = HashMap::new();
    flatten_into(&mut out, None, table);
    out
}

fn flatten_into(out: &mut HashMap<String, String>, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let full_key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(nested) => flatten_into(out, Some(&full_key), nested),
            toml::Value::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    match scalar_to_string(item) {
                        Some(s) => parts.push(s),
                        None => tracing::warn!(key = %full_key, "Skipping non-scalar array element"),
                    }
                }
                out.insert(full_key, parts.join(","));
            }
            scalar => {
                if let Some(s) = scalar_to_string(scalar) {
                    out.insert(full_key, s);
                }
            }
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_flatten() {
        let config = parse_config(
            r#"
            [eager_load]
            enabled = true
            clients = ["myservice"]

            [properties.ribbon]
            ConnectTimeout = 250

            [properties.myservice.ribbon]
            NFLoadBalancerRuleClassName = "RoundRobinRule"
            listOfServers = ["a:1", "b:2"]
            IsSecure = false

            [properties."my.dotted".ribbon]
            listOfServers = "c:3"
            "#,
        )
        .unwrap();

        assert!(config.eager_load.enabled);
        assert_eq!(config.observability.log_level, "info");

        let props = config.flattened_properties();
        assert_eq!(
            props.get("myservice.ribbon.NFLoadBalancerRuleClassName").map(String::as_str),
            Some("RoundRobinRule")
        );
        assert_eq!(props.get("myservice.ribbon.listOfServers").map(String::as_str), Some("a:1,b:2"));
        assert_eq!(props.get("myservice.ribbon.IsSecure").map(String::as_str), Some("false"));
        assert_eq!(props.get("ribbon.ConnectTimeout").map(String::as_str), Some("250"));
        assert_eq!(props.get("my.dotted.ribbon.listOfServers").map(String::as_str), Some("c:3"));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[eager_load\nenabled = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error() {
        let err = parse_config(
            r#"
            [eager_load]
            enabled = true
            clients = [" "]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("Validation failed: "));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
