use crate::algorithms::{Algorithm, Bounds};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Run configuration.
///
/// ```toml
/// size = 128
/// seed = 7
/// algorithms = ["bubble", "quick", "radix"]
/// bounds = { lo = 0, hi = 63 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SortConfig {
    pub size: usize,
    pub seed: Option<u64>,
    pub algorithms: Vec<Algorithm>,
    pub bounds: Option<Bounds>,
    pub trace_writes: bool,
    pub json: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            size: 64,
            seed: None,
            algorithms: Algorithm::DEFAULT_SET.to_vec(),
            bounds: None,
            trace_writes: false,
            json: false,
        }
    }
}

impl SortConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SortConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::invalid("size", "must be at least 1"));
        }
        if self.algorithms.is_empty() {
            return Err(ConfigError::invalid("algorithms", "list is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = SortConfig::from_toml("").unwrap();
        assert_eq!(config, SortConfig::default());
        assert_eq!(config.algorithms.len(), 6);
        assert!(!config.algorithms.contains(&Algorithm::Gnome));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
size = 10
seed = 42
algorithms = ["read-optimized-bubble", "gnome"]
bounds = {{ lo = 2, hi = 7 }}
trace_writes = true
"#
        )
        .unwrap();

        let config = SortConfig::load(file.path()).unwrap();
        assert_eq!(config.size, 10);
        assert_eq!(config.seed, Some(42));
        assert_eq!(
            config.algorithms,
            vec![Algorithm::ReadOptimizedBubble, Algorithm::Gnome]
        );
        assert_eq!(config.bounds, Some(Bounds::new(2, 7).unwrap()));
        assert!(config.trace_writes);
        assert!(!config.json);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SortConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_unknown_algorithm_is_a_parse_error() {
        let err = SortConfig::from_toml(r#"algorithms = ["bogo"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_field_is_a_parse_error() {
        let err = SortConfig::from_toml("sise = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_inverted_bounds_fail_to_parse() {
        let err = SortConfig::from_toml("bounds = { lo = 5, hi = 1 }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("lo (5) is greater than hi (1)"), "{err}");
    }

    #[test]
    fn test_validation() {
        let cases = [
            ("size = 0", "size"),
            ("algorithms = []", "algorithms"),
        ];
        for (content, expected) in cases {
            match SortConfig::from_toml(content) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("{content}: expected Invalid, got {other:?}"),
            }
        }
    }
}
