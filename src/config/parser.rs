use crate::config::types::TuningConfig;
use crate::ConfigError;
use std::path::Path;

/// Loads the optional tuning file from the given path
///
/// The file may override any subset of the HTTP and pipeline settings;
/// everything omitted keeps its default.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sitegraph::config::load_tuning;
///
/// let tuning = load_tuning(Path::new("sitegraph.toml")).unwrap();
/// println!("Queue capacity: {}", tuning.pipeline.queue_capacity);
/// ```
pub fn load_tuning(path: &Path) -> Result<TuningConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let tuning: TuningConfig = toml::from_str(&content)?;
    Ok(tuning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_tuning_missing_file() {
        let result = load_tuning(Path::new("/nonexistent/sitegraph.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_tuning_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[http\nbroken").unwrap();
        let result = load_tuning(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_tuning_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [pipeline]
            queue-capacity = 8
            drain-attempts = 3
            "#
        )
        .unwrap();
        let tuning = load_tuning(file.path()).unwrap();
        assert_eq!(tuning.pipeline.queue_capacity, 8);
        assert_eq!(tuning.pipeline.drain_attempts, 3);
    }
}
