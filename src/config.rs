use std::path::PathBuf;

use crate::data::filter::PipelineConfig;
use crate::error::ConfigError;

pub const DATA_ENV: &str = "RUSTY_ESTATE_DATA";
pub const PIPELINE_ENV: &str = "RUSTY_ESTATE_PIPELINE";
pub const EXPORT_DIR_ENV: &str = "RUSTY_ESTATE_EXPORT_DIR";
pub const TOP_N_ENV: &str = "RUSTY_ESTATE_TOP_N";

pub const DEFAULT_DATA_FILE: &str = "jabodetabek_house_price.xlsx";
pub const DEFAULT_TOP_N: usize = 5;

/// Startup configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub pipeline: PipelineConfig,
    pub export_dir: PathBuf,
    pub top_n: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            pipeline: PipelineConfig::default(),
            export_dir: PathBuf::from("."),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AppConfig {
    /// Resolve from the process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let arg = std::env::args().nth(1);
        Self::resolve(arg, |name| std::env::var(name).ok())
    }

    /// CLI argument beats environment beats defaults.
    pub fn resolve<F>(arg: Option<String>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = arg.or_else(|| env(DATA_ENV)) {
            config.data_path = PathBuf::from(path);
        }

        if let Some(path) = env(PIPELINE_ENV) {
            let path = PathBuf::from(path);
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
            config.pipeline = PipelineConfig::from_json(&text)?;
        }

        if let Some(dir) = env(EXPORT_DIR_ENV) {
            config.export_dir = PathBuf::from(dir);
        }

        if let Some(raw) = env(TOP_N_ENV) {
            config.top_n = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: TOP_N_ENV,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::data::filter::FilterKind;
    use crate::data::model::Attribute;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::resolve(None, env_of(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn argument_wins_over_env() {
        let config = AppConfig::resolve(Some("a.csv".into()), env_of(&[(DATA_ENV, "b.csv")])).unwrap();
        assert_eq!(config.data_path, PathBuf::from("a.csv"));
        let config = AppConfig::resolve(None, env_of(&[(DATA_ENV, "b.csv")])).unwrap();
        assert_eq!(config.data_path, PathBuf::from("b.csv"));
    }

    #[test]
    fn rejects_zero_top_n() {
        let err = AppConfig::resolve(None, env_of(&[(TOP_N_ENV, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: TOP_N_ENV, .. }));
    }

    #[test]
    fn reads_pipeline_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"filters":[{{"attribute":"bedrooms","kind":"range"}}]}}"#).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = AppConfig::resolve(None, env_of(&[(PIPELINE_ENV, path.as_str())])).unwrap();
        assert_eq!(config.pipeline.filters.len(), 1);
        assert_eq!(config.pipeline.filters[0].attribute, Attribute::Bedrooms);
        assert_eq!(config.pipeline.filters[0].kind, FilterKind::Range);
    }
}
