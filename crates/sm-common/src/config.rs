use std::{fs, path::PathBuf};

use serde::Deserialize;

use crate::matching::{category::CompatibilityTable, weights::WeightVector};

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("weights must sum to 1.0 (got {0})")]
    WeightSum(f64),
    #[error("weight for {dimension} must be a non-negative finite number (got {value})")]
    InvalidWeight { dimension: String, value: f64 },
    #[error("compatibility table has no entry for category {0}")]
    MissingCategory(String),
    #[error("{0} must be positive")]
    NonPositive(&'static str),
    #[error("failed to read matching config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse matching config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
}

/// マッチング全体の設定
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    pub weights: WeightVector,
    pub compatibility: CompatibilityTable,
    /// 1リクエストあたりの最大推薦件数
    pub top_n: usize,
    /// バッチ実行時の同時実行数
    pub batch_concurrency: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: WeightVector::default(),
            compatibility: CompatibilityTable::default(),
            top_n: DEFAULT_TOP_N,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

/// `SM_MATCH_CONFIG_PATH` の JSON。指定されたキーだけを上書きする。
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub weights: Option<WeightVector>,
    pub compatibility: Option<CompatibilityTable>,
    pub top_n: Option<usize>,
    pub batch_concurrency: Option<usize>,
}

impl MatchingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.compatibility.validate()?;
        if self.top_n == 0 {
            return Err(ConfigError::NonPositive("top_n"));
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::NonPositive("batch_concurrency"));
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 環境変数の取得方法を差し替えられる版（テスト用）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("SM_MATCH_CONFIG_PATH").filter(|p| !p.trim().is_empty()) {
            config.apply_overrides_file(PathBuf::from(path.trim()))?;
        }
        if let Some(top_n) = parse_usize(&lookup, "SM_MATCH_TOP_N")? {
            config.top_n = top_n;
        }
        if let Some(concurrency) = parse_usize(&lookup, "SM_BATCH_CONCURRENCY")? {
            config.batch_concurrency = concurrency;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides_file(&mut self, path: PathBuf) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let overrides: ConfigOverrides =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;
        self.apply_overrides(overrides);
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(weights) = overrides.weights {
            self.weights = weights;
        }
        if let Some(compatibility) = overrides.compatibility {
            self.compatibility = compatibility;
        }
        if let Some(top_n) = overrides.top_n {
            self.top_n = top_n;
        }
        if let Some(concurrency) = overrides.batch_concurrency {
            self.batch_concurrency = concurrency;
        }
    }
}

fn parse_usize<F>(lookup: &F, var: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use super::*;
    use crate::model::Category;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn temp_json(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("sm-config-{}-{}.json", name, std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_are_valid() {
        let config = MatchingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_n, 10);
        assert_eq!(config.batch_concurrency, 8);
    }

    #[test]
    fn reads_limits_from_env() {
        let config = MatchingConfig::from_lookup(lookup_from(&[
            ("SM_MATCH_TOP_N", "5"),
            ("SM_BATCH_CONCURRENCY", " 2 "),
        ]))
        .unwrap();

        assert_eq!(config.top_n, 5);
        assert_eq!(config.batch_concurrency, 2);
    }

    #[test]
    fn rejects_unparseable_and_zero_limits() {
        let err = MatchingConfig::from_lookup(lookup_from(&[("SM_MATCH_TOP_N", "ten")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "SM_MATCH_TOP_N", .. }));

        let err =
            MatchingConfig::from_lookup(lookup_from(&[("SM_BATCH_CONCURRENCY", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositive("batch_concurrency")));
    }

    #[test]
    fn json_file_overrides_weights_and_table() {
        let path = temp_json(
            "override",
            r#"{
                "weights": {"location": 0.5, "time": 0.1, "category": 0.1,
                            "capacity": 0.1, "price": 0.1, "facility": 0.1},
                "compatibility": {"office": [], "meeting_room": ["office"],
                                  "conference_room": [], "shared_desk": [], "other": []}
            }"#,
        );
        let config = MatchingConfig::from_lookup(lookup_from(&[(
            "SM_MATCH_CONFIG_PATH",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.weights.location, 0.5);
        assert_eq!(
            config.compatibility.substitutes(Category::MeetingRoom),
            &[Category::Office]
        );
        assert_eq!(config.top_n, DEFAULT_TOP_N);
    }

    #[test]
    fn invalid_override_weights_fail_validation() {
        let path = temp_json(
            "bad-weights",
            r#"{"weights": {"location": 0.9, "time": 0.25, "category": 0.2,
                            "capacity": 0.1, "price": 0.1, "facility": 0.05}}"#,
        );
        let err = MatchingConfig::from_lookup(lookup_from(&[(
            "SM_MATCH_CONFIG_PATH",
            path.to_str().unwrap(),
        )]))
        .unwrap_err();
        let _ = fs::remove_file(&path);

        assert!(matches!(err, ConfigError::WeightSum(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = MatchingConfig::from_lookup(lookup_from(&[(
            "SM_MATCH_CONFIG_PATH",
            "/nonexistent/sm-match-config.json",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let path = temp_json("unknown", r#"{"weight": {}}"#);
        let err = MatchingConfig::from_lookup(lookup_from(&[(
            "SM_MATCH_CONFIG_PATH",
            path.to_str().unwrap(),
        )]))
        .unwrap_err();
        let _ = fs::remove_file(&path);

        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
