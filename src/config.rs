use anyhow::{bail, Context};
use std::{collections::HashMap, path::PathBuf, time::Duration};

/// facility 資訊的來源
#[derive(Debug, Clone, PartialEq)]
pub enum FacilitySource {
    Http { base_url: String, timeout: Duration },
    File(PathBuf),
}

/// 啟動時讀取一次，之後不再變動
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub facility: FacilitySource,
    pub request_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let facility_timeout = Duration::from_secs(parse_or(&get, "FACILITY_TIMEOUT_SECS", 5)?);
        let facility = match (get("FACILITY_API_URL"), get("FACILITY_INFO_PATH")) {
            (Some(base_url), _) => FacilitySource::Http {
                base_url,
                timeout: facility_timeout,
            },
            (None, Some(path)) => FacilitySource::File(PathBuf::from(path)),
            (None, None) => bail!("FACILITY_API_URL 或 FACILITY_INFO_PATH 至少要設定一個"),
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "APP_PORT", 3000)?,
            database_url: get("DATABASE_URL"),
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            facility,
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?),
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} 的值 {:?} 無法解析", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_with_facility_api() {
        let config = AppConfig::from_vars(vars(&[("FACILITY_API_URL", "http://facility")])).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.database_url, None);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(
            config.facility,
            FacilitySource::Http {
                base_url: "http://facility".to_string(),
                timeout: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = AppConfig::from_vars(vars(&[
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/shifts"),
            ("FACILITY_INFO_PATH", "facilities.json"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/shifts")
        );
        assert_eq!(
            config.facility,
            FacilitySource::File(PathBuf::from("facilities.json"))
        );
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn facility_source_is_required() {
        assert!(AppConfig::from_vars(vars(&[])).is_err());
        assert!(AppConfig::from_vars(vars(&[("FACILITY_API_URL", "  ")])).is_err());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = AppConfig::from_vars(vars(&[
            ("FACILITY_API_URL", "http://facility"),
            ("APP_PORT", "not-a-port"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("APP_PORT"));
    }
}
