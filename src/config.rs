/// 환경 변수 기반 설정
/// DATABASE_URL 외의 값은 모두 기본값을 가진다.
// region:    --- Imports
use std::time::Duration;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Config Error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("필수 환경 변수가 없습니다: {0}")]
    Missing(&'static str),

    #[error("환경 변수 {key} 값이 올바르지 않습니다: {value}")]
    Invalid { key: &'static str, value: String },
}
// endregion: --- Config Error

// region:    --- Config
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_statement_timeout: Duration,
    pub db_acquire_timeout: Duration,
    pub kafka_brokers: String,
    pub events_topic: String,
    pub consumer_group: String,
    pub listen_addr: String,
    pub auction_service_url: String,
    pub outbox_poll_interval: Duration,
    pub outbox_batch_size: i64,
    pub reconcile_interval: Duration,
}

impl Config {
    /// 프로세스 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정 로드 (테스트용 분리)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            db_max_connections: parse_positive_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_statement_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DB_STATEMENT_TIMEOUT_MS",
                5_000,
            )?),
            db_acquire_timeout: Duration::from_millis(parse_positive_or(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_MS",
                3_000,
            )?),
            kafka_brokers: lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_string()),
            events_topic: lookup("EVENTS_TOPIC").unwrap_or_else(|| "auction-events".to_string()),
            consumer_group: lookup("CONSUMER_GROUP").unwrap_or_else(|| "search-projector".to_string()),
            listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            auction_service_url: lookup("AUCTION_SERVICE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            outbox_poll_interval: Duration::from_millis(parse_positive_or(
                &lookup,
                "OUTBOX_POLL_INTERVAL_MS",
                500,
            )?),
            outbox_batch_size: parse_positive_or(&lookup, "OUTBOX_BATCH_SIZE", 100)?,
            reconcile_interval: Duration::from_secs(parse_positive_or(
                &lookup,
                "RECONCILE_INTERVAL_SECS",
                30,
            )?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// 0 이하를 허용하지 않는 값 (주기, 배치 크기, 풀 크기)
fn parse_positive_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default + ToString,
{
    let value = parse_or(lookup, key, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}
// endregion: --- Config

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn database_url_is_required() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn defaults_are_applied() {
        let config =
            Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/db")])).unwrap();
        assert_eq!(config.kafka_brokers, "localhost:9092");
        assert_eq!(config.events_topic, "auction-events");
        assert_eq!(config.outbox_batch_size, 100);
        assert_eq!(config.db_statement_timeout, Duration::from_secs(5));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("OUTBOX_BATCH_SIZE", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "OUTBOX_BATCH_SIZE",
                ..
            }
        ));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        for key in ["OUTBOX_POLL_INTERVAL_MS", "RECONCILE_INTERVAL_SECS"] {
            let err = Config::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://localhost/db"),
                (key, "0"),
            ]))
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: k, ref value } if k == key && value == "0"),
                "{key}: {err:?}"
            );
        }
    }

    #[test]
    fn non_positive_batch_size_is_rejected() {
        for value in ["0", "-5"] {
            let err = Config::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://localhost/db"),
                ("OUTBOX_BATCH_SIZE", value),
            ]))
            .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    key: "OUTBOX_BATCH_SIZE",
                    ..
                }
            ));
        }
    }

    #[test]
    fn positive_overrides_are_accepted() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("OUTBOX_POLL_INTERVAL_MS", "250"),
            ("OUTBOX_BATCH_SIZE", "10"),
            ("RECONCILE_INTERVAL_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.outbox_poll_interval, Duration::from_millis(250));
        assert_eq!(config.outbox_batch_size, 10);
        assert_eq!(config.reconcile_interval, Duration::from_secs(5));
    }
}
// endregion: --- Tests
