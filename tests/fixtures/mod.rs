//! テスト用の共通フィクスチャ
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use portfolio_guard::clock::FixedClock;
use portfolio_guard::config::AppConfig;
use portfolio_guard::logging::{LogLevel, Logger, MemorySink};
use portfolio_guard::session::{SessionGuard, SessionTokens};
use std::sync::Arc;

pub const TEST_SECRET: &str = "integration-test-secret";

/// テストの基準時刻
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 14, 0, 0).unwrap()
}

/// 環境変数の組からアプリケーション設定を作成
pub fn config_from(vars: &[(&str, &str)]) -> portfolio_guard::Result<AppConfig> {
    let map: config::Map<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_source(config::Environment::default().source(Some(map)))
}

/// テスト用の設定（APP_ENV=test、固定の署名鍵）
pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
    let mut vars = vec![("APP_ENV", "test"), ("JWT_SECRET", TEST_SECRET)];
    vars.extend_from_slice(extra);
    config_from(&vars).unwrap()
}

/// 固定時計・メモリ出力で構成した部品一式
pub struct Harness {
    pub config: Arc<AppConfig>,
    pub clock: Arc<FixedClock>,
    pub sink: Arc<MemorySink>,
    pub logger: Logger,
    pub guard: Arc<SessionGuard>,
}

impl Harness {
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let clock = Arc::new(FixedClock::new(base_time()));
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::new(
            LogLevel::Debug,
            config.environment.clone(),
            sink.clone(),
            clock.clone(),
        );
        let guard = Arc::new(SessionGuard::new(
            SessionTokens::from_config(&config, clock.clone()),
            logger.clone(),
            !config.is_local(),
        ));

        Self {
            config,
            clock,
            sink,
            logger,
            guard,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(test_config(&[]))
    }
}
