//! Compliance Engine
//!
//! お問い合わせフォームの書き込みを同意でゲートし、データ保持期間を計算する。
//!
//! ## 主要機能
//!
//! - **同意チェック**: 種別ごとの同意と24時間の有効期間
//! - **データ保持**: 保持期間（日）に基づく期限切れ判定と一括仕分け
//! - **フォーム整形**: 保存してはならないフィールドの除去
//! - **同意証跡**: IP・User-Agent のハッシュのみを保持する記録
//! - **プライバシー通知**: 英語・スペイン語の通知文
//!
//! ## 使用例
//!
//! ```rust
//! use portfolio_guard::clock::SystemClock;
//! use portfolio_guard::compliance::{ComplianceEngine, ConsentData, ConsentType};
//! use portfolio_guard::config::AppConfig;
//! use std::sync::Arc;
//!
//! let engine = ComplianceEngine::new(Arc::new(AppConfig::default()), Arc::new(SystemClock));
//!
//! let consent = ConsentData::default().with(ConsentType::ContactForm, true);
//! assert!(engine.validate_consent(Some(&consent), ConsentType::ContactForm).valid);
//! assert!(!engine.validate_consent(None, ConsentType::ContactForm).valid);
//! ```

pub mod engine;
pub mod notice;
pub mod types;

pub use engine::ComplianceEngine;
pub use notice::{Locale, NoticeKey};
pub use types::*;
