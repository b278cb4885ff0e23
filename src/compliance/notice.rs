//! プライバシー通知文
//!
//! サイトは英語・スペイン語の2言語。テンプレート中の `{days}` は
//! データ保持期間（日）に置換される。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 保持期間のプレースホルダ
const DAYS_PLACEHOLDER: &str = "{days}";

/// 通知文のロケール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// ロケールコードを解釈（`es-MX` などの地域部分は無視、不明なら既定ロケール）
    pub fn parse(code: &str) -> Self {
        let language = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match language.as_str() {
            "es" => Locale::Es,
            "en" => Locale::En,
            _ => Locale::default(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 通知文の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKey {
    #[default]
    DataCollection,
    Retention,
    ContactConsent,
    Marketing,
    Rights,
    Cookies,
}

impl NoticeKey {
    /// キー文字列を解釈（不明なら `DataCollection`）
    pub fn parse(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "retention" => NoticeKey::Retention,
            "contact_consent" => NoticeKey::ContactConsent,
            "marketing" => NoticeKey::Marketing,
            "rights" => NoticeKey::Rights,
            "cookies" => NoticeKey::Cookies,
            _ => NoticeKey::DataCollection,
        }
    }
}

fn template(locale: Locale, key: NoticeKey) -> &'static str {
    match (locale, key) {
        (Locale::En, NoticeKey::DataCollection) => {
            "We only collect the information you submit through our contact form. It is kept for {days} days and then deleted."
        }
        (Locale::En, NoticeKey::Retention) => {
            "Contact submissions are retained for {days} days, after which they are permanently removed."
        }
        (Locale::En, NoticeKey::ContactConsent) => {
            "I agree that my details may be used to respond to my inquiry. They will be stored for {days} days."
        }
        (Locale::En, NoticeKey::Marketing) => {
            "I would like to receive occasional news about our work. I can unsubscribe at any time."
        }
        (Locale::En, NoticeKey::Rights) => {
            "You may request access to, correction of, or deletion of your data at any time. Unless you ask us sooner, it is erased after {days} days."
        }
        (Locale::En, NoticeKey::Cookies) => {
            "We use a single strictly necessary cookie to keep administrators signed in. No tracking cookies are set."
        }
        (Locale::Es, NoticeKey::DataCollection) => {
            "Solo recopilamos la información que envías a través de nuestro formulario de contacto. Se conserva durante {days} días y luego se elimina."
        }
        (Locale::Es, NoticeKey::Retention) => {
            "Los mensajes de contacto se conservan durante {days} días y después se eliminan de forma permanente."
        }
        (Locale::Es, NoticeKey::ContactConsent) => {
            "Acepto que mis datos se utilicen para responder a mi consulta. Se almacenarán durante {days} días."
        }
        (Locale::Es, NoticeKey::Marketing) => {
            "Deseo recibir noticias ocasionales sobre vuestro trabajo. Puedo darme de baja en cualquier momento."
        }
        (Locale::Es, NoticeKey::Rights) => {
            "Puedes solicitar el acceso, la rectificación o la eliminación de tus datos en cualquier momento. Si no lo solicitas antes, se borran a los {days} días."
        }
        (Locale::Es, NoticeKey::Cookies) => {
            "Utilizamos una única cookie estrictamente necesaria para mantener la sesión de los administradores. No usamos cookies de seguimiento."
        }
    }
}

/// 通知文を取得し、保持期間を埋め込む
pub fn render(locale: Locale, key: NoticeKey, retention_days: u32) -> String {
    template(locale, key).replace(DAYS_PLACEHOLDER, &retention_days.to_string())
}
