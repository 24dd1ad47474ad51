use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Booking form the monitor drives. Fixed, not configurable.
pub const EHI_BASE_URL: &str = "https://booking.1hai.cn/order/firstStep";
pub const EHI_TZ: &str = "Asia/Shanghai";
pub const EHI_LOCALE: &str = "zh-CN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything one fetch attempt needs. Immutable for the duration of the attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTarget {
    pub car_name: String,
    pub pickup_city: String,
    pub return_city: String,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub headful: bool,
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub target: FetchTarget,
    pub check_interval_seconds: u64,
    pub smtp: SmtpConfig,

    // Browser
    pub chrome_path: String,
    pub debug_dir: PathBuf,

    // Alerts
    pub alert_price: Option<f64>,

    // Storage
    pub data_file: PathBuf,
    pub logs_dir: PathBuf,

    /// Refuse to submit the search unless every form control was confirmed interactively.
    pub require_confirmed_selection: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let target = FetchTarget {
            car_name: env::var("EH_CAR_NAME").unwrap_or_else(|_| "大众新探影".to_string()),
            pickup_city: env::var("PICKUP_CITY").unwrap_or_else(|_| "敦煌".to_string()),
            return_city: env::var("RETURN_CITY").unwrap_or_else(|_| "德令哈".to_string()),
            pickup_date: date_var("PICKUP_DATE", "2025-10-04")?,
            return_date: date_var("RETURN_DATE", "2025-10-08")?,
            headful: flag_var("HEADFUL"),
            debug: flag_var("DEBUG"),
        };

        Ok(Config {
            target,
            check_interval_seconds: parsed_var("CHECK_INTERVAL_SECONDS", 600)?,
            smtp: SmtpConfig {
                host: required("SMTP_HOST")?,
                // 587 (STARTTLS) is what most domestic providers expect
                port: parsed_var("SMTP_PORT", 587)?,
                user: required("SMTP_USER")?,
                pass: required("SMTP_PASS")?,
                from: required("SMTP_FROM")?,
                to: required("EMAIL_TO")?,
            },
            chrome_path: env::var("CHROME_PATH").unwrap_or_else(|_| default_chrome_path()),
            debug_dir: env::var("DEBUG_DIR")
                .unwrap_or_else(|_| "debug".to_string())
                .into(),
            alert_price: optional_parsed_var("ALERT_PRICE")?,
            data_file: env::var("DATA_FILE")
                .unwrap_or_else(|_| "data/last_price.json".to_string())
                .into(),
            logs_dir: env::var("LOGS_DIR")
                .unwrap_or_else(|_| "logs".to_string())
                .into(),
            require_confirmed_selection: flag_var("REQUIRE_CONFIRMED_SELECTION"),
        })
    }
}

fn default_chrome_path() -> String {
    if cfg!(target_os = "windows") {
        "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe".to_string()
    } else if cfg!(target_os = "macos") {
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".to_string()
    } else {
        "google-chrome".to_string()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn flag_var(name: &str) -> bool {
    env::var(name).map(|v| is_truthy(&v)).unwrap_or(false)
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "on")
}

fn parsed_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

fn optional_parsed_var(name: &'static str) -> Result<Option<f64>, ConfigError> {
    let raw = env::var(name).unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|e: std::num::ParseFloatError| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn date_var(name: &'static str, default: &str) -> Result<NaiveDate, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_iso_date(name, &raw)
}

pub(crate) fn parse_iso_date(name: &'static str, raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
