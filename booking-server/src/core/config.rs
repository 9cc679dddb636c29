use std::str::FromStr;
use std::time::Duration;

use chrono::Weekday;
use chrono_tz::Tz;
use shared::ServiceWindow;
use thiserror::Error;

use crate::capacity::CapacityReadFailure;
use crate::utils::time::parse_weekdays;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Missing required setting {0}")]
    Missing(&'static str),
}

/// Reservation store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Google,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "sheets" => Ok(Self::Google),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected google or memory, got {other:?}")),
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | TIMEZONE | Europe/Paris | 营业时区 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (按天滚动) |
/// | SERVICE_WINDOWS | lunch:12-14:60,dinner:19-22:70 | 营业时段 `name:start-end:capacity` |
/// | CLOSED_WEEKDAYS | sun,mon | 日期选择器隐藏的星期 |
/// | RESERVATION_DURATION_MINUTES | 120 | 日历事件时长 |
/// | SESSION_TTL_SECS | 1800 | 对话会话过期时间 |
/// | EXTERNAL_TIMEOUT_MS | 10000 | 外部调用超时 |
/// | CAPACITY_READ_FAILURE | reject | 容量读取失败策略 (reject / assume_empty) |
/// | STORE_BACKEND | google | 存储后端 (google / memory) |
/// | SHEET_ID | - | Google Sheets 表格 ID |
/// | SHEET_NAME | Sheet1 | 工作表名 |
/// | CALENDAR_ID | - | Google Calendar ID (不设则不镜像) |
/// | GOOGLE_CREDENTIALS | - | 服务账号 JSON (内联) |
/// | GOOGLE_CREDENTIALS_PATH | credentials.json | 服务账号 JSON 文件 |
/// | TELEGRAM_BOT_TOKEN | - | Bot token (不设则不启动机器人) |
/// | TELEGRAM_CHAT_ID | - | 员工通知群 |
/// | TELEGRAM_RESTRICT_CHAT | false | 只响应员工群 |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    /// development | production
    pub environment: String,
    pub timezone: Tz,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub service_windows: Vec<ServiceWindow>,
    pub closed_weekdays: Vec<Weekday>,
    pub reservation_duration: chrono::Duration,
    pub session_ttl: Duration,
    pub external_timeout: Duration,
    pub capacity_read_failure: CapacityReadFailure,
    pub store_backend: StoreBackend,
    pub sheet_id: Option<String>,
    pub sheet_name: String,
    pub calendar_id: Option<String>,
    pub google_credentials: Option<String>,
    pub google_credentials_path: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub telegram_restrict_chat: bool,
}

const DEFAULT_WINDOWS: &str = "lunch:12-14:60,dinner:19-22:70";

impl Config {
    /// 加载 `.env` 后从环境变量读取配置
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            http_port: parse_or(&get, "HTTP_PORT", 3000)?,
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".into()),
            timezone: parse_or(&get, "TIMEZONE", chrono_tz::Europe::Paris)?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: get("LOG_DIR"),
            service_windows: parse_service_windows(
                &get("SERVICE_WINDOWS").unwrap_or_else(|| DEFAULT_WINDOWS.into()),
            )
            .map_err(|message| ConfigError::Invalid {
                key: "SERVICE_WINDOWS",
                message,
            })?,
            closed_weekdays: parse_weekdays(&get("CLOSED_WEEKDAYS").unwrap_or_else(|| "sun,mon".into()))
                .map_err(|message| ConfigError::Invalid {
                    key: "CLOSED_WEEKDAYS",
                    message,
                })?,
            reservation_duration: chrono::Duration::minutes(parse_or(
                &get,
                "RESERVATION_DURATION_MINUTES",
                120,
            )?),
            session_ttl: Duration::from_secs(parse_or(&get, "SESSION_TTL_SECS", 1800)?),
            external_timeout: Duration::from_millis(parse_or(&get, "EXTERNAL_TIMEOUT_MS", 10_000)?),
            capacity_read_failure: parse_or(&get, "CAPACITY_READ_FAILURE", CapacityReadFailure::Reject)?,
            store_backend: parse_or(&get, "STORE_BACKEND", StoreBackend::Google)?,
            sheet_id: get("SHEET_ID"),
            sheet_name: get("SHEET_NAME").unwrap_or_else(|| "Sheet1".into()),
            calendar_id: get("CALENDAR_ID"),
            google_credentials: get("GOOGLE_CREDENTIALS"),
            google_credentials_path: get("GOOGLE_CREDENTIALS_PATH")
                .unwrap_or_else(|| "credentials.json".into()),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID")
                .map(|v| {
                    v.parse().map_err(|_| ConfigError::Invalid {
                        key: "TELEGRAM_CHAT_ID",
                        message: format!("{v:?} is not a chat id"),
                    })
                })
                .transpose()?,
            telegram_restrict_chat: parse_or(&get, "TELEGRAM_RESTRICT_CHAT", false)?,
        };

        if config.store_backend == StoreBackend::Google && config.sheet_id.is_none() {
            return Err(ConfigError::Missing("SHEET_ID"));
        }
        if config.telegram_restrict_chat && config.telegram_chat_id.is_none() {
            return Err(ConfigError::Missing("TELEGRAM_CHAT_ID"));
        }
        Ok(config)
    }

    /// Memory store, no calendar, no bot. Used by tests and local runs.
    pub fn for_memory() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| (key == "STORE_BACKEND").then(|| "memory".to_string()))
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

/// `lunch:12-14:60,dinner:19-22:70`
pub fn parse_service_windows(value: &str) -> Result<Vec<ServiceWindow>, String> {
    let mut windows: Vec<ServiceWindow> = Vec::new();
    for spec in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mut parts = spec.split(':');
        let (Some(name), Some(hours), Some(capacity), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("{spec:?}: expected name:start-end:capacity"));
        };

        let name = name.trim().to_lowercase();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(format!("{spec:?}: invalid window name"));
        }
        let (start, end) = hours
            .split_once('-')
            .and_then(|(s, e)| Some((s.trim().parse::<u32>().ok()?, e.trim().parse::<u32>().ok()?)))
            .ok_or_else(|| format!("{spec:?}: invalid hour range"))?;
        if start > end || end > 23 {
            return Err(format!("{spec:?}: hours must satisfy start <= end <= 23"));
        }
        let capacity: u32 = capacity
            .trim()
            .parse()
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| format!("{spec:?}: capacity must be a positive integer"))?;
        if windows.iter().any(|w| w.name == name) {
            return Err(format!("duplicate window {name:?}"));
        }
        windows.push(ServiceWindow::new(name, start, end, capacity));
    }

    if windows.is_empty() {
        return Err("at least one service window is required".into());
    }
    Ok(windows)
}
