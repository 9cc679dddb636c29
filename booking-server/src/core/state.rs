//! 服务器状态
//!
//! `ServerState` 可廉价 Clone，所有服务以 `Arc` 共享。

use std::sync::Arc;
use std::time::Instant;

use chrono_tz::Tz;

use super::{Config, Result, ServerError, StoreBackend};
use crate::bot::{ChatTransport, Notifier, SessionStore, TelegramClient};
use crate::booking::{BookingService, WaitlistRegister};
use crate::calendar::{CalendarService, DisabledCalendar, GoogleCalendar};
use crate::capacity::{AdmissionController, CapacityLedger, CapacitySettings};
use crate::google::{ServiceAccountAuth, ServiceAccountKey};
use crate::reservations::{ArrivalTracker, ReservationWriter, SchemaRegistry};
use crate::store::{MemoryStore, ReservationStore, SheetsStore};

#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Arc<Config>,
    /// 预订存储 (Sheets / Memory)
    pub store: Arc<dyn ReservationStore>,
    /// 营业时段与全局线上开关
    pub settings: Arc<CapacitySettings>,
    pub ledger: CapacityLedger,
    /// 表头能力缓存
    pub schema: Arc<SchemaRegistry>,
    /// 准入 + 写入 + 候补
    pub booking: Arc<BookingService>,
    pub arrivals: ArrivalTracker,
    pub sessions: Arc<SessionStore>,
    pub notifier: Notifier,
    /// 机器人未配置时为 None
    pub telegram: Option<Arc<TelegramClient>>,
    pub started_at: Instant,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. HTTP 客户端 (统一超时)
    /// 2. Google 凭据 (google 后端或配置了日历时)
    /// 3. 存储 + 表头探测 (失败即退出)
    /// 4. 日历镜像、Telegram 客户端
    pub async fn initialize(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.external_timeout)
            .build()?;

        let needs_google = config.store_backend == StoreBackend::Google || config.calendar_id.is_some();
        let auth = if needs_google {
            let key = load_service_account(config).await?;
            tracing::info!(client = %key.client_email, "Loaded Google service account");
            Some(Arc::new(ServiceAccountAuth::new(key, http.clone())?))
        } else {
            None
        };

        let store: Arc<dyn ReservationStore> = match (config.store_backend, &auth) {
            (StoreBackend::Google, Some(auth)) => {
                let sheet_id = config
                    .sheet_id
                    .clone()
                    .ok_or(ServerError::Config(super::ConfigError::Missing("SHEET_ID")))?;
                Arc::new(SheetsStore::new(http.clone(), auth.clone(), sheet_id, &config.sheet_name))
            }
            _ => {
                tracing::warn!("Using in-memory reservation store, data is lost on restart");
                Arc::new(MemoryStore::full())
            }
        };

        let calendar: Arc<dyn CalendarService> = match (&config.calendar_id, &auth) {
            (Some(id), Some(auth)) => Arc::new(GoogleCalendar::new(http.clone(), auth.clone(), id)),
            _ => {
                tracing::info!("No CALENDAR_ID, calendar mirror disabled");
                Arc::new(DisabledCalendar)
            }
        };

        let telegram = config
            .telegram_bot_token
            .as_ref()
            .map(|token| Arc::new(TelegramClient::new(http.clone(), token)));
        let transport = telegram
            .clone()
            .map(|client| client as Arc<dyn ChatTransport>);

        let mut state = Self::with_components(config.clone(), store, calendar, transport).await?;
        state.telegram = telegram;
        Ok(state)
    }

    /// Assemble the state around given adapters
    pub async fn with_components(
        config: Config,
        store: Arc<dyn ReservationStore>,
        calendar: Arc<dyn CalendarService>,
        transport: Option<Arc<dyn ChatTransport>>,
    ) -> Result<Self> {
        let tz = config.timezone;
        let schema = Arc::new(SchemaRegistry::probe(store.clone()).await?);
        let settings = Arc::new(CapacitySettings::new(config.service_windows.clone()));
        let ledger = CapacityLedger::new(store.clone(), tz);

        let admission =
            AdmissionController::new(settings.clone(), ledger.clone(), config.capacity_read_failure);
        let writer = Arc::new(ReservationWriter::new(
            store.clone(),
            calendar,
            config.reservation_duration,
            tz.name(),
        ));
        let booking = Arc::new(BookingService::new(
            admission,
            writer,
            Arc::new(WaitlistRegister::new()),
        ));
        let arrivals = ArrivalTracker::new(store.clone(), ledger.clone(), settings.clone(), schema.clone());

        let notifier = match transport {
            Some(transport) => Notifier::new(transport, config.telegram_chat_id),
            None => Notifier::disabled(),
        };

        Ok(Self {
            sessions: Arc::new(SessionStore::new(config.session_ttl)),
            config: Arc::new(config),
            store,
            settings,
            ledger,
            schema,
            booking,
            arrivals,
            notifier,
            telegram: None,
            started_at: Instant::now(),
        })
    }

    pub fn tz(&self) -> Tz {
        self.config.timezone
    }

    pub fn calendar(&self) -> &Arc<dyn CalendarService> {
        self.booking.writer().calendar()
    }

    pub fn waitlist(&self) -> &Arc<WaitlistRegister> {
        self.booking.waitlist()
    }
}

/// Inline `GOOGLE_CREDENTIALS` wins over the credentials file
async fn load_service_account(config: &Config) -> Result<ServiceAccountKey> {
    let json = match &config.google_credentials {
        Some(inline) => inline.clone(),
        None => tokio::fs::read_to_string(&config.google_credentials_path)
            .await
            .map_err(|e| {
                ServerError::Credentials(format!(
                    "cannot read {}: {e}",
                    config.google_credentials_path
                ))
            })?,
    };
    Ok(ServiceAccountKey::from_json(&json)?)
}
