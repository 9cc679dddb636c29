//! Server Implementation
//!
//! HTTP 服务器、Telegram 轮询与定期清理任务的启动和关闭

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api;
use crate::bot::{BotRouter, TelegramPoller};
use crate::core::{Config, Result, ServerState};
use crate::utils::time;

/// 会话 / 准入锁清理间隔
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let shutdown = CancellationToken::new();
        start_background_tasks(&state, shutdown.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("🍽  Booking server listening on {}", addr);

        let app = api::build_app(state);
        let token = shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down..."),
                    _ = token.cancelled() => {}
                }
            })
            .await?;

        shutdown.cancel();
        Ok(())
    }
}

/// 启动后台任务
///
/// - Telegram 长轮询 (配置了 token 时)
/// - 过期会话与过往日期准入锁的定期清理
pub fn start_background_tasks(state: &ServerState, shutdown: CancellationToken) {
    match &state.telegram {
        Some(client) => {
            let poller = TelegramPoller::new(client.clone(), BotRouter::new(state.clone()), shutdown.clone());
            tokio::spawn(poller.run());
        }
        None => tracing::info!("No TELEGRAM_BOT_TOKEN, chat bot disabled"),
    }

    let state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => run_maintenance(&state),
                _ = shutdown.cancelled() => {
                    tracing::debug!("Maintenance task stopped");
                    return;
                }
            }
        }
    });
}

fn run_maintenance(state: &ServerState) {
    let expired = state.sessions.sweep();
    let pruned = state.booking.prune_locks_before(time::today(state.tz()));
    if expired > 0 || pruned > 0 {
        tracing::debug!(expired, pruned, "Maintenance sweep");
    }
}
