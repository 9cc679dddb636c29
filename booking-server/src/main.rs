use booking_server::{Config, Server, init_logger, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载配置 (.env + 环境变量)
    let config = Config::from_env()?;

    // 2. 日志
    init_logger(Some(&config.log_level), config.log_dir.as_deref());

    print_banner();
    tracing::info!(
        environment = %config.environment,
        timezone = %config.timezone,
        backend = ?config.store_backend,
        "🍽  Booking server starting..."
    );

    // 3. 启动服务器 (Server::run 会初始化状态并启动后台任务)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
