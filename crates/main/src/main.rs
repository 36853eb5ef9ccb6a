//! 主应用程序入口
//!
//! 加载配置、连接数据库并启动 Axum Web API 服务。

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use application::{
    services::{InboxService, InboxServiceDependencies, UserService, UserServiceDependencies},
    SystemClock,
};
use clap::Parser;
use config::AppConfig;
use infrastructure::{Infrastructure, InfrastructureConfig};
use tracing_subscriber::EnvFilter;
use web_api::{app, AppState, JwtService};

/// 收件箱服务
#[derive(Debug, Parser)]
#[command(name = "inbox", version, about = "Inbox API server", long_about = None)]
struct Cli {
    /// 配置文件路径，未指定时读取 etc/inbox-api.yaml（若存在）
    #[arg(short = 'f', long = "config", env = "INBOX_CONFIG")]
    config: Option<PathBuf>,
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "监听退出信号失败");
    }
    tracing::info!("收到退出信号，开始优雅关闭");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;
    tracing::info!(config = %config.sanitize(), "配置加载完成");

    let infrastructure = Infrastructure::connect(InfrastructureConfig::from(&config))
        .await
        .context("初始化数据库失败")?;

    let jwt_service = Arc::new(JwtService::new(&config.jwt));

    // 创建应用层服务
    let user_service = UserService::new(UserServiceDependencies {
        user_repository: infrastructure.user_repository(),
        password_hasher: infrastructure.password_hasher_trait(),
        token_service: jwt_service.clone(),
    });
    let inbox_service = InboxService::new(InboxServiceDependencies {
        message_repository: infrastructure.message_repository(),
        clock: Arc::new(SystemClock),
    });

    let state = AppState::new(Arc::new(user_service), Arc::new(inbox_service), jwt_service);
    let app = app(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法监听 {address}"))?;

    tracing::info!("收件箱服务启动在 http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
