//! 登录 ETL 服务主入口

use std::sync::Arc;

use login_etl::{
    config::AppConfig, db, error::EtlError, queue::SqsQueue, repository::PostgresStore,
    services::LoginEtlService, telemetry,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("login-etl {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    if let Ok(env) = std::env::var("LOGIN_ETL_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        EtlError::from(e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        queue_url = %config.queue.queue_url,
        table = %config.database.table,
        "Login ETL starting..."
    );

    // 3. 连接队列与数据库，失败即退出
    let queue = SqsQueue::connect(&config.queue).await;
    let pool = db::connect(&config.database).await?;

    let service = LoginEtlService::new(
        Arc::new(queue),
        Arc::new(PostgresStore::new(pool.clone())),
        config.database.table.clone(),
    );

    // 4. 停止信号
    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    // 5. 主循环
    let result = service.run(shutdown).await;
    pool.close().await;

    let stats = result?;
    tracing::info!(
        loaded = stats.loaded,
        dropped = stats.dropped,
        "Login ETL shutdown complete"
    );
    Ok(())
}

/// 收到 Ctrl+C 或 SIGTERM 后取消令牌
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, finishing current message");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, finishing current message");
        },
    }

    token.cancel();
}

/// 打印帮助信息
fn print_help() {
    println!("login-etl {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: login-etl [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 LOGIN_ETL_ 前缀的环境变量完成，例如:");
    println!("  LOGIN_ETL_QUEUE__QUEUE_URL, LOGIN_ETL_DATABASE__HOST, LOGIN_ETL_DATABASE__TABLE");
}
