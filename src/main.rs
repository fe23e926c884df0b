//! # GameStats Proxy 主程序
//!
//! 加载配置，启动函数服务器，收到 Ctrl-C 后优雅退出

use clap::Parser;
use gamestats_proxy::{
    FunctionServer, ProxyError, Result,
    config::ConfigManager,
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
};
use std::path::PathBuf;

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "gamestats-proxy", version, about)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 日志级别（RUST_LOG 优先）
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// 打印生效配置（敏感字段遮盖）后退出
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    logging::init_optimized_logging(cli.log_level.as_deref());

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let manager = ConfigManager::load(cli.config.as_deref())?;

    if cli.print_config {
        let rendered = toml::to_string_pretty(&manager.config().masked())
            .map_err(|e| ProxyError::internal_with_source("配置序列化失败", e))?;
        let source = manager
            .source()
            .map_or_else(|| "内置默认值".to_string(), |path| path.display().to_string());
        println!("# 来源: {source}，环境变量覆盖: {}", manager.override_count());
        println!("{rendered}");
        return Ok(());
    }

    let server = FunctionServer::new(manager.config())?;
    server.serve(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lerror!(
            "system",
            LogStage::Shutdown,
            LogComponent::Main,
            "signal_listen_failed",
            &format!("无法监听关闭信号: {e}")
        );
        std::future::pending::<()>().await;
    }
    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "shutdown_signal",
        "收到关闭信号，等待进行中的请求完成"
    );
}
