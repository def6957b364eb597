//! hpgat-cli：XPLR-HPG 板卡 AT 命令交互控制台
//!
//! 启动流程：加载命令模板与设备配置 -> 打开串口会话（后台监督线程
//! 负责重连与响应落盘）-> 进入交互菜单。退出时合拢监督线程。

mod actions;
mod config;
mod menu;

use anyhow::Result;
use clap::Parser;
use hpgat_api::{AtApi, TemplateStore};
use hpgat_serial::UartBackend;
use hpgat_session::{ChangeLogSink, SerialSession, SessionConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::actions::Actions;
use crate::config::DeviceConfig;

#[derive(Parser, Debug)]
#[command(name = "hpgat-cli", about = "Interactive AT command console for u-blox XPLR-HPG boards")]
struct Cli {
    /// 设备配置文件
    #[arg(long, default_value = "config/config.json")]
    config: PathBuf,

    /// AT 命令模板文件
    #[arg(long, default_value = "config/hpgApi.json")]
    api: PathBuf,

    /// 响应日志根目录
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let api = AtApi::new(TemplateStore::load(&cli.api)?);
    let device_config = DeviceConfig::load(&cli.config)?;
    let device = device_config.primary_device()?;

    info!(
        port = %device.serialport,
        baudrate = device.baudrate,
        "opening session for `{}`",
        device.description
    );

    let session_config = SessionConfig::new(&device.serialport, device.baudrate, device.timeout());
    let sink = Arc::new(ChangeLogSink::new(&cli.log_dir));
    let mut session = SerialSession::start(
        device.description.clone(),
        session_config,
        Arc::new(UartBackend::new()),
        sink,
    );

    let result = {
        let actions = Actions::new(&api, &session, &device_config);
        menu::run(&actions, &session)
    };

    session.shutdown();
    result
}
