/// 日志工具模块
///
/// 初始化控制台和文件日志，提供进度和汇总输出的辅助函数
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::models::{BatchReport, RecordOutcome, RecordStatus, Tag};
use crate::workflow::RecordCtx;

/// 日志选项
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// 日志文件目录
    pub dir: PathBuf,
    /// 控制台级别
    pub level: String,
    /// 调试模式，控制台输出 debug
    pub verbose: bool,
}

/// 日志句柄，丢弃时把文件缓冲写完
pub struct LogHandle {
    pub path: PathBuf,
    _guard: WorkerGuard,
}

/// 初始化日志
///
/// 每次运行写入一个新的日志文件 `sei-tags-<时间>.log`
pub fn init(options: &LogOptions) -> Result<LogHandle> {
    std::fs::create_dir_all(&options.dir)
        .with_context(|| format!("无法创建日志目录: {}", options.dir.display()))?;

    let file_name = log_file_name(chrono::Local::now());
    let appender = tracing_appender::rolling::never(&options.dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let level = if options.verbose {
        "debug"
    } else {
        options.level.as_str()
    };
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sei_tags={},chromiumoxide=warn", level)));
    let file_filter = EnvFilter::new("sei_tags=debug,chromiumoxide=warn");

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(console_filter))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter),
        )
        .try_init()
        .context("日志初始化失败")?;

    Ok(LogHandle {
        path: options.dir.join(file_name),
        _guard: guard,
    })
}

fn log_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("sei-tags-{}.log", now.format("%Y%m%d-%H%M%S"))
}

/// 记录程序启动信息
pub fn log_startup(base_url: &str, headless: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 SEI 流程标签 - 批量添加");
    info!("🌐 门户: {}", base_url);
    info!("🖥️ 浏览器: {}", if headless { "无头模式" } else { "可视模式" });
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
pub fn log_batch_start(total: usize, tag: Tag) {
    info!("📋 共 {} 个流程，标签: {}", total, tag);
}

/// 记录单个流程开始
pub fn log_record_start(ctx: &RecordCtx) {
    info!("\n{} {}", ctx, "─".repeat(30));
}

/// 记录单个流程结果
pub fn log_record_result(ctx: &RecordCtx, outcome: &RecordOutcome) {
    let message = outcome.error_message.as_deref().unwrap_or_default();
    match outcome.status {
        RecordStatus::Success => info!("{} ✅ 标签已添加", ctx),
        RecordStatus::Skipped => warn!("{} ⊘ {}", ctx, message),
        RecordStatus::Failed => error!("{} ❌ {}", ctx, message),
        RecordStatus::Pending => warn!("{} 仍在处理中", ctx),
    }
}

/// 打印最终统计信息
pub fn print_final_stats(report: &BatchReport, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 执行汇总");
    info!(
        "完成时间: {}",
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("流程总数:   {}", report.total());
    info!("✅ 成功:    {}", report.successful());
    info!("⊘ 已有标签: {}", report.skipped());
    info!("❌ 失败:    {}", report.failed());
    info!("总耗时:     {:.2}s", report.duration_secs());

    if report.failed() > 0 {
        info!("{}", "─".repeat(60));
        info!("失败的流程:");
        for outcome in report.failures() {
            error!(
                "  • {}: {}",
                outcome.identifier,
                outcome.error_message.as_deref().unwrap_or_default()
            );
        }
    }

    info!("{}", "=".repeat(60));
    info!("\n详细日志: {}", log_file_path.display());
}
