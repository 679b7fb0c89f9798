use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult, BrowserError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 浏览器启动参数
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// 不显示浏览器窗口
    pub headless: bool,
    /// 浏览器命令超时
    pub timeout: Duration,
    /// 指定可执行文件，否则自动查找
    pub executable: Option<PathBuf>,
}

/// 启动浏览器并打开空白页
///
/// # 返回
/// 浏览器、后台事件处理任务、页面
pub async fn launch_browser(options: &BrowserOptions) -> AppResult<(Browser, JoinHandle<()>, Page)> {
    info!(
        "🚀 启动浏览器 ({})...",
        if options.headless { "无头模式" } else { "可视模式" }
    );

    let mut builder = BrowserConfig::builder()
        .window_size(1280, 720)
        .request_timeout(options.timeout)
        .args(vec![
            format!("--user-agent={}", USER_AGENT),
            "--disable-dev-shm-usage".to_string(),
            "--no-first-run".to_string(),
        ]);

    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(executable) = resolve_executable(options.executable.as_deref()) {
        debug!("使用浏览器: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AppError::Browser(BrowserError::ConfigurationFailed { reason: e })
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(BrowserError::LaunchFailed { source: e })
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        e
    })?;
    debug!("新页面已创建");

    Ok((browser, handle, page))
}

/// 查找浏览器可执行文件
///
/// 优先使用显式指定的路径；否则依次检查常见安装位置（包括 Nix profile）。
/// 都不存在时返回 None，交给 chromiumoxide 自行检测。
pub fn resolve_executable(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    candidate_paths().into_iter().find(|p| p.exists())
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(user) = std::env::var("USER") {
        paths.push(PathBuf::from(format!("/etc/profiles/per-user/{}/bin/google-chrome-stable", user)));
        paths.push(PathBuf::from(format!("/etc/profiles/per-user/{}/bin/chromium", user)));
    }
    for p in [
        "/run/current-system/sw/bin/chromium",
        "/run/current-system/sw/bin/google-chrome-stable",
    ] {
        paths.push(PathBuf::from(p));
    }
    if let Ok(home) = std::env::var("HOME") {
        for bin in ["chromium", "google-chrome-stable", "chrome"] {
            paths.push(Path::new(&home).join(".nix-profile/bin").join(bin));
        }
    }
    for p in [
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ] {
        paths.push(PathBuf::from(p));
    }

    paths
}
