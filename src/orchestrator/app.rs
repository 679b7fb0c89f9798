//! 应用生命周期
//!
//! 初始化（配置、选择器、日志）→ 询问操作员 → 启动浏览器 → 批量处理 → 汇总

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::browser::{launch_browser, BrowserOptions};
use crate::cli::Cli;
use crate::config::Config;
use crate::infrastructure::{CdpPortal, JsExecutor};
use crate::models::{load_selectors, Selectors};
use crate::orchestrator::batch_processor::BatchOrchestrator;
use crate::services::{InputService, SessionStore};
use crate::utils::logging::{self, print_final_stats, LogHandle, LogOptions};

/// 应用主结构
pub struct App {
    cli: Cli,
    config: Config,
    selectors: Selectors,
    log: LogHandle,
}

impl App {
    /// 初始化应用
    ///
    /// 配置或选择器文件有问题时直接返回错误，此时还没有启动浏览器
    pub fn initialize(cli: Cli) -> Result<Self> {
        let config = Config::from_env().context("配置加载失败")?;

        let log = logging::init(&LogOptions {
            dir: config.log_dir.clone(),
            level: config.log_level.clone(),
            verbose: cli.debug,
        })?;

        let selectors = load_selectors(&config.selectors_path)
            .with_context(|| format!("选择器文件无效: {}", config.selectors_path.display()))?;

        logging::log_startup(&config.base_url, cli.headless);

        Ok(Self {
            cli,
            config,
            selectors,
            log,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let (identifiers, tag) = {
            let mut input = InputService::stdio();
            let identifiers = input.ask_identifiers()?;
            let tag = input.select_tag()?;
            if !input.confirm_execution(identifiers.len())? {
                info!("操作员取消，未处理任何流程");
                return Ok(());
            }
            (identifiers, tag)
        };

        let options = BrowserOptions {
            headless: self.cli.headless,
            timeout: std::time::Duration::from_millis(self.config.timeout_ms),
            executable: self.config.chrome_executable.clone(),
        };
        let (browser, handler, page) = launch_browser(&options).await?;
        let portal = CdpPortal::new(
            browser,
            handler,
            JsExecutor::new(page),
            self.config.screenshot_dir.clone(),
        );

        let store = SessionStore::new(self.config.session_path.clone());
        let report = BatchOrchestrator::new(&portal, &self.config, &self.selectors, &store)
            .run(&identifiers, tag)
            .await;

        print_final_stats(&report, &self.log.path);

        if report.aborted {
            bail!("登录失败，未处理任何流程");
        }
        Ok(())
    }
}
