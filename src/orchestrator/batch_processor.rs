//! 批量流程处理器 - 编排层
//!
//! 登录一次，然后按输入顺序逐个处理流程。每个流程的处理都有重试，
//! 单个流程的失败不会影响后面的流程。登录失败则整批中止。

use chrono::Local;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::PortalDriver;
use crate::models::{BatchReport, RecordOutcome, Selectors, Tag};
use crate::services::{AuthService, SessionStore};
use crate::utils::logging::{log_batch_start, log_record_result, log_record_start};
use crate::utils::retry::RetryPolicy;
use crate::workflow::{classify, RecordCtx, RecordFlow};

/// 批量处理器
///
/// 不持有浏览器，结束时负责关闭 driver
pub struct BatchOrchestrator<'a> {
    driver: &'a dyn PortalDriver,
    config: &'a Config,
    selectors: &'a Selectors,
    store: &'a SessionStore,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        driver: &'a dyn PortalDriver,
        config: &'a Config,
        selectors: &'a Selectors,
        store: &'a SessionStore,
    ) -> Self {
        Self {
            driver,
            config,
            selectors,
            store,
        }
    }

    /// 为所有流程添加标签
    ///
    /// # 返回
    /// 与输入顺序一一对应的结果；登录失败时返回中止的空报告
    pub async fn run(&self, identifiers: &[String], tag: Tag) -> BatchReport {
        let started_at = Local::now();

        let auth = AuthService::new(self.driver, self.config, self.selectors, self.store);
        if !auth.login().await {
            error!("❌ 登录失败，终止本次运行");
            self.shutdown().await;
            return BatchReport::aborted(started_at);
        }

        let outcomes = self.process_all(identifiers, tag).await;

        self.shutdown().await;
        BatchReport::completed(outcomes, started_at)
    }

    async fn process_all(&self, identifiers: &[String], tag: Tag) -> Vec<RecordOutcome> {
        let total = identifiers.len();
        log_batch_start(total, tag);

        let flow = RecordFlow::new(self.driver, self.selectors, self.config);
        let policy = RetryPolicy::new(self.config.retry);
        let mut outcomes = Vec::with_capacity(total);

        for (index, identifier) in identifiers.iter().enumerate() {
            let ctx = RecordCtx::new(identifier.as_str(), index + 1, total);
            log_record_start(&ctx);

            let outcome = RecordOutcome::begin(identifier.as_str());
            let label = format!("流程 {}", identifier);
            let result = policy
                .execute(|| flow.try_process(&ctx, tag), &label)
                .await;
            let outcome = classify(outcome, result);

            log_record_result(&ctx, &outcome);
            outcomes.push(outcome);
        }

        info!("🏁 全部 {} 个流程处理结束", total);
        outcomes
    }

    async fn shutdown(&self) {
        if let Err(e) = self.driver.close().await {
            warn!("关闭浏览器时出错: {}", e);
        }
    }
}
