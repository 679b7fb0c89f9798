//! 登录服务 - 业务能力层
//!
//! 先尝试恢复保存的会话，失败再提交账号密码。登录结果是布尔值，
//! 不向外抛错，由编排层决定是否中止整批任务。

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{Frame, PortalDriver};
use crate::models::Selectors;
use crate::services::session_store::SessionStore;

/// 登录后等待页面跳转的上限
const POST_LOGIN_WAIT: Duration = Duration::from_secs(15);
/// 打开入口页后等待加载的上限
const PAGE_LOAD_WAIT: Duration = Duration::from_secs(10);

/// 登录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    SessionRestoreAttempted,
    CredentialSubmissionAttempted,
    Authenticated,
    Failed,
}

/// 登录服务
pub struct AuthService<'a> {
    driver: &'a dyn PortalDriver,
    config: &'a Config,
    selectors: &'a Selectors,
    store: &'a SessionStore,
    state: Mutex<AuthState>,
}

impl<'a> AuthService<'a> {
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
            state: Mutex::new(AuthState::Unauthenticated),
        }
    }

    /// 当前状态
    pub fn state(&self) -> AuthState {
        self.state.lock().map(|s| *s).unwrap_or(AuthState::Failed)
    }

    fn transition(&self, next: AuthState) {
        if let Ok(mut state) = self.state.lock() {
            debug!("登录状态: {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    /// 登录门户
    ///
    /// # 返回
    /// 是否已登录。流程中的任何错误都会被记录并返回 false
    pub async fn login(&self) -> bool {
        match self.run().await {
            Ok(true) => {
                self.transition(AuthState::Authenticated);
                true
            }
            Ok(false) => {
                self.transition(AuthState::Failed);
                false
            }
            Err(e) => {
                error!("登录过程中出错: {}", e);
                self.log_portal_error().await;
                self.transition(AuthState::Failed);
                false
            }
        }
    }

    async fn run(&self) -> AppResult<bool> {
        if self.restore_session().await? {
            info!("✓ 已通过保存的会话登录");
            return Ok(true);
        }

        self.submit_credentials().await?;

        if self.is_authenticated().await {
            info!("✓ 登录成功");
            self.persist_session().await;
            Ok(true)
        } else {
            error!("登录失败: 无法确认登录状态");
            if let Ok(url) = self.driver.current_url().await {
                debug!("当前地址: {}", url);
            }
            self.log_portal_error().await;
            Ok(false)
        }
    }

    /// 尝试用保存的 cookie 恢复会话
    async fn restore_session(&self) -> AppResult<bool> {
        self.transition(AuthState::SessionRestoreAttempted);

        let Some(snapshot) = self.store.load().await else {
            info!("没有保存的会话，使用账号密码登录");
            return Ok(false);
        };

        info!("找到保存的会话，尝试恢复");
        if let Err(e) = self.driver.import_session(&snapshot).await {
            warn!("保存的会话无法写入浏览器，使用账号密码登录: {}", e);
            return Ok(false);
        }
        self.open_entry_page().await?;

        if self.is_authenticated().await {
            Ok(true)
        } else {
            info!("保存的会话已失效，使用账号密码登录");
            Ok(false)
        }
    }

    async fn submit_credentials(&self) -> AppResult<()> {
        self.transition(AuthState::CredentialSubmissionAttempted);
        let login = &self.selectors.login;
        let main = Frame::main();

        info!("打开登录页");
        self.open_entry_page().await?;

        if let Some(orgao_select) = login.orgao_select.as_deref() {
            if self.driver.count(&main, orgao_select).await? > 0 {
                debug!("选择机构: {}", self.config.orgao);
                self.driver
                    .select_by_label(&main, orgao_select, &self.config.orgao)
                    .await?;
            }
        }

        debug!("填写账号密码");
        self.driver
            .fill(&main, &login.username_field, &self.config.username)
            .await?;
        self.driver
            .fill(&main, &login.password_field, &self.config.password)
            .await?;

        let login_url = self.driver.current_url().await.unwrap_or_default();
        if let Err(e) = self.driver.mark_document().await {
            debug!("标记登录页失败: {}", e);
        }

        if self.driver.count(&main, &login.submit_button).await? > 0 {
            self.driver.click(&main, &login.submit_button).await?;
        } else {
            warn!("没有找到登录按钮，在密码框中按回车");
            self.driver.press_enter(&main, &login.password_field).await?;
        }

        if !self.wait_after_submit(&login_url).await {
            warn!("等待登录跳转超时，继续检查登录状态");
        }
        if let Err(e) = self.driver.wait_for_network_idle(PAGE_LOAD_WAIT).await {
            debug!("登录后页面加载未完全结束，继续: {}", e);
        }
        Ok(())
    }

    /// 等待登录提交生效
    ///
    /// 离开登录文档 / 地址离开登录页 / 出现已登录页面的搜索框，任一发生即返回 true
    async fn wait_after_submit(&self, login_url: &str) -> bool {
        let navigation = async {
            self.driver.wait_for_navigation(POST_LOGIN_WAIT).await.ok()
        };
        let left_login_page = self.poll_until(move || async move {
            match self.driver.current_url().await {
                Ok(url) => url != login_url && !url.to_lowercase().contains("login"),
                Err(_) => false,
            }
        });
        let landed = self.poll_until(move || async move {
            matches!(
                self.driver
                    .count(&Frame::main(), &self.selectors.record.search_field)
                    .await,
                Ok(n) if n > 0
            )
        });

        let outcome = tokio::time::timeout(POST_LOGIN_WAIT, async {
            tokio::select! {
                Some(()) = navigation => true,
                Some(()) = left_login_page => true,
                Some(()) = landed => true,
                else => false,
            }
        })
        .await;
        outcome.unwrap_or(false)
    }

    /// 轮询直到条件成立；超过 `POST_LOGIN_WAIT` 返回 None
    async fn poll_until<F, Fut>(&self, mut check: F) -> Option<()>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let deadline = tokio::time::Instant::now() + POST_LOGIN_WAIT;
        while tokio::time::Instant::now() < deadline {
            if check().await {
                return Some(());
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        None
    }

    async fn open_entry_page(&self) -> AppResult<()> {
        self.driver.goto(&self.config.base_url).await?;
        if let Err(e) = self.driver.wait_for_network_idle(PAGE_LOAD_WAIT).await {
            debug!("入口页加载未完全结束，继续: {}", e);
        }
        Ok(())
    }

    /// 登录表单标记不存在即视为已登录
    pub async fn is_authenticated(&self) -> bool {
        match self
            .driver
            .count(&Frame::main(), &self.selectors.login.submit_button)
            .await
        {
            Ok(n) => n == 0,
            Err(e) => {
                warn!("检查登录状态出错: {}", e);
                false
            }
        }
    }

    async fn persist_session(&self) {
        let result = async {
            let snapshot = self.driver.export_session().await?;
            self.store.save(&snapshot).await
        }
        .await;

        match result {
            Ok(()) => info!("会话已保存到 {}，供下次使用", self.store.path().display()),
            Err(e) => warn!("保存会话失败（不影响本次运行）: {}", e),
        }
    }

    /// 记录门户页面上显示的错误信息
    async fn log_portal_error(&self) {
        let Some(selector) = self.selectors.login.error_message.as_deref() else {
            return;
        };
        if let Ok(Some(text)) = self.driver.text(&Frame::main(), selector).await {
            let text = text.trim();
            if !text.is_empty() {
                error!("门户错误信息: {}", text);
            }
        }
    }
}
