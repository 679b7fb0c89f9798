//! 流程打标签 - 流程层
//!
//! 核心职责：定义"一个流程"的完整处理流程
//!
//! 流程顺序：
//! 1. 搜索流程号并打开
//! 2. 已有该标签 → 跳过
//! 3. 打开"管理标签" → 选择标签 → 填写备注 → 保存
//! 4. 再次检查标签；无法确认时仍按成功处理
//! 5. 分配标签（SGP）→ 把流程分配给指定用户，失败只记警告

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{frame_named, screenshot_best_effort, Frame, PortalDriver};
use crate::models::{RecordOutcome, Selectors, Tag};
use crate::utils::strategy::{find_first, first_matching};
use crate::workflow::record_ctx::RecordCtx;

/// 已有标签时的说明
pub const ALREADY_PRESENT: &str = "tag already present";

const SEARCH_FIELD_WAIT: Duration = Duration::from_secs(10);
const CONTENT_FRAME_WAIT: Duration = Duration::from_secs(5);
const FORM_WAIT: Duration = Duration::from_secs(5);
const CONTROL_WAIT: Duration = Duration::from_secs(3);
const NOTE_WAIT: Duration = Duration::from_secs(2);
const SETTLE_WAIT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 单次处理的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagResult {
    /// 标签已添加
    Applied,
    /// 流程上已有该标签
    AlreadyPresent,
}

/// 把单次处理结果写入 outcome
pub fn classify(outcome: RecordOutcome, result: AppResult<TagResult>) -> RecordOutcome {
    match result {
        Ok(TagResult::Applied) => outcome.succeed(),
        Ok(TagResult::AlreadyPresent) => outcome.skip(ALREADY_PRESENT),
        Err(e) => outcome.fail(e.to_string()),
    }
}

/// 流程打标签
///
/// - 只处理单个流程
/// - 不持有浏览器，只通过 `PortalDriver` 操作页面
/// - 不关心批次和重试
pub struct RecordFlow<'a> {
    driver: &'a dyn PortalDriver,
    selectors: &'a Selectors,
    assignee: String,
    note: String,
    page_timeout: Duration,
}

impl<'a> RecordFlow<'a> {
    pub fn new(driver: &'a dyn PortalDriver, selectors: &'a Selectors, config: &Config) -> Self {
        Self {
            driver,
            selectors,
            assignee: config.assignee.clone(),
            note: config.tag_note.clone(),
            page_timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// 处理一个流程，所有错误都记录在返回的结果中
    pub async fn process(&self, ctx: &RecordCtx, tag: Tag) -> RecordOutcome {
        let outcome = RecordOutcome::begin(&ctx.identifier);
        classify(outcome, self.try_process(ctx, tag).await)
    }

    /// 处理一个流程，失败时返回错误（供重试使用）
    pub async fn try_process(&self, ctx: &RecordCtx, tag: Tag) -> AppResult<TagResult> {
        debug!("{} 开始添加标签 {}", ctx, tag);

        match self.apply(ctx, tag).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("{} ❌ 处理失败: {}", ctx, e);
                screenshot_best_effort(self.driver, &format!("error-{}", ctx.identifier)).await;
                Err(e)
            }
        }
    }

    async fn apply(&self, ctx: &RecordCtx, tag: Tag) -> AppResult<TagResult> {
        self.navigate(ctx).await?;

        if self.has_tag(tag).await {
            info!("{} 标签 {} 已存在，跳过", ctx, tag);
            return Ok(TagResult::AlreadyPresent);
        }

        self.add_tag(ctx, tag).await?;
        info!("{} ✓ 标签 {} 已添加", ctx, tag);

        if tag.requires_assignment() {
            info!("{} 分配给用户 {}", ctx, self.assignee);
            match self.assign(ctx).await {
                Ok(()) => info!("{} ✓ 已分配给 {}", ctx, self.assignee),
                Err(e) => {
                    warn!("{} ⚠️ 分配失败，但标签已添加: {}", ctx, e);
                    screenshot_best_effort(self.driver, &format!("error-atribuir-{}", ctx.identifier))
                        .await;
                }
            }
        }

        Ok(TagResult::Applied)
    }

    /// 通过快速搜索打开流程
    async fn navigate(&self, ctx: &RecordCtx) -> AppResult<()> {
        let main = Frame::main();
        let search_field = &self.selectors.record.search_field;
        debug!("{} 搜索流程", ctx);

        self.driver
            .wait_for(&main, search_field, SEARCH_FIELD_WAIT)
            .await?;
        self.driver.fill(&main, search_field, &ctx.identifier).await?;
        self.driver.mark_document().await?;
        self.driver.press_enter(&main, search_field).await?;
        if let Err(e) = self.driver.wait_for_navigation(self.page_timeout).await {
            warn!("{} 搜索后页面没有跳转，继续: {}", ctx, e);
        }
        self.driver.wait_for_network_idle(self.page_timeout).await?;

        // 内容 frame 加载超时不算失败
        let content = &self.selectors.frames.content;
        let ready = match frame_named(self.driver, content).await {
            Ok(Some(frame)) => self
                .driver
                .wait_for(&frame, "body", CONTENT_FRAME_WAIT)
                .await
                .is_ok(),
            _ => false,
        };
        if ready {
            debug!("{} frame {} 已加载", ctx, content);
        } else {
            warn!("{} 等待 frame {} 超时，继续处理", ctx, content);
        }
        Ok(())
    }

    /// 流程上是否已有该标签（检查所有 frame）
    ///
    /// 读取出错时视为没有
    pub async fn has_tag(&self, tag: Tag) -> bool {
        let frames = match self.driver.frames().await {
            Ok(frames) => frames,
            Err(e) => {
                warn!("读取已有标签出错，视为没有该标签: {}", e);
                return false;
            }
        };

        let mut existing = Vec::new();
        for frame in &frames {
            match self.driver.texts(frame, &self.selectors.record.tag_list).await {
                Ok(texts) => existing.extend(texts),
                Err(e) => debug!("frame {} 读取标签失败: {}", frame, e),
            }
        }

        let present = existing.iter().any(|t| tag.matches_text(t));
        debug!("已有标签: {:?}, 包含 {}: {}", existing, tag, present);
        present
    }

    async fn add_tag(&self, ctx: &RecordCtx, tag: Tag) -> AppResult<()> {
        let record = &self.selectors.record;

        // 1. "管理标签"链接所在的 frame 不固定，逐个查找
        let Some(link_frame) = self.locate(&record.tag_manager_link, CONTROL_WAIT).await? else {
            screenshot_best_effort(self.driver, "gerenciar-marcador-not-found").await;
            return Err(AppError::control_not_found("管理标签"));
        };
        debug!("{} 在 frame {} 中找到管理标签链接", ctx, link_frame);
        self.driver.click(&link_frame, &record.tag_manager_link).await?;

        // 2. 标签表单
        let Some(form) = self.locate(&record.tag_form, FORM_WAIT).await? else {
            screenshot_best_effort(self.driver, "form-marcador-not-found").await;
            return Err(AppError::control_not_found("标签表单"));
        };
        debug!("{} 标签表单在 frame {}", ctx, form);

        // 3. 选择标签
        if let Some(dropdown) = record.tag_dropdown.as_deref() {
            self.driver.wait_for(&form, dropdown, CONTROL_WAIT).await?;
            self.driver.click(&form, dropdown).await?;
        }
        if !self
            .driver
            .click_by_text(&form, &record.tag_option, tag.label())
            .await?
        {
            return Err(AppError::option_not_found("标签下拉框", tag.label()));
        }

        // 4. 备注（可选）
        if let Some(note_field) = record.tag_note.as_deref() {
            let filled = async {
                self.driver.wait_for(&form, note_field, NOTE_WAIT).await?;
                self.driver.fill(&form, note_field, &self.note).await
            }
            .await;
            if let Err(e) = filled {
                warn!("{} 备注框不可用，不填写备注: {}", ctx, e);
            }
        }

        // 5. 保存
        self.save(&form).await.inspect_err(|_| {
            warn!("{} 没有找到保存按钮", ctx);
        })?;

        if let Err(e) = self.driver.wait_for_network_idle(SETTLE_WAIT).await {
            debug!("{} 保存后等待网络空闲超时，继续: {}", ctx, e);
        }

        // 6. 确认
        if self.has_tag(tag).await {
            debug!("{} 已确认标签 {} 存在", ctx, tag);
        } else {
            warn!(
                "{} ⚠️ 无法确认标签 {} 已添加，保存操作已完成，按成功处理",
                ctx, tag
            );
        }
        Ok(())
    }

    /// 按顺序尝试保存按钮，第一个存在的被点击
    async fn save(&self, form: &Frame) -> AppResult<()> {
        let buttons = &self.selectors.record.save_buttons;
        let driver = self.driver;

        if let Some(first) = buttons.first() {
            let _ = driver.wait_for(form, first, CONTROL_WAIT).await;
        }

        let result = first_matching("保存按钮", buttons, move |selector| async move {
            if driver.count(form, selector).await? == 0 {
                return Ok::<_, AppError>(None);
            }
            driver.click(form, selector).await?;
            Ok(Some(()))
        })
        .await;

        match result {
            Ok((selector, ())) => {
                debug!("已点击保存按钮: {}", selector);
                Ok(())
            }
            Err(e) => {
                screenshot_best_effort(driver, "salvar-button-not-found").await;
                Err(e)
            }
        }
    }

    /// 把流程分配给配置的用户
    async fn assign(&self, ctx: &RecordCtx) -> AppResult<()> {
        let record = &self.selectors.record;
        let button = required(record.assign_button.as_deref(), "分配流程按钮")?;
        let select = required(record.assign_select.as_deref(), "分配下拉框")?;
        let save = required(record.assign_save_button.as_deref(), "分配保存按钮")?;

        let button_frame = self
            .locate(button, CONTROL_WAIT)
            .await?
            .ok_or_else(|| AppError::control_not_found("分配流程"))?;
        self.driver.click(&button_frame, button).await?;
        debug!("{} 已点击分配按钮", ctx);

        let form = self
            .locate(select, FORM_WAIT)
            .await?
            .ok_or_else(|| AppError::control_not_found("分配下拉框"))?;

        let value = self
            .driver
            .option_value_by_text(&form, select, &self.assignee)
            .await?
            .ok_or_else(|| AppError::option_not_found("分配下拉框", self.assignee.as_str()))?;
        self.driver.select_by_value(&form, select, &value).await?;
        debug!("{} 已选择用户 {}", ctx, self.assignee);

        self.driver.wait_for(&form, save, CONTROL_WAIT).await?;
        self.driver.click(&form, save).await?;

        if let Err(e) = self.driver.wait_for_network_idle(SETTLE_WAIT).await {
            debug!("{} 分配后等待网络空闲超时，继续: {}", ctx, e);
        }
        Ok(())
    }

    /// 在所有 frame 中查找包含 `selector` 的第一个，最多等待 `wait`
    async fn locate(&self, selector: &str, wait: Duration) -> AppResult<Option<Frame>> {
        let driver = self.driver;
        let deadline = Instant::now() + wait;

        loop {
            let frames = driver.frames().await?;
            let found = find_first(&frames, move |frame| async move {
                Ok::<_, AppError>(driver.count(frame, selector).await? > 0)
            })
            .await;

            if let Some(frame) = found {
                return Ok(Some(frame.clone()));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

fn required<'s>(selector: Option<&'s str>, control: &str) -> AppResult<&'s str> {
    selector
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::control_not_found(format!("{}（未配置选择器）", control)))
}
