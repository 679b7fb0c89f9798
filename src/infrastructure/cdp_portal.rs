//! 基于 chromiumoxide 的 `PortalDriver` 实现
//!
//! 元素操作统一通过 `JsExecutor::eval_in_frame` 在目标 frame 的 document
//! 中执行；cookie、截图、导航走 CDP。

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Browser;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::portal::{Frame, PortalDriver};
use crate::models::{SessionSnapshot, StoredCookie};

/// 写在 window 上的旧文档标记，新文档没有它
const DOCUMENT_MARK: &str = "__seiTagsDocumentMark";
/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// 所有文档加载完成后再等待的静默时间
const IDLE_SETTLE: Duration = Duration::from_millis(500);

/// 真实浏览器上的门户页面
pub struct CdpPortal {
    executor: JsExecutor,
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    screenshot_dir: PathBuf,
}

impl CdpPortal {
    pub fn new(
        browser: Browser,
        handler: JoinHandle<()>,
        executor: JsExecutor,
        screenshot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handler)),
            screenshot_dir: screenshot_dir.into(),
        }
    }

    async fn in_frame<T: serde::de::DeserializeOwned>(
        &self,
        frame: &Frame,
        body: &str,
        args: serde_json::Value,
    ) -> AppResult<T> {
        self.executor.eval_in_frame(frame.index, body, args).await
    }

    /// 对第一个匹配元素执行 `action`，元素不存在时报错
    async fn with_element(
        &self,
        frame: &Frame,
        selector: &str,
        action: &str,
        extra: serde_json::Value,
    ) -> AppResult<()> {
        let body = format!(
            r#"
            const el = doc.querySelector(args.selector);
            if (!el) {{ return false; }}
            const extra = args.extra;
            {action}
            return true;
            "#,
            action = action
        );
        let found: bool = self
            .in_frame(frame, &body, json!({ "selector": selector, "extra": extra }))
            .await?;
        if found {
            Ok(())
        } else {
            Err(AppError::element_not_found(selector, frame.to_string()))
        }
    }
}

#[async_trait]
impl PortalDriver for CdpPortal {
    async fn goto(&self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        self.executor.page().goto(url).await.map_err(|e| {
            AppError::Browser(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn frames(&self) -> AppResult<Vec<Frame>> {
        let names = self.executor.frame_names().await?;
        Ok(names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Frame { index, name })
            .collect())
    }

    async fn count(&self, frame: &Frame, selector: &str) -> AppResult<usize> {
        self.in_frame(
            frame,
            "return doc.querySelectorAll(args.selector).length;",
            json!({ "selector": selector }),
        )
        .await
    }

    async fn wait_for(&self, frame: &Frame, selector: &str, wait: Duration) -> AppResult<()> {
        let deadline = Instant::now() + wait;
        loop {
            // frame 可能还在加载，脚本出错时继续轮询
            if let Ok(n) = self.count(frame, selector).await {
                if n > 0 {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(AppError::timeout(
                    format!("{} (frame: {})", selector, frame),
                    wait.as_millis() as u64,
                ));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, frame: &Frame, selector: &str) -> AppResult<()> {
        self.with_element(frame, selector, "el.click();", json!(null))
            .await
    }

    async fn fill(&self, frame: &Frame, selector: &str, value: &str) -> AppResult<()> {
        self.with_element(
            frame,
            selector,
            r#"
            el.focus();
            el.value = extra;
            el.dispatchEvent(new Event('input', { bubbles: true }));
            el.dispatchEvent(new Event('change', { bubbles: true }));
            "#,
            json!(value),
        )
        .await
    }

    async fn press_enter(&self, frame: &Frame, selector: &str) -> AppResult<()> {
        if frame.is_main() {
            // 顶层页面用真实按键，触发页面自己的 onkeypress
            let element = self.executor.page().find_element(selector).await?;
            element.press_key("Enter").await?;
            return Ok(());
        }

        self.with_element(
            frame,
            selector,
            r#"
            for (const type of ['keydown', 'keypress', 'keyup']) {
                el.dispatchEvent(new KeyboardEvent(type, { key: 'Enter', code: 'Enter', keyCode: 13, which: 13, bubbles: true }));
            }
            if (el.form) {
                if (el.form.requestSubmit) { el.form.requestSubmit(); } else { el.form.submit(); }
            }
            "#,
            json!(null),
        )
        .await
    }

    async fn select_by_label(&self, frame: &Frame, selector: &str, label: &str) -> AppResult<()> {
        let body = r#"
            const el = doc.querySelector(args.selector);
            if (!el) { return 'missing'; }
            const opt = Array.from(el.options || []).find(o => o.text.trim() === args.label);
            if (!opt) { return 'no-option'; }
            el.value = opt.value;
            el.dispatchEvent(new Event('change', { bubbles: true }));
            return 'ok';
        "#;
        let status: String = self
            .in_frame(frame, body, json!({ "selector": selector, "label": label }))
            .await?;
        match status.as_str() {
            "ok" => Ok(()),
            "no-option" => Err(AppError::option_not_found(selector, label)),
            _ => Err(AppError::element_not_found(selector, frame.to_string())),
        }
    }

    async fn select_by_value(&self, frame: &Frame, selector: &str, value: &str) -> AppResult<()> {
        self.with_element(
            frame,
            selector,
            r#"
            el.value = extra;
            el.dispatchEvent(new Event('change', { bubbles: true }));
            "#,
            json!(value),
        )
        .await
    }

    async fn option_value_by_text(
        &self,
        frame: &Frame,
        select: &str,
        text: &str,
    ) -> AppResult<Option<String>> {
        let body = r#"
            const el = doc.querySelector(args.selector);
            if (!el) { throw new Error('元素不存在: ' + args.selector); }
            const needle = args.text.toLowerCase();
            const opt = Array.from(el.options || []).find(o => o.text.toLowerCase().includes(needle));
            return opt ? opt.value : null;
        "#;
        self.in_frame(frame, body, json!({ "selector": select, "text": text }))
            .await
    }

    async fn click_by_text(&self, frame: &Frame, selector: &str, text: &str) -> AppResult<bool> {
        let body = r#"
            const needle = args.text.trim().toLowerCase();
            const el = Array.from(doc.querySelectorAll(args.selector))
                .find(e => (e.textContent || '').trim().toLowerCase().includes(needle));
            if (!el) { return false; }
            el.click();
            return true;
        "#;
        self.in_frame(frame, body, json!({ "selector": selector, "text": text }))
            .await
    }

    async fn texts(&self, frame: &Frame, selector: &str) -> AppResult<Vec<String>> {
        self.in_frame(
            frame,
            "return Array.from(doc.querySelectorAll(args.selector)).map(e => e.textContent || '');",
            json!({ "selector": selector }),
        )
        .await
    }

    async fn text(&self, frame: &Frame, selector: &str) -> AppResult<Option<String>> {
        self.in_frame(
            frame,
            "const el = doc.querySelector(args.selector); return el ? (el.textContent || '') : null;",
            json!({ "selector": selector }),
        )
        .await
    }

    async fn wait_for_network_idle(&self, wait: Duration) -> AppResult<()> {
        let js = r#"
            (() => {
                const states = [];
                const walk = (win) => {
                    try { states.push(win.document.readyState); } catch (e) {}
                    let count = 0;
                    try { count = win.frames.length; } catch (e) {}
                    for (let i = 0; i < count; i++) { walk(win.frames[i]); }
                };
                walk(window);
                return states.every(s => s === 'complete');
            })()
        "#;

        let deadline = Instant::now() + wait;
        loop {
            let ready: bool = self.executor.eval_as(js).await.unwrap_or(false);
            if ready {
                sleep(IDLE_SETTLE.min(deadline.saturating_duration_since(Instant::now())))
                    .await;
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::timeout("网络空闲", wait.as_millis() as u64));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn mark_document(&self) -> AppResult<()> {
        let js = format!("(() => {{ window.{} = true; return true; }})()", DOCUMENT_MARK);
        let _: bool = self.executor.eval_as(js).await?;
        Ok(())
    }

    async fn wait_for_navigation(&self, wait: Duration) -> AppResult<()> {
        // 标记还在说明仍是旧文档
        let js = format!(
            "(() => window.{} === true ? 'marked' : document.readyState)()",
            DOCUMENT_MARK
        );
        let deadline = Instant::now() + wait;
        loop {
            // 文档切换过程中脚本可能失败，继续轮询
            if let Ok(state) = self.executor.eval_as::<String>(js.as_str()).await {
                if state == "complete" {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(AppError::timeout("页面导航", wait.as_millis() as u64));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn screenshot(&self, name: &str) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.screenshot_dir).await?;
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S-%3f");
        let path = self
            .screenshot_dir
            .join(format!("{}-{}.png", sanitize(name), timestamp));

        self.executor
            .page()
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), &path)
            .await?;
        Ok(path)
    }

    async fn export_session(&self) -> AppResult<SessionSnapshot> {
        let cookies = self.executor.page().get_cookies().await?;
        let stored = cookies
            .into_iter()
            .map(|c| StoredCookie {
                expires: (!c.session && c.expires > 0.0).then_some(c.expires),
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect();
        Ok(SessionSnapshot::new(stored))
    }

    async fn import_session(&self, snapshot: &SessionSnapshot) -> AppResult<()> {
        let mut params = Vec::with_capacity(snapshot.cookies.len());
        for cookie in &snapshot.cookies {
            let mut builder = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .http_only(cookie.http_only)
                .secure(cookie.secure);
            if let Some(expires) = cookie.expires {
                builder = builder.expires(TimeSinceEpoch::new(expires));
            }
            params.push(builder.build().map_err(AppError::Other)?);
        }

        self.executor.page().set_cookies(params).await?;
        debug!("已写入 {} 个 cookie", snapshot.cookies.len());
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器时出错: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("等待浏览器进程退出时出错: {}", e);
            }
        }
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
        debug!("浏览器已关闭");
        Ok(())
    }
}

/// 文件名中只保留安全字符
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
