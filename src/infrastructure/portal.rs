//! 门户页面操作接口 - 基础设施层
//!
//! 上层只通过 `PortalDriver` 操作浏览器：定位、点击、填写、等待。
//! 所有元素操作都指定在哪个 frame 中执行。

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::SessionSnapshot;

/// 一个可导航的文档（顶层页面或 iframe）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 深度优先遍历中的序号，0 为顶层页面
    pub index: usize,
    /// iframe 的 name 属性，顶层页面为空
    pub name: String,
}

impl Frame {
    /// 顶层页面
    pub fn main() -> Self {
        Self {
            index: 0,
            name: String::new(),
        }
    }

    pub fn is_main(&self) -> bool {
        self.index == 0
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_main() {
            write!(f, "main")
        } else if self.name.is_empty() {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// 浏览器页面能力
///
/// 只有一个实现持有真实的浏览器页面（`CdpPortal`），测试中用内存实现替代。
#[async_trait]
pub trait PortalDriver: Send + Sync {
    /// 打开地址
    async fn goto(&self, url: &str) -> AppResult<()>;

    /// 当前地址
    async fn current_url(&self) -> AppResult<String>;

    /// 当前所有 frame（含顶层页面，顺序固定）
    async fn frames(&self) -> AppResult<Vec<Frame>>;

    /// 匹配选择器的元素数量
    async fn count(&self, frame: &Frame, selector: &str) -> AppResult<usize>;

    /// 等待元素出现
    async fn wait_for(&self, frame: &Frame, selector: &str, timeout: Duration) -> AppResult<()>;

    async fn click(&self, frame: &Frame, selector: &str) -> AppResult<()>;

    async fn fill(&self, frame: &Frame, selector: &str, value: &str) -> AppResult<()>;

    async fn press_enter(&self, frame: &Frame, selector: &str) -> AppResult<()>;

    /// 按可见文本选择 `<select>` 的选项
    async fn select_by_label(&self, frame: &Frame, selector: &str, label: &str) -> AppResult<()>;

    /// 按 value 选择 `<select>` 的选项
    async fn select_by_value(&self, frame: &Frame, selector: &str, value: &str) -> AppResult<()>;

    /// 查找文本包含 `text` 的 option，返回它的 value
    async fn option_value_by_text(
        &self,
        frame: &Frame,
        select: &str,
        text: &str,
    ) -> AppResult<Option<String>>;

    /// 点击第一个文本包含 `text` 的元素，没有则返回 false
    async fn click_by_text(&self, frame: &Frame, selector: &str, text: &str) -> AppResult<bool>;

    /// 所有匹配元素的文本
    async fn texts(&self, frame: &Frame, selector: &str) -> AppResult<Vec<String>>;

    /// 第一个匹配元素的文本
    async fn text(&self, frame: &Frame, selector: &str) -> AppResult<Option<String>>;

    /// 等待网络空闲
    async fn wait_for_network_idle(&self, timeout: Duration) -> AppResult<()>;

    /// 标记当前顶层文档，在触发导航的操作之前调用
    async fn mark_document(&self) -> AppResult<()>;

    /// 等待顶层页面离开 `mark_document` 标记的文档并加载完成
    ///
    /// 没有标记时只等待当前文档加载完成
    async fn wait_for_navigation(&self, timeout: Duration) -> AppResult<()>;

    /// 保存截图，返回文件路径
    async fn screenshot(&self, name: &str) -> AppResult<PathBuf>;

    /// 导出当前会话的 cookie
    async fn export_session(&self) -> AppResult<SessionSnapshot>;

    /// 把保存的 cookie 写回浏览器
    async fn import_session(&self, snapshot: &SessionSnapshot) -> AppResult<()>;

    /// 关闭页面和浏览器
    async fn close(&self) -> AppResult<()>;
}

/// 按名称查找 frame
pub async fn frame_named(driver: &dyn PortalDriver, name: &str) -> AppResult<Option<Frame>> {
    Ok(driver.frames().await?.into_iter().find(|f| f.name == name))
}

/// 截图，失败只记录日志
pub async fn screenshot_best_effort(driver: &dyn PortalDriver, name: &str) {
    match driver.screenshot(name).await {
        Ok(path) => tracing::info!("📸 截图已保存: {}", path.display()),
        Err(e) => tracing::warn!("截图失败 ({}): {}", name, e),
    }
}
