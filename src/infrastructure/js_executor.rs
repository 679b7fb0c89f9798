//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};

/// 深度优先收集所有可访问的 frame 文档。跨域 frame 占位但 doc 为 null，
/// 保证序号在同一页面状态下稳定。
const FRAME_WALKER: &str = r#"
(() => {
    const docs = [];
    const walk = (win, name) => {
        let doc = null;
        try { doc = win.document; } catch (e) { doc = null; }
        docs.push({ name, doc });
        let count = 0;
        try { count = win.frames.length; } catch (e) { count = 0; }
        for (let i = 0; i < count; i++) {
            const child = win.frames[i];
            let childName = '';
            try { childName = child.name || ''; } catch (e) { childName = ''; }
            walk(child, childName);
        }
    };
    walk(window, '');
    return docs;
})()
"#;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 在指定 frame 的 document 上执行脚本
/// - 不认识流程 / 标签
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result
            .into_value()
            .map_err(|e| AppError::script(format!("无法读取脚本返回值: {}", e)))?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 列出所有 frame 的名称（按遍历顺序）
    pub async fn frame_names(&self) -> AppResult<Vec<String>> {
        let js = format!("({}).map(f => f.name)", FRAME_WALKER.trim());
        self.eval_as(js).await
    }

    /// 在第 `frame_index` 个 frame 中执行 `body`
    ///
    /// `body` 是函数体，可以使用 `doc`（该 frame 的 document）和 `args`
    /// （序列化后的参数），用 `return` 返回结果。脚本内抛出的异常会转换为
    /// `AppError`。
    pub async fn eval_in_frame<T: DeserializeOwned>(
        &self,
        frame_index: usize,
        body: &str,
        args: JsonValue,
    ) -> AppResult<T> {
        let js = format!(
            r#"
            (() => {{
                const frames = {walker};
                const entry = frames[{index}];
                if (!entry || !entry.doc) {{
                    return {{ __error: 'frame #{index} 不存在或不可访问' }};
                }}
                const doc = entry.doc;
                const args = {args};
                try {{
                    return {{ value: (() => {{ {body} }})() ?? null }};
                }} catch (e) {{
                    return {{ __error: String(e && e.message ? e.message : e) }};
                }}
            }})()
            "#,
            walker = FRAME_WALKER.trim(),
            index = frame_index,
            args = args,
            body = body,
        );

        let mut envelope = self.eval(js).await?;
        if let Some(err) = envelope.get("__error").and_then(|v| v.as_str()) {
            return Err(AppError::script(err));
        }
        let value = envelope
            .get_mut("value")
            .map(JsonValue::take)
            .unwrap_or(JsonValue::Null);
        Ok(serde_json::from_value(value)?)
    }
}
