use std::path::Path;

use crate::error::{AppError, AppResult, FileError, SelectorError};
use crate::models::selectors::Selectors;

/// 从 TOML 文件加载并校验选择器
pub fn load_selectors(path: &Path) -> AppResult<Selectors> {
    let path_str = path.display().to_string();

    if !path.exists() {
        return Err(SelectorError::NotFound { path: path_str }.into());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::File(FileError::ReadFailed {
            path: path_str.clone(),
            source: e,
        })
    })?;

    let selectors = parse_selectors(&content).map_err(|e| match e {
        SelectorError::ParseFailed { source, .. } => SelectorError::ParseFailed {
            path: path_str.clone(),
            source,
        },
        other => other,
    })?;

    tracing::debug!("已加载选择器: {}", path_str);
    Ok(selectors)
}

/// 解析并校验选择器内容
pub fn parse_selectors(content: &str) -> Result<Selectors, SelectorError> {
    let selectors: Selectors =
        toml::from_str(content).map_err(|e| SelectorError::ParseFailed {
            path: String::new(),
            source: e,
        })?;
    selectors.validate()?;
    Ok(selectors)
}
