//! 按顺序尝试候选项，第一个命中的胜出
//!
//! - `find_first`：在一组容器（frame）里找第一个满足条件的
//! - `first_matching`：按顺序尝试一串选择器，第一个成功的胜出

use std::future::Future;

use tracing::debug;

use crate::error::{AppError, AppResult, PortalError};

/// 返回第一个满足 `predicate` 的候选项
///
/// 判断过程中出错的候选项视为不满足，继续检查下一个。
pub async fn find_first<'a, T, F, Fut>(candidates: &'a [T], mut predicate: F) -> Option<&'a T>
where
    F: FnMut(&'a T) -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    for candidate in candidates {
        match predicate(candidate).await {
            Ok(true) => return Some(candidate),
            Ok(false) => {}
            Err(e) => debug!("检查候选项时出错，继续下一个: {}", e),
        }
    }
    None
}

/// 依次尝试 `strategies`，返回第一个成功的策略及其结果
///
/// `attempt` 返回 `Ok(None)` 表示该策略不适用（例如元素不存在）。
/// 全部不命中时返回 `PortalError::NoStrategyMatched`。
pub async fn first_matching<'a, S, T, F, Fut>(
    what: &str,
    strategies: &'a [S],
    mut attempt: F,
) -> AppResult<(&'a S, T)>
where
    S: AsRef<str>,
    F: FnMut(&'a S) -> Fut,
    Fut: Future<Output = AppResult<Option<T>>>,
{
    for strategy in strategies {
        match attempt(strategy).await {
            Ok(Some(value)) => return Ok((strategy, value)),
            Ok(None) => debug!("{}: {} 未命中", what, strategy.as_ref()),
            Err(e) => debug!("{}: {} 出错: {}", what, strategy.as_ref(), e),
        }
    }

    Err(AppError::Portal(PortalError::NoStrategyMatched {
        what: what.to_string(),
        tried: strategies.iter().map(|s| s.as_ref().to_string()).collect(),
    }))
}
