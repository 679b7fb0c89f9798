//! 流程处理上下文
//!
//! 封装"我正在处理第几个流程、流程号是什么"这一信息

use std::fmt::Display;

/// 流程处理上下文
#[derive(Debug, Clone)]
pub struct RecordCtx {
    /// 流程号
    pub identifier: String,

    /// 在本批中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本批流程总数
    pub total: usize,
}

impl RecordCtx {
    pub fn new(identifier: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            identifier: identifier.into(),
            index,
            total,
        }
    }
}

impl Display for RecordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{} 流程 {}]", self.index, self.total, self.identifier)
    }
}
