use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 单个流程的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Success,
    Failed,
    Skipped,
}

impl RecordStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RecordStatus::Pending)
    }
}

/// 单个流程的处理结果
///
/// 以 `Pending` 创建，之后只通过 `succeed` / `skip` / `fail` 转换一次。
/// 这些方法消耗 `self`，终态结果不会再被修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// 流程号
    pub identifier: String,
    pub status: RecordStatus,
    /// 仅在 Failed / Skipped 时存在
    pub error_message: Option<String>,
    /// 开始处理的时间
    pub timestamp: DateTime<Local>,
}

impl RecordOutcome {
    /// 开始处理一个流程
    pub fn begin(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            status: RecordStatus::Pending,
            error_message: None,
            timestamp: Local::now(),
        }
    }

    pub fn succeed(self) -> Self {
        self.finish(RecordStatus::Success, None)
    }

    pub fn skip(self, reason: impl Into<String>) -> Self {
        self.finish(RecordStatus::Skipped, Some(reason.into()))
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.finish(RecordStatus::Failed, Some(message.into()))
    }

    fn finish(mut self, status: RecordStatus, message: Option<String>) -> Self {
        debug_assert!(!self.status.is_terminal(), "结果已是终态");
        self.status = status;
        self.error_message = message;
        self
    }
}

/// 一次批处理的汇总
///
/// 只由结果序列推导，不单独修改
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// 与输入顺序一致的结果
    pub outcomes: Vec<RecordOutcome>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// 登录失败导致整批中止
    pub aborted: bool,
}

impl BatchReport {
    pub fn completed(outcomes: Vec<RecordOutcome>, started_at: DateTime<Local>) -> Self {
        Self {
            outcomes,
            started_at,
            finished_at: Local::now(),
            aborted: false,
        }
    }

    pub fn aborted(started_at: DateTime<Local>) -> Self {
        Self {
            outcomes: Vec::new(),
            started_at,
            finished_at: Local::now(),
            aborted: true,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successful(&self) -> usize {
        self.count(RecordStatus::Success)
    }

    pub fn skipped(&self) -> usize {
        self.count(RecordStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(RecordStatus::Failed)
    }

    /// 失败的结果（按输入顺序）
    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == RecordStatus::Failed)
    }

    /// 耗时（秒）
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    fn count(&self, status: RecordStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
