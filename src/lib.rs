//! # SEI Tags
//!
//! 在 SEI 门户上为一批流程添加分区标签
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - `PortalDriver` 抽象了页面操作
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `CdpPortal` - 基于 chromiumoxide 的真实实现
//!
//! ### ② 业务能力层（Services）
//! - `AuthService` - 恢复会话或使用账号密码登录
//! - `SessionStore` - 保存 / 读取 cookie
//! - `InputService` - 询问操作员
//!
//! ### ③ 流程层（Workflow）
//! - `RecordCtx` - 上下文封装（流程号 + 序号）
//! - `RecordFlow` - 单个流程（搜索 → 检查 → 添加标签 → 分配）
//!
//! ### ④ 编排层（Orchestration）
//! - `BatchOrchestrator` - 登录一次，逐个处理并重试
//! - `App` - 应用生命周期

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use cli::Cli;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CdpPortal, Frame, JsExecutor, PortalDriver};
pub use models::{BatchReport, RecordOutcome, RecordStatus, Selectors, Tag};
pub use orchestrator::{App, BatchOrchestrator};
pub use workflow::{RecordCtx, RecordFlow};
