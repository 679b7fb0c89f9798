//! 编排层（Orchestration Layer）
//!
//! ### `batch_processor` - 批量流程处理器
//! - 登录一次，按顺序处理所有流程
//! - 每个流程外面包一层重试
//! - 结束时关闭浏览器，返回 `BatchReport`
//!
//! ### `app` - 应用生命周期
//! - 加载配置和选择器、初始化日志
//! - 询问流程号和标签，启动浏览器，输出汇总
//!
//! ```text
//! app
//!     ↓
//! batch_processor (处理 Vec<流程号>)
//!     ↓
//! workflow::RecordFlow (处理单个流程)
//!     ↓
//! services (登录 / 会话)
//!     ↓
//! infrastructure (PortalDriver)
//! ```

pub mod app;
pub mod batch_processor;

pub use app::App;
pub use batch_processor::BatchOrchestrator;
