use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（启动阶段致命）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 选择器文件错误（启动阶段致命）
    #[error("选择器错误: {0}")]
    Selector(#[from] SelectorError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 门户页面交互错误
    #[error("门户错误: {0}")]
    Portal(#[from] PortalError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 重试次数耗尽
    #[error("{label}: 在 {attempts} 次尝试后失败。最后错误: {source}")]
    RetryExhausted {
        label: String,
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量不存在
    #[error("缺少必需的环境变量: {var_name}")]
    EnvVarNotFound { var_name: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 数值超出允许范围
    #[error("环境变量 {var_name} 取值无效: {reason}")]
    OutOfRange { var_name: String, reason: String },
}

/// 选择器配置错误
#[derive(Debug, Error)]
pub enum SelectorError {
    /// 选择器文件不存在
    #[error("选择器文件不存在: {path}")]
    NotFound { path: String },
    /// 选择器文件解析失败
    #[error("选择器文件解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 缺少必需字段
    #[error("缺少必需的选择器: {section}.{field}")]
    MissingField { section: String, field: String },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {reason}")]
    ConfigurationFailed { reason: String },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {reason}")]
    NavigationFailed { url: String, reason: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {reason}")]
    ScriptExecutionFailed { reason: String },
}

/// 门户页面交互错误
#[derive(Debug, Error)]
pub enum PortalError {
    /// 元素不存在
    #[error("元素不存在: {selector} (frame: {frame})")]
    ElementNotFound { selector: String, frame: String },
    /// 任何 frame 中都找不到控件
    #[error("控件 \"{control}\" 在任何 frame 中都未找到")]
    ControlNotFound { control: String },
    /// 下拉选项不存在
    #[error("选项 \"{option}\" 不在 {control} 的选项列表中")]
    OptionNotFound { control: String, option: String },
    /// 候选策略全部失败
    #[error("{what}: 所有候选选择器均未命中 ({})", tried.join(", "))]
    NoStrategyMatched { what: String, tried: Vec<String> },
    /// 等待超时
    #[error("等待 {what} 超时 ({timeout_ms}ms)")]
    Timeout { what: String, timeout_ms: u64 },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: serde_json::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            reason: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::JsonParseFailed { source: err })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建"控件未找到"错误
    pub fn control_not_found(control: impl Into<String>) -> Self {
        AppError::Portal(PortalError::ControlNotFound {
            control: control.into(),
        })
    }

    /// 创建"元素不存在"错误
    pub fn element_not_found(selector: impl Into<String>, frame: impl Into<String>) -> Self {
        AppError::Portal(PortalError::ElementNotFound {
            selector: selector.into(),
            frame: frame.into(),
        })
    }

    /// 创建"选项不存在"错误
    pub fn option_not_found(control: impl Into<String>, option: impl Into<String>) -> Self {
        AppError::Portal(PortalError::OptionNotFound {
            control: control.into(),
            option: option.into(),
        })
    }

    /// 创建等待超时错误
    pub fn timeout(what: impl Into<String>, timeout_ms: u64) -> Self {
        AppError::Portal(PortalError::Timeout {
            what: what.into(),
            timeout_ms,
        })
    }

    /// 创建脚本执行错误
    pub fn script(reason: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            reason: reason.into(),
        })
    }

    /// 是否为重试耗尽错误
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, AppError::RetryExhausted { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
