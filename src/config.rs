use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::utils::retry::RetryConfig;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- SEI 门户 ---
    /// 门户入口地址
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// 登录时选择的机构（órgão）
    pub orgao: String,
    /// 使用分配标签时，流程要分配给的用户
    pub assignee: String,
    /// 添加标签时填写的备注
    pub tag_note: String,
    // --- 浏览器 ---
    /// 浏览器命令默认超时（毫秒）
    pub timeout_ms: u64,
    /// 指定浏览器可执行文件
    pub chrome_executable: Option<PathBuf>,
    // --- 重试 ---
    pub retry: RetryConfig,
    // --- 文件路径 ---
    pub selectors_path: PathBuf,
    pub session_path: PathBuf,
    pub screenshot_dir: PathBuf,
    pub log_dir: PathBuf,
    /// 控制台日志级别
    pub log_level: String,
}

impl Config {
    /// 从环境变量（以及可选的 .env 文件）加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// 从键值表加载配置，主要用于测试
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(|key| map.get(key).cloned())
    }

    /// 从任意查找函数加载配置
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };

        let retry = RetryConfig {
            max_retries: source.number("MAX_RETRIES", 3)?,
            delay_ms: source.number("RETRY_DELAY_MS", 2000)?,
        };
        if retry.max_retries == 0 {
            return Err(ConfigError::OutOfRange {
                var_name: "MAX_RETRIES".to_string(),
                reason: "至少需要 1 次尝试".to_string(),
            });
        }

        Ok(Self {
            base_url: source.required("SEI_BASE_URL")?,
            username: source.required("SEI_USERNAME")?,
            password: source.required("SEI_PASSWORD")?,
            orgao: source.required("SEI_ORGAO")?,
            assignee: source.optional("SEI_ASSIGNEE", "brunoresende"),
            tag_note: source.optional("TAG_NOTE", "notion"),
            timeout_ms: source.number("TIMEOUT_MS", 30_000)?,
            chrome_executable: source.get("CHROME_EXECUTABLE").map(PathBuf::from),
            retry,
            selectors_path: source.optional("SELECTORS_PATH", "config/selectors.toml").into(),
            session_path: source.optional("SESSION_PATH", ".cache/sei-cookies.json").into(),
            screenshot_dir: source.optional("SCREENSHOT_DIR", "screenshots").into(),
            log_dir: source.optional("LOG_DIR", "logs").into(),
            log_level: source.optional("LOG_LEVEL", "info"),
        })
    }
}

struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 空字符串与未设置等价
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::EnvVarNotFound {
            var_name: key.to_string(),
        })
    }

    fn optional(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn number<N: std::str::FromStr>(&self, key: &str, default: N) -> Result<N, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: key.to_string(),
                value,
                expected_type: "数字".to_string(),
            }),
        }
    }
}
