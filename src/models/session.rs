use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 保存下来的登录会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub saved_at: DateTime<Local>,
    pub cookies: Vec<StoredCookie>,
}

/// 单个 cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Unix 秒；会话 cookie 为 None
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

impl SessionSnapshot {
    pub fn new(cookies: Vec<StoredCookie>) -> Self {
        Self {
            saved_at: Local::now(),
            cookies,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
