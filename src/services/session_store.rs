//! 会话存储服务 - 业务能力层
//!
//! 只负责读写保存的 cookie 文件，不接触浏览器

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{AppError, AppResult, FileError};
use crate::models::SessionSnapshot;

/// 会话存储
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取保存的会话
    ///
    /// 文件不存在不算错误；文件损坏时记录警告并当作没有会话
    pub async fn load(&self) -> Option<SessionSnapshot> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("没有找到保存的会话: {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("读取会话文件失败 ({}): {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<SessionSnapshot>(&content) {
            Ok(snapshot) if !snapshot.is_empty() => {
                debug!("已读取 {} 个 cookie", snapshot.cookies.len());
                Some(snapshot)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("会话文件格式错误 ({}): {}", self.path.display(), e);
                None
            }
        }
    }

    /// 保存会话，自动创建目录
    pub async fn save(&self, snapshot: &SessionSnapshot) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_failed(e))?;
        }

        let content = serde_json::to_string_pretty(snapshot)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| self.write_failed(e))?;

        debug!("会话已保存: {}", self.path.display());
        Ok(())
    }

    fn write_failed(&self, source: std::io::Error) -> AppError {
        AppError::File(FileError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        })
    }
}
