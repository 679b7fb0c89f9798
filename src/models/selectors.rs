use serde::Deserialize;

use crate::error::SelectorError;

/// 页面元素选择器（来自 `config/selectors.toml`）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Selectors {
    #[serde(default)]
    pub login: LoginSelectors,
    #[serde(default)]
    pub record: RecordSelectors,
    #[serde(default)]
    pub frames: FrameSelectors,
}

/// 登录页
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginSelectors {
    #[serde(default)]
    pub username_field: String,
    #[serde(default)]
    pub password_field: String,
    /// 同时用作"仍在登录页"的标记
    #[serde(default)]
    pub submit_button: String,
    pub error_message: Option<String>,
    /// 机构下拉框，部分部署没有
    pub orgao_select: Option<String>,
}

/// 流程页
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordSelectors {
    #[serde(default)]
    pub search_field: String,
    /// 流程上已有的标签
    #[serde(default = "default_tag_list")]
    pub tag_list: String,
    /// "管理标签"链接
    #[serde(default)]
    pub tag_manager_link: String,
    /// 标签表单的标记元素
    #[serde(default)]
    pub tag_form: String,
    /// 自定义下拉框（点击后展开选项）
    pub tag_dropdown: Option<String>,
    #[serde(default = "default_tag_option")]
    pub tag_option: String,
    /// 标签备注输入框
    pub tag_note: Option<String>,
    /// 保存按钮候选，按顺序尝试
    #[serde(default)]
    pub save_buttons: Vec<String>,
    /// "分配流程"链接
    pub assign_button: Option<String>,
    pub assign_select: Option<String>,
    pub assign_save_button: Option<String>,
}

/// frame 名称
#[derive(Debug, Clone, Deserialize)]
pub struct FrameSelectors {
    /// 搜索后需要等待加载的内容 frame
    #[serde(default = "default_content_frame")]
    pub content: String,
}

impl Default for FrameSelectors {
    fn default() -> Self {
        Self {
            content: default_content_frame(),
        }
    }
}

fn default_tag_list() -> String {
    "a[href*='andamento_marcador'] span, .marcador".to_string()
}

fn default_tag_option() -> String {
    ".dd-option".to_string()
}

fn default_content_frame() -> String {
    "ifrConteudoVisualizacao".to_string()
}

impl Selectors {
    /// 检查必需的选择器都已配置
    pub fn validate(&self) -> Result<(), SelectorError> {
        let required = [
            ("login", "username_field", &self.login.username_field),
            ("login", "password_field", &self.login.password_field),
            ("login", "submit_button", &self.login.submit_button),
            ("record", "search_field", &self.record.search_field),
            ("record", "tag_manager_link", &self.record.tag_manager_link),
            ("record", "tag_form", &self.record.tag_form),
        ];

        for (section, field, value) in required {
            if value.trim().is_empty() {
                return Err(missing(section, field));
            }
        }

        if self.record.save_buttons.iter().all(|s| s.trim().is_empty()) {
            return Err(missing("record", "save_buttons"));
        }

        Ok(())
    }
}

fn missing(section: &str, field: &str) -> SelectorError {
    SelectorError::MissingField {
        section: section.to_string(),
        field: field.to_string(),
    }
}
