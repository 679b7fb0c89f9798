use phf::phf_map;

/// 可选的分区标签（marcador）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Tag {
    Sad,
    Sgp,
    Siq,
    Sop,
}

static TAGS_BY_LABEL: phf::Map<&'static str, Tag> = phf_map! {
    "SAD" => Tag::Sad,
    "SGP" => Tag::Sgp,
    "SIQ" => Tag::Siq,
    "SOP" => Tag::Sop,
};

impl Tag {
    /// 菜单中展示的顺序
    pub const ALL: [Tag; 4] = [Tag::Sad, Tag::Sgp, Tag::Siq, Tag::Sop];

    /// 门户中显示的标签文本
    pub fn label(self) -> &'static str {
        match self {
            Tag::Sad => "SAD",
            Tag::Sgp => "SGP",
            Tag::Siq => "SIQ",
            Tag::Sop => "SOP",
        }
    }

    /// 不区分大小写解析
    pub fn parse(s: &str) -> Option<Self> {
        TAGS_BY_LABEL.get(s.trim().to_uppercase().as_str()).copied()
    }

    /// 打上该标签后是否需要把流程分配给指定用户
    pub fn requires_assignment(self) -> bool {
        matches!(self, Tag::Sgp)
    }

    /// 与门户上读取到的文本比较（忽略大小写和首尾空白）
    pub fn matches_text(self, text: &str) -> bool {
        text.trim().eq_ignore_ascii_case(self.label())
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
