//! 内存中的门户，按选择器模拟 SEI 页面的行为

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use sei_tags::error::{AppError, AppResult};
use sei_tags::infrastructure::{Frame, PortalDriver};
use sei_tags::models::{
    FrameSelectors, LoginSelectors, RecordSelectors, Selectors, SessionSnapshot, StoredCookie,
};
use sei_tags::Config;

pub const SESSION_COOKIE: &str = "SEI_SESSION";
pub const LOGIN_ERROR: &str = "Usuário ou senha inválidos";

const ARVORE: usize = 1;
const CONTENT: usize = 2;

pub fn selectors() -> Selectors {
    Selectors {
        login: LoginSelectors {
            username_field: "#user".into(),
            password_field: "#pass".into(),
            submit_button: "#login".into(),
            error_message: Some("#msg".into()),
            orgao_select: Some("#orgao".into()),
        },
        record: RecordSelectors {
            search_field: "#search".into(),
            tag_list: ".tag".into(),
            tag_manager_link: "#manage".into(),
            tag_form: "#form".into(),
            tag_dropdown: Some("#dropdown".into()),
            tag_option: ".option".into(),
            tag_note: Some("#note".into()),
            save_buttons: vec!["#save".into(), "#save-alt".into()],
            assign_button: Some("#assign".into()),
            assign_select: Some("#assignee".into()),
            assign_save_button: Some("#assign-save".into()),
        },
        frames: FrameSelectors {
            content: "content".into(),
        },
    }
}

/// 测试配置，重试等待很短
pub fn config(session_path: PathBuf) -> Config {
    let env: HashMap<String, String> = [
        ("SEI_BASE_URL", "https://sei.test/sei/"),
        ("SEI_USERNAME", "operador"),
        ("SEI_PASSWORD", "segredo"),
        ("SEI_ORGAO", "ANTT"),
        ("MAX_RETRIES", "3"),
        ("RETRY_DELAY_MS", "10"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let mut config = Config::from_map(&env).unwrap();
    config.session_path = session_path;
    config
}

pub fn valid_snapshot() -> SessionSnapshot {
    SessionSnapshot::new(vec![StoredCookie {
        name: SESSION_COOKIE.into(),
        value: "valid".into(),
        domain: "sei.test".into(),
        path: "/".into(),
        expires: None,
        http_only: true,
        secure: true,
    }])
}

#[derive(Debug)]
pub struct State {
    // --- 场景设置 ---
    pub accept_login: bool,
    pub tags: HashMap<String, Vec<String>>,
    pub options: Vec<String>,
    pub users: Vec<String>,
    pub save_buttons: Vec<String>,
    /// 这些流程页面上没有"管理标签"链接
    pub no_manager_for: HashSet<String>,
    /// 永远不存在的选择器
    pub missing: HashSet<String>,
    /// 前 N 次搜索失败
    pub fail_searches: usize,
    /// 浏览器拒绝写入保存的 cookie
    pub fail_import: bool,
    /// 保存后页面上看不到新标签
    pub drop_saved_tags: bool,
    /// 提交登录后要经过几个轮询周期才进入新页面
    pub slow_login_steps: usize,

    // --- 运行状态 ---
    pub cookie_valid: bool,
    pub logged_in: bool,
    pub search_value: String,
    pub current: Option<String>,
    pub form_open: bool,
    pub selected_tag: Option<String>,
    pub assign_open: bool,
    pub assign_value: Option<String>,
    pub marked: bool,
    pub pending_login: usize,

    // --- 记录 ---
    pub opened: Vec<String>,
    pub credential_submits: usize,
    pub selected_orgao: Option<String>,
    pub enter_presses: Vec<String>,
    pub text_reads: Vec<String>,
    pub clicks: Vec<String>,
    pub notes: Vec<String>,
    pub assigned: HashMap<String, String>,
    pub screenshots: Vec<String>,
    pub closed: usize,
    /// 没有先标记文档就触发了导航
    pub unmarked_submits: usize,
}

impl Default for State {
    fn default() -> Self {
        Self {
            accept_login: true,
            tags: HashMap::new(),
            options: ["SAD", "SGP", "SIQ", "SOP"].map(String::from).to_vec(),
            users: vec!["fulano".into(), "brunoresende".into()],
            save_buttons: vec!["#save".into(), "#save-alt".into()],
            no_manager_for: HashSet::new(),
            missing: HashSet::new(),
            fail_searches: 0,
            fail_import: false,
            drop_saved_tags: false,
            slow_login_steps: 0,
            cookie_valid: false,
            logged_in: false,
            search_value: String::new(),
            current: None,
            form_open: false,
            selected_tag: None,
            assign_open: false,
            assign_value: None,
            marked: false,
            pending_login: 0,
            opened: Vec::new(),
            credential_submits: 0,
            selected_orgao: None,
            enter_presses: Vec::new(),
            text_reads: Vec::new(),
            clicks: Vec::new(),
            notes: Vec::new(),
            assigned: HashMap::new(),
            screenshots: Vec::new(),
            closed: 0,
            unmarked_submits: 0,
        }
    }
}

#[derive(Default)]
pub struct FakePortal {
    state: Mutex<State>,
}

impl FakePortal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(setup: impl FnOnce(&mut State)) -> Self {
        let portal = Self::new();
        setup(&mut portal.state());
        portal
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn tags_of(&self, record: &str) -> Vec<String> {
        self.state().tags.get(record).cloned().unwrap_or_default()
    }

    pub fn opened_count(&self, record: &str) -> usize {
        self.state().opened.iter().filter(|r| *r == record).count()
    }
}

impl State {
    fn count(&self, frame: &Frame, selector: &str) -> usize {
        if self.missing.contains(selector) {
            return 0;
        }
        let main = frame.index == 0;
        let record_open = self.current.is_some();
        let present = match selector {
            "body" => true,
            "#user" | "#pass" | "#login" | "#orgao" | "#msg" => main && !self.logged_in,
            "#search" => main && self.logged_in,
            "#manage" => {
                frame.index == ARVORE
                    && self
                        .current
                        .as_ref()
                        .is_some_and(|r| !self.no_manager_for.contains(r))
            }
            "#assign" => frame.index == ARVORE && record_open,
            "#form" | "#dropdown" | "#note" => frame.index == CONTENT && self.form_open,
            "#assignee" | "#assign-save" => frame.index == CONTENT && self.assign_open,
            s if self.save_buttons.iter().any(|b| b == s) => {
                frame.index == CONTENT && self.form_open
            }
            _ => false,
        };
        usize::from(present)
    }

    /// 触发导航的操作之前应先标记文档
    fn note_submit(&mut self) {
        if !self.marked {
            self.unmarked_submits += 1;
        }
        self.marked = false;
    }

    fn submit_login(&mut self) {
        self.note_submit();
        self.credential_submits += 1;
        if !self.accept_login {
            return;
        }
        if self.slow_login_steps > 0 {
            self.pending_login = self.slow_login_steps;
        } else {
            self.logged_in = true;
        }
    }

    fn require(&self, frame: &Frame, selector: &str) -> AppResult<()> {
        if self.count(frame, selector) == 0 {
            return Err(AppError::element_not_found(selector, frame.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PortalDriver for FakePortal {
    async fn goto(&self, _url: &str) -> AppResult<()> {
        let mut state = self.state();
        if state.cookie_valid {
            state.logged_in = true;
        }
        state.current = None;
        Ok(())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(if self.state().logged_in {
            "https://sei.test/sei/controlador.php?acao=procedimento_controlar".into()
        } else {
            "https://sei.test/sip/login.php".into()
        })
    }

    async fn frames(&self) -> AppResult<Vec<Frame>> {
        Ok(vec![
            Frame::main(),
            Frame {
                index: ARVORE,
                name: "arvore".into(),
            },
            Frame {
                index: CONTENT,
                name: "content".into(),
            },
        ])
    }

    async fn count(&self, frame: &Frame, selector: &str) -> AppResult<usize> {
        Ok(self.state().count(frame, selector))
    }

    async fn wait_for(&self, frame: &Frame, selector: &str, timeout: Duration) -> AppResult<()> {
        if self.state().count(frame, selector) > 0 {
            Ok(())
        } else {
            Err(AppError::timeout(selector, timeout.as_millis() as u64))
        }
    }

    async fn click(&self, frame: &Frame, selector: &str) -> AppResult<()> {
        let mut state = self.state();
        state.require(frame, selector)?;
        state.clicks.push(selector.to_string());

        match selector {
            "#login" => state.submit_login(),
            "#manage" => state.form_open = true,
            "#assign" => state.assign_open = true,
            "#assign-save" => {
                if let (Some(record), Some(value)) = (state.current.clone(), state.assign_value.clone()) {
                    state.assigned.insert(record, value);
                }
                state.assign_open = false;
            }
            s if state.save_buttons.iter().any(|b| b == s) => {
                if let (Some(record), Some(tag)) = (state.current.clone(), state.selected_tag.take()) {
                    if !state.drop_saved_tags {
                        state.tags.entry(record).or_default().push(tag);
                    }
                }
                state.form_open = false;
            }
            _ => {}
        }
        Ok(())
    }

    async fn fill(&self, frame: &Frame, selector: &str, value: &str) -> AppResult<()> {
        let mut state = self.state();
        state.require(frame, selector)?;
        match selector {
            "#search" => state.search_value = value.to_string(),
            "#note" => state.notes.push(value.to_string()),
            _ => {}
        }
        Ok(())
    }

    async fn press_enter(&self, frame: &Frame, selector: &str) -> AppResult<()> {
        let mut state = self.state();
        state.require(frame, selector)?;
        state.enter_presses.push(selector.to_string());
        if selector == "#search" {
            state.note_submit();
            if state.fail_searches > 0 {
                state.fail_searches -= 1;
                return Err(AppError::script("页面没有响应"));
            }
            let record = state.search_value.clone();
            state.opened.push(record.clone());
            state.current = Some(record);
            state.form_open = false;
            state.assign_open = false;
        } else if selector == "#pass" {
            state.submit_login();
        }
        Ok(())
    }

    async fn select_by_label(&self, frame: &Frame, selector: &str, label: &str) -> AppResult<()> {
        let mut state = self.state();
        state.require(frame, selector)?;
        if selector == "#orgao" {
            state.selected_orgao = Some(label.to_string());
        }
        Ok(())
    }

    async fn select_by_value(&self, frame: &Frame, selector: &str, value: &str) -> AppResult<()> {
        let mut state = self.state();
        state.require(frame, selector)?;
        state.assign_value = Some(value.to_string());
        Ok(())
    }

    async fn option_value_by_text(
        &self,
        frame: &Frame,
        select: &str,
        text: &str,
    ) -> AppResult<Option<String>> {
        let state = self.state();
        state.require(frame, select)?;
        Ok(state
            .users
            .iter()
            .find(|u| u.contains(text))
            .map(|u| format!("u-{}", u)))
    }

    async fn click_by_text(&self, frame: &Frame, selector: &str, text: &str) -> AppResult<bool> {
        let mut state = self.state();
        if selector != ".option" || frame.index != CONTENT || !state.form_open {
            return Ok(false);
        }
        let Some(option) = state.options.iter().find(|o| o.contains(text)).cloned() else {
            return Ok(false);
        };
        state.selected_tag = Some(option);
        Ok(true)
    }

    async fn texts(&self, frame: &Frame, selector: &str) -> AppResult<Vec<String>> {
        let state = self.state();
        if selector != ".tag" || frame.index != CONTENT {
            return Ok(Vec::new());
        }
        Ok(state
            .current
            .as_ref()
            .and_then(|r| state.tags.get(r))
            .map(|tags| tags.iter().map(|t| format!("  {} ", t)).collect())
            .unwrap_or_default())
    }

    async fn text(&self, frame: &Frame, selector: &str) -> AppResult<Option<String>> {
        let mut state = self.state();
        state.text_reads.push(selector.to_string());
        Ok((selector == "#msg" && state.count(frame, selector) > 0).then(|| LOGIN_ERROR.to_string()))
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn mark_document(&self) -> AppResult<()> {
        self.state().marked = true;
        Ok(())
    }

    /// 慢速登录时逐步推进，直到新页面出现
    async fn wait_for_navigation(&self, _timeout: Duration) -> AppResult<()> {
        loop {
            {
                let mut state = self.state();
                if state.pending_login == 0 {
                    return Ok(());
                }
                state.pending_login -= 1;
                if state.pending_login == 0 {
                    state.logged_in = true;
                }
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn screenshot(&self, name: &str) -> AppResult<PathBuf> {
        self.state().screenshots.push(name.to_string());
        Ok(PathBuf::from(format!("screenshots/{}.png", name)))
    }

    async fn export_session(&self) -> AppResult<SessionSnapshot> {
        Ok(valid_snapshot())
    }

    async fn import_session(&self, snapshot: &SessionSnapshot) -> AppResult<()> {
        let mut state = self.state();
        if state.fail_import {
            return Err(AppError::Other("cookie 被浏览器拒绝".into()));
        }
        state.cookie_valid = snapshot
            .cookies
            .iter()
            .any(|c| c.name == SESSION_COOKIE && c.value == "valid");
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        self.state().closed += 1;
        Ok(())
    }
}
