mod common;

use common::{config, selectors, valid_snapshot, FakePortal};
use sei_tags::models::{RecordStatus, Tag};
use sei_tags::services::SessionStore;
use sei_tags::workflow::ALREADY_PRESENT;
use sei_tags::{BatchOrchestrator, BatchReport, Config};
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    config: Config,
    store: SessionStore,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let session_path = dir.path().join("cache").join("cookies.json");
    Harness {
        config: config(session_path.clone()),
        store: SessionStore::new(session_path),
        _dir: dir,
    }
}

async fn run(h: &Harness, portal: &FakePortal, ids: &[&str], tag: Tag) -> BatchReport {
    let selectors = selectors();
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    BatchOrchestrator::new(portal, &h.config, &selectors, &h.store)
        .run(&ids, tag)
        .await
}

#[tokio::test]
async fn test_sad_scenario_one_added_one_already_present() {
    let h = harness();
    let portal = FakePortal::with(|s| {
        s.tags.insert("200".into(), vec!["SAD".into()]);
    });

    let report = run(&h, &portal, &["100", "200"], Tag::Sad).await;

    assert!(!report.aborted);
    assert_eq!(report.total(), 2);
    assert_eq!(report.successful(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 0);

    assert_eq!(report.outcomes[0].identifier, "100");
    assert_eq!(report.outcomes[0].status, RecordStatus::Success);
    assert!(report.outcomes[0].error_message.is_none());
    assert_eq!(report.outcomes[1].identifier, "200");
    assert_eq!(report.outcomes[1].status, RecordStatus::Skipped);
    assert_eq!(report.outcomes[1].error_message.as_deref(), Some(ALREADY_PRESENT));

    assert_eq!(portal.tags_of("100"), vec!["SAD"]);
    assert_eq!(portal.tags_of("200"), vec!["SAD"]);
    assert_eq!(portal.state().notes, vec!["notion"]);
    assert_eq!(portal.state().closed, 1);
    // 登录和每次搜索之前都先标记了旧页面
    assert_eq!(portal.state().unmarked_submits, 0);
}

#[tokio::test(start_paused = true)]
async fn test_outcomes_follow_input_order_with_failures_in_between() {
    let h = harness();
    let portal = FakePortal::with(|s| {
        s.no_manager_for.insert("b".into());
    });

    let report = run(&h, &portal, &["a", "b", "c"], Tag::Siq).await;

    let ids: Vec<_> = report.outcomes.iter().map(|o| o.identifier.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![RecordStatus::Success, RecordStatus::Failed, RecordStatus::Success]
    );

    let failed = &report.outcomes[1];
    let message = failed.error_message.as_deref().unwrap();
    assert!(message.starts_with("流程 b: 在 3 次尝试后失败"), "{}", message);
    assert!(message.contains("管理标签"), "{}", message);

    // 每次尝试都重新搜索一次
    assert_eq!(portal.opened_count("b"), 3);
    assert!(portal
        .state()
        .screenshots
        .iter()
        .any(|s| s == "error-b"));
}

#[tokio::test(start_paused = true)]
async fn test_error_message_present_only_for_failed_or_skipped() {
    let h = harness();
    let portal = FakePortal::with(|s| {
        s.tags.insert("2".into(), vec!["sop".into()]);
        s.no_manager_for.insert("3".into());
    });

    let report = run(&h, &portal, &["1", "2", "3"], Tag::Sop).await;

    for outcome in &report.outcomes {
        let expects_message = matches!(outcome.status, RecordStatus::Failed | RecordStatus::Skipped);
        assert_eq!(outcome.error_message.is_some(), expects_message, "{:?}", outcome);
        assert!(outcome.status.is_terminal());
    }
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let h = harness();
    let portal = FakePortal::new();

    let first = run(&h, &portal, &["10", "11"], Tag::Sad).await;
    assert_eq!(first.successful(), 2);

    let second = run(&h, &portal, &["10", "11"], Tag::Sad).await;
    assert_eq!(second.skipped(), 2);
    assert_eq!(second.successful(), 0);
    assert_eq!(portal.tags_of("10"), vec!["SAD"]);
}

#[tokio::test]
async fn test_failed_login_aborts_without_processing() {
    let h = harness();
    let portal = FakePortal::with(|s| s.accept_login = false);

    let report = run(&h, &portal, &["100", "200"], Tag::Sad).await;

    assert!(report.aborted);
    assert_eq!(report.total(), 0);
    assert!(portal.state().opened.is_empty());
    assert_eq!(portal.state().closed, 1);
    assert!(h.store.load().await.is_none());
}

#[tokio::test]
async fn test_credential_login_saves_session() {
    let h = harness();
    let portal = FakePortal::new();

    let report = run(&h, &portal, &["100"], Tag::Sad).await;

    assert_eq!(report.successful(), 1);
    assert_eq!(portal.state().credential_submits, 1);
    let saved = h.store.load().await.expect("会话应已保存");
    assert_eq!(saved.cookies[0].name, common::SESSION_COOKIE);
}

#[tokio::test]
async fn test_saved_session_skips_credentials() {
    let h = harness();
    h.store.save(&valid_snapshot()).await.unwrap();
    // 账号密码会被拒绝，只能靠保存的会话登录
    let portal = FakePortal::with(|s| s.accept_login = false);

    let report = run(&h, &portal, &["100"], Tag::Sad).await;

    assert!(!report.aborted);
    assert_eq!(report.successful(), 1);
    assert_eq!(portal.state().credential_submits, 0);
}

#[tokio::test]
async fn test_sgp_assigns_record() {
    let h = harness();
    let portal = FakePortal::new();

    let report = run(&h, &portal, &["100"], Tag::Sgp).await;

    assert_eq!(report.outcomes[0].status, RecordStatus::Success);
    assert_eq!(
        portal.state().assigned.get("100").map(String::as_str),
        Some("u-brunoresende")
    );
}

#[tokio::test(start_paused = true)]
async fn test_sgp_assignment_failure_keeps_success() {
    let h = harness();
    let portal = FakePortal::with(|s| {
        s.missing.insert("#assign".into());
    });

    let report = run(&h, &portal, &["100"], Tag::Sgp).await;

    assert_eq!(report.outcomes[0].status, RecordStatus::Success);
    assert!(report.outcomes[0].error_message.is_none());
    assert_eq!(portal.tags_of("100"), vec!["SGP"]);
    assert!(portal.state().assigned.is_empty());
    assert!(portal
        .state()
        .screenshots
        .iter()
        .any(|s| s == "error-atribuir-100"));
    // 分配失败不触发重试
    assert_eq!(portal.opened_count("100"), 1);
}

#[tokio::test]
async fn test_other_tags_never_assign() {
    let h = harness();
    let portal = FakePortal::new();

    run(&h, &portal, &["100"], Tag::Siq).await;

    assert!(portal.state().assigned.is_empty());
    assert!(!portal.state().clicks.iter().any(|c| c == "#assign"));
}

#[tokio::test]
async fn test_save_falls_back_to_next_button() {
    let h = harness();
    let portal = FakePortal::with(|s| s.save_buttons = vec!["#save-alt".into()]);

    let report = run(&h, &portal, &["100"], Tag::Sad).await;

    assert_eq!(report.successful(), 1);
    let clicks = portal.state().clicks.clone();
    assert!(clicks.contains(&"#save-alt".to_string()));
    assert!(!clicks.contains(&"#save".to_string()));
}

#[tokio::test]
async fn test_no_save_button_fails_record() {
    let h = harness();
    let portal = FakePortal::with(|s| s.save_buttons.clear());

    let report = run(&h, &portal, &["100"], Tag::Sad).await;

    assert_eq!(report.failed(), 1);
    let message = report.outcomes[0].error_message.clone().unwrap();
    assert!(message.contains("保存按钮"), "{}", message);
    assert!(portal
        .state()
        .screenshots
        .iter()
        .any(|s| s == "salvar-button-not-found"));
}

#[tokio::test]
async fn test_missing_tag_option_fails_record() {
    let h = harness();
    let portal = FakePortal::with(|s| s.options = vec!["SAD".into(), "SGP".into()]);

    let report = run(&h, &portal, &["100"], Tag::Sop).await;

    assert_eq!(report.failed(), 1);
    assert!(report.outcomes[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("SOP"));
}

#[tokio::test]
async fn test_transient_failure_recovers_on_retry() {
    let h = harness();
    let portal = FakePortal::with(|s| s.fail_searches = 1);

    let report = run(&h, &portal, &["100"], Tag::Sad).await;

    assert_eq!(report.outcomes[0].status, RecordStatus::Success);
    assert!(report.outcomes[0].error_message.is_none());
    assert_eq!(portal.tags_of("100"), vec!["SAD"]);
}

#[tokio::test]
async fn test_unconfirmed_save_still_counts_as_success() {
    let h = harness();
    let portal = FakePortal::with(|s| s.drop_saved_tags = true);

    let report = run(&h, &portal, &["100"], Tag::Sad).await;

    assert_eq!(report.outcomes[0].status, RecordStatus::Success);
    assert!(report.outcomes[0].error_message.is_none());
    assert!(portal.tags_of("100").is_empty());
    assert!(portal.state().clicks.contains(&"#save".to_string()));
    assert_eq!(portal.opened_count("100"), 1);
}

#[tokio::test]
async fn test_unusable_saved_session_does_not_abort_batch() {
    let h = harness();
    h.store.save(&valid_snapshot()).await.unwrap();
    let portal = FakePortal::with(|s| s.fail_import = true);

    let report = run(&h, &portal, &["100", "200"], Tag::Sad).await;

    assert!(!report.aborted);
    assert_eq!(report.successful(), 2);
    assert_eq!(portal.state().credential_submits, 1);
}
