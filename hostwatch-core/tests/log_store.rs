use chrono::{Datelike, Local, NaiveDate};
use hostwatch_core::config::RecentErrorOrder;
use hostwatch_core::{Error, LogQuery, LogStore, Severity};
use hostwatch_devkit::{fixtures, init_test_logging, LogFixture};
use std::sync::Arc;

#[tokio::test]
async fn test_summary_over_standard_sources() {
    init_test_logging();
    let fixture = LogFixture::standard().unwrap();
    let store = LogStore::new(fixture.config());

    let summary = store.summary().await;
    assert_eq!(summary.total_entries, 12);
    assert_eq!(summary.error_count, 4);
    assert_eq!(summary.warning_count, 2);
    assert_eq!(summary.source_counts["auth"], 6);
    assert_eq!(summary.source_counts["kern"], 2);
    assert_eq!(summary.source_counts["syslog"], 4);

    // walked in source name order
    let origins: Vec<_> = summary
        .recent_errors
        .iter()
        .map(|r| r.process_name.clone().unwrap_or_default())
        .collect();
    assert_eq!(origins, vec!["sshd", "sshd", "kernel", "systemd"]);
    assert!(summary.recent_errors.iter().all(|r| r.level == Severity::Error));
}

#[tokio::test]
async fn test_summary_newest_errors_first() {
    let fixture = LogFixture::standard().unwrap();
    let mut config = fixture.config();
    config.recent_error_order = RecentErrorOrder::Newest;
    config.recent_errors = 3;
    let store = LogStore::new(config);

    let summary = store.summary().await;
    assert_eq!(summary.error_count, 4);
    assert_eq!(summary.recent_errors.len(), 3);

    // year-less syslog lines resolve to this year or the last, newer than the rest
    let first = &summary.recent_errors[0];
    assert_eq!(first.process_name.as_deref(), Some("systemd"));
    assert!(first.timestamp.year() >= Local::now().year() - 1);
    assert!(first.timestamp <= Local::now().naive_local() + chrono::Duration::days(1));
    assert!(summary
        .recent_errors
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
}

#[tokio::test]
async fn test_sources_and_unknown_source() {
    let fixture = LogFixture::standard().unwrap();
    let store = LogStore::new(fixture.config());

    assert_eq!(store.sources(), vec!["auth", "kern", "syslog"]);
    assert!(matches!(
        store.query(&LogQuery::for_source("fail2ban")).await,
        Err(Error::UnknownSource(_))
    ));
}

#[tokio::test]
async fn test_missing_file_is_skipped_by_summary() {
    let mut fixture = LogFixture::standard().unwrap();
    fixture.add_missing_source("fail2ban");
    let store = LogStore::new(fixture.config());

    assert!(matches!(
        store.query(&LogQuery::for_source("fail2ban")).await,
        Err(Error::SourceUnavailable { .. })
    ));
    let summary = store.summary().await;
    assert_eq!(summary.total_entries, 12);
    assert!(!summary.source_counts.contains_key("fail2ban"));
}

#[tokio::test]
async fn test_query_filters_on_fixture() {
    let fixture = LogFixture::standard().unwrap();
    let store = LogStore::new(fixture.config());

    let from_attacker = store
        .query(&LogQuery::for_source("auth").search("192.168.1.5"))
        .await
        .unwrap();
    assert_eq!(from_attacker.len(), 3);

    let start = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(8, 1, 15).unwrap();
    let failures_after = store
        .query(
            &LogQuery::for_source("auth")
                .level(Severity::Error)
                .between(Some(start), None),
        )
        .await
        .unwrap();
    assert_eq!(failures_after.len(), 1);
    assert_eq!(failures_after[0].process_id, Some(2107));

    let last = store.query(&LogQuery::for_source("auth").limit(1)).await.unwrap();
    assert_eq!(last[0].process_name.as_deref(), Some("systemd-logind"));
}

#[tokio::test]
async fn test_appended_lines_need_invalidate() {
    let fixture = LogFixture::standard().unwrap();
    let store = LogStore::new(fixture.config());
    let all = LogQuery::for_source("kern");

    assert_eq!(store.query(&all).await.unwrap().len(), 2);
    fixture
        .append("kern", "2024-03-10T09:20:00 web01 kernel: Out of memory: Killed process 4242")
        .unwrap();
    assert_eq!(store.query(&all).await.unwrap().len(), 2);

    store.invalidate("kern").unwrap();
    assert_eq!(store.query(&all).await.unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_and_summaries() {
    let fixture = LogFixture::standard().unwrap();
    let store = Arc::new(LogStore::new(fixture.config()));

    let mut tasks = Vec::new();
    for i in 0..24 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            if i % 3 == 0 {
                store.summary().await.total_entries
            } else {
                store.query(&LogQuery::for_source("auth")).await.unwrap().len()
            }
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let count = task.await.unwrap();
        assert_eq!(count, if i % 3 == 0 { 12 } else { 6 });
    }
}

#[tokio::test]
async fn test_export_round_trips_raw_bytes() {
    let fixture = LogFixture::standard().unwrap();
    let store = LogStore::new(fixture.config());
    let out = tempfile::tempdir().unwrap();

    let exported = store.export("syslog", out.path()).await.unwrap();
    assert_eq!(exported.parent(), Some(out.path()));
    assert_eq!(std::fs::read_to_string(exported).unwrap(), fixtures::SYSLOG);
}
