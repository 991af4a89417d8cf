use chrono::Utc;
use match_core::{
    RewardCatalog, RewardCatalogEntry, SessionRecord, SessionState, SessionSummary, TicketStatus,
    SESSION_TTL_SECS,
};
use match_service::{
    CatalogHandle, CoordinatorConfig, GrantOutcome, InMemoryBackend, InMemoryBackendConfig,
    MatchmakingCoordinator, RewardError, RewardFlushStatus, RewardLedger, SessionError,
    SessionManager, TicketError,
};
use match_store::{InMemoryLedger, InMemorySessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn test_catalog() -> RewardCatalog {
    RewardCatalog {
        version: "1.0".to_string(),
        last_updated: "2026-01-15".to_string(),
        rewards: ["first_capture", "perfect_game", "spell_master"]
            .iter()
            .map(|id| RewardCatalogEntry {
                id: id.to_string(),
                name: id.to_string(),
                description: String::new(),
                category: None,
            })
            .collect(),
    }
}

struct Fixture {
    session_store: Arc<InMemorySessionStore>,
    ledger: Arc<RewardLedger>,
    sessions: Arc<SessionManager>,
    coordinator: MatchmakingCoordinator,
}

fn fixture_with(backend_config: InMemoryBackendConfig) -> Fixture {
    let catalog = CatalogHandle::new(test_catalog());
    let session_store = Arc::new(InMemorySessionStore::new());
    let ledger = Arc::new(RewardLedger::new(
        catalog,
        Arc::new(InMemoryLedger::new()),
    ));
    let sessions = Arc::new(SessionManager::new(
        session_store.clone(),
        ledger.clone(),
    ));
    let coordinator = MatchmakingCoordinator::new(
        Arc::new(InMemoryBackend::new(backend_config)),
        sessions.clone(),
        CoordinatorConfig {
            poll_interval: Duration::from_millis(10),
            ..Default::default()
        },
    );
    Fixture {
        session_store,
        ledger,
        sessions,
        coordinator,
    }
}

fn fixture() -> Fixture {
    fixture_with(InMemoryBackendConfig::default())
}

#[tokio::test]
async fn grant_twice_yields_one_record_and_one_timestamp() {
    let f = fixture();

    let first = f.ledger.grant("p1", "first_capture", "s1").await.unwrap();
    let second = f.ledger.grant("p1", "first_capture", "s2").await.unwrap();

    let original = match first {
        GrantOutcome::Granted(g) => g,
        other => panic!("expected Granted, got {:?}", other),
    };
    match second {
        GrantOutcome::AlreadyGranted(g) => {
            assert_eq!(g.granted_at, original.granted_at);
            assert_eq!(g.source_session_id, "s1");
        }
        other => panic!("expected AlreadyGranted, got {:?}", other),
    }

    assert_eq!(f.ledger.list_grants("p1").await.unwrap().len(), 1);
    assert!(f.ledger.has_reward("p1", "first_capture").await.unwrap());
}

#[tokio::test]
async fn concurrent_grants_one_winner_both_succeed() {
    let f = fixture();
    let ledger1 = f.ledger.clone();
    let ledger2 = f.ledger.clone();

    let a = tokio::spawn(async move { ledger1.grant("p1", "first_capture", "s1").await });
    let b = tokio::spawn(async move { ledger2.grant("p1", "first_capture", "s1").await });

    let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
    let granted = outcomes
        .iter()
        .filter(|o| matches!(o, GrantOutcome::Granted(_)))
        .count();
    assert_eq!(granted, 1, "exactly one concurrent grant wins");
    assert_eq!(f.ledger.list_grants("p1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn grant_rejects_unknown_and_unloaded_catalog_distinctly() {
    let f = fixture();
    let err = f.ledger.grant("p1", "bogus_id", "s1").await.unwrap_err();
    assert_eq!(err, RewardError::InvalidRewardId("bogus_id".to_string()));

    let unloaded = RewardLedger::new(
        CatalogHandle::unloaded(),
        Arc::new(InMemoryLedger::new()),
    );
    let err = unloaded.grant("p1", "first_capture", "s1").await.unwrap_err();
    assert_eq!(err, RewardError::CatalogUnavailable);
}

#[tokio::test]
async fn full_session_lifecycle_grants_and_summarizes() {
    let f = fixture();

    let record = f.sessions.create_session("p1", "shard-1").await.unwrap();
    let id = record.session_id.clone();

    // Events are rejected before activation and never reach the summary
    let err = f
        .sessions
        .record_event(&id, "early".to_string(), HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotActive { .. }));

    f.sessions.activate(&id).await.unwrap();
    assert_eq!(
        f.sessions.session_state(&id).await.unwrap(),
        SessionState::Active
    );

    for event_type in ["spell_cast", "objective_captured", "spell_cast"] {
        f.sessions
            .record_event(&id, event_type.to_string(), HashMap::new())
            .await
            .unwrap();
    }
    f.sessions.grant_reward(&id, "first_capture").await.unwrap();

    let report = f.sessions.end_session(&id).await.unwrap();
    assert_eq!(report.summary.rewards, vec!["first_capture".to_string()]);
    assert_eq!(
        report.summary.ttl,
        report.summary.end_time.timestamp() + SESSION_TTL_SECS
    );
    let now = Utc::now().timestamp();
    assert!((report.summary.ttl - (now + SESSION_TTL_SECS)).abs() <= 2);

    // Ledger holds the grant
    assert!(f.ledger.has_reward("p1", "first_capture").await.unwrap());

    // The durable side never sees events: the summary is the only record
    let summary = f.sessions.get_summary("p1", &id).await.unwrap().unwrap();
    assert_eq!(summary, report.summary);

    // Events after end are rejected
    let err = f
        .sessions
        .record_event(&id, "late".to_string(), HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::NotActive {
            state: SessionState::Ended,
            ..
        }
    ));
}

#[tokio::test]
async fn end_session_is_idempotent() {
    let f = fixture();
    let record = f.sessions.create_session("p1", "shard-1").await.unwrap();
    let id = record.session_id.clone();
    f.sessions.activate(&id).await.unwrap();
    f.sessions.grant_reward(&id, "first_capture").await.unwrap();
    f.sessions.grant_reward(&id, "perfect_game").await.unwrap();

    let first = f.sessions.end_session(&id).await.unwrap();
    let second = f.sessions.end_session(&id).await.unwrap();

    assert_eq!(first.summary, second.summary);
    assert!(second
        .reward_results
        .iter()
        .all(|r| r.status == RewardFlushStatus::AlreadyGranted));
    assert_eq!(f.ledger.list_grants("p1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_pending_reward_fails_alone_and_is_excluded_from_summary() {
    let f = fixture();
    let record = f.sessions.create_session("p1", "shard-1").await.unwrap();
    let id = record.session_id.clone();
    f.sessions.activate(&id).await.unwrap();

    // Staging validates, so plant a bogus id directly to exercise the flush path
    f.sessions.grant_reward(&id, "first_capture").await.unwrap();
    let mut planted = f.sessions.get_session(&id).await.unwrap();
    planted.pending_rewards.push("bogus_id".to_string());
    planted.pending_rewards.push("perfect_game".to_string());
    f.session_store.plant_session(planted).await;

    let report = f.sessions.end_session(&id).await.unwrap();

    assert_eq!(report.reward_results.len(), 3);
    let by_id: HashMap<_, _> = report
        .reward_results
        .iter()
        .map(|r| (r.reward_id.as_str(), &r.status))
        .collect();
    assert_eq!(by_id["first_capture"], &RewardFlushStatus::Granted);
    assert_eq!(by_id["perfect_game"], &RewardFlushStatus::Granted);
    assert_eq!(
        by_id["bogus_id"],
        &RewardFlushStatus::Failed(RewardError::InvalidRewardId("bogus_id".to_string()))
    );

    // Summary carries only the accepted ids, in pending order
    assert_eq!(
        report.summary.rewards,
        vec!["first_capture".to_string(), "perfect_game".to_string()]
    );
}

#[tokio::test]
async fn staging_rejects_invalid_reward_up_front() {
    let f = fixture();
    let record = f.sessions.create_session("p1", "shard-1").await.unwrap();
    let id = record.session_id.clone();
    f.sessions.activate(&id).await.unwrap();

    let err = f.sessions.grant_reward(&id, "bogus_id").await.unwrap_err();
    assert_eq!(
        err,
        SessionError::Reward(RewardError::InvalidRewardId("bogus_id".to_string()))
    );
}

#[tokio::test]
async fn activate_is_idempotent_but_rejects_ended() {
    let f = fixture();
    let record = f.sessions.create_session("p1", "shard-1").await.unwrap();
    let id = record.session_id.clone();

    f.sessions.activate(&id).await.unwrap();
    let again = f.sessions.activate(&id).await.unwrap();
    assert_eq!(again.state, SessionState::Active);

    f.sessions.end_session(&id).await.unwrap();
    let err = f.sessions.activate(&id).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::NotActive {
            state: SessionState::Ended,
            ..
        }
    ));
}

#[tokio::test]
async fn ending_a_created_session_is_rejected() {
    let f = fixture();
    let record = f.sessions.create_session("p1", "shard-1").await.unwrap();
    let err = f.sessions.end_session(&record.session_id).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::NotActive {
            state: SessionState::Created,
            ..
        }
    ));
}

#[tokio::test]
async fn expired_session_reads_as_never_existed() {
    let f = fixture();

    let mut record = SessionRecord::with_id(
        "s-old".to_string(),
        "p1".to_string(),
        "shard-1".to_string(),
    );
    record.state = SessionState::Ended;
    record.end_time = Some(Utc::now());
    record.ttl = Some(Utc::now().timestamp() - 10);
    f.session_store.plant_session(record).await;

    let err = f.sessions.get_session("s-old").await.unwrap_err();
    assert_eq!(err, SessionError::NotFound("s-old".to_string()));

    let end = Utc::now();
    let mut summary = SessionSummary::new(
        "p1".to_string(),
        "s-old".to_string(),
        end,
        end,
        vec!["first_capture".to_string()],
    );
    summary.ttl = Utc::now().timestamp() - 10;
    f.session_store.plant_summary(summary).await;
    assert!(f.sessions.get_summary("p1", "s-old").await.unwrap().is_none());
}

#[tokio::test]
async fn request_match_merges_defaults_and_requires_player() {
    let f = fixture();

    let err = f.coordinator.request_match("  ", None).await.unwrap_err();
    assert!(matches!(err, TicketError::InvalidRequest(_)));

    let ticket = f.coordinator.request_match("p1", None).await.unwrap();
    let attrs = &ticket.players[0].attributes;
    assert_eq!(
        attrs.get("skill"),
        Some(&match_core::AttributeValue::Number(10.0))
    );
    assert_eq!(
        attrs.get("region"),
        Some(&match_core::AttributeValue::Text("us-west-2".to_string()))
    );

    // Caller-supplied values win over defaults
    let mut custom = HashMap::new();
    custom.insert(
        "skill".to_string(),
        match_core::AttributeValue::Number(42.0),
    );
    let ticket = f.coordinator.request_match("p2", Some(custom)).await.unwrap();
    assert_eq!(
        ticket.players[0].attributes.get("skill"),
        Some(&match_core::AttributeValue::Number(42.0))
    );
}

#[tokio::test]
async fn unknown_ticket_is_not_found() {
    let f = fixture();
    let err = f.coordinator.get_status("unknown-ticket").await.unwrap_err();
    assert_eq!(err, TicketError::NotFound("unknown-ticket".to_string()));
}

#[tokio::test]
async fn completed_ticket_derives_created_sessions_once() {
    let f = fixture();

    let t1 = f.coordinator.request_match("p1", None).await.unwrap();
    let seen = f.coordinator.get_status(&t1.ticket_id).await.unwrap();
    assert_eq!(seen.status, TicketStatus::Searching);

    let t2 = f.coordinator.request_match("p2", None).await.unwrap();
    assert_eq!(t2.status, TicketStatus::Completed);

    let info = t2.connection_info.as_ref().unwrap();
    assert_eq!(info.matched_player_sessions.len(), 2);

    for placement in &info.matched_player_sessions {
        let session = f
            .sessions
            .get_session(&placement.player_session_id)
            .await
            .unwrap();
        assert_eq!(session.state, SessionState::Created);
        assert_eq!(session.shard_id, info.session_arn);
    }

    // Repeat observation: sessions stay as they are
    let placement = &info.matched_player_sessions[0];
    f.sessions.activate(&placement.player_session_id).await.unwrap();
    f.coordinator.get_status(&t1.ticket_id).await.unwrap();
    assert_eq!(
        f.sessions
            .session_state(&placement.player_session_id)
            .await
            .unwrap(),
        SessionState::Active
    );
}

#[tokio::test]
async fn local_poll_timeout_leaves_backend_ticket_live() {
    let f = fixture();

    let ticket = f.coordinator.request_match("p1", None).await.unwrap();
    let view = f
        .coordinator
        .wait_for_match(&ticket.ticket_id, Duration::from_millis(30))
        .await
        .unwrap();
    assert_eq!(view.status, TicketStatus::TimedOut);
    assert!(view.connection_info.is_none());

    // The backend still has the ticket open
    let live = f.coordinator.get_status(&ticket.ticket_id).await.unwrap();
    assert_eq!(live.status, TicketStatus::Searching);

    // A second player still completes it
    f.coordinator.request_match("p2", None).await.unwrap();
    let done = f.coordinator.get_status(&ticket.ticket_id).await.unwrap();
    assert_eq!(done.status, TicketStatus::Completed);
}

#[tokio::test]
async fn wait_for_match_returns_terminal_tickets() {
    let f = fixture_with(InMemoryBackendConfig {
        match_size: 1,
        ..Default::default()
    });

    let ticket = f.coordinator.request_match("p1", None).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Completed);

    let done = f
        .coordinator
        .wait_for_match(&ticket.ticket_id, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(done.status, TicketStatus::Completed);
    assert!(done.connection_info.is_some());
}

#[tokio::test]
async fn cancel_is_idempotent_through_the_coordinator() {
    let f = fixture();
    let ticket = f.coordinator.request_match("p1", None).await.unwrap();

    let cancelled = f.coordinator.cancel(&ticket.ticket_id).await.unwrap();
    assert_eq!(cancelled.status, TicketStatus::Cancelled);

    let again = f.coordinator.cancel(&ticket.ticket_id).await.unwrap();
    assert_eq!(again.status, TicketStatus::Cancelled);

    let err = f.coordinator.cancel("unknown").await.unwrap_err();
    assert_eq!(err, TicketError::NotFound("unknown".to_string()));
}

#[tokio::test]
async fn pushed_summary_replays_idempotently() {
    let f = fixture();

    let rewards = vec!["first_capture".to_string(), "perfect_game".to_string()];
    let first = f
        .sessions
        .put_pushed_summary("p1", "s1", &rewards, None)
        .await
        .unwrap();
    assert_eq!(first.summary.rewards, rewards);

    let second = f
        .sessions
        .put_pushed_summary("p1", "s1", &rewards, Some(first.summary.end_time))
        .await
        .unwrap();
    assert_eq!(second.summary.rewards, rewards);
    assert!(second
        .reward_results
        .iter()
        .all(|r| r.status == RewardFlushStatus::AlreadyGranted));
    assert_eq!(f.ledger.list_grants("p1").await.unwrap().len(), 2);
}
