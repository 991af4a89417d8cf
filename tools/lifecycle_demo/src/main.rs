use match_core::{RewardCatalog, RewardCatalogEntry, TicketStatus};
use match_service::{
    CatalogHandle, CoordinatorConfig, InMemoryBackend, InMemoryBackendConfig,
    MatchmakingCoordinator, RewardLedger, SessionManager,
};
use match_store::{InMemoryLedger, InMemorySessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    println!("=== Match Lifecycle Demo ===\n");

    let catalog = CatalogHandle::new(demo_catalog());
    let ledger = Arc::new(RewardLedger::new(
        catalog,
        Arc::new(InMemoryLedger::new()),
    ));
    let sessions = Arc::new(SessionManager::new(
        Arc::new(InMemorySessionStore::new()),
        ledger.clone(),
    ));
    let coordinator = Arc::new(MatchmakingCoordinator::new(
        Arc::new(InMemoryBackend::new(InMemoryBackendConfig::default())),
        sessions.clone(),
        CoordinatorConfig {
            poll_interval: Duration::from_millis(100),
            ..Default::default()
        },
    ));

    // Two players request a match concurrently
    let c1 = Arc::clone(&coordinator);
    let c2 = Arc::clone(&coordinator);
    let alice = tokio::spawn(async move { request_and_wait(c1, "alice").await });
    let bob = tokio::spawn(async move { request_and_wait(c2, "bob").await });

    let (alice_ticket, bob_ticket) = tokio::join!(alice, bob);
    let alice_ticket = alice_ticket.expect("alice task panicked");
    let bob_ticket = bob_ticket.expect("bob task panicked");

    let info = alice_ticket
        .connection_info
        .or(bob_ticket.connection_info)
        .expect("completed ticket must carry connection info");
    println!(
        "\nMatch formed on shard {} ({}:{})",
        info.session_arn, info.address, info.port
    );

    // Play out each player's session
    for placement in &info.matched_player_sessions {
        let session_id = &placement.player_session_id;
        println!("\n[{}] session {}", placement.player_id, session_id);

        sessions.activate(session_id).await.expect("activate failed");
        println!("[{}] session active", placement.player_id);

        for event_type in ["spell_cast", "objective_captured", "spell_cast"] {
            let mut data = HashMap::new();
            data.insert("arena".to_string(), "demo".to_string());
            sessions
                .record_event(session_id, event_type.to_string(), data)
                .await
                .expect("record_event failed");
        }
        println!("[{}] recorded 3 events", placement.player_id);

        sessions
            .grant_reward(session_id, "first_capture")
            .await
            .expect("grant_reward failed");

        let report = sessions.end_session(session_id).await.expect("end failed");
        println!(
            "[{}] session ended: {} reward(s) in summary, ttl={}",
            placement.player_id,
            report.summary.rewards.len(),
            report.summary.ttl
        );
    }

    // Durable grants survive; the ephemeral side will expire on its own
    println!("\n=== Durable Reward Ledger ===");
    for placement in &info.matched_player_sessions {
        let grants = ledger
            .list_grants(&placement.player_id)
            .await
            .expect("list_grants failed");
        for grant in grants {
            println!(
                "{}: {} (granted at {}, from session {})",
                grant.player_id, grant.reward_id, grant.granted_at, grant.source_session_id
            );
        }
    }

    println!("\nDemo complete.");
}

async fn request_and_wait(
    coordinator: Arc<MatchmakingCoordinator>,
    player: &'static str,
) -> match_core::MatchTicket {
    println!("[{}] requesting match...", player);
    let ticket = coordinator
        .request_match(player, None)
        .await
        .expect("request_match failed");
    println!("[{}] ticket {} ({:?})", player, ticket.ticket_id, ticket.status);

    let ticket = coordinator
        .wait_for_match(&ticket.ticket_id, Duration::from_secs(10))
        .await
        .expect("wait_for_match failed");
    assert_eq!(ticket.status, TicketStatus::Completed, "demo expects a match");
    println!("[{}] matched!", player);
    ticket
}

fn demo_catalog() -> RewardCatalog {
    RewardCatalog {
        version: "1.0".to_string(),
        last_updated: "2026-01-15".to_string(),
        rewards: vec![RewardCatalogEntry {
            id: "first_capture".to_string(),
            name: "First Capture".to_string(),
            description: "Capture your first objective in a match".to_string(),
            category: Some("combat".to_string()),
        }],
    }
}
