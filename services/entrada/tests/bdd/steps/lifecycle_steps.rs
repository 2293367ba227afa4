//! BDD step definitions for the service lifecycle

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use entrada::config::DashboardConfig;
use entrada::{Config, EntradaBuilder};
use tokio_util::sync::CancellationToken;

use crate::doubles::RecordingHub;
use crate::world::EntradaWorld;

#[given("the hub accepts connections")]
fn hub_accepts(world: &mut EntradaWorld) {
    world.hub_refuses = false;
}

#[given("the hub refuses connections")]
fn hub_refuses(world: &mut EntradaWorld) {
    world.hub_refuses = true;
}

#[given(expr = "the hub will announce EPC {string}")]
fn hub_will_announce(world: &mut EntradaWorld, epc: String) {
    world.announcements.push(epc);
}

#[when("the service runs and is shut down")]
async fn run_and_shut_down(world: &mut EntradaWorld) {
    let hub = Arc::new(RecordingHub::new(!world.hub_refuses, &world.announcements));
    world.hub = Some(Arc::clone(&hub));

    let config = Config {
        dashboard: DashboardConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let cancel = CancellationToken::new();
    let entrada = EntradaBuilder::new(config)
        .with_http_client(Arc::new(world.catalog.clone()))
        .with_hub(hub.clone())
        .with_cancellation_token(cancel.clone())
        .build()
        .await
        .expect("service should build");
    let state = entrada.state();
    world.state = Some(Arc::clone(&state));

    let service = tokio::spawn(entrada.start());

    let expected = world.announcements.len() as u64;
    let refused = world.hub_refuses;
    let settled = async {
        loop {
            {
                let state = state.read().await;
                let joined_or_refused = hub.calls().len() >= 2 || refused;
                let handled = state.entries_added + state.messages_dropped;
                if joined_or_refused && state.messages_received == expected && handled == expected
                {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), settled)
        .await
        .expect("service did not settle in time");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), service)
        .await
        .expect("service did not stop in time")
        .expect("service task panicked")
        .expect("service returned an error");
}

#[then(expr = "the hub calls were {string}")]
fn hub_calls(world: &mut EntradaWorld, expected: String) {
    let hub = world.hub.as_ref().expect("service has not run");
    assert_eq!(hub.calls().join("; "), expected);
}

#[then("the hub connection is closed")]
fn hub_closed(world: &mut EntradaWorld) {
    use entrada::hub::Hub;
    let hub = world.hub.as_ref().expect("service has not run");
    assert!(!hub.is_connected());
    let closes = hub.calls().iter().filter(|c| *c == "close").count();
    assert_eq!(closes, 1, "connection should be closed exactly once");
}

#[then(expr = "the board reports the hub as {string}")]
async fn board_reports(world: &mut EntradaWorld, expected: String) {
    let state = world.state();
    let state = state.read().await;
    assert_eq!(state.connection.to_string(), expected);
}
