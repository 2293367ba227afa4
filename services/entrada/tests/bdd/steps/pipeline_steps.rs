//! BDD step definitions for the message-to-entry pipeline

use cucumber::{given, then, when};
use entrada::config::ApiConfig;
use entrada::record::{ProductEntry, ProductRecord};
use serde_json::json;

use crate::logs;
use crate::world::EntradaWorld;

#[given(expr = "a product catalog with product {string} named {string} on print card {string}")]
fn catalog_product(world: &mut EntradaWorld, epc: String, name: String, print_card: String) {
    world.catalog.add_product(&epc, &name, &print_card);
}

#[given(expr = "the catalog has an image {string} for print card {string}")]
fn catalog_image(world: &mut EntradaWorld, payload: String, print_card: String) {
    world.catalog.add_image(&print_card, &payload);
}

#[given(expr = "the board already shows an entry for EPC {string}")]
async fn board_has_entry(world: &mut EntradaWorld, epc: String) {
    let record = ProductRecord {
        product_name: Some("Existente".to_string()),
        ..Default::default()
    };
    let entry = ProductEntry::new(record, "http://img".to_string(), &epc, 1);
    world.state().write().await.add_entry(entry);
}

#[when(expr = "the hub announces EPC {string}")]
async fn announce_epc(world: &mut EntradaWorld, epc: String) {
    let pipeline = world.pipeline();
    if let Some(lookup) = pipeline.handle_message(&json!({ "epc": epc })).await {
        lookup.await.expect("lookup task panicked");
    }
}

#[when("the hub announces a message without an EPC")]
async fn announce_without_epc(world: &mut EntradaWorld) {
    let pipeline = world.pipeline();
    let lookup = pipeline
        .handle_message(&json!({ "codigo": "E2801160" }))
        .await;
    assert!(lookup.is_none(), "malformed message should not start a lookup");
}

#[then(expr = "the board shows {int} entries")]
async fn board_shows(world: &mut EntradaWorld, count: usize) {
    let state = world.state();
    let state = state.read().await;
    assert_eq!(state.entries.len(), count);
}

#[then(expr = "the newest entry is for EPC {string}")]
async fn newest_epc(world: &mut EntradaWorld, epc: String) {
    let state = world.state();
    let state = state.read().await;
    let newest = state.newest().expect("board is empty");
    assert_eq!(newest.epc, epc);
}

#[then(expr = "the newest entry shows product {string}")]
async fn newest_product(world: &mut EntradaWorld, name: String) {
    let state = world.state();
    let state = state.read().await;
    let newest = state.newest().expect("board is empty");
    assert_eq!(newest.product_name, name);
}

#[then(expr = "the newest entry shows image {string}")]
async fn newest_image(world: &mut EntradaWorld, image: String) {
    let state = world.state();
    let state = state.read().await;
    let newest = state.newest().expect("board is empty");
    assert_eq!(newest.image, image);
}

#[then("the newest entry shows the placeholder image")]
async fn newest_placeholder(world: &mut EntradaWorld) {
    let state = world.state();
    let state = state.read().await;
    let newest = state.newest().expect("board is empty");
    assert_eq!(newest.image, ApiConfig::default().placeholder_image_url);
}

#[then("no image lookup was made")]
fn no_image_lookup(world: &mut EntradaWorld) {
    let requests = world.catalog.requests.lock().unwrap();
    assert!(
        requests.iter().all(|r| !r.contains("/api/Image/")),
        "unexpected lookup: {:?}",
        requests
    );
}

#[then(expr = "a warning mentioning {string} is logged")]
fn warning_logged(_world: &mut EntradaWorld, needle: String) {
    let logs = logs::captured();
    assert!(
        logs.lines()
            .any(|line| line.contains("WARN") && line.contains(&needle)),
        "Expected a warning mentioning '{}'.\nCaptured logs:\n{}",
        needle,
        logs
    );
}
