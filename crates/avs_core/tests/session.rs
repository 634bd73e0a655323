use std::collections::BTreeSet;

use avs_core::{
    AggregationResult, InMemorySession, SessionContext, SessionStore, TripMetadata,
};

fn init_logging() {
    avs_logging::initialize_for_tests();
}

fn result(total: &str) -> AggregationResult {
    AggregationResult {
        items: Vec::new(),
        combined_total: total.to_string(),
        issuers: BTreeSet::new(),
        last_timestamp: None,
        failed_urls: Vec::new(),
    }
}

#[test]
fn add_url_appends_in_order_and_keeps_duplicates() {
    init_logging();
    let mut store = InMemorySession::new();
    let mut ctx = SessionContext::new(&mut store);

    assert_eq!(ctx.add_url("https://a.example/nfce").unwrap(), 1);
    assert_eq!(ctx.add_url("  https://b.example/nfce \n").unwrap(), 2);
    assert_eq!(ctx.add_url("https://a.example/nfce").unwrap(), 3);
    assert_eq!(ctx.add_url("   ").unwrap(), 3);

    assert_eq!(
        ctx.pending_urls().unwrap(),
        vec![
            "https://a.example/nfce".to_string(),
            "https://b.example/nfce".to_string(),
            "https://a.example/nfce".to_string(),
        ]
    );
}

#[test]
fn new_aggregation_supersedes_previous() {
    init_logging();
    let mut store = InMemorySession::new();
    let trip = TripMetadata {
        destination: "Curitiba".to_string(),
        request_type: "ressarcimento".to_string(),
    };
    {
        let mut ctx = SessionContext::new(&mut store);
        ctx.record_authorization(&result("10,00"), &trip).unwrap();
        ctx.record_authorization(&result("20,00"), &trip).unwrap();
    }
    let stored = store.load_aggregation().unwrap().unwrap();
    assert_eq!(stored.combined_total, "20,00");
    assert_eq!(store.load_trip().unwrap(), Some(trip));
}

#[test]
fn clear_resets_urls_and_aggregation() {
    init_logging();
    let mut store = InMemorySession::new();
    let mut ctx = SessionContext::new(&mut store);
    ctx.add_url("https://a.example/nfce").unwrap();
    ctx.record_authorization(&result("10,00"), &TripMetadata::default())
        .unwrap();

    ctx.clear().unwrap();

    assert!(ctx.pending_urls().unwrap().is_empty());
    assert!(ctx.aggregation().unwrap().is_none());
}
