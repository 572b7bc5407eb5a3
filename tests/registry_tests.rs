use std::collections::HashSet;
use std::sync::Arc;

use portdrop::registry::{RegistryError, SessionRegistry, SessionState};

#[tokio::test]
async fn concurrent_offers_yield_distinct_codes_in_range() {
    const OFFERS: usize = 200;
    let registry = Arc::new(SessionRegistry::new(20000..=29999));

    let mut handles = Vec::with_capacity(OFFERS);
    for i in 0..OFFERS {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry.offer(format!("/tmp/file-{i}")).expect("offer")
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let code = handle.await.expect("join");
        assert!((20000..=29999).contains(&code), "code {code} out of range");
        assert!(codes.insert(code), "code {code} handed out twice");
    }
    assert_eq!(codes.len(), OFFERS);
    assert_eq!(registry.len(), OFFERS);
}

#[tokio::test]
async fn offers_accumulate_without_eviction() {
    let registry = SessionRegistry::new(30000..=30010);
    let mut codes = Vec::new();
    for i in 0..5 {
        codes.push(registry.offer(format!("/tmp/f{i}")).expect("offer"));
    }

    // Completing one session does not free its entry or its code
    registry
        .transition(codes[0], SessionState::Serving)
        .unwrap();
    registry
        .transition(codes[0], SessionState::Completed)
        .unwrap();

    assert_eq!(registry.len(), 5);
    for code in &codes {
        assert!(registry.lookup(*code).is_some());
    }
}

#[tokio::test]
async fn exhausted_range_is_a_reported_error() {
    let registry = SessionRegistry::new(31000..=31002);
    for _ in 0..3 {
        registry.offer("/tmp/x").expect("offer inside range");
    }
    assert_eq!(
        registry.offer("/tmp/overflow"),
        Err(RegistryError::CodeSpaceExhausted)
    );
}

#[tokio::test]
async fn failed_sessions_are_terminal() {
    let registry = SessionRegistry::new(32000..=32000);
    let code = registry.offer("/tmp/x").expect("offer");
    registry.transition(code, SessionState::Serving).unwrap();
    registry.transition(code, SessionState::Failed).unwrap();

    assert!(registry.transition(code, SessionState::Serving).is_err());
    assert!(registry.transition(code, SessionState::Completed).is_err());
    assert_eq!(registry.state(code), Some(SessionState::Failed));
}
