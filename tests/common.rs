#![allow(dead_code)]
//! Shared helpers for `callpod-filter` integration tests.

use callpod_filter::*;
use crossbeam::channel;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Opt-in log output: `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn sample_lists() -> CatalogLists {
    CatalogLists {
        pod_names: vec!["cpq-7f9c".into(), "cpq-a1b2".into(), "billing-0".into()],
        service_names: vec!["cpq".into(), "billing".into(), "CPQ-Quote".into()],
        namespaces: vec!["prod".into(), "preprod".into(), "dev".into()],
    }
}

pub fn session_with(config: FilterConfig) -> FilterSession {
    init_tracing();
    let catalog = Arc::new(ServiceCatalog::new(sample_lists()));
    FilterSession::new(config, FieldRegistry::standard(catalog))
}

pub fn session() -> FilterSession {
    session_with(FilterConfig::default())
}

/// Runs a keystroke with the cursor at the end and waits for its suggestions.
pub fn type_query(session: &FilterSession, input: &str) -> (Pass, Vec<String>) {
    type_at(session, input, input.chars().count())
}

pub fn type_at(session: &FilterSession, input: &str, cursor: usize) -> (Pass, Vec<String>) {
    let (sender, receiver) = channel::bounded(1);
    let pass = session.on_input(
        input,
        Some(cursor),
        Box::new(move |candidates| {
            let _ = sender.send(candidates);
        }),
    );
    let suggestions = if pass.target.is_some() {
        receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("suggestions were requested")
    } else {
        Vec::new()
    };
    (pass, suggestions)
}
