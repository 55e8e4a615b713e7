mod cli;

use anyhow::{Context, Result};
use callpod_filter::{apply_suggestion, FieldRegistry, FilterConfig, FilterSession, ServiceCatalog};
use clap::Parser;
use cli::Cli;
use crossbeam::channel::{bounded, RecvTimeoutError};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use std::sync::Arc;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::default(),
    };
    config.loaded_from_dump |= cli.from_dump;
    let catalog = match &cli.services {
        Some(path) => ServiceCatalog::load(path)?,
        None => ServiceCatalog::default(),
    };
    let session = FilterSession::new(config, FieldRegistry::standard(Arc::new(catalog)));

    let timeout = session.config().suggestion_timeout();
    let cursor = cli.cursor.unwrap_or_else(|| cli.query.chars().count());
    let (sender, receiver) = bounded(1);
    let pass = session.on_input(
        &cli.query,
        Some(cursor),
        Box::new(move |candidates| {
            let _ = sender.send(candidates);
        }),
    );

    if let Some(message) = pass.compiled.diagnostic() {
        println!("diagnostic: {message}");
    }
    if let Some(tree) = &pass.compiled.tree {
        let json = serde_json::to_string_pretty(tree).context("serialize condition tree")?;
        println!("{json}");
    }

    let Some(target) = &pass.target else {
        return Ok(());
    };
    let suggestions = match receiver.recv_timeout(timeout) {
        Ok(suggestions) => suggestions,
        Err(RecvTimeoutError::Timeout) => {
            warn!(?timeout, "suggestions did not arrive in time");
            Vec::new()
        }
        Err(RecvTimeoutError::Disconnected) => Vec::new(),
    };
    for (index, suggestion) in suggestions.iter().enumerate() {
        println!("suggestion {index}: {suggestion}");
    }

    if let Some(index) = cli.apply {
        let suggestion = suggestions
            .get(index)
            .with_context(|| format!("no suggestion {index}, got {}", suggestions.len()))?;
        let tree = pass.compiled.tree.as_ref().context("no condition tree to edit")?;
        let printed = apply_suggestion(tree, target, suggestion)?;
        println!("query: {}", printed.text);
        if let Some(cursor) = printed.cursor {
            println!("cursor: {cursor}");
        }
    }
    Ok(())
}
