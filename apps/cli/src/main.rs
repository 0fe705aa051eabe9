use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{
    config, EntityListSession, HttpEntityGateway, NoopStatsSink,
};
use shared::protocol::FilterSet;

/// Fetches one page of translatable entities and prints it.
#[derive(Parser, Debug)]
struct Args {
    /// Entity API base url; falls back to client.toml / environment.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    locale: String,
    #[arg(long)]
    project: String,
    #[arg(long)]
    resource: String,
    #[arg(long)]
    search: Option<String>,
    /// Status facet, e.g. "missing" or "unreviewed".
    #[arg(long)]
    status: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }

    let gateway = Arc::new(HttpEntityGateway::from_settings(&settings)?);
    let session = EntityListSession::new(gateway, Arc::new(NoopStatsSink));

    let filters = FilterSet {
        search: args.search,
        status: args.status,
        ..FilterSet::default()
    };
    session
        .load_entities(&args.locale, &args.project, &args.resource, &filters)
        .await?;

    let state = session.snapshot().await;
    for entity in state.entities() {
        println!("{:>8}  {:<10?}  {}", entity.pk.0, entity.status(), entity.original);
    }
    println!(
        "{} entities, more available: {}",
        state.len(),
        state.has_more()
    );

    Ok(())
}
