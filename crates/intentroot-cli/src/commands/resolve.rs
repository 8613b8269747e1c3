//! Full hybrid resolution of one query

use super::{join_query, llm_client};
use crate::app::ResolveArgs;
use crate::output;
use crate::Context;
use anyhow::Result;
use intentroot_core::{
    Embedder, HttpEmbedder, HttpIntentClassifier, IntentResolver, Query, VectorIndex,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn run(args: ResolveArgs, ctx: &Context) -> Result<()> {
    let config = Arc::new(ctx.config.clone());
    let client = llm_client(&config.llm_service)?;
    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(Arc::clone(&client)));
    let index: Arc<dyn VectorIndex> = Arc::new(ctx.open_index()?);

    let resolver = IntentResolver::new(Arc::clone(&config))?
        .with_services(embedder, Arc::clone(&index))
        .with_llm(Arc::new(HttpIntentClassifier::new(client)));
    resolver.check_collections(args.agent.as_deref()).await?;

    if config.llm_classifier.enabled {
        let collections = config.routing.collections_for(args.agent.as_deref());
        resolver
            .registry()
            .reload(index.as_ref(), &collections)
            .await?;
    }

    let mut query = Query::new(join_query(&args.query), args.session);
    if let Some(agent) = args.agent {
        query = query.with_agent(agent);
    }

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let resolution = resolver.resolve_cancellable(&query, &token).await?;
    print!("{}", output::format_resolution(&resolution, ctx.format));

    if let Some(response) = args.response.as_deref() {
        if let Some(handle) = resolver.record(&query, &resolution.decision, Some(response)) {
            let written = handle.await?;
            tracing::debug!(entries = written, "Interaction recorded");
        }
    }
    Ok(())
}
