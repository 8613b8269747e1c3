//! Intent training and listing

use super::llm_client;
use crate::app::{IntentAction, IntentArgs, OutputFormat};
use crate::output;
use crate::Context;
use anyhow::Result;
use intentroot_core::intents::IntentSummary;
use intentroot_core::{train, HttpEmbedder, IntentCatalog, IntentRootError, VectorIndex};

/// Listing stops after this many records per collection
const LIST_LIMIT: usize = 10_000;

pub async fn run(args: IntentArgs, ctx: &Context) -> Result<()> {
    let index = ctx.open_index()?;

    match args.action {
        IntentAction::Train { catalog, agent } => {
            let catalog = IntentCatalog::load(&catalog)?;
            catalog.validate()?;

            let embedder = HttpEmbedder::new(llm_client(&ctx.config.llm_service)?);
            let report = train(
                &catalog,
                &embedder,
                &index,
                &ctx.config.routing,
                agent.as_deref(),
            )
            .await?;

            match ctx.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Cli => println!(
                    "Trained {} intents into {}",
                    report.trained,
                    report.collections.join(", ")
                ),
            }
        }
        IntentAction::List { agent } => {
            let target = ctx.config.routing.route(agent.as_deref());
            let points = match index
                .scroll(&target.collection, target.filter.as_ref(), LIST_LIMIT)
                .await
            {
                Ok(points) => points,
                Err(IntentRootError::CollectionNotFound(_)) => Vec::new(),
                Err(e) => return Err(e.into()),
            };

            let intents: Vec<IntentSummary> =
                points.iter().map(IntentSummary::from_point).collect();
            print!("{}", output::format_intents(&intents, ctx.format));
        }
    }
    Ok(())
}
