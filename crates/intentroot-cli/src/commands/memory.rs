//! Episodic memory commands

use super::{join_query, llm_client};
use crate::app::{MemoryAction, MemoryArgs};
use crate::output;
use crate::Context;
use anyhow::Result;
use intentroot_core::{recall, HttpEmbedder};

pub async fn run(args: MemoryArgs, ctx: &Context) -> Result<()> {
    match args.action {
        MemoryAction::Recall {
            query,
            session,
            limit,
        } => {
            let index = ctx.open_index()?;
            let embedder = HttpEmbedder::new(llm_client(&ctx.config.llm_service)?);
            let recalled = recall(
                &index,
                &embedder,
                &ctx.config.memory.collection,
                &session,
                &join_query(&query),
                limit,
            )
            .await?;
            print!("{}", output::format_recalled(&recalled, ctx.format));
        }
    }
    Ok(())
}
