//! Status command

use crate::app::OutputFormat;
use crate::Context;
use anyhow::Result;

pub async fn run(ctx: &Context) -> Result<()> {
    let index = ctx.open_index()?;
    let stats = index.with_db(|db| db.get_stats()).await?;

    match ctx.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Cli => {
            println!("Collections:     {}", stats.collection_count);
            println!("Points:          {}", stats.point_count);
            println!("Vectors:         {}", stats.vector_count);
            if let Some(version) = stats.schema_version {
                println!("Schema version:  {}", version);
            }
        }
    }
    Ok(())
}
