//! Collection management commands

use crate::app::{CollectionAction, CollectionArgs, OutputFormat};
use crate::Context;
use anyhow::Result;
use intentroot_core::{VectorSchema, FACET_CONTENT};

pub async fn run(args: CollectionArgs, ctx: &Context) -> Result<()> {
    let index = ctx.open_index()?;

    match args.action {
        CollectionAction::Create { name, dims, facets } => {
            let facets = if facets.is_empty() {
                vec![FACET_CONTENT.to_string()]
            } else {
                facets
            };
            let schema = VectorSchema::new(dims, facets);
            let created = name.clone();
            index
                .with_db(move |db| db.create_collection(&created, &schema))
                .await?;
            println!("Created collection '{}' ({} dims)", name, dims);
        }
        CollectionAction::List => {
            let collections = index.with_db(|db| db.list_collections()).await?;
            match ctx.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&collections)?);
                }
                OutputFormat::Cli => {
                    if collections.is_empty() {
                        println!("No collections");
                    } else {
                        for coll in collections {
                            println!(
                                "{}: {} dims [{}] {} points",
                                coll.name,
                                coll.dimensions,
                                coll.facets.join(", "),
                                coll.point_count
                            );
                        }
                    }
                }
            }
        }
        CollectionAction::Remove { name } => {
            let removed = name.clone();
            if index.with_db(move |db| db.remove_collection(&removed)).await? {
                println!("Removed collection '{}'", name);
            } else {
                return Err(intentroot_core::IntentRootError::CollectionNotFound(name).into());
            }
        }
    }
    Ok(())
}
