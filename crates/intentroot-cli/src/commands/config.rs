//! Configuration commands

use crate::app::{ConfigAction, ConfigArgs, OutputFormat};
use crate::Context;
use anyhow::Result;
use intentroot_core::RuleMatcher;

pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    match args.action {
        ConfigAction::Check => {
            config.validate()?;
            let rules = RuleMatcher::new(&config.rules)?;

            match ctx.format {
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "valid": true,
                        "rules": rules.rule_count(),
                        "vector_enabled": config.vector.enabled,
                        "llm_enabled": config.llm_classifier.enabled,
                        "memory_enabled": config.memory.enabled,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Cli => {
                    println!("Configuration OK");
                    println!("  Rules:       {}", rules.rule_count());
                    println!("  Vector:      {}", on_off(config.vector.enabled));
                    println!("  LLM:         {}", on_off(config.llm_classifier.enabled));
                    println!("  Memory:      {}", on_off(config.memory.enabled));
                }
            }
        }
        ConfigAction::Show => match ctx.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Cli => print!("{}", serde_yaml::to_string(config)?),
        },
    }
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
