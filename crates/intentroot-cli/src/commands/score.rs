//! Offline scoring of candidate lists

use crate::app::ScoreArgs;
use crate::output;
use crate::Context;
use anyhow::{Context as _, Result};
use intentroot_core::{Candidate, HybridScorer, IntentRootError};
use std::io::Read;

pub async fn run(args: ScoreArgs, ctx: &Context) -> Result<()> {
    ctx.config.validate()?;

    let content = if args.candidates.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.candidates)
            .with_context(|| format!("reading {}", args.candidates.display()))?
    };

    let candidates: Vec<Candidate> = serde_json::from_str(&content)
        .map_err(|e| IntentRootError::InvalidInput(format!("candidate list: {}", e)))?;
    for candidate in &candidates {
        candidate.validate()?;
    }

    let scorer = HybridScorer::new(&ctx.config.scoring);
    let scored = scorer.score_detailed(&candidates, chrono::Utc::now());
    print!("{}", output::format_scored(&scored, ctx.format));
    Ok(())
}
