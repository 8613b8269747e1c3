//! Rule matcher dry run

use super::join_query;
use crate::app::QueryArgs;
use crate::output;
use crate::Context;
use anyhow::Result;
use intentroot_core::RuleMatcher;

pub async fn run(args: QueryArgs, ctx: &Context) -> Result<()> {
    let matcher = RuleMatcher::new(&ctx.config.rules)?;
    let query = join_query(&args.query);
    let candidate = matcher.classify(&query);
    print!(
        "{}",
        output::format_rule_match(&query, candidate.as_ref(), ctx.format)
    );
    Ok(())
}
