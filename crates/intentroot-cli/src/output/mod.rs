//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use intentroot_core::intents::IntentSummary;
use intentroot_core::memory::RecalledEntry;
use intentroot_core::{Candidate, Resolution, ScoredDecision};

/// Format an offline scoring result
pub fn format_scored(scored: &ScoredDecision, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(scored),
        OutputFormat::Cli => terminal::format_scored(scored),
    }
}

/// Format a full resolution with per-source reports
pub fn format_resolution(resolution: &Resolution, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(resolution),
        OutputFormat::Cli => terminal::format_resolution(resolution),
    }
}

/// Format the rule matcher's answer for one query
pub fn format_rule_match(query: &str, candidate: Option<&Candidate>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_rule_match(query, candidate),
        OutputFormat::Cli => terminal::format_rule_match(candidate),
    }
}

pub fn format_intents(intents: &[IntentSummary], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(&intents),
        OutputFormat::Cli => terminal::format_intents(intents),
    }
}

pub fn format_recalled(entries: &[RecalledEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(&entries),
        OutputFormat::Cli => terminal::format_recalled(entries),
    }
}
