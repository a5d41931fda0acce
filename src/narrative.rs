//! Human-readable explanations of an allocation.
//!
//! A [`Narrator`] may call out to anything (a text-generation service, a
//! translation layer). Its output is decoration only: it is attached to
//! [`AllocationResult::explanation`] after every number is final, and any
//! failure falls back to [`TemplateNarrator`].

use crate::optimization::composer::AllocationResult;
use crate::optimization::decision::Decision;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NarrativeError {
    #[error("narrator unavailable")]
    Unavailable,
    #[error("narration failed: {0}")]
    Failed(String),
}

pub trait Narrator {
    fn narrate(&self, result: &AllocationResult) -> Result<String, NarrativeError>;
}

/// Deterministic explanation built from the result's own fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl Narrator for TemplateNarrator {
    fn narrate(&self, result: &AllocationResult) -> Result<String, NarrativeError> {
        Ok(template_explanation(result))
    }
}

fn template_explanation(result: &AllocationResult) -> String {
    let symbol = result.home_currency.symbol();
    let hints = &result.ui_hints;

    let route = match result.decision {
        Decision::CreditOptimised => format!(
            "{} on {} keeps your savings invested until the statement is due.",
            hints.headline, result.category
        ),
        Decision::PassThrough => format!(
            "{}. No card offers a better return on {} spend.",
            hints.headline, result.category
        ),
        Decision::Split => format!(
            "{} to stay within each source's limit while keeping the best rates.",
            hints.headline
        ),
        Decision::FallbackInternational => format!(
            "{}. Home sources could not cover {}{:.2} on their own.",
            hints.headline, symbol, result.amount_home
        ),
    };

    let mut parts = vec![route, format!("{}.", hints.earn_label)];
    if result.eom_impact.net_eom_benefit != Decimal::ZERO {
        parts.push(format!("{}.", hints.comparison));
    }
    if !hints.savings_nudge.is_empty() {
        parts.push(format!("{}.", hints.savings_nudge));
    }
    parts.join(" ")
}

/// Run `narrator`, falling back to the template when it is absent or fails.
pub fn narrate_or_template(narrator: Option<&dyn Narrator>, result: &AllocationResult) -> String {
    match narrator.map(|n| n.narrate(result)) {
        Some(Ok(text)) => text,
        Some(Err(err)) => {
            log::warn!("NARRATE   | {err}; using template explanation");
            template_explanation(result)
        }
        None => template_explanation(result),
    }
}
