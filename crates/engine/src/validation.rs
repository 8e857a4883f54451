// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation strategies applied to a successful response

use crate::error::EngineError;
use crate::script::{self, ScriptLimits, ScriptOutcome};
use sw_core::{SiteSettings, ValidationMode};

/// How a response body is judged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStrategy {
    /// Reaching the site is enough
    StatusCode,
    /// Body must contain `term` (case-sensitive)
    TermSearch { term: String },
    /// Script must return `true`
    Script { source: String },
}

/// Result of judging a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Error(String),
}

impl ValidationStrategy {
    pub fn from_settings(settings: &SiteSettings) -> Result<Self, EngineError> {
        let mode = settings.validation_mode;
        let args = || {
            settings
                .validation_args
                .clone()
                .ok_or(EngineError::MissingValidationArgs(mode))
        };
        Ok(match mode {
            ValidationMode::StatusCode => ValidationStrategy::StatusCode,
            ValidationMode::TermSearch => ValidationStrategy::TermSearch { term: args()? },
            ValidationMode::Script => ValidationStrategy::Script { source: args()? },
        })
    }

    pub fn mode(&self) -> ValidationMode {
        match self {
            ValidationStrategy::StatusCode => ValidationMode::StatusCode,
            ValidationStrategy::TermSearch { .. } => ValidationMode::TermSearch,
            ValidationStrategy::Script { .. } => ValidationMode::Script,
        }
    }

    pub async fn evaluate(&self, body: &str, limits: ScriptLimits) -> Verdict {
        match self {
            ValidationStrategy::StatusCode => Verdict::Ok,
            ValidationStrategy::TermSearch { term } => {
                if body.contains(term.as_str()) {
                    Verdict::Ok
                } else {
                    Verdict::Error(format!("Term \"{}\" not found in response body.", term))
                }
            }
            ValidationStrategy::Script { source } => {
                match script::evaluate(source, body, limits).await {
                    Ok(outcome) => script_verdict(outcome),
                    Err(e) => Verdict::Error(e.to_string()),
                }
            }
        }
    }
}

fn script_verdict(outcome: ScriptOutcome) -> Verdict {
    match outcome {
        ScriptOutcome::Returned(value) => match value.as_str() {
            "true" => Verdict::Ok,
            "false" => Verdict::Error("Script returned false.".to_string()),
            "undefined" => Verdict::Error("Script did not return or throw anything.".to_string()),
            _ => Verdict::Error(value),
        },
        ScriptOutcome::Threw(message) => Verdict::Error(message),
        ScriptOutcome::TimedOut(limit) => Verdict::Error(format!(
            "Script timed out after {}ms.",
            limit.as_millis()
        )),
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
