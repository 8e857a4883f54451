// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandboxed script evaluation
//!
//! Each evaluation gets a fresh QuickJS runtime and context with a memory
//! limit and an interrupt deadline. The script body becomes the body of a
//! function taking a single `response` parameter (the response body string).
//! Nothing else is exposed to it.

use rquickjs::{Context, Object, Runtime};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors setting up or running the script engine itself
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script engine failed: {0}")]
    Engine(String),
    #[error("script task failed: {0}")]
    Join(String),
}

/// Resource limits for one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
    pub timeout: Duration,
    pub memory_limit: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            memory_limit: 16 * 1024 * 1024,
        }
    }
}

/// What a script did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// Returned a value, converted with `String(value)`
    Returned(String),
    /// Threw; an `Error`'s message, or the thrown value as a string
    Threw(String),
    /// Interrupted at the deadline
    TimedOut(Duration),
}

const HARNESS: &str = r#"
(function () {
    function describe(e) {
        if (e instanceof Error) { return String(e.message); }
        return String(e);
    }
    var source = globalThis.__sw_source;
    var body = globalThis.__sw_body;
    delete globalThis.__sw_source;
    delete globalThis.__sw_body;
    var check;
    try {
        check = new Function("response", source);
    } catch (e) {
        return { threw: true, value: describe(e) };
    }
    try {
        return { threw: false, value: String(check(body)) };
    } catch (e) {
        return { threw: true, value: describe(e) };
    }
})()
"#;

/// Evaluate `source` against `body` on the blocking pool
pub async fn evaluate(
    source: &str,
    body: &str,
    limits: ScriptLimits,
) -> Result<ScriptOutcome, ScriptError> {
    let source = source.to_string();
    let body = body.to_string();
    tokio::task::spawn_blocking(move || evaluate_blocking(&source, &body, limits))
        .await
        .map_err(|e| ScriptError::Join(e.to_string()))?
}

/// Evaluate `source` against `body` on the current thread
pub fn evaluate_blocking(
    source: &str,
    body: &str,
    limits: ScriptLimits,
) -> Result<ScriptOutcome, ScriptError> {
    let runtime = Runtime::new().map_err(|e| ScriptError::Engine(e.to_string()))?;
    runtime.set_memory_limit(limits.memory_limit);

    let deadline = Instant::now() + limits.timeout;
    runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));

    let context = Context::full(&runtime).map_err(|e| ScriptError::Engine(e.to_string()))?;

    context.with(|ctx| {
        let globals = ctx.globals();
        globals
            .set("__sw_source", source)
            .and_then(|_| globals.set("__sw_body", body))
            .map_err(|e| ScriptError::Engine(e.to_string()))?;

        match ctx.eval::<Object, _>(HARNESS) {
            Ok(result) => {
                let threw: bool = result
                    .get("threw")
                    .map_err(|e| ScriptError::Engine(e.to_string()))?;
                let value: String = result
                    .get("value")
                    .map_err(|e| ScriptError::Engine(e.to_string()))?;
                Ok(if threw {
                    ScriptOutcome::Threw(value)
                } else {
                    ScriptOutcome::Returned(value)
                })
            }
            Err(_) if Instant::now() >= deadline => Ok(ScriptOutcome::TimedOut(limits.timeout)),
            Err(e) => {
                // Uncatchable engine exceptions land here, out-of-memory among them
                let caught = ctx.catch();
                let message = caught
                    .as_exception()
                    .and_then(|ex| ex.message())
                    .unwrap_or_else(|| e.to_string());
                Ok(ScriptOutcome::Threw(message))
            }
        }
    })
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
