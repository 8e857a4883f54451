// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yare::parameterized;

fn strategy(mode: ValidationMode, args: Option<&str>) -> ValidationStrategy {
    let settings = SiteSettings::default().with_mode(mode, args.map(str::to_string));
    ValidationStrategy::from_settings(&settings).unwrap()
}

#[parameterized(
    term = { ValidationMode::TermSearch },
    script = { ValidationMode::Script },
)]
fn modes_with_arguments_require_them(mode: ValidationMode) {
    let settings = SiteSettings::default().with_mode(mode, None);
    let err = ValidationStrategy::from_settings(&settings).unwrap_err();
    assert!(matches!(err, EngineError::MissingValidationArgs(m) if m == mode));
}

#[test]
fn status_code_ignores_arguments() {
    let s = strategy(ValidationMode::StatusCode, None);
    assert_eq!(s, ValidationStrategy::StatusCode);
    assert_eq!(s.mode(), ValidationMode::StatusCode);
}

#[tokio::test]
async fn status_code_accepts_any_body() {
    let verdict = strategy(ValidationMode::StatusCode, None)
        .evaluate("", ScriptLimits::default())
        .await;
    assert_eq!(verdict, Verdict::Ok);
}

#[tokio::test]
async fn term_found_is_ok() {
    let verdict = strategy(ValidationMode::TermSearch, Some("healthy"))
        .evaluate("status: healthy", ScriptLimits::default())
        .await;
    assert_eq!(verdict, Verdict::Ok);
}

#[tokio::test]
async fn term_search_is_case_sensitive() {
    let verdict = strategy(ValidationMode::TermSearch, Some("Healthy"))
        .evaluate("status: healthy", ScriptLimits::default())
        .await;
    assert_eq!(
        verdict,
        Verdict::Error("Term \"Healthy\" not found in response body.".to_string())
    );
}

#[parameterized(
    returns_true = { "return true;", None },
    returns_false = { "return false;", Some("Script returned false.") },
    returns_nothing = { "response.length;", Some("Script did not return or throw anything.") },
    returns_reason = { "return 'queue backed up';", Some("queue backed up") },
    throws_error = { "throw new Error('bad payload');", Some("bad payload") },
    throws_string = { "throw 'nope';", Some("nope") },
)]
fn script_outcomes_map_to_verdicts(source: &str, reason: Option<&str>) {
    let verdict = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(strategy(ValidationMode::Script, Some(source)).evaluate("{}", ScriptLimits::default()));

    let expected = match reason {
        None => Verdict::Ok,
        Some(r) => Verdict::Error(r.to_string()),
    };
    assert_eq!(verdict, expected);
}

#[tokio::test]
async fn script_timeout_is_reported() {
    let limits = ScriptLimits {
        timeout: Duration::from_millis(50),
        ..ScriptLimits::default()
    };
    let verdict = strategy(ValidationMode::Script, Some("for (;;) {}"))
        .evaluate("", limits)
        .await;
    assert_eq!(
        verdict,
        Verdict::Error("Script timed out after 50ms.".to_string())
    );
}

#[test]
fn returned_string_true_is_ok() {
    assert_eq!(
        script_verdict(ScriptOutcome::Returned("true".into())),
        Verdict::Ok
    );
}
