// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::Parser;

#[derive(Parser)]
struct TestCli {
    #[command(subcommand)]
    command: SiteCommand,
}

fn parse(args: &[&str]) -> SiteCommand {
    let argv = std::iter::once("site").chain(args.iter().copied());
    TestCli::try_parse_from(argv).unwrap().command
}

fn add_args(args: &[&str]) -> AddArgs {
    match parse(args) {
        SiteCommand::Add(add) => add,
        _ => panic!("expected add"),
    }
}

fn edit_args(args: &[&str]) -> EditArgs {
    match parse(args) {
        SiteCommand::Edit(edit) => edit,
        _ => panic!("expected edit"),
    }
}

fn saved_site() -> Site {
    build_site(&add_args(&[
        "add",
        "api",
        "https://api.example.test",
        "--mode",
        "term_search",
        "--arg",
        "healthy",
        "--tag",
        "prod",
        "-H",
        "X-Key: abc",
        "--retries",
        "2",
        "--retry-minutes",
        "4",
    ]))
    .unwrap()
    .with_id(5)
}

#[test]
fn add_defaults_to_status_code_every_ten_minutes() {
    let site = build_site(&add_args(&["add", "api", "https://api.example.test"])).unwrap();

    let settings = site.settings.as_ref().unwrap();
    assert_eq!(settings.validation_mode, ValidationMode::StatusCode);
    assert_eq!(settings.validation_interval_ms, 600_000);
    assert_eq!(settings.network_timeout_ms, 10_000);
    assert!(!settings.disabled);
    assert!(site.retry_policy.is_none());
    assert!(!site.is_saved());
}

#[test]
fn add_collects_tags_headers_and_retry_policy() {
    let site = build_site(&add_args(&[
        "add",
        "api",
        "https://api.example.test",
        "--tag",
        "prod,eu",
        "--tag",
        " api ",
        "-H",
        "Authorization: Bearer x:y",
        "--interval",
        "90s",
        "--retries",
        "3",
        "--retry-minutes",
        "6",
    ]))
    .unwrap();

    assert_eq!(site.tags, vec!["prod", "eu", "api"]);
    assert_eq!(site.headers, vec![Header::new("Authorization", "Bearer x:y")]);
    assert_eq!(site.settings.unwrap().validation_interval_ms, 90_000);
    assert_eq!(site.retry_policy, Some(RetryPolicy::new(3, 6)));
}

#[test]
fn term_search_without_term_is_refused() {
    let err = build_site(&add_args(&[
        "add",
        "api",
        "https://api.example.test",
        "--mode",
        "term",
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("needs an argument"));
}

#[test]
fn script_can_come_from_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("check.js");
    std::fs::write(&script, "return response.includes('ok');").unwrap();

    let site = build_site(&add_args(&[
        "add",
        "api",
        "https://api.example.test",
        "--mode",
        "script",
        "--script-file",
        script.to_str().unwrap(),
    ]))
    .unwrap();

    let settings = site.settings.unwrap();
    assert_eq!(settings.validation_mode, ValidationMode::Script);
    assert_eq!(
        settings.validation_args.as_deref(),
        Some("return response.includes('ok');")
    );
}

#[test]
fn retries_need_a_window() {
    let argv = ["site", "add", "api", "https://a.test", "--retries", "3"];
    assert!(TestCli::try_parse_from(argv).is_err());
}

#[test]
fn bad_headers_are_rejected() {
    assert!(parse_headers(&["no-colon".to_string()]).is_err());
    assert!(parse_headers(&[": value".to_string()]).is_err());
}

#[test]
fn edit_only_touches_given_fields() {
    let site = saved_site();
    let edited = apply_edit(site.clone(), &edit_args(&["edit", "5", "--interval", "1h"])).unwrap();

    assert_eq!(edited.id, 5);
    assert_eq!(edited.name, site.name);
    assert_eq!(edited.tags, site.tags);
    assert_eq!(edited.headers, site.headers);
    assert_eq!(edited.retry_policy, site.retry_policy);
    let settings = edited.settings.unwrap();
    assert_eq!(settings.validation_interval_ms, 3_600_000);
    assert_eq!(settings.validation_args.as_deref(), Some("healthy"));
}

#[test]
fn edit_clears_collections_and_retry() {
    let edited = apply_edit(
        saved_site(),
        &edit_args(&["edit", "5", "--clear-tags", "--clear-headers", "--no-retry"]),
    )
    .unwrap();

    assert!(edited.tags.is_empty());
    assert!(edited.headers.is_empty());
    assert!(edited.retry_policy.is_none());
}

#[test]
fn switching_to_status_code_drops_the_argument() {
    let edited = apply_edit(saved_site(), &edit_args(&["edit", "5", "--mode", "status_code"])).unwrap();

    let settings = edited.settings.unwrap();
    assert_eq!(settings.validation_mode, ValidationMode::StatusCode);
    assert_eq!(settings.validation_args, None);
}

#[test]
fn new_term_keeps_the_mode() {
    let edited = apply_edit(saved_site(), &edit_args(&["edit", "5", "--arg", "ready"])).unwrap();

    let settings = edited.settings.unwrap();
    assert_eq!(settings.validation_mode, ValidationMode::TermSearch);
    assert_eq!(settings.validation_args.as_deref(), Some("ready"));
}

#[test]
fn schedule_outcomes_read_naturally() {
    assert_eq!(
        describe(ScheduleOutcome::Submitted { delay_ms: 1 }),
        "check scheduled now"
    );
    assert_eq!(
        describe(ScheduleOutcome::Submitted { delay_ms: 600_000 }),
        "next check in 10m"
    );
    assert_eq!(describe(ScheduleOutcome::Skipped), "not scheduled (disabled)");
}
