// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::site::{Status, ValidationMode};

#[test]
fn site_upsert_without_tags_defaults_to_empty() {
    // Entries written before tags existed should still parse
    let json = r#"{"SiteUpsert":{"id":3,"name":"api","url":"https://api.test"}}"#;

    let op: Operation = serde_json::from_str(json).unwrap();

    match op {
        Operation::SiteUpsert { id, tags, .. } => {
            assert_eq!(id, 3);
            assert!(tags.is_empty());
        }
        _ => panic!("expected SiteUpsert"),
    }
}

#[test]
fn settings_upsert_uses_snake_case_mode() {
    let op = Operation::SettingsUpsert {
        site_id: 1,
        settings: SiteSettings::default().with_mode(ValidationMode::Script, Some("return true;".into())),
    };

    let json = serde_json::to_string(&op).unwrap();
    assert!(json.contains("\"validation_mode\":\"script\""), "{}", json);

    let parsed: Operation = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, op);
}

#[test]
fn operations_report_site_and_table() {
    let ops = [
        (Operation::SiteDelete { id: 4 }, "sites"),
        (Operation::SettingsDelete { site_id: 4 }, "site_settings"),
        (
            Operation::ResultUpsert {
                site_id: 4,
                result: ValidationResult {
                    timestamp_ms: 1,
                    status: Status::Ok,
                    reason: None,
                },
            },
            "validation_results",
        ),
        (
            Operation::RetryPolicyUpsert {
                site_id: 4,
                policy: RetryPolicy::new(3, 6),
            },
            "retry_policies",
        ),
        (
            Operation::HeadersReplace {
                site_id: 4,
                headers: vec![Header::new("Accept", "text/html")],
            },
            "headers",
        ),
    ];

    for (op, table) in ops {
        assert_eq!(op.site_id(), 4);
        assert_eq!(op.table(), table);
    }
}
