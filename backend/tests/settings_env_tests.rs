//! Tests for settings loaded from the process environment.

mod support;

use std::sync::Arc;

use vdp_rust::config::{DEFAULT_DATABASE, DEFAULT_OUTPUT_LOCATION, DEFAULT_REGION};
use vdp_rust::execution::{LocalQueryService, QueryExecutionClient};
use vdp_rust::Settings;

const ALL_VARS: [&str; 7] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "REGION_NAME",
    "ATHENA_DATABASE",
    "ATHENA_OUTPUT_LOCATION",
    "SLEEP_TIME",
    "CREATE_BAR_CHART",
];

fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
    ALL_VARS.iter().map(|k| (*k, None)).collect()
}

fn sleep_time_for(value: Option<&str>) -> u64 {
    let mut changes = cleared();
    changes.push(("SLEEP_TIME", value));
    support::with_scoped_env(&changes, || {
        let client =
            QueryExecutionClient::new(Arc::new(LocalQueryService::new()), &Settings::from_env());
        client.sleep_time().seconds()
    })
}

#[test]
fn test_defaults_when_unset() {
    support::with_scoped_env(&cleared(), || {
        let settings = Settings::from_env();
        assert_eq!(settings.region, DEFAULT_REGION);
        assert_eq!(settings.database, DEFAULT_DATABASE);
        assert_eq!(settings.output_location, DEFAULT_OUTPUT_LOCATION);
        assert!(settings.access_key_id.is_none());
        assert!(settings.wait_duration_override.is_none());
        assert!(!settings.chart_enabled);
    });
}

#[test]
fn test_values_read_from_env() {
    support::with_scoped_env(
        &[
            ("AWS_ACCESS_KEY_ID", Some("AKIDEXAMPLE")),
            ("AWS_SECRET_ACCESS_KEY", Some("wJalrXUtnFEMI")),
            ("REGION_NAME", Some("eu-west-1")),
            ("ATHENA_DATABASE", Some("fleet_db")),
            ("ATHENA_OUTPUT_LOCATION", Some("s3://fleet/results/")),
            ("SLEEP_TIME", Some("45")),
            ("CREATE_BAR_CHART", Some("TRUE")),
        ],
        || {
            let settings = Settings::from_env();
            assert_eq!(settings.access_key_id.as_deref(), Some("AKIDEXAMPLE"));
            assert_eq!(settings.region, "eu-west-1");
            assert_eq!(settings.database, "fleet_db");
            assert_eq!(settings.output_location, "s3://fleet/results/");
            assert_eq!(settings.wait_duration_override.as_deref(), Some("45"));
            assert!(settings.chart_enabled);
            assert!(!format!("{:?}", settings).contains("wJalrXUtnFEMI"));
        },
    );
}

#[test]
fn test_chart_flag_requires_true() {
    for (value, expected) in [("true", true), ("True", true), ("1", false), ("yes", false)] {
        let mut changes = cleared();
        changes.push(("CREATE_BAR_CHART", Some(value)));
        let enabled = support::with_scoped_env(&changes, || Settings::from_env().chart_enabled);
        assert_eq!(enabled, expected, "CREATE_BAR_CHART={value}");
    }
}

#[test]
fn test_sleep_time_valid_values() {
    for value in [0u64, 30, 60, 90, 120] {
        assert_eq!(sleep_time_for(Some(&value.to_string())), value);
    }
}

#[test]
fn test_sleep_time_fallbacks() {
    assert_eq!(sleep_time_for(None), 30);
    assert_eq!(sleep_time_for(Some("invalid")), 30);
    assert_eq!(sleep_time_for(Some("-1")), 30);
    assert_eq!(sleep_time_for(Some("121")), 120);
    assert_eq!(sleep_time_for(Some("2.5")), 30);
}
