//! Integration tests declaring context kinds WITHOUT the macro.
//!
//! This shows the manual `ContextKind` implementation, which gives full control
//! over argument validation. Constructor errors reach the caller unchanged and
//! never touch the current binding.

use context_local::{enter, ContextError, ContextKind};
use std::collections::HashMap;

// ============================================================================
// Manual Kind Implementation (Without Macro)
// ============================================================================

/// The bound value: a database connection profile.
#[derive(Debug, Clone, PartialEq)]
struct DbProfile {
    host: String,
    port: u16,
    read_only: bool,
}

/// Named arguments; `host` is required, the rest have defaults.
#[derive(Debug, Clone, Default)]
struct DbProfileArgs {
    host: Option<String>,
    port: Option<i64>,
    read_only: bool,
}

#[derive(Debug, PartialEq)]
enum ProfileError {
    MissingHost,
    PortOutOfRange(i64),
}

impl ContextKind for DbProfile {
    type Args = DbProfileArgs;
    type Error = ProfileError;

    fn construct(args: DbProfileArgs) -> Result<Self, ProfileError> {
        let host = args.host.ok_or(ProfileError::MissingHost)?;
        let port = args.port.unwrap_or(5432);
        let port = u16::try_from(port).map_err(|_| ProfileError::PortOutOfRange(port))?;
        Ok(DbProfile {
            host,
            port,
            read_only: args.read_only,
        })
    }
}

/// A kind built from loosely typed key/value settings.
#[derive(Debug)]
struct FeatureFlags(HashMap<String, bool>);

impl ContextKind for FeatureFlags {
    type Args = Vec<(&'static str, &'static str)>;
    type Error = String;

    fn construct(pairs: Self::Args) -> Result<Self, String> {
        pairs
            .into_iter()
            .map(|(key, raw)| match raw {
                "on" | "true" => Ok((key.to_string(), true)),
                "off" | "false" => Ok((key.to_string(), false)),
                other => Err(format!("flag {key}: cannot coerce {other:?} to bool")),
            })
            .collect::<Result<HashMap<_, _>, _>>()
            .map(FeatureFlags)
    }
}

fn connection_string() -> Result<String, ContextError> {
    let profile = DbProfile::current()?;
    Ok(format!("{}:{}", profile.host, profile.port))
}

// ============================================================================
// Tests Using Manual Implementation
// ============================================================================

#[test]
fn test_defaults_are_applied() {
    let guard = DbProfile::enter(DbProfileArgs {
        host: Some("db.local".to_string()),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(guard.port, 5432);
    assert!(!guard.read_only);
    assert_eq!(connection_string().unwrap(), "db.local:5432");
}

#[test]
fn test_missing_required_argument_is_propagated() {
    let result = DbProfile::enter(DbProfileArgs::default());
    assert_eq!(result.err(), Some(ProfileError::MissingHost));
    assert!(!DbProfile::is_bound());
}

#[test]
fn test_failed_construction_keeps_outer_binding() {
    let _outer = enter::<DbProfile>(DbProfileArgs {
        host: Some("primary".to_string()),
        port: Some(6000),
        read_only: false,
    })
    .unwrap();

    let err = DbProfile::enter(DbProfileArgs {
        host: Some("replica".to_string()),
        port: Some(70_000),
        read_only: true,
    })
    .err();

    assert_eq!(err, Some(ProfileError::PortOutOfRange(70_000)));
    assert_eq!(connection_string().unwrap(), "primary:6000");
}

#[test]
fn test_scope_with_invalid_args_never_runs_body() {
    let mut ran = false;
    let result = DbProfile::scope(DbProfileArgs::default(), |_| ran = true);

    assert_eq!(result, Err(ProfileError::MissingHost));
    assert!(!ran);
}

#[test]
fn test_coercing_constructor() {
    let guard = FeatureFlags::enter(vec![("beta", "on"), ("legacy", "false")]).unwrap();
    assert_eq!(guard.0.get("beta"), Some(&true));
    assert_eq!(guard.0.get("legacy"), Some(&false));
    drop(guard);

    let err = FeatureFlags::enter(vec![("beta", "maybe")]).unwrap_err();
    assert_eq!(err, "flag beta: cannot coerce \"maybe\" to bool");
    assert!(FeatureFlags::current().is_err());
}

#[test]
fn test_read_only_replica_scope() {
    fn run_report() -> Result<bool, ContextError> {
        Ok(DbProfile::current()?.read_only)
    }

    let primary = DbProfileArgs {
        host: Some("primary".to_string()),
        ..Default::default()
    };
    let replica = DbProfileArgs {
        host: Some("replica".to_string()),
        read_only: true,
        ..Default::default()
    };

    let _primary = DbProfile::enter(primary).unwrap();
    let report = DbProfile::scope(replica, |_| run_report()).unwrap();

    assert_eq!(report, Ok(true));
    assert_eq!(run_report(), Ok(false));
}
