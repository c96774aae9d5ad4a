#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use vdp_rust::execution::QueryResults;
use vdp_rust::ReportConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Variables are restored on unwind and access is serialized, since the
/// settings loader reads process-global state.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// A result as the service returns it for block size 30, including the
/// `ignore` category and one missing cell.
pub fn detection_results() -> QueryResults {
    QueryResults::from_rows(vec![
        vec![
            Some("vehicle_type"),
            Some("1-30"),
            Some("31-60"),
            Some("61-90"),
            Some("91-100"),
        ],
        vec![Some("bus"), Some("98.214"), Some("95.0"), Some("90.5"), None],
        vec![Some("car"), Some("99.1"), Some("97.333"), Some("93.75"), Some("88.0")],
        vec![Some("ignore"), Some("50.0"), Some("50.0"), Some("50.0"), Some("50.0")],
        vec![Some("truck"), Some("96.0"), Some("94.125"), Some("89.0"), Some("80.5")],
    ])
}

/// Default configuration writing artifacts into `dir`.
pub fn config_in(dir: &Path) -> ReportConfig {
    let mut config = ReportConfig::default();
    config.report.output_dir = dir.to_path_buf();
    config
}
