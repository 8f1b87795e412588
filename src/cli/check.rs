//! `reloadkit check`: one pass, then report.

use anyhow::Result;
use reloadkit::config::ReloadConfig;
use reloadkit::log;

use super::common::Session;

/// Compile every source once. Returns whether the pass was free of errors.
pub fn run(config: &ReloadConfig) -> Result<bool> {
    let session = Session::build(config)?;
    session.monitor.check_now();

    let results = session.results();
    let (mut errors, mut warnings, mut failed) = (0, 0, 0);

    for result in &results {
        for problem in &result.errors {
            log!("error"; "{}", problem);
        }
        for problem in &result.warnings {
            log!("warning"; "{}", problem);
        }
        errors += result.errors.len();
        warnings += result.warnings.len();
        failed += result.failed_files().len();
    }

    if errors > 0 {
        log!("check"; "{} error(s), {} warning(s) in {} source(s)", errors, warnings, failed);
    } else {
        log!("check"; "ok, {} warning(s)", warnings);
    }
    Ok(errors == 0)
}
