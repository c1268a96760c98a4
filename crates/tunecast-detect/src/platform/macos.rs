use std::time::Duration;

use tracing::debug;

use crate::bridge::parse_process_count;
use crate::error::DetectError;
use crate::runner::ScriptRunner;
use crate::script;

/// Count processes through System Events.
pub fn count_processes(runner: &ScriptRunner, app_name: &str) -> Result<u32, DetectError> {
    let output = runner.run_applescript(&script::process_count(app_name))?;
    let count = parse_process_count(&output)?;
    debug!(app = %app_name, count, "Counted player processes");
    Ok(count)
}

/// `sw_vers -productVersion`, e.g. `"14.4.1"`.
pub fn product_version(timeout: Duration) -> Result<String, DetectError> {
    let version = ScriptRunner::new("sw_vers", timeout).run(&["-productVersion"])?;
    debug!(%version, "macOS version");
    Ok(version)
}
