#[cfg(target_os = "macos")]
pub mod macos;

use std::time::Duration;

use crate::error::DetectError;
use crate::runner::ScriptRunner;

/// Scripting name of the player on macOS 10.15 and later.
pub const MUSIC_APP_NAME: &str = "Music";
/// Scripting name of the player before macOS 10.15.
pub const ITUNES_APP_NAME: &str = "iTunes";

/// Whether this platform has the automation bridge at all.
pub const fn bridge_available() -> bool {
    cfg!(target_os = "macos")
}

/// Platform-specific process counting.
///
/// Elsewhere the player can never be running, so every poll resolves to
/// stopped without spawning anything.
pub fn count_processes(runner: &ScriptRunner, app_name: &str) -> Result<u32, DetectError> {
    #[cfg(target_os = "macos")]
    {
        macos::count_processes(runner, app_name)
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = (runner, app_name);
        Ok(0)
    }
}

/// Player application name for the running OS version.
///
/// Falls back to [`MUSIC_APP_NAME`] when the version cannot be read, and
/// always returns it off macOS.
pub fn detect_app_name(timeout: Duration) -> &'static str {
    #[cfg(target_os = "macos")]
    {
        match macos::product_version(timeout) {
            Ok(version) => app_name_for_version(&version).unwrap_or(MUSIC_APP_NAME),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read the macOS version, assuming {MUSIC_APP_NAME}");
                MUSIC_APP_NAME
            }
        }
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = timeout;
        MUSIC_APP_NAME
    }
}

/// Map a `sw_vers -productVersion` string such as `"10.14.6"` to the player
/// name. `None` if the version does not parse.
pub fn app_name_for_version(version: &str) -> Option<&'static str> {
    let mut parts = version.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };

    if (major, minor) >= (10, 15) {
        Some(MUSIC_APP_NAME)
    } else {
        Some(ITUNES_APP_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_name_for_version() {
        assert_eq!(app_name_for_version("10.14.6"), Some(ITUNES_APP_NAME));
        assert_eq!(app_name_for_version("10.15"), Some(MUSIC_APP_NAME));
        assert_eq!(app_name_for_version("14.4.1\n"), Some(MUSIC_APP_NAME));
        assert_eq!(app_name_for_version("11"), Some(MUSIC_APP_NAME));
        assert_eq!(app_name_for_version("10.9"), Some(ITUNES_APP_NAME));
    }

    #[test]
    fn test_unparsable_version() {
        assert_eq!(app_name_for_version(""), None);
        assert_eq!(app_name_for_version("Sonoma"), None);
        assert_eq!(app_name_for_version("10.x"), None);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_detect_off_macos() {
        assert_eq!(detect_app_name(Duration::from_secs(1)), MUSIC_APP_NAME);
    }
}
