//! AppleScript sources for the queries the bridge issues.
//!
//! Each function returns the script as lines, ready for
//! [`ScriptRunner::run_applescript`](crate::ScriptRunner::run_applescript).

/// Quote `value` as an AppleScript string literal.
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Count running processes named `app_name`.
pub fn process_count(app_name: &str) -> Vec<String> {
    vec![
        "tell application \"System Events\"".to_string(),
        format!("count (every process whose name is {})", quote(app_name)),
        "end tell".to_string(),
    ]
}

/// The player's `player state`, coerced to its terminology name.
pub fn player_state(app_name: &str) -> Vec<String> {
    vec![
        format!("tell application {}", quote(app_name)),
        "get player state as string".to_string(),
        "end tell".to_string(),
    ]
}

/// Name, artist, album, year, duration and position in one call, printed
/// as a `", "` separated list.
pub fn track_info(app_name: &str) -> Vec<String> {
    vec![
        format!("tell application {}", quote(app_name)),
        "get {name, artist, album, year, duration} of current track & {player position}"
            .to_string(),
        "end tell".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("Music"), "\"Music\"");
        assert_eq!(quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_scripts_target_app() {
        assert!(process_count("Music")[1].contains("whose name is \"Music\""));
        assert_eq!(player_state("iTunes")[0], "tell application \"iTunes\"");
        assert!(track_info("Music")[1].contains("player position"));
    }
}
