//! Run with: cargo run -p tunecast-detect --example poll
//!
//! Polls Apple Music once and prints its status and current track fields.

use std::time::Duration;

use tunecast_detect::{platform, AppleMusicBridge, PlaybackStatus};

fn main() {
    let timeout = Duration::from_secs(5);
    let app_name = platform::detect_app_name(timeout);
    println!("Player: {app_name}");
    let bridge = AppleMusicBridge::new(app_name, timeout);

    let status = match bridge.poll_status() {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Status query failed: {e}");
            return;
        }
    };
    println!("Status: {status}");

    if status != PlaybackStatus::Stopped {
        match bridge.poll_track_fields() {
            Ok(fields) => {
                for field in &fields {
                    println!("  {field}");
                }
            }
            Err(e) => eprintln!("Track query failed: {e}"),
        }
    }
}
