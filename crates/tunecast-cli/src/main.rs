mod discord;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::SystemTime;

use clap::{Parser, ValueEnum};
use tunecast_core::config::{AppConfig, SessionPolicy};
use tunecast_core::error::CoreError;
use tunecast_core::models::PlaybackStatus;
use tunecast_core::payload::PayloadBuilder;
use tunecast_core::reconciler::Reconciler;
use tunecast_detect::AppleMusicBridge;

use crate::discord::DiscordPresence;

/// Show what Apple Music is playing as your Discord status.
#[derive(Debug, Parser)]
#[command(name = "tunecast", version, about)]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seconds between player polls.
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// How the Discord connection is held between listening sessions.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,

    /// Poll once and print the payload without contacting Discord.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    PerSession,
    Persistent,
}

impl From<PolicyArg> for SessionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::PerSession => SessionPolicy::PerSession,
            PolicyArg::Persistent => SessionPolicy::Persistent,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tunecast failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CoreError> {
    let config = load_config(&cli)?;

    if !tunecast_detect::platform::bridge_available() {
        tracing::warn!("Apple Music automation is only available on macOS; the player will always read as stopped");
    }

    let bridge = AppleMusicBridge::new(&config.player.app_name, config.general.query_timeout());

    if cli.dry_run {
        return dry_run(&bridge, &config);
    }

    let presence = DiscordPresence::new(config.client_id());
    let mut reconciler = Reconciler::from_config(bridge, presence, &config)?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received termination signal");
        let _ = shutdown_tx.send(());
    }) {
        tracing::warn!(error = %e, "Failed to install signal handler; presence will not be cleared on exit");
    }

    reconciler.run_forever(config.general.poll_interval(), &shutdown_rx);
    tracing::info!("Goodbye");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig, CoreError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    if let Some(interval) = cli.interval {
        config.general.poll_interval = interval;
    }
    if let Some(policy) = cli.policy {
        config.presence.policy = policy.into();
    }
    config.validate()?;

    if config.player.is_auto() {
        let detected = tunecast_detect::platform::detect_app_name(config.general.query_timeout());
        config.resolve_player(detected);
    }

    tracing::info!(
        app = %config.player.app_name,
        client_id = config.client_id(),
        interval_secs = config.general.poll_interval,
        policy = ?config.presence.policy,
        artwork = config.artwork.enabled,
        "Configuration loaded"
    );
    Ok(config)
}

fn dry_run(bridge: &AppleMusicBridge, config: &AppConfig) -> Result<(), CoreError> {
    let status = bridge.poll_status()?;
    let fields = match status {
        PlaybackStatus::Stopped => None,
        _ => Some(bridge.poll_track_fields()?),
    };

    let payload = PayloadBuilder::from_config(config).build(status, fields.as_deref(), SystemTime::now());
    tracing::info!(%status, "Dry run complete");
    println!("{payload:#?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::try_parse_from([
            "tunecast",
            "--interval",
            "5",
            "--policy",
            "persistent",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.interval, Some(5));
        assert!(matches!(cli.policy, Some(PolicyArg::Persistent)));
        assert!(cli.dry_run);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["tunecast"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.policy.is_none());
    }

    #[test]
    fn test_policy_names() {
        assert!(Cli::try_parse_from(["tunecast", "--policy", "per-session"]).is_ok());
        assert!(Cli::try_parse_from(["tunecast", "--policy", "sometimes"]).is_err());
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        AppConfig::default().save_to(&path).unwrap();
        let path = path.to_str().unwrap();

        let cli = Cli::try_parse_from([
            "tunecast",
            "--config",
            path,
            "--interval",
            "3",
            "--policy",
            "persistent",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.general.poll_interval, 3);
        assert_eq!(config.presence.policy, SessionPolicy::Persistent);
        assert!(!config.player.is_auto());

        let cli = Cli::try_parse_from(["tunecast", "--config", path, "--interval", "0"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_load_config_uses_player_client_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.player.app_name = "iTunes".into();
        config.save_to(&path).unwrap();

        let cli = Cli::try_parse_from(["tunecast", "--config", path.to_str().unwrap()]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.player.app_name, "iTunes");
        assert_eq!(config.client_id(), "979297966739300416");
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
