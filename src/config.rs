//! Command-line parsing and validation helpers.

use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use crate::event::DEFAULT_QUEUE_CAPACITY;
use crate::input::DecoderConfig;

const MIN_POLL_MS: u64 = 1;
const MAX_POLL_MS: u64 = 20;
const MIN_DEBOUNCE_MS: u64 = 5;
const MAX_DEBOUNCE_MS: u64 = 200;
const MIN_LONG_PRESS_MS: u64 = 200;
const MAX_LONG_PRESS_MS: u64 = 5_000;
const MIN_QUIT_HOLD_MS: u64 = 500;
const MAX_QUIT_HOLD_MS: u64 = 10_000;
const MIN_QUEUE_CAPACITY: usize = 8;
const MAX_QUEUE_CAPACITY: usize = 1_024;
const MIN_NOTICE_MS: u64 = 500;
const MAX_NOTICE_MS: u64 = 30_000;
const MIN_SNAKE_STEP_MS: u64 = 50;
const MAX_SNAKE_STEP_MS: u64 = 1_000;
// The docker binary name ends up on a Command invocation; keep shell
// metacharacters out even though no shell is involved.
const FORBIDDEN_CMD_CHARS: &[char] = &[';', '|', '&', '$', '`', '<', '>', '\\', '\'', '"', ' '];

/// CLI options for the control panel. Validated values keep the loop timing
/// sane and downstream subprocesses safe.
#[derive(Debug, Parser, Clone)]
#[command(about = "Rotary-dial OLED control panel", version)]
pub struct AppConfig {
    /// Input line sampling interval in milliseconds
    #[arg(long, default_value_t = 1)]
    pub poll_interval_ms: u64,

    /// Stability window before a button level change is accepted
    #[arg(long, default_value_t = 30)]
    pub debounce_ms: u64,

    /// Hold duration that turns a press into a long press
    #[arg(long, default_value_t = 800)]
    pub long_press_ms: u64,

    /// Back+Confirm combined hold that requests shutdown of the panel
    #[arg(long, default_value_t = 2_000)]
    pub quit_hold_ms: u64,

    /// Event queue capacity before drop-oldest kicks in
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// How long action results stay on screen without a button press
    #[arg(long, default_value_t = 2_500)]
    pub notice_ms: u64,

    /// Snake simulation step interval at game start
    #[arg(long, default_value_t = 150)]
    pub snake_step_ms: u64,

    /// Container CLI binary
    #[arg(long, default_value = "docker")]
    pub docker_cmd: String,

    /// Skip the container listing at startup; the Docker menu then only
    /// carries the list action
    #[arg(long)]
    pub no_docker: bool,

    /// Print the containers the menu would be built from, then exit
    #[arg(long)]
    pub list_containers: bool,

    /// Print an environment report, then exit
    #[arg(long)]
    pub doctor: bool,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        range(
            "--poll-interval-ms",
            self.poll_interval_ms,
            MIN_POLL_MS,
            MAX_POLL_MS,
        )?;
        range("--debounce-ms", self.debounce_ms, MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS)?;
        range(
            "--long-press-ms",
            self.long_press_ms,
            MIN_LONG_PRESS_MS,
            MAX_LONG_PRESS_MS,
        )?;
        range(
            "--quit-hold-ms",
            self.quit_hold_ms,
            MIN_QUIT_HOLD_MS,
            MAX_QUIT_HOLD_MS,
        )?;
        range(
            "--queue-capacity",
            self.queue_capacity as u64,
            MIN_QUEUE_CAPACITY as u64,
            MAX_QUEUE_CAPACITY as u64,
        )?;
        range("--notice-ms", self.notice_ms, MIN_NOTICE_MS, MAX_NOTICE_MS)?;
        range(
            "--snake-step-ms",
            self.snake_step_ms,
            MIN_SNAKE_STEP_MS,
            MAX_SNAKE_STEP_MS,
        )?;
        if self.debounce_ms <= self.poll_interval_ms {
            bail!("--debounce-ms must exceed --poll-interval-ms");
        }
        if self.long_press_ms <= self.debounce_ms {
            bail!("--long-press-ms must exceed --debounce-ms");
        }
        if self.quit_hold_ms < self.long_press_ms {
            bail!("--quit-hold-ms must be at least --long-press-ms");
        }
        let cmd = self.docker_cmd.trim();
        if cmd.is_empty() {
            bail!("--docker-cmd cannot be empty");
        }
        if cmd.chars().any(|c| FORBIDDEN_CMD_CHARS.contains(&c)) {
            bail!("--docker-cmd contains forbidden characters");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }

    pub fn snake_step(&self) -> Duration {
        Duration::from_millis(self.snake_step_ms)
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            long_press: Duration::from_millis(self.long_press_ms),
            quit_hold: Duration::from_millis(self.quit_hold_ms),
        }
    }
}

fn range(flag: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        bail!("{flag} must be between {min} and {max}, got {value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn accepts_valid_defaults() {
        let cfg = AppConfig::parse_from(["test-app"]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_poll_interval_out_of_bounds() {
        let cfg = AppConfig::parse_from(["test-app", "--poll-interval-ms", "0"]);
        assert!(cfg.validate().is_err());
        let cfg = AppConfig::parse_from(["test-app", "--poll-interval-ms", "50"]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_debounce_not_exceeding_poll() {
        let cfg = AppConfig::parse_from([
            "test-app",
            "--poll-interval-ms",
            "10",
            "--debounce-ms",
            "10",
        ]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_quit_hold_shorter_than_long_press() {
        let cfg = AppConfig::parse_from([
            "test-app",
            "--long-press-ms",
            "1500",
            "--quit-hold-ms",
            "1000",
        ]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_docker_cmd_with_shell_metacharacters() {
        for dangerous in ["docker;rm -rf /", "docker|tee", "doc ker", "$(docker)"] {
            let cfg = AppConfig::parse_from(["test-app", "--docker-cmd", dangerous]);
            assert!(
                cfg.validate().is_err(),
                "docker cmd '{dangerous}' should be rejected"
            );
        }
    }

    #[test]
    fn rejects_tiny_queue() {
        let cfg = AppConfig::parse_from(["test-app", "--queue-capacity", "2"]);
        assert!(cfg.validate().is_err());
    }
}
