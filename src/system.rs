//! System status and power commands, shelled out the same way the device has
//! always done it. Parsing is split into pure helpers so the formatting is
//! testable without the underlying binaries.

use std::fs;
use std::process::Command;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";
/// Grace period before reboot/shutdown actually fire, so the result screen
/// has a moment on the display.
const POWER_COUNTDOWN: Duration = Duration::from_secs(3);

/// Run a command and return trimmed stdout, failing on a non-zero exit.
pub fn command_output(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {program}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn hostname_kernel() -> Result<String> {
    let hostname = command_output("hostname", &[])?;
    let kernel = command_output("uname", &["-r"])?;
    Ok(format!("Host: {hostname}\nKernel: {kernel}"))
}

pub fn ip_address() -> Result<String> {
    let raw = command_output("hostname", &["-I"])?;
    let ip = first_ip(&raw).context("no IP address assigned")?;
    Ok(format!("IP Address:\n{ip}"))
}

/// `vcgencmd` exists on the Pi; anywhere else (or if it fails) fall back to
/// the generic thermal zone.
pub fn cpu_temp() -> Result<String> {
    if let Ok(out) = command_output("vcgencmd", &["measure_temp"]) {
        return Ok(format!("CPU Temp:\n{out}"));
    }
    let raw = fs::read_to_string(THERMAL_ZONE)
        .with_context(|| format!("failed to read {THERMAL_ZONE}"))?;
    let milli: i64 = raw.trim().parse().context("malformed thermal zone value")?;
    Ok(format!("CPU Temp:\n{}", format_millidegrees(milli)))
}

pub fn disk_usage() -> Result<String> {
    let out = command_output("df", &["-h", "/"])?;
    format_disk(&out)
}

pub fn memory_info() -> Result<String> {
    let out = command_output("free", &["-h"])?;
    format_memory(&out)
}

pub fn apt_update() -> Result<String> {
    command_output("sudo", &["apt-get", "update"])?;
    Ok("Update complete!".to_string())
}

pub fn reboot() -> Result<String> {
    thread::sleep(POWER_COUNTDOWN);
    command_output("sudo", &["reboot"])?;
    Ok("Rebooting...".to_string())
}

pub fn shutdown() -> Result<String> {
    thread::sleep(POWER_COUNTDOWN);
    command_output("sudo", &["shutdown", "-h", "now"])?;
    Ok("Shutting down...".to_string())
}

/// First address in `hostname -I` output.
pub fn first_ip(raw: &str) -> Option<&str> {
    raw.split_whitespace().next().filter(|s| !s.is_empty())
}

pub fn format_millidegrees(milli: i64) -> String {
    format!("{:.1} C", milli as f64 / 1000.0)
}

/// Pick used/free/percent out of `df -h /` output.
pub fn format_disk(df_output: &str) -> Result<String> {
    let line = df_output.lines().nth(1).context("df output too short")?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        bail!("unexpected df line: {line}");
    }
    Ok(format!(
        "Disk:\nUsed: {}\nFree: {}\n{} used",
        parts[2], parts[3], parts[4]
    ))
}

/// Pick total/used/free out of `free -h` output.
pub fn format_memory(free_output: &str) -> Result<String> {
    let line = free_output.lines().nth(1).context("free output too short")?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        bail!("unexpected free line: {line}");
    }
    Ok(format!(
        "Memory:\nTotal: {}\nUsed: {}\nFree: {}",
        parts[1], parts[2], parts[3]
    ))
}
