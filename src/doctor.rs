use std::env;
use std::fmt::Display;
use std::path::Path;
use std::process::Command;

use crossterm::terminal::size as terminal_size;

use crate::config::AppConfig;
use crate::log_file_path;

pub struct DoctorReport {
    lines: Vec<String>,
}

impl DoctorReport {
    pub fn new(title: &str) -> Self {
        Self {
            lines: vec![title.to_string()],
        }
    }

    pub fn section(&mut self, title: &str) {
        self.lines.push(String::new());
        self.lines.push(format!("{title}:"));
    }

    pub fn push_kv(&mut self, key: &str, value: impl Display) {
        self.lines.push(format!("  {key}: {value}"));
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Everything worth knowing before blaming the hardware: terminal, config,
/// docker availability, thermal source.
pub fn doctor_report(config: &AppConfig) -> DoctorReport {
    let mut report = DoctorReport::new("PiDial Doctor");
    report.push_kv("version", env!("CARGO_PKG_VERSION"));
    report.push_kv("os", format!("{}/{}", env::consts::OS, env::consts::ARCH));

    report.section("Terminal");
    match terminal_size() {
        Ok((cols, rows)) => report.push_kv("size", format!("{cols}x{rows}")),
        Err(err) => report.push_kv("size", format!("error: {err}")),
    }
    if let Ok(term) = env::var("TERM") {
        report.push_kv("term", term);
    }

    report.section("Config");
    match config.validate() {
        Ok(()) => report.push_kv("validation", "ok"),
        Err(err) => report.push_kv("validation", format!("error: {err}")),
    }
    report.push_kv("poll_interval_ms", config.poll_interval_ms);
    report.push_kv("queue_capacity", config.queue_capacity);
    report.push_kv("log_file", log_file_path().display());

    report.section("Actions");
    report.push_kv("docker_cmd", &config.docker_cmd);
    report.push_kv("docker", probe_command(&config.docker_cmd, &["--version"]));
    report.push_kv("hostname", probe_command("hostname", &[]));
    report.push_kv("vcgencmd", probe_command("vcgencmd", &["version"]));
    report.push_kv(
        "thermal_zone",
        if Path::new("/sys/class/thermal/thermal_zone0/temp").exists() {
            "present"
        } else {
            "missing"
        },
    );

    report
}

fn probe_command(program: &str, args: &[&str]) -> String {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            let first = String::from_utf8_lossy(&output.stdout);
            first.lines().next().unwrap_or("ok").trim().to_string()
        }
        Ok(output) => format!("exited with {}", output.status),
        Err(err) => format!("unavailable: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn report_carries_the_key_sections() {
        let config = AppConfig::parse_from(["test-app"]);
        let rendered = doctor_report(&config).render();
        assert!(rendered.contains("PiDial Doctor"));
        assert!(rendered.contains("Config:"));
        assert!(rendered.contains("Actions:"));
        assert!(rendered.contains("docker_cmd: docker"));
    }
}
