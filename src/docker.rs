//! Container lifecycle backend driving the `docker` CLI. Listing uses the
//! JSON output format so the parse is a real deserialization instead of
//! column splitting.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::system::command_output;

/// One container as shown in menus and listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    pub image: String,
}

/// Record emitted per line by `docker ps --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct PsRecord {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names")]
    names: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Image", default)]
    image: String,
}

impl From<PsRecord> for ContainerSummary {
    fn from(record: PsRecord) -> Self {
        Self {
            id: record.id,
            name: record.names,
            status: record.status,
            image: record.image,
        }
    }
}

/// Parse the newline-delimited JSON records of a `docker ps` invocation.
pub fn parse_ps_lines(raw: &str) -> Result<Vec<ContainerSummary>> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str::<PsRecord>(line)
                .map(ContainerSummary::from)
                .with_context(|| format!("malformed docker ps record: {line}"))
        })
        .collect()
}

/// Multi-line listing for the result screen.
pub fn format_container_list(containers: &[ContainerSummary]) -> String {
    if containers.is_empty() {
        return "<no containers>".to_string();
    }
    containers
        .iter()
        .map(|c| format!("{} [{}]", c.name, c.status))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Thin wrapper so the docker binary name stays configurable.
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// All containers, stopped ones included.
    pub fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let raw = command_output(&self.program, &["ps", "-a", "--format", "{{json .}}"])?;
        parse_ps_lines(&raw)
    }

    pub fn start(&self, id: &str) -> Result<String> {
        command_output(&self.program, &["start", id])?;
        Ok(format!("Started {id}"))
    }

    pub fn stop(&self, id: &str) -> Result<String> {
        command_output(&self.program, &["stop", id])?;
        Ok(format!("Stopped {id}"))
    }

    pub fn restart(&self, id: &str) -> Result<String> {
        command_output(&self.program, &["restart", id])?;
        Ok(format!("Restarted {id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_lines() {
        let raw = concat!(
            r#"{"ID":"abc123","Names":"web","Status":"Up 2 hours","Image":"nginx:latest"}"#,
            "\n",
            r#"{"ID":"def456","Names":"db","Status":"Exited (0) 3 days ago","Image":"postgres:16"}"#,
            "\n"
        );
        let containers = parse_ps_lines(raw).unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].id, "abc123");
        assert_eq!(containers[0].name, "web");
        assert_eq!(containers[1].image, "postgres:16");
    }

    #[test]
    fn empty_output_is_an_empty_list() {
        assert!(parse_ps_lines("\n  \n").unwrap().is_empty());
    }

    #[test]
    fn malformed_record_is_an_error() {
        assert!(parse_ps_lines("{not json}").is_err());
    }

    #[test]
    fn listing_formats_name_and_status() {
        let containers = vec![
            ContainerSummary {
                id: "abc".into(),
                name: "web".into(),
                status: "Up 2 hours".into(),
                image: "nginx".into(),
            },
            ContainerSummary {
                id: "def".into(),
                name: "db".into(),
                status: "Exited".into(),
                image: "postgres".into(),
            },
        ];
        assert_eq!(
            format_container_list(&containers),
            "web [Up 2 hours]\ndb [Exited]"
        );
        assert_eq!(format_container_list(&[]), "<no containers>");
    }
}
