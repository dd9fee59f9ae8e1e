use anyhow::Result;
use clap::Parser;
use pidial::{
    config::AppConfig,
    docker::{self, ContainerSummary},
    doctor::doctor_report,
    init_debug_log_file, log_debug, log_file_path,
    menu::MenuTree,
    provider::ShellProvider,
    sim, App,
};
use std::{env, sync::Arc};

#[cfg(not(test))]
fn main() -> Result<()> {
    run_with_args(env::args_os())
}

#[cfg_attr(test, allow(dead_code))]
fn run_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let config = AppConfig::parse_from(args);
    if config.doctor {
        let report = doctor_report(&config);
        println!("{}", report.render());
        return Ok(());
    }

    config.validate()?;

    let provider = ShellProvider::new(config.docker_cmd.clone());

    if config.list_containers {
        let containers = discover_containers(&config, &provider)?;
        println!("{}", docker::format_container_list(&containers));
        return Ok(());
    }

    init_debug_log_file();
    let log_path = log_file_path();
    log_debug("=== pidial started ===");
    log_debug(&format!("Log file: {log_path:?}"));

    // The Docker submenu is built from one listing taken at startup; a
    // daemon that is down just means an empty submenu, not a dead UI.
    let containers = if config.no_docker {
        Vec::new()
    } else {
        match discover_containers(&config, &provider) {
            Ok(containers) => containers,
            Err(err) => {
                log_debug(&format!("container discovery failed: {err:#}"));
                Vec::new()
            }
        }
    };
    log_debug(&format!("{} containers discovered", containers.len()));

    let tree = MenuTree::build(&containers);
    let mut app = App::new(config, tree, Arc::new(provider));
    let result = sim::run(&mut app);

    log_debug("=== pidial exiting ===");
    if let Err(ref err) = result {
        log_debug(&format!("exit with error: {err:#}"));
    }

    result
}

/// List containers, honoring the test hook so integration tests never need a
/// Docker daemon. Hook format: comma-separated `id:name:status:image`.
fn discover_containers(
    config: &AppConfig,
    provider: &ShellProvider,
) -> Result<Vec<ContainerSummary>> {
    if let Ok(raw) = env::var("PIDIAL_TEST_CONTAINERS") {
        return Ok(parse_test_containers(&raw));
    }
    if config.no_docker {
        return Ok(Vec::new());
    }
    provider.docker().list_containers()
}

fn parse_test_containers(raw: &str) -> Vec<ContainerSummary> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(4, ':');
            ContainerSummary {
                id: parts.next().unwrap_or_default().to_string(),
                name: parts.next().unwrap_or_default().to_string(),
                status: parts.next().unwrap_or("unknown").to_string(),
                image: parts.next().unwrap_or_default().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_container_hook_format() {
        let containers = parse_test_containers("abc:web:running:nginx, def:db:exited:postgres");
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].id, "abc");
        assert_eq!(containers[0].name, "web");
        assert_eq!(containers[1].status, "exited");
        assert_eq!(containers[1].image, "postgres");
    }

    #[test]
    fn hook_tolerates_missing_fields_and_blanks() {
        let containers = parse_test_containers("abc:web, ,");
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].status, "unknown");
        assert_eq!(containers[0].image, "");
    }
}
