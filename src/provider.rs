//! The provider the device actually ships: system commands for host actions,
//! the docker CLI for container lifecycle. Everything here runs on the
//! executor's worker thread and is allowed to block.

use anyhow::Result;

use crate::action::{ActionProvider, ActionRequest};
use crate::docker::{format_container_list, DockerCli};
use crate::system;

pub struct ShellProvider {
    docker: DockerCli,
}

impl ShellProvider {
    pub fn new(docker_cmd: impl Into<String>) -> Self {
        Self {
            docker: DockerCli::new(docker_cmd),
        }
    }

    pub fn docker(&self) -> &DockerCli {
        &self.docker
    }
}

impl ActionProvider for ShellProvider {
    fn perform(&self, request: &ActionRequest) -> Result<String> {
        match request {
            ActionRequest::Restart => system::reboot(),
            ActionRequest::Shutdown => system::shutdown(),
            ActionRequest::SystemInfo => system::hostname_kernel(),
            ActionRequest::ShowIp => system::ip_address(),
            ActionRequest::CpuTemp => system::cpu_temp(),
            ActionRequest::Disk => system::disk_usage(),
            ActionRequest::Mem => system::memory_info(),
            ActionRequest::Update => system::apt_update(),
            ActionRequest::ContainerList => {
                let containers = self.docker.list_containers()?;
                Ok(format_container_list(&containers))
            }
            ActionRequest::ContainerStart { id } => self.docker.start(id),
            ActionRequest::ContainerStop { id } => self.docker.stop(id),
            ActionRequest::ContainerRestart { id } => self.docker.restart(id),
        }
    }
}
