use log::debug;
use std::{
    ffi::{OsStr, OsString},
    process::{Command, Stdio},
};

use crate::{
    error::CommandFailure,
    models::{ContainerId, ContainerName, ContainerSpec, CopySpec, ImageBuildSpec},
    services::ContainerBackend,
};

/// Drives a docker compatible command line client.
pub struct DockerCliBackend {
    program: String,
}

impl DockerCliBackend {
    pub fn new<P: Into<String>>(program: P) -> DockerCliBackend {
        DockerCliBackend {
            program: program.into(),
        }
    }

    /// Runs the runtime to completion and returns its stdout.
    fn run(&self, args: Vec<OsString>) -> Result<String, CommandFailure> {
        debug!(
            "running {} {}",
            self.program,
            args.iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| CommandFailure::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !stdout.is_empty() {
            debug!("{} stdout: {}", self.program, stdout.trim_end());
        }

        if !output.status.success() {
            return Err(CommandFailure::Status {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }
}

fn args<I, S>(parts: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    parts.into_iter().map(|part| part.as_ref().to_owned()).collect()
}

fn build_args(spec: &ImageBuildSpec) -> Vec<OsString> {
    args(&[
        OsStr::new("build"),
        OsStr::new("-t"),
        OsStr::new(&spec.name.0),
        OsStr::new("--file"),
        spec.dockerfile.as_os_str(),
        spec.context.as_os_str(),
    ])
}

fn create_args(spec: &ContainerSpec) -> Vec<OsString> {
    args(&["create", "--name", spec.name.0.as_str(), spec.image.0.as_str()])
}

fn copy_args(spec: &CopySpec) -> Vec<OsString> {
    let source = format!("{}:{}", spec.container.0, spec.source);
    args(&[
        OsStr::new("cp"),
        OsStr::new(&source),
        spec.destination.as_os_str(),
    ])
}

fn remove_args(name: &ContainerName) -> Vec<OsString> {
    args(&["rm", "-f", name.0.as_str()])
}

impl ContainerBackend for DockerCliBackend {
    fn build_image(&mut self, image_spec: &ImageBuildSpec) -> Result<(), CommandFailure> {
        self.run(build_args(image_spec))?;
        Ok(())
    }

    fn create_container(
        &mut self,
        container_spec: &ContainerSpec,
    ) -> Result<ContainerId, CommandFailure> {
        let stdout = self.run(create_args(container_spec))?;
        Ok(ContainerId(stdout.trim().to_string()))
    }

    fn copy_from_container(&mut self, copy_spec: &CopySpec) -> Result<(), CommandFailure> {
        self.run(copy_args(copy_spec))?;
        Ok(())
    }

    fn remove_container(&mut self, name: &ContainerName) -> Result<(), CommandFailure> {
        self.run(remove_args(name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageName;
    use std::path::PathBuf;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn runtime_arguments() {
        let build = ImageBuildSpec {
            name: ImageName("slurm_24.05".into()),
            dockerfile: PathBuf::from("24.05.dockerfile"),
            context: PathBuf::from("."),
        };
        assert_eq!(
            strings(build_args(&build)),
            vec!["build", "-t", "slurm_24.05", "--file", "24.05.dockerfile", "."]
        );

        let create = ContainerSpec {
            name: ContainerName("slurm-24.05".into()),
            image: ImageName("slurm_24.05".into()),
        };
        assert_eq!(
            strings(create_args(&create)),
            vec!["create", "--name", "slurm-24.05", "slurm_24.05"]
        );

        let copy = CopySpec {
            container: ContainerId("3f2a".into()),
            source: "/slurm/v0.0.41.json".into(),
            destination: PathBuf::from("../openapi-specs/24.05.json"),
        };
        assert_eq!(
            strings(copy_args(&copy)),
            vec!["cp", "3f2a:/slurm/v0.0.41.json", "../openapi-specs/24.05.json"]
        );

        let name = ContainerName("slurm-24.05".into());
        assert_eq!(strings(remove_args(&name)), vec!["rm", "-f", "slurm-24.05"]);
    }

    #[test]
    fn missing_runtime_is_a_spawn_failure() {
        let mut backend = DockerCliBackend::new("slurm-openapi-dump-no-such-runtime");
        let err = backend
            .remove_container(&ContainerName("slurm-24.05".into()))
            .unwrap_err();

        match err {
            CommandFailure::Spawn { program, .. } => {
                assert_eq!(program, "slurm-openapi-dump-no-such-runtime")
            }
            other => panic!("expected a spawn failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_success() {
        let spec = ContainerSpec {
            name: ContainerName("slurm-24.05".into()),
            image: ImageName("slurm_24.05".into()),
        };

        let id = DockerCliBackend::new("true").create_container(&spec).unwrap();
        assert_eq!(id, ContainerId(String::new()));

        match DockerCliBackend::new("false").create_container(&spec) {
            Err(CommandFailure::Status { program, code, .. }) => {
                assert_eq!(program, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("expected a status failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn container_id_is_trimmed() {
        let spec = ContainerSpec {
            name: ContainerName("slurm-24.05".into()),
            image: ImageName("slurm_24.05".into()),
        };

        // echo prints its arguments followed by a newline
        let id = DockerCliBackend::new("echo").create_container(&spec).unwrap();
        assert_eq!(id, ContainerId("create --name slurm-24.05 slurm_24.05".into()));
    }
}
