use std::{io, path::PathBuf};
use thiserror::Error;

use crate::models::{ContainerName, ImageName};

/// A container runtime invocation that did not succeed.
#[derive(Debug, Error)]
pub enum CommandFailure {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {}: {stderr}", exit_code(.code))]
    Status {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".into(),
    }
}

impl CommandFailure {
    /// Whether the runtime reported that the container does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            CommandFailure::Status { stderr, .. } => {
                stderr.to_lowercase().contains("no such container")
            }
            CommandFailure::Spawn { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported slurm version {requested:?}, supported slurm versions: {}", .supported.join(", "))]
    UnsupportedVersion {
        requested: String,
        supported: Vec<String>,
    },
    #[error("failed to build SLURM image {image}: {failure}")]
    Build {
        image: ImageName,
        failure: CommandFailure,
    },
    #[error("failed to create SLURM container {container}: {failure}")]
    Create {
        container: ContainerName,
        failure: CommandFailure,
    },
    #[error("failed to copy {source_path} to {}: {failure}", .destination.display())]
    Copy {
        source_path: String,
        destination: PathBuf,
        failure: CommandFailure,
    },
    #[error("failed to clean up container {container}: {failure}")]
    Cleanup {
        container: ContainerName,
        failure: CommandFailure,
    },
}
