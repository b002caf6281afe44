use anyhow::Result;

use crate::{
    error::CommandFailure,
    models::{ContainerId, ContainerName, ContainerSpec, CopySpec, ImageBuildSpec},
    versions::VersionTable,
};

pub trait VersionFrontend {
    fn version_table(&mut self) -> Result<VersionTable>;
}

pub trait ContainerBackend {
    fn build_image(&mut self, image_spec: &ImageBuildSpec) -> Result<(), CommandFailure>;

    /// Creates, but does not start, a container and returns its id.
    fn create_container(&mut self, container_spec: &ContainerSpec)
        -> Result<ContainerId, CommandFailure>;

    fn copy_from_container(&mut self, copy_spec: &CopySpec) -> Result<(), CommandFailure>;

    /// Force-removes a container, whether it is running or not.
    fn remove_container(&mut self, name: &ContainerName) -> Result<(), CommandFailure>;
}
