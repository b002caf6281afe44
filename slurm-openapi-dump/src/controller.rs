use log::{error, info};
use std::path::{Path, PathBuf};

use crate::{
    error::ExtractError,
    models::{
        ContainerName, ContainerSpec, CopySpec, Extraction, ImageBuildSpec, ReleaseId, VersionSpec,
    },
    services::ContainerBackend,
};

/// Removes a container, treating a container that is already gone as removed.
fn remove_container(
    backend: &mut dyn ContainerBackend,
    name: &ContainerName,
) -> Result<(), ExtractError> {
    match backend.remove_container(name) {
        Ok(()) => {
            info!("removed container {}", name);
            Ok(())
        }
        Err(failure) if failure.is_not_found() => {
            info!("container {} was already gone", name);
            Ok(())
        }
        Err(failure) => Err(ExtractError::Cleanup {
            container: name.clone(),
            failure,
        }),
    }
}

/// Owns the container name for the duration of one extraction.
///
/// The container is removed exactly once: by `release`, or on drop when the
/// lease goes out of scope without being released.
struct ContainerLease<'a> {
    backend: &'a mut dyn ContainerBackend,
    name: ContainerName,
    released: bool,
}

impl<'a> ContainerLease<'a> {
    fn new(backend: &'a mut dyn ContainerBackend, name: ContainerName) -> ContainerLease<'a> {
        ContainerLease {
            backend,
            name,
            released: false,
        }
    }

    fn backend(&mut self) -> &mut dyn ContainerBackend {
        &mut *self.backend
    }

    fn release(mut self) -> Result<(), ExtractError> {
        self.released = true;
        remove_container(&mut *self.backend, &self.name)
    }
}

impl<'a> Drop for ContainerLease<'a> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        self.released = true;
        if let Err(err) = remove_container(&mut *self.backend, &self.name) {
            error!("{}", err);
        }
    }
}

/// Build, create and copy, stopping at the first failure.
fn run_stages(
    backend: &mut dyn ContainerBackend,
    image_spec: &ImageBuildSpec,
    container_name: &ContainerName,
    version: &VersionSpec,
    destination: &Path,
) -> Result<(), ExtractError> {
    info!("building image {} from {:?}", image_spec.name, image_spec.dockerfile);
    backend
        .build_image(image_spec)
        .map_err(|failure| ExtractError::Build {
            image: image_spec.name.clone(),
            failure,
        })?;

    let container_spec = ContainerSpec {
        name: container_name.clone(),
        image: image_spec.name.clone(),
    };
    info!("creating container {}", container_spec.name);
    let container_id = backend
        .create_container(&container_spec)
        .map_err(|failure| ExtractError::Create {
            container: container_spec.name.clone(),
            failure,
        })?;
    info!("created container {}", container_id);

    let copy_spec = CopySpec {
        container: container_id,
        source: version.artifact_path(),
        destination: destination.to_path_buf(),
    };
    info!("copying {} to {:?}", copy_spec.source, copy_spec.destination);
    backend
        .copy_from_container(&copy_spec)
        .map_err(|failure| ExtractError::Copy {
            source_path: copy_spec.source.clone(),
            destination: copy_spec.destination.clone(),
            failure,
        })
}

pub struct Extractor {
    backend: Box<dyn ContainerBackend>,
    context: PathBuf,
    output_dir: PathBuf,
}

impl Extractor {
    pub fn init<B, P>(backend: B, output_dir: P) -> Extractor
    where
        B: 'static + ContainerBackend,
        P: AsRef<Path>,
    {
        Extractor {
            backend: Box::new(backend),
            context: PathBuf::from("."),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn destination(&self, release: &ReleaseId) -> PathBuf {
        self.output_dir.join(format!("{}.json", release.0))
    }

    /// Builds the image for `version`, copies its OpenAPI document out of a
    /// freshly created container and removes the container again.
    pub fn extract(
        &mut self,
        release: &ReleaseId,
        version: &VersionSpec,
    ) -> Result<Extraction, ExtractError> {
        let tag = &version.build_tag;
        let image_spec = ImageBuildSpec {
            name: tag.image_name(),
            dockerfile: tag.recipe_file(),
            context: self.context.clone(),
        };
        let container_name = tag.container_name();
        let destination = self.destination(release);

        let mut lease = ContainerLease::new(&mut *self.backend, container_name.clone());
        let result = run_stages(
            lease.backend(),
            &image_spec,
            &container_name,
            version,
            &destination,
        );

        let cleanup = lease.release();

        match (result, cleanup) {
            (Ok(()), Ok(())) => Ok(Extraction {
                release: release.clone(),
                api_version: version.api_version.clone(),
                destination,
            }),
            (Ok(()), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup_err)) => {
                error!("{}", cleanup_err);
                Err(err)
            }
        }
    }

    /// Force-removes `name`. Succeeds when the container does not exist.
    pub fn cleanup(&mut self, name: &ContainerName) -> Result<(), ExtractError> {
        remove_container(&mut *self.backend, name)
    }
}
