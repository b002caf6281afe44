use std::{fmt, path::PathBuf};

#[derive(Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct ReleaseId(pub String);

#[derive(Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct BuildTag(pub String);

#[derive(Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct ImageName(pub String);

#[derive(Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct ContainerId(pub String);

#[derive(Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct ContainerName(pub String);

macro_rules! display_inner {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

display_inner!(ReleaseId, BuildTag, ImageName, ContainerId, ContainerName);

impl BuildTag {
    pub fn image_name(&self) -> ImageName {
        ImageName(format!("slurm_{}", self.0))
    }

    pub fn container_name(&self) -> ContainerName {
        ContainerName(format!("slurm-{}", self.0))
    }

    /// The build recipe for this tag, relative to the build context.
    pub fn recipe_file(&self) -> PathBuf {
        PathBuf::from(format!("{}.dockerfile", self.0))
    }
}

/// Build parameters selected by a release identifier.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct VersionSpec {
    pub api_version: String,
    pub build_tag: BuildTag,
}

impl VersionSpec {
    pub fn new<A, B>(api_version: A, build_tag: B) -> VersionSpec
    where
        A: Into<String>,
        B: Into<String>,
    {
        VersionSpec {
            api_version: api_version.into(),
            build_tag: BuildTag(build_tag.into()),
        }
    }

    /// Location of the generated OpenAPI document inside the built image.
    pub fn artifact_path(&self) -> String {
        format!("/slurm/v{}.json", self.api_version)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ImageBuildSpec {
    pub name: ImageName,
    pub dockerfile: PathBuf,
    pub context: PathBuf,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: ContainerName,
    pub image: ImageName,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct CopySpec {
    pub container: ContainerId,
    pub source: String,
    pub destination: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    pub release: ReleaseId,
    pub api_version: String,
    pub destination: PathBuf,
}
