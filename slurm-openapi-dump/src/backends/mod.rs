mod docker;

pub use docker::DockerCliBackend;
