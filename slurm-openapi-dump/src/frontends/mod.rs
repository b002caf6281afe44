mod versions_file;

pub use versions_file::{BuiltinVersions, VersionsFile};
