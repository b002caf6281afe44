use anyhow::{Context, Result};
use crossterm::{
    style::{self, Colorize, StyledContent, Styler},
    QueueableCommand,
};
use log::info;
use number_prefix::NumberPrefix;
use std::{
    env, fs,
    io::{stdout, Write},
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;

use backends::DockerCliBackend;
use controller::Extractor;
use frontends::{BuiltinVersions, VersionsFile};
use models::ReleaseId;
use services::VersionFrontend;
use versions::VersionTable;

mod backends;
mod controller;
mod error;
mod frontends;
mod models;
mod services;
mod versions;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "slurm-openapi-dump",
    about = "Builds a slurmrestd container and copies its OpenAPI specification to disk."
)]
struct Opt {
    /// Slurm release to dump the specification for, e.g. 24.05.
    #[structopt(required_unless = "list")]
    release: Option<String>,

    #[structopt(short, long)]
    /// Print the supported slurm releases and exit.
    list: bool,

    #[structopt(long)]
    /// Only remove the container a previous run left behind for the release.
    cleanup_only: bool,

    #[structopt(long, default_value = "docker")]
    /// Container runtime executable, anything accepting docker's command syntax.
    runtime: String,

    #[structopt(short = "C", long, parse(from_os_str))]
    /// Directory holding the <build tag>.dockerfile recipes. Relative paths resolve against it.
    workdir: Option<PathBuf>,

    #[structopt(short, long, default_value = "../openapi-specs", parse(from_os_str))]
    /// Directory receiving <release>.json.
    output_dir: PathBuf,

    #[structopt(long, parse(from_os_str))]
    /// YAML file replacing the built-in release table.
    versions: Option<PathBuf>,
}

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    let opt = Opt::from_args();
    let mut stdout = stdout();

    if let Err(err) = run(opt, &mut stdout) {
        let _ = print_status(&mut stdout, "ERROR: ".red().bold(), &format!("{:#}", err));
        process::exit(1);
    }
}

fn run(opt: Opt, stdout: &mut impl Write) -> Result<()> {
    let Opt {
        release,
        list,
        cleanup_only,
        runtime,
        workdir,
        output_dir,
        versions,
    } = opt;

    if let Some(ref workdir) = workdir {
        env::set_current_dir(workdir)
            .with_context(|| format!("couldn't change into {:?}", workdir))?;
        info!("changed work directory to {:?}", workdir);
    }

    let table = match versions {
        Some(ref path) => VersionsFile::new(path).version_table()?,
        None => BuiltinVersions.version_table()?,
    };
    info!("loaded {} slurm releases", table.supported().len());

    if list {
        return list_versions(stdout, &table);
    }

    // structopt only lets a missing release through together with --list
    let release = ReleaseId(release.unwrap_or_default());
    let version = table.resolve(&release.0)?.clone();

    if cleanup_only {
        let container_name = version.build_tag.container_name();
        let mut extractor = Extractor::init(DockerCliBackend::new(runtime), &output_dir);
        extractor.cleanup(&container_name)?;

        return print_status(
            stdout,
            "DONE: ".green().bold(),
            &format!("Removed container {}", container_name),
        );
    }

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("couldn't create output directory {:?}", output_dir))?;

    print_status(
        stdout,
        "INFO: ".cyan().bold(),
        &format!(
            "Building SLURM {} to get Openapi manifest version {}",
            version.build_tag, version.api_version
        ),
    )?;

    let backend = DockerCliBackend::new(runtime);
    let mut extractor = Extractor::init(backend, &output_dir);

    let extraction = extractor
        .extract(&release, &version)
        .context("Failed to copy openapi spec")?;

    print_status(
        stdout,
        "DONE: ".green().bold(),
        &format!(
            "Copied openapi spec {} for SLURM {} to {}{}",
            extraction.api_version,
            extraction.release,
            extraction.destination.display(),
            artifact_size(&extraction.destination)
        ),
    )?;

    Ok(())
}

fn list_versions(stdout: &mut impl Write, table: &VersionTable) -> Result<()> {
    for (release, spec) in table.iter() {
        stdout.queue(style::Print(format!(
            "{}\tapi v{}\tbuild {}\n",
            release, spec.api_version, spec.build_tag
        )))?;
    }

    stdout.flush()?;
    Ok(())
}

fn print_status(stdout: &mut impl Write, tag: StyledContent<&str>, message: &str) -> Result<()> {
    stdout
        .queue(style::PrintStyledContent(tag))?
        .queue(style::Print(format!("{}\n", message)))?
        .flush()?;

    Ok(())
}

fn artifact_size(path: &Path) -> String {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(_) => return String::new(),
    };

    match NumberPrefix::binary(size as f32) {
        NumberPrefix::Standalone(bytes) => format!(" ({} bytes)", bytes),
        NumberPrefix::Prefixed(prefix, n) => format!(" ({:.1} {}B)", n, prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(args: &[&str]) -> Result<Opt, structopt::clap::Error> {
        Opt::from_iter_safe(std::iter::once("slurm-openapi-dump").chain(args.iter().cloned()))
    }

    #[test]
    fn release_argument_is_required() {
        assert!(opt(&[]).is_err());
        assert!(opt(&["24.05", "23.11"]).is_err());

        let parsed = opt(&["24.05"]).unwrap();
        assert_eq!(parsed.release.as_deref(), Some("24.05"));
        assert_eq!(parsed.runtime, "docker");
        assert_eq!(parsed.output_dir, PathBuf::from("../openapi-specs"));
        assert!(!parsed.list);
        assert!(!parsed.cleanup_only);

        let listing = opt(&["--list"]).unwrap();
        assert!(listing.list);
        assert_eq!(listing.release, None);
    }

    #[test]
    fn unsupported_release_fails_before_touching_the_runtime() {
        let output_dir = tempfile::tempdir().unwrap();
        let missing = output_dir.path().join("never-created");

        let mut parsed = opt(&["99.99", "--runtime", "slurm-openapi-dump-no-such-runtime"]).unwrap();
        parsed.output_dir = missing.clone();

        let mut out = Vec::new();
        let err = run(parsed, &mut out).unwrap_err();

        assert_eq!(
            err.to_string(),
            "unsupported slurm version \"99.99\", supported slurm versions: 24.05, 23.11"
        );
        assert!(out.is_empty());
        assert!(!missing.exists());
    }

    #[test]
    fn runtime_failure_after_creating_output_dir() {
        let scratch = tempfile::tempdir().unwrap();
        let output_dir = scratch.path().join("openapi-specs");

        let mut parsed = opt(&["24.05", "--runtime", "slurm-openapi-dump-no-such-runtime"]).unwrap();
        parsed.output_dir = output_dir.clone();

        let mut out = Vec::new();
        let err = run(parsed, &mut out).unwrap_err();

        assert!(output_dir.is_dir());
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Building SLURM 24.05 to get Openapi manifest version 0.0.41"));

        let message = format!("{:#}", err);
        assert!(message.starts_with("Failed to copy openapi spec: failed to build SLURM image slurm_24.05"));
        assert!(message.contains("failed to execute slurm-openapi-dump-no-such-runtime"));
    }

    #[test]
    fn workdir_applies_before_reading_versions() {
        let workdir = tempfile::tempdir().unwrap();
        fs::write(
            workdir.path().join("versions.yaml"),
            "versions:\n  - release: \"24.11\"\n    api_version: \"0.0.42\"\n    build_tag: \"24.11\"\n",
        )
        .unwrap();

        let workdir_arg = workdir.path().to_str().unwrap().to_string();
        let parsed = opt(&["--list", "-C", workdir_arg.as_str(), "--versions", "versions.yaml"]).unwrap();

        let original_dir = env::current_dir().unwrap();
        let mut out = Vec::new();
        let result = run(parsed, &mut out);
        env::set_current_dir(original_dir).unwrap();

        result.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "24.11\tapi v0.0.42\tbuild 24.11\n"
        );
    }

    #[test]
    fn lists_supported_releases() {
        let mut out = Vec::new();
        run(opt(&["--list"]).unwrap(), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "24.05\tapi v0.0.41\tbuild 24.05\n23.11\tapi v0.0.40\tbuild 24.05\n"
        );
    }

    #[test]
    fn artifact_size_is_human_readable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'x'; 2048]).unwrap();
        file.flush().unwrap();

        assert_eq!(artifact_size(file.path()), " (2.0 KiB)");
        assert_eq!(artifact_size(&file.path().with_extension("gone")), "");
    }
}
