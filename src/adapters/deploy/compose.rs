//! Docker Compose Deployer - Image Swap via `docker compose up`
//!
//! Recreates the application service with `APP_IMAGE` set to the
//! requested image. Prefers a standalone `docker-compose` binary and
//! falls back to the `docker compose` plugin.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, instrument, warn};

use crate::config::RollbackConfig;
use crate::ports::deployer::{DeployOutcome, Deployer};

/// Environment variable the compose file reads the image from.
pub const IMAGE_ENV: &str = "APP_IMAGE";

/// Exit code reported when no compose tool is installed.
pub const NOT_FOUND_EXIT_CODE: i32 = 127;

/// Stderr reported when no compose tool is installed.
pub const NOT_FOUND_MESSAGE: &str = "docker-compose (or docker) not found in PATH";

/// Resolved compose invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeCommand {
    /// Executable found on the search path.
    pub program: PathBuf,
    /// Subcommand placed before the compose arguments (`compose` for the plugin).
    pub prefix: Vec<String>,
}

/// `Deployer` backed by docker compose.
#[derive(Debug, Clone)]
pub struct ComposeDeployer {
    /// Working directory for compose commands.
    compose_dir: PathBuf,
    /// Compose file, relative to `compose_dir`.
    compose_file: String,
    /// Service to recreate.
    service: String,
    /// `PATH`-style list searched for the compose tool.
    search_path: OsString,
}

impl ComposeDeployer {
    /// Create a deployer for `service` defined in `compose_dir/compose_file`.
    ///
    /// The compose tool is looked up on the process `PATH`.
    pub fn new(
        compose_dir: impl Into<PathBuf>,
        compose_file: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            compose_dir: compose_dir.into(),
            compose_file: compose_file.into(),
            service: service.into(),
            search_path: std::env::var_os("PATH").unwrap_or_default(),
        }
    }

    /// Create a deployer from rollback config.
    pub fn from_config(config: &RollbackConfig) -> Self {
        Self::new(
            config.compose_dir.clone(),
            config.compose_file.clone(),
            config.service.clone(),
        )
    }

    /// Search `search_path` instead of the process `PATH`.
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = search_path.into();
        self
    }

    /// Arguments appended after the compose command.
    ///
    /// The command runs inside `compose_dir`, so the file is passed as is.
    pub fn up_args(&self) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.compose_file.clone(),
            "up".to_string(),
            "-d".to_string(),
            "--no-deps".to_string(),
            "--force-recreate".to_string(),
            self.service.clone(),
        ]
    }
}

#[async_trait]
impl Deployer for ComposeDeployer {
    #[instrument(skip(self), fields(service = %self.service))]
    async fn deploy(&self, image: &str) -> anyhow::Result<DeployOutcome> {
        let Some(compose) = find_compose_cmd(&self.search_path, &self.compose_dir) else {
            warn!("No docker-compose or docker binary on PATH");
            return Ok(DeployOutcome {
                exit_code: NOT_FOUND_EXIT_CODE,
                stdout: String::new(),
                stderr: NOT_FOUND_MESSAGE.to_string(),
            });
        };

        let args = self.up_args();
        info!(
            program = %compose.program.display(),
            args = %format!("{} {}", compose.prefix.join(" "), args.join(" ")),
            cwd = %self.compose_dir.display(),
            "Running {}={} compose up",
            IMAGE_ENV,
            image
        );

        let output = Command::new(&compose.program)
            .args(&compose.prefix)
            .args(&args)
            .current_dir(&self.compose_dir)
            .env(IMAGE_ENV, image)
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", compose.program.display()))?;

        Ok(DeployOutcome {
            // Killed by a signal: no exit code
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Resolve the compose invocation from a `PATH`-style search list.
///
/// Returns `docker-compose` if present, else `docker compose`, else `None`.
/// Relative entries in `search_path` resolve against `cwd`.
pub fn find_compose_cmd(search_path: &OsStr, cwd: &Path) -> Option<ComposeCommand> {
    if let Ok(program) = which::which_in("docker-compose", Some(search_path), cwd) {
        return Some(ComposeCommand {
            program,
            prefix: Vec::new(),
        });
    }
    if let Ok(program) = which::which_in("docker", Some(search_path), cwd) {
        return Some(ComposeCommand {
            program,
            prefix: vec!["compose".to_string()],
        });
    }
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Fake compose tool: fails unless the `-f` file exists relative to
    /// its cwd, then echoes the image, cwd and arguments.
    const FAKE_COMPOSE: &str = r#"#!/bin/sh
file=""
prev=""
for arg in "$@"; do
  [ "$prev" = "-f" ] && file="$arg"
  prev="$arg"
done
[ -f "$file" ] || { echo "missing $file (cwd=$(pwd))" >&2; exit 1; }
echo "image=$APP_IMAGE"
echo "cwd=$(pwd)"
echo "args=$*"
"#;

    fn install(dir: &Path, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn cwd() -> PathBuf {
        std::env::current_dir().unwrap()
    }

    #[test]
    fn test_up_args() {
        let deployer = ComposeDeployer::new("/srv/demo", "docker-compose.yml", "app");
        assert_eq!(
            deployer.up_args(),
            vec![
                "-f",
                "docker-compose.yml",
                "up",
                "-d",
                "--no-deps",
                "--force-recreate",
                "app"
            ]
        );
    }

    #[test]
    fn test_prefers_standalone_compose() {
        let bin = tempfile::tempdir().unwrap();
        install(bin.path(), "docker", FAKE_COMPOSE);
        install(bin.path(), "docker-compose", FAKE_COMPOSE);

        let found = find_compose_cmd(bin.path().as_os_str(), &cwd()).unwrap();
        assert!(found.program.ends_with("docker-compose"));
        assert!(found.prefix.is_empty());
    }

    #[test]
    fn test_falls_back_to_docker_plugin() {
        let bin = tempfile::tempdir().unwrap();
        install(bin.path(), "docker", FAKE_COMPOSE);

        let found = find_compose_cmd(bin.path().as_os_str(), &cwd()).unwrap();
        assert!(found.program.ends_with("docker"));
        assert_eq!(found.prefix, vec!["compose".to_string()]);
    }

    #[test]
    fn test_nothing_on_path() {
        let bin = tempfile::tempdir().unwrap();
        assert_eq!(find_compose_cmd(bin.path().as_os_str(), &cwd()), None);
        assert_eq!(find_compose_cmd(OsStr::new(""), &cwd()), None);
    }

    #[test]
    fn test_non_executable_is_skipped() {
        let bin = tempfile::tempdir().unwrap();
        std::fs::write(bin.path().join("docker"), "").unwrap();
        assert_eq!(find_compose_cmd(bin.path().as_os_str(), &cwd()), None);
    }

    #[tokio::test]
    async fn test_deploy_without_compose_tool_exits_127() {
        let bin = tempfile::tempdir().unwrap();
        let deployer = ComposeDeployer::new(".", "docker-compose.yml", "app")
            .with_search_path(bin.path());

        let outcome = deployer.deploy("app:v1").await.unwrap();
        assert_eq!(outcome.exit_code, 127);
        assert_eq!(outcome.stderr, "docker-compose (or docker) not found in PATH");
        assert!(outcome.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_deploy_passes_image_and_runs_in_compose_dir() {
        let bin = tempfile::tempdir().unwrap();
        install(bin.path(), "docker-compose", FAKE_COMPOSE);
        let project = tempfile::tempdir().unwrap();
        std::fs::write(project.path().join("docker-compose.yml"), "services: {}\n").unwrap();

        let deployer = ComposeDeployer::new(project.path(), "docker-compose.yml", "app")
            .with_search_path(bin.path());
        let outcome = deployer.deploy("app:v1").await.unwrap();

        assert_eq!(outcome.exit_code, 0, "stderr: {}", outcome.stderr);
        assert!(outcome.stdout.contains("image=app:v1"));
        assert!(outcome.stdout.contains(
            "args=-f docker-compose.yml up -d --no-deps --force-recreate app"
        ));
        let reported_cwd = outcome
            .stdout
            .lines()
            .find_map(|l| l.strip_prefix("cwd="))
            .unwrap();
        assert_eq!(
            Path::new(reported_cwd).canonicalize().unwrap(),
            project.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_deploy_with_relative_compose_dir() {
        let bin = tempfile::tempdir().unwrap();
        install(bin.path(), "docker", FAKE_COMPOSE);
        // Created under the current directory, so the path is relative
        let project = tempfile::Builder::new()
            .prefix("compose-project")
            .tempdir_in(".")
            .unwrap();
        assert!(project.path().is_relative());
        std::fs::write(project.path().join("docker-compose.yml"), "services: {}\n").unwrap();

        let deployer = ComposeDeployer::new(project.path(), "docker-compose.yml", "app")
            .with_search_path(bin.path());
        let outcome = deployer.deploy("app:v1").await.unwrap();

        assert_eq!(outcome.exit_code, 0, "stderr: {}", outcome.stderr);
        assert!(outcome.stdout.contains("args=compose -f docker-compose.yml up"));
    }

    #[tokio::test]
    async fn test_deploy_reports_failure_exit_code() {
        let bin = tempfile::tempdir().unwrap();
        install(bin.path(), "docker-compose", FAKE_COMPOSE);
        // No compose file in the project dir
        let project = tempfile::tempdir().unwrap();

        let deployer = ComposeDeployer::new(project.path(), "docker-compose.yml", "app")
            .with_search_path(bin.path());
        let outcome = deployer.deploy("app:v1").await.unwrap();

        assert_eq!(outcome.exit_code, 1);
        assert!(outcome.stderr.contains("missing docker-compose.yml"));
    }
}
