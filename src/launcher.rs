use std::fmt;
use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

use crate::config_store::{ensure_config, LoadedConfig};
use crate::desktop::ReadyActions;
use crate::errors::LauncherError;
use crate::materialize::Materialized;
use crate::platform::PlatformAsset;
use crate::process::{spawn_managed, ProcessSpec};
use crate::provision::{ensure_asset, ProvisionedAsset};
use crate::releases::ReleaseSource;
use crate::settings::LaunchSettings;
use crate::supervisor::{Supervisor, SupervisorReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchPhase {
    Idle,
    ProvisioningAsset,
    ConfiguringSecrets,
    DataServiceStarting,
    ApplicationStarting,
    Running,
}

impl fmt::Display for LaunchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ProvisioningAsset => "provisioning-asset",
            Self::ConfiguringSecrets => "configuring-secrets",
            Self::DataServiceStarting => "data-service-starting",
            Self::ApplicationStarting => "application-starting",
            Self::Running => "running",
        };
        f.write_str(name)
    }
}

fn enter(phase: LaunchPhase) {
    log::debug!("launch phase: {phase}");
}

#[derive(Debug, Clone)]
pub struct Bootstrapped {
    pub platform: PlatformAsset,
    pub asset: ProvisionedAsset,
    pub config: LoadedConfig,
}

#[derive(Debug, Clone)]
pub struct LaunchReport {
    pub bootstrapped: Bootstrapped,
    pub search_engine: ProcessSpec,
    pub application: ProcessSpec,
    pub supervisor: SupervisorReport,
}

pub async fn check_runner(runner: &str) -> Result<(), LauncherError> {
    let missing = |detail: String| LauncherError::MissingDependency {
        tool: runner.to_string(),
        detail,
    };
    let output = Command::new(runner)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| missing(e.to_string()))?;
    if !output.status.success() {
        return Err(missing(format!(
            "`{runner} --version` exited with {}",
            output.status
        )));
    }
    log::debug!(
        "{runner} version {}",
        String::from_utf8_lossy(&output.stdout).trim()
    );
    Ok(())
}

/// Best effort: failures are logged and startup continues.
pub async fn self_update(runner: &str, package: &str) {
    log::info!("updating {package} to the latest release");
    let status = Command::new(runner)
        .args(["add", "-g", package, "--latest"])
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await;
    match status {
        Ok(s) if s.success() => log::debug!("{package} is up to date"),
        Ok(s) => log::warn!("self-update of {package} exited with {s}, continuing"),
        Err(e) => log::warn!("self-update of {package} could not run: {e}, continuing"),
    }
}

pub async fn bootstrap(
    settings: &LaunchSettings,
    source: &dyn ReleaseSource,
) -> anyhow::Result<Bootstrapped> {
    enter(LaunchPhase::ProvisioningAsset);
    let platform = PlatformAsset::for_host(&settings.host)?;
    log::debug!(
        "{}/{} needs {}",
        platform.os,
        platform.arch,
        platform.file_name
    );
    let asset = ensure_asset(&settings.paths.asset_dir, platform.file_name, source).await?;
    if asset.state == Materialized::Created {
        log::info!("installed search engine at {}", asset.path.display());
    }

    enter(LaunchPhase::ConfiguringSecrets);
    let config = ensure_config(&settings.paths.config_path).await?;
    Ok(Bootstrapped {
        platform,
        asset,
        config,
    })
}

pub async fn launch<O, E>(
    settings: &LaunchSettings,
    source: &dyn ReleaseSource,
    actions: Arc<dyn ReadyActions>,
    out: &mut O,
    err: &mut E,
) -> anyhow::Result<LaunchReport>
where
    O: Write,
    E: Write,
{
    enter(LaunchPhase::Idle);
    check_runner(&settings.runner).await?;

    let bootstrapped = bootstrap(settings, source).await?;
    let api_key = bootstrapped.config.config.api_key().to_string();

    if settings.self_update {
        self_update(&settings.runner, &settings.package).await;
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    enter(LaunchPhase::DataServiceStarting);
    let search_engine = ProcessSpec::search_engine(&bootstrapped.asset.path, &api_key);
    let search_task = spawn_managed(&search_engine, tx.clone())?;

    enter(LaunchPhase::ApplicationStarting);
    let application = ProcessSpec::application(&settings.runner, &settings.package);
    if let Err(e) = spawn_managed(&application, tx) {
        search_task.abort();
        return Err(e);
    }

    enter(LaunchPhase::Running);
    let supervisor = Supervisor::new(actions, settings.supervisor.clone(), &api_key)
        .run(rx, out, err)
        .await;

    Ok(LaunchReport {
        bootstrapped,
        search_engine,
        application,
        supervisor,
    })
}
