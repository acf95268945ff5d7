use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use docbase_launcher::desktop::DesktopActions;
use docbase_launcher::launcher::launch;
use docbase_launcher::platform::HostPlatform;
use docbase_launcher::releases::{GitHubReleases, DEFAULT_GITHUB_API_URL};
use docbase_launcher::settings::{
    default_state_root, LaunchSettings, DEFAULT_PACKAGE, DEFAULT_RUNNER,
};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "docbase", version, about = "Provision MeiliSearch and start DocBase")]
struct Cli {
    /// State directory holding the search engine binary and data/config.json.
    #[arg(long, env = "DOCBASE_HOME")]
    home: Option<PathBuf>,
    #[arg(long, env = "DOCBASE_RUNNER", default_value = DEFAULT_RUNNER)]
    runner: String,
    #[arg(long, default_value = DEFAULT_PACKAGE)]
    package: String,
    #[arg(long, default_value_t = false)]
    skip_update: bool,
    #[arg(long, default_value_t = false)]
    no_browser: bool,
    #[arg(long, default_value_t = false)]
    no_notify: bool,
    /// Open the browser and notify on every ready line instead of only the first.
    #[arg(long, default_value_t = false)]
    repeat_ready_actions: bool,
    #[arg(long, env = "DOCBASE_GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    github_api_url: String,
    #[arg(long, default_value_t = 10_000)]
    connect_timeout_ms: u64,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<LaunchSettings> {
        let root = match &self.home {
            Some(home) => home.clone(),
            None => default_state_root()?,
        };
        let mut settings = LaunchSettings::new(&root, HostPlatform::detect());
        settings.runner = self.runner.clone();
        settings.package = self.package.clone();
        settings.self_update = !self.skip_update;
        settings.supervisor.repeat_ready_actions = self.repeat_ready_actions;
        settings.github.api_base = self.github_api_url.clone();
        settings.github.connect_timeout_ms = self.connect_timeout_ms;
        settings.github.token = std::env::var("GITHUB_TOKEN").ok();
        Ok(settings)
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings()?;
    log::debug!("state root: {}", settings.paths.root.display());

    let source = GitHubReleases::new(settings.github.clone())?;
    let actions = Arc::new(DesktopActions {
        os: settings.host.os.clone(),
        open_browser: !cli.no_browser,
        notify: !cli.no_notify,
    });

    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    tokio::select! {
        report = launch(&settings, &source, actions, &mut out, &mut err) => {
            let report = report?;
            log::info!(
                "all services stopped ({} ready signal(s), {} exit(s))",
                report.supervisor.ready_triggers,
                report.supervisor.exits.len()
            );
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            log::info!("interrupted, stopping services");
        }
    }
    Ok(())
}

/// Runs `future` on a fresh runtime. On return, blocking tasks still parked
/// on a desktop notification get `SHUTDOWN_GRACE` before they are abandoned.
fn run_to_completion<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run_to_completion(run(cli)).and_then(|result| result) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
