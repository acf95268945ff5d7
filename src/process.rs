use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::output::{Component, OutputEvent, OutputStream, SupervisorEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub component: Component,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub inherit_stdin: bool,
}

impl ProcessSpec {
    /// Search engine started from the provisioned binary, inside its own directory.
    pub fn search_engine(binary: &Path, api_key: &str) -> Self {
        Self {
            component: Component::SearchEngine,
            program: binary.to_path_buf(),
            args: vec!["--master-key".to_string(), api_key.to_string()],
            cwd: binary.parent().map(Path::to_path_buf),
            inherit_stdin: true,
        }
    }

    pub fn application(runner: &str, package: &str) -> Self {
        Self {
            component: Component::Application,
            program: PathBuf::from(runner),
            args: vec!["x".to_string(), package.to_string()],
            cwd: None,
            inherit_stdin: true,
        }
    }
}

/// Spawns the process and relays every output line as a [`SupervisorEvent`].
/// The returned task ends after the child exits and both pipes drain.
pub fn spawn_managed(
    spec: &ProcessSpec,
    events: UnboundedSender<SupervisorEvent>,
) -> anyhow::Result<JoinHandle<()>> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(if spec.inherit_stdin {
            Stdio::inherit()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn {}", spec.program.display()))?;
    log::info!(
        "started {} (pid {})",
        spec.component,
        child.id().map(|id| id.to_string()).unwrap_or_else(|| "?".to_string())
    );

    let component = spec.component;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    Ok(tokio::spawn(async move {
        let out_task = stdout.map(|pipe| {
            tokio::spawn(relay_lines(
                pipe,
                component,
                OutputStream::Stdout,
                events.clone(),
            ))
        });
        let err_task = stderr.map(|pipe| {
            tokio::spawn(relay_lines(
                pipe,
                component,
                OutputStream::Stderr,
                events.clone(),
            ))
        });
        let code = match child.wait().await {
            Ok(status) => status.code(),
            Err(e) => {
                log::warn!("failed to wait for {component}: {e}");
                None
            }
        };
        for task in [out_task, err_task].into_iter().flatten() {
            let _ = task.await;
        }
        let _ = events.send(SupervisorEvent::Exited { component, code });
    }))
}

async fn relay_lines<R>(
    pipe: R,
    component: Component,
    stream: OutputStream,
    events: UnboundedSender<SupervisorEvent>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let event = SupervisorEvent::Output(OutputEvent {
                    component,
                    stream,
                    text: String::from_utf8_lossy(&buf).into_owned(),
                });
                if events.send(event).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("{component} {stream:?} closed: {e}");
                break;
            }
        }
    }
}
