use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

use crate::desktop::{ReadyActions, ReadyNotice};
use crate::output::{format_chunk, Component, OutputEvent, OutputStream, SupervisorEvent};

pub const READY_MARKER: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorOptions {
    pub ready_marker: String,
    pub repeat_ready_actions: bool,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            ready_marker: READY_MARKER.to_string(),
            repeat_ready_actions: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorReport {
    pub ready_triggers: usize,
    pub exits: Vec<(Component, Option<i32>)>,
}

pub struct Supervisor {
    actions: Arc<dyn ReadyActions>,
    options: SupervisorOptions,
    secret: String,
    pending: JoinSet<()>,
    report: SupervisorReport,
}

impl Supervisor {
    pub fn new(actions: Arc<dyn ReadyActions>, options: SupervisorOptions, secret: &str) -> Self {
        Self {
            actions,
            options,
            secret: secret.to_string(),
            pending: JoinSet::new(),
            report: SupervisorReport::default(),
        }
    }

    pub fn is_ready_chunk(&self, event: &OutputEvent) -> bool {
        event.component == Component::Application
            && event.stream == OutputStream::Stdout
            && event.text.contains(&self.options.ready_marker)
    }

    /// Relays events until every child has exited, then waits for any ready
    /// actions still in flight.
    pub async fn run<O, E>(
        mut self,
        mut events: UnboundedReceiver<SupervisorEvent>,
        out: &mut O,
        err: &mut E,
    ) -> SupervisorReport
    where
        O: Write,
        E: Write,
    {
        while let Some(event) = events.recv().await {
            self.handle(event, out, err);
        }
        while let Some(joined) = self.pending.join_next().await {
            if let Err(e) = joined {
                log::warn!("ready action task failed: {e}");
            }
        }
        self.report
    }

    pub fn handle<O, E>(&mut self, event: SupervisorEvent, out: &mut O, err: &mut E)
    where
        O: Write,
        E: Write,
    {
        match event {
            SupervisorEvent::Output(chunk) => {
                if self.is_ready_chunk(&chunk) {
                    self.on_ready();
                }
                let line = format_chunk(&chunk);
                let written = match chunk.stream {
                    OutputStream::Stdout => writeln!(out, "{line}").and_then(|_| out.flush()),
                    OutputStream::Stderr => writeln!(err, "{line}").and_then(|_| err.flush()),
                };
                if let Err(e) = written {
                    log::debug!("dropped {} output: {e}", chunk.component);
                }
            }
            SupervisorEvent::Exited { component, code } => {
                match code {
                    Some(0) => log::info!("{component} exited"),
                    Some(code) => log::warn!("{component} exited with status {code}"),
                    None => log::warn!("{component} terminated by signal"),
                }
                self.report.exits.push((component, code));
            }
        }
    }

    fn on_ready(&mut self) {
        if self.report.ready_triggers > 0 && !self.options.repeat_ready_actions {
            log::debug!("ready marker seen again, actions already fired");
            return;
        }
        self.report.ready_triggers += 1;
        log::info!("application ready at {}", self.options.ready_marker);

        let actions = self.actions.clone();
        let url = self.options.ready_marker.clone();
        let notice = ReadyNotice::for_secret(&self.secret);
        self.pending.spawn(async move {
            if let Err(e) = actions.open_browser(&url).await {
                log::warn!("failed to open browser: {e:#}");
            }
            if let Err(e) = actions.notify(&notice).await {
                log::warn!("failed to send notification: {e:#}");
            }
        });
    }
}
