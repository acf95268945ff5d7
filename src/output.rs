use std::fmt;

pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    SearchEngine,
    Application,
}

impl Component {
    pub fn label(self) -> &'static str {
        match self {
            Self::SearchEngine => "MeiliSearch",
            Self::Application => "Docbase",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn color(self) -> &'static str {
        match self {
            Self::Stdout => GREEN,
            Self::Stderr => RED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    pub component: Component,
    pub stream: OutputStream,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    Output(OutputEvent),
    Exited {
        component: Component,
        code: Option<i32>,
    },
}

pub fn format_chunk(event: &OutputEvent) -> String {
    format!(
        "{}[{}] {}{}",
        event.stream.color(),
        event.component.label(),
        event.text.trim_end_matches(['\r', '\n']),
        RESET
    )
}
