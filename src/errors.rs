use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherError {
    MissingDependency {
        tool: String,
        detail: String,
    },
    UnsupportedPlatform {
        os: String,
    },
    UnsupportedArchitecture {
        os: String,
        arch: String,
        supported: &'static str,
    },
    ProvisioningMismatch {
        expected: PathBuf,
        received: Option<PathBuf>,
    },
    ConfigParse {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for LauncherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependency { tool, detail } => {
                write!(f, "{tool} not found, please install it first ({detail})")
            }
            Self::UnsupportedPlatform { os } => write!(f, "unsupported platform: {os}"),
            Self::UnsupportedArchitecture {
                os,
                arch,
                supported,
            } => write!(f, "{os} only supports {supported}, got {arch}"),
            Self::ProvisioningMismatch { expected, received } => match received {
                Some(received) => write!(
                    f,
                    "download failed: expected {} but release provided {}",
                    expected.display(),
                    received.display()
                ),
                None => write!(
                    f,
                    "download failed: no release asset was written for {}",
                    expected.display()
                ),
            },
            Self::ConfigParse { path, message } => {
                write!(f, "invalid config at {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for LauncherError {}
