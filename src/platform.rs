use std::fmt;

use crate::errors::LauncherError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
    Other(String),
}

impl HostOs {
    pub fn detect() -> Self {
        Self::from_target_os(std::env::consts::OS)
    }

    pub fn from_target_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => f.write_str("windows"),
            Self::MacOs => f.write_str("macos"),
            Self::Linux => f.write_str("linux"),
            Self::Other(os) => f.write_str(os),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostArch {
    X64,
    Arm64,
    Other(String),
}

impl HostArch {
    pub fn detect() -> Self {
        Self::from_target_arch(std::env::consts::ARCH)
    }

    pub fn from_target_arch(arch: &str) -> Self {
        match arch {
            "x86_64" => Self::X64,
            "aarch64" => Self::Arm64,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HostArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X64 => f.write_str("x64"),
            Self::Arm64 => f.write_str("arm64"),
            Self::Other(arch) => f.write_str(arch),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: HostOs,
    pub arch: HostArch,
}

impl HostPlatform {
    pub fn detect() -> Self {
        Self {
            os: HostOs::detect(),
            arch: HostArch::detect(),
        }
    }
}

/// The search engine binary required by a host. Resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAsset {
    pub os: HostOs,
    pub arch: HostArch,
    pub file_name: &'static str,
}

impl PlatformAsset {
    pub fn for_host(host: &HostPlatform) -> Result<Self, LauncherError> {
        let file_name = resolve_asset_name(&host.os, &host.arch)?;
        Ok(Self {
            os: host.os.clone(),
            arch: host.arch.clone(),
            file_name,
        })
    }
}

pub fn resolve_asset_name(os: &HostOs, arch: &HostArch) -> Result<&'static str, LauncherError> {
    let unsupported_arch = |supported: &'static str| LauncherError::UnsupportedArchitecture {
        os: os.to_string(),
        arch: arch.to_string(),
        supported,
    };
    match os {
        HostOs::Windows => match arch {
            HostArch::X64 => Ok("meilisearch-windows-amd64.exe"),
            _ => Err(unsupported_arch("x64")),
        },
        HostOs::MacOs => match arch {
            HostArch::Arm64 => Ok("meilisearch-macos-apple-silicon"),
            HostArch::X64 => Ok("meilisearch-macos-amd64"),
            HostArch::Other(_) => Err(unsupported_arch("arm64 and x64")),
        },
        HostOs::Linux => match arch {
            HostArch::Arm64 => Ok("meilisearch-linux-aarch64"),
            HostArch::X64 => Ok("meilisearch-linux-amd64"),
            HostArch::Other(_) => Err(unsupported_arch("arm64 and x64")),
        },
        HostOs::Other(os) => Err(LauncherError::UnsupportedPlatform { os: os.clone() }),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_asset_name, HostArch, HostOs, HostPlatform, PlatformAsset};
    use crate::errors::LauncherError;

    #[test]
    fn supported_matrix_resolves_exact_names() {
        let cases = [
            (HostOs::Windows, HostArch::X64, "meilisearch-windows-amd64.exe"),
            (HostOs::MacOs, HostArch::Arm64, "meilisearch-macos-apple-silicon"),
            (HostOs::MacOs, HostArch::X64, "meilisearch-macos-amd64"),
            (HostOs::Linux, HostArch::Arm64, "meilisearch-linux-aarch64"),
            (HostOs::Linux, HostArch::X64, "meilisearch-linux-amd64"),
        ];
        for (os, arch, expected) in cases {
            assert_eq!(
                resolve_asset_name(&os, &arch).expect("supported"),
                expected,
                "{os}/{arch}"
            );
        }
    }

    #[test]
    fn windows_rejects_everything_but_x64() {
        let err = resolve_asset_name(&HostOs::Windows, &HostArch::Arm64).expect_err("arm64");
        assert!(matches!(
            err,
            LauncherError::UnsupportedArchitecture { supported: "x64", .. }
        ));
        assert_eq!(err.to_string(), "windows only supports x64, got arm64");
    }

    #[test]
    fn unknown_arch_is_unsupported_on_unix_hosts() {
        for os in [HostOs::MacOs, HostOs::Linux] {
            let err = resolve_asset_name(&os, &HostArch::from_target_arch("riscv64"))
                .expect_err("riscv64");
            match err {
                LauncherError::UnsupportedArchitecture { arch, .. } => assert_eq!(arch, "riscv64"),
                other => panic!("unexpected error variant: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_os_is_unsupported_platform() {
        let err = resolve_asset_name(&HostOs::from_target_os("freebsd"), &HostArch::X64)
            .expect_err("freebsd");
        assert_eq!(
            err,
            LauncherError::UnsupportedPlatform {
                os: "freebsd".to_string()
            }
        );
    }

    #[test]
    fn target_constants_map_to_host_enums() {
        assert_eq!(HostOs::from_target_os("macos"), HostOs::MacOs);
        assert_eq!(HostArch::from_target_arch("aarch64"), HostArch::Arm64);
        assert_eq!(HostArch::from_target_arch("x86_64"), HostArch::X64);
    }

    #[test]
    fn platform_asset_keeps_host_tags() {
        let host = HostPlatform {
            os: HostOs::Linux,
            arch: HostArch::X64,
        };
        let asset = PlatformAsset::for_host(&host).expect("asset");
        assert_eq!(asset.os, HostOs::Linux);
        assert_eq!(asset.arch, HostArch::X64);
        assert_eq!(asset.file_name, "meilisearch-linux-amd64");
    }
}
