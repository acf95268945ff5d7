use std::process::Stdio;

use anyhow::anyhow;
use async_trait::async_trait;
use notify_rust::Notification;
use tokio::process::Command;

use crate::platform::HostOs;

pub const NOTICE_TITLE: &str = "DocBase 已启动";
pub const NOTICE_SUBTITLE: &str = "点击查看";
pub const NOTICE_ICON: &str = "https://docbase.cc/logo.svg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyNotice {
    pub title: String,
    pub subtitle: String,
    pub message: String,
    pub icon: String,
}

impl ReadyNotice {
    pub fn for_secret(secret: &str) -> Self {
        Self {
            title: NOTICE_TITLE.to_string(),
            subtitle: NOTICE_SUBTITLE.to_string(),
            message: format!("密钥：{secret}"),
            icon: NOTICE_ICON.to_string(),
        }
    }
}

/// Side effects fired once the application reports it is serving.
#[async_trait]
pub trait ReadyActions: Send + Sync {
    async fn open_browser(&self, url: &str) -> anyhow::Result<()>;
    async fn notify(&self, notice: &ReadyNotice) -> anyhow::Result<()>;
}

pub fn browser_command(os: &HostOs, url: &str) -> (&'static str, Vec<String>) {
    match os {
        HostOs::Windows => (
            "cmd",
            vec![
                "/C".to_string(),
                "start".to_string(),
                String::new(),
                url.to_string(),
            ],
        ),
        HostOs::MacOs => ("open", vec![url.to_string()]),
        HostOs::Linux | HostOs::Other(_) => ("xdg-open", vec![url.to_string()]),
    }
}

#[derive(Debug, Clone)]
pub struct DesktopActions {
    pub os: HostOs,
    pub open_browser: bool,
    pub notify: bool,
}

#[async_trait]
impl ReadyActions for DesktopActions {
    async fn open_browser(&self, url: &str) -> anyhow::Result<()> {
        if !self.open_browser {
            log::debug!("browser launch disabled, skipping {url}");
            return Ok(());
        }
        let (program, args) = browser_command(&self.os, url);
        let status = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| anyhow!("failed to run '{program}': {e}"))?;
        if !status.success() {
            return Err(anyhow!("'{program}' exited with {status}"));
        }
        Ok(())
    }

    async fn notify(&self, notice: &ReadyNotice) -> anyhow::Result<()> {
        if !self.notify {
            log::debug!("desktop notification disabled");
            return Ok(());
        }
        let notice = notice.clone();
        tokio::task::spawn_blocking(move || show_notification(&notice)).await?
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn show_notification(notice: &ReadyNotice) -> anyhow::Result<()> {
    let handle = build_notification(notice)
        .show()
        .map_err(|e| anyhow!("failed to show notification: {e}"))?;
    handle.wait_for_action(|action| log::debug!("notification closed: {action}"));
    Ok(())
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn show_notification(notice: &ReadyNotice) -> anyhow::Result<()> {
    build_notification(notice)
        .show()
        .map(|_| ())
        .map_err(|e| anyhow!("failed to show notification: {e}"))
}

fn build_notification(notice: &ReadyNotice) -> Notification {
    let mut notification = Notification::new();
    notification
        .summary(&notice.title)
        .subtitle(&notice.subtitle)
        .body(&notice.message)
        .icon(&notice.icon);
    notification
}

#[cfg(test)]
mod tests {
    use super::{browser_command, ReadyNotice, NOTICE_ICON};
    use crate::platform::HostOs;

    #[test]
    fn browser_command_follows_host_os() {
        let url = "http://localhost:3000";
        assert_eq!(
            browser_command(&HostOs::Windows, url),
            (
                "cmd",
                vec![
                    "/C".to_string(),
                    "start".to_string(),
                    String::new(),
                    url.to_string()
                ]
            )
        );
        assert_eq!(
            browser_command(&HostOs::MacOs, url),
            ("open", vec![url.to_string()])
        );
        assert_eq!(
            browser_command(&HostOs::Linux, url),
            ("xdg-open", vec![url.to_string()])
        );
        assert_eq!(
            browser_command(&HostOs::Other("freebsd".to_string()), url).0,
            "xdg-open"
        );
    }

    #[test]
    fn notice_embeds_secret() {
        let notice = ReadyNotice::for_secret("abc123");
        assert_eq!(notice.title, "DocBase 已启动");
        assert_eq!(notice.subtitle, "点击查看");
        assert_eq!(notice.message, "密钥：abc123");
        assert_eq!(notice.icon, NOTICE_ICON);
    }
}
