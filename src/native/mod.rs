//! Capability-gated OS actions. Every operation is an ordered chain of
//! strategies — native host command, companion helper, web-intent URL,
//! clipboard payload — executed until one succeeds. Absent capabilities
//! degrade to the next step and failure is reported to the caller, never
//! thrown past this boundary.

pub mod companion;

use std::path::Path;

use crate::config::MisradConfig;
use crate::core::phone::format_phone_for_whatsapp;
use companion::CompanionClient;

/// What a successful strategy produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An OS-level action ran to completion.
    Opened,
    /// The user picked this path.
    SelectedPath(String),
    /// A web-equivalent URL for the hosting shell to open.
    Intent(String),
    /// A payload to place on the clipboard as a last resort.
    Copied(String),
}

/// One step of a fallback chain.
#[derive(Debug, Clone)]
enum Step {
    /// Open a path or URL with the OS handler. Requires a native shell.
    HostOpen(String),
    CompanionOpenFolder(String),
    CompanionSelectFolder,
    Intent(String),
    Clipboard(String),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Self::HostOpen(_) => "host-open",
            Self::CompanionOpenFolder(_) => "companion-open-folder",
            Self::CompanionSelectFolder => "companion-select-folder",
            Self::Intent(_) => "web-intent",
            Self::Clipboard(_) => "clipboard",
        }
    }
}

/// Facade over folder and communication actions. Constructed explicitly
/// (no global singleton); the companion client is injected so tests can
/// substitute a fake helper.
pub struct NativeBridge {
    native_shell: bool,
    companion: Option<CompanionClient>,
}

impl NativeBridge {
    pub fn new(native_shell: bool, companion: Option<CompanionClient>) -> Self {
        Self {
            native_shell,
            companion,
        }
    }

    pub fn from_config(config: &MisradConfig) -> Self {
        Self::new(
            config.native_shell,
            Some(CompanionClient::new(config.companion_port)),
        )
    }

    pub fn has_native_shell(&self) -> bool {
        self.native_shell
    }

    async fn run_step(&self, step: &Step) -> Result<Outcome, String> {
        match step {
            Step::HostOpen(target) => {
                if !self.native_shell {
                    return Err("no native shell".into());
                }
                open::that(target).map_err(|e| format!("open failed: {}", e))?;
                Ok(Outcome::Opened)
            }
            Step::CompanionOpenFolder(path) => {
                let Some(companion) = &self.companion else {
                    return Err("no companion configured".into());
                };
                if companion.open_folder(path).await {
                    Ok(Outcome::Opened)
                } else {
                    Err("companion unavailable".into())
                }
            }
            Step::CompanionSelectFolder => {
                let Some(companion) = &self.companion else {
                    return Err("no companion configured".into());
                };
                companion
                    .select_folder()
                    .await
                    .map(Outcome::SelectedPath)
                    .ok_or_else(|| "companion unavailable".into())
            }
            Step::Intent(url) => Ok(Outcome::Intent(url.clone())),
            Step::Clipboard(text) => Ok(Outcome::Copied(text.clone())),
        }
    }

    async fn run_chain(&self, action: &str, steps: Vec<Step>) -> Result<Outcome, String> {
        for step in &steps {
            match self.run_step(step).await {
                Ok(outcome) => {
                    log::info!("{}: {} succeeded", action, step.name());
                    return Ok(outcome);
                }
                Err(e) => log::debug!("{}: {} failed: {}", action, step.name(), e),
            }
        }
        Err(format!("{}: every strategy failed", action))
    }

    /// Open a folder in the system file manager, falling back to a
    /// clipboard copy of the path.
    pub async fn open_folder(&self, path: &str) -> Result<Outcome, String> {
        self.run_chain(
            "open-folder",
            vec![
                Step::HostOpen(path.to_string()),
                Step::CompanionOpenFolder(path.to_string()),
                Step::Clipboard(path.to_string()),
            ],
        )
        .await
    }

    /// Show a folder picker. Only the companion helper can do this
    /// without a native shell; there is no web fallback.
    pub async fn select_folder(&self) -> Option<String> {
        match self
            .run_chain("select-folder", vec![Step::CompanionSelectFolder])
            .await
        {
            Ok(Outcome::SelectedPath(path)) => Some(path),
            _ => None,
        }
    }

    /// Check whether a folder path exists, via the local filesystem in a
    /// native shell or through the companion otherwise.
    pub async fn validate_folder(&self, path: &str) -> bool {
        if path.trim().is_empty() {
            return false;
        }
        if self.native_shell {
            return Path::new(path).exists();
        }
        match &self.companion {
            Some(companion) => companion.validate_folder(path).await,
            None => false,
        }
    }

    /// Open the phone dialer for a number.
    pub async fn dial(&self, phone: &str) -> Result<Outcome, String> {
        let url = tel_url(phone);
        self.run_chain(
            "dial",
            vec![
                Step::HostOpen(url.clone()),
                Step::Intent(url),
                Step::Clipboard(phone.to_string()),
            ],
        )
        .await
    }

    /// Open a WhatsApp conversation, optionally with a prefilled message.
    pub async fn open_whatsapp(
        &self,
        phone: &str,
        message: Option<&str>,
    ) -> Result<Outcome, String> {
        let url = whatsapp_url(phone, message);
        self.run_chain(
            "open-whatsapp",
            vec![
                Step::HostOpen(url.clone()),
                Step::Intent(url.clone()),
                Step::Clipboard(url),
            ],
        )
        .await
    }

    /// Compose an email, optionally with subject and body.
    pub async fn open_email(
        &self,
        email: &str,
        subject: Option<&str>,
        body: Option<&str>,
    ) -> Result<Outcome, String> {
        let url = mailto_url(email, subject, body);
        self.run_chain(
            "open-email",
            vec![
                Step::HostOpen(url.clone()),
                Step::Intent(url),
                Step::Clipboard(email.to_string()),
            ],
        )
        .await
    }
}

/// wa.me link for a phone number in any local/international form.
pub fn whatsapp_url(phone: &str, message: Option<&str>) -> String {
    let formatted = format_phone_for_whatsapp(phone);
    match message {
        Some(message) if !message.is_empty() => {
            format!("https://wa.me/{}?text={}", formatted, encode_component(message))
        }
        _ => format!("https://wa.me/{}", formatted),
    }
}

pub fn mailto_url(email: &str, subject: Option<&str>, body: Option<&str>) -> String {
    let mut url = format!("mailto:{}", email);
    let mut params = Vec::new();
    if let Some(subject) = subject {
        params.push(format!("subject={}", encode_component(subject)));
    }
    if let Some(body) = body {
        params.push(format!("body={}", encode_component(body)));
    }
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
    url
}

pub fn tel_url(phone: &str) -> String {
    format!("tel:{}", phone)
}

/// Percent-encode a URL query component.
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web_bridge() -> NativeBridge {
        // No native shell, no companion: only web-equivalent steps can win.
        NativeBridge::new(false, None)
    }

    #[test]
    fn whatsapp_url_formats_israeli_number() {
        assert_eq!(
            whatsapp_url("050-1234567", None),
            "https://wa.me/972501234567"
        );
    }

    #[test]
    fn whatsapp_url_encodes_message() {
        let url = whatsapp_url("050-1234567", Some("שלום world"));
        assert!(url.starts_with("https://wa.me/972501234567?text="));
        assert!(url.contains("%20"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn mailto_url_with_subject_and_body() {
        let url = mailto_url("a@b.co", Some("hi there"), Some("line 1"));
        assert_eq!(url, "mailto:a@b.co?subject=hi%20there&body=line%201");
    }

    #[test]
    fn mailto_url_bare() {
        assert_eq!(mailto_url("a@b.co", None, None), "mailto:a@b.co");
    }

    #[tokio::test]
    async fn chain_skips_failing_steps_and_returns_first_success() {
        let bridge = web_bridge();
        // host-open fails (no shell), companion absent, web intent wins.
        let outcome = bridge.open_whatsapp("050-1234567", None).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Intent("https://wa.me/972501234567".into())
        );
    }

    #[tokio::test]
    async fn open_folder_degrades_to_clipboard() {
        let bridge = web_bridge();
        let outcome = bridge.open_folder("/home/user/projects").await.unwrap();
        assert_eq!(outcome, Outcome::Copied("/home/user/projects".into()));
    }

    #[tokio::test]
    async fn select_folder_without_companion_reports_failure() {
        let bridge = web_bridge();
        assert!(bridge.select_folder().await.is_none());
    }

    #[tokio::test]
    async fn validate_folder_rejects_empty_path() {
        let bridge = NativeBridge::new(true, None);
        assert!(!bridge.validate_folder("").await);
        assert!(!bridge.validate_folder("   ").await);
    }

    #[tokio::test]
    async fn validate_folder_checks_filesystem_in_native_shell() {
        let bridge = NativeBridge::new(true, None);
        assert!(bridge.validate_folder(std::env::temp_dir().to_str().unwrap()).await);
        assert!(!bridge.validate_folder("/definitely/not/a/real/path").await);
    }
}
