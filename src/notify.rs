//! Webhook notification fan-out
//!
//! Provides:
//! - A channel-agnostic message model (title, severity, sections, timestamp)
//! - One notifier per supported chat platform, each owning its JSON envelope
//! - A dispatcher that fans a message out to every configured channel in a
//!   fixed order, treating per-channel failures as local

pub mod block;
pub mod card;
pub mod markdown;

use crate::config::Config;
use tracing::{error, info, warn};

pub use block::BlockNotifier;
pub use card::CardNotifier;
pub use markdown::MarkdownNotifier;

/// Timestamp format used in notification footers
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How urgent a message is; drives per-channel decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Good news (recovery confirmations, diagnostics)
    Info,
    /// Something needs attention but the host is partially recovered
    Warning,
    /// Active resource breach or network outage
    Critical,
}

impl Severity {
    /// Emoji used by channels that render unicode directly
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Info => "✅",
            Severity::Warning => "⚠️",
            Severity::Critical => "❗",
        }
    }

    /// Emoji shortcode for markdown-based channels
    pub fn shortcode(&self) -> &'static str {
        match self {
            Severity::Info => ":white_check_mark:",
            Severity::Warning => ":warning:",
            Severity::Critical => ":exclamation:",
        }
    }
}

/// One block of message content
#[derive(Debug, Clone, Default)]
pub struct Section {
    /// Optional bold heading
    pub heading: Option<String>,
    /// Optional lead paragraph
    pub text: Option<String>,
    /// Bulleted lines
    pub items: Vec<String>,
}

impl Section {
    /// Section that opens with a lead paragraph
    pub fn lead(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Section that opens with a heading
    pub fn titled(heading: impl Into<String>) -> Self {
        Self {
            heading: Some(heading.into()),
            ..Default::default()
        }
    }

    /// Append a bulleted line
    pub fn item(mut self, line: impl Into<String>) -> Self {
        self.items.push(line.into());
        self
    }

    /// Append several bulleted lines
    pub fn items(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.items.extend(lines);
        self
    }

    /// Render as markdown-ish text with channel-specific bullet and bold
    /// markers.
    pub fn render(&self, bullet: &str, bold: &str) -> String {
        let mut out = String::new();
        if let Some(heading) = &self.heading {
            out.push_str(&format!("{bold}{heading}{bold}\n"));
        }
        if let Some(text) = &self.text {
            out.push_str(text);
            out.push('\n');
        }
        for item in &self.items {
            out.push_str(&format!("{bullet}{item}\n"));
        }
        out.trim_end().to_string()
    }
}

/// A channel-agnostic notification
#[derive(Debug, Clone)]
pub struct Message {
    pub title: String,
    pub severity: Severity,
    pub sections: Vec<Section>,
    /// Preformatted check time shown in the footer
    pub timestamp: String,
}

impl Message {
    pub fn new(title: impl Into<String>, severity: Severity, timestamp: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            severity,
            sections: Vec::new(),
            timestamp: timestamp.into(),
        }
    }

    /// Append a content section
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }
}

/// A chat platform that can receive messages through a webhook
pub trait Notifier {
    /// Channel name for logs
    fn name(&self) -> &'static str;

    /// Webhook endpoint
    fn url(&self) -> &str;

    /// Wrap a message in this channel's JSON envelope
    fn format(&self, message: &Message) -> serde_json::Value;
}

/// HTTP delivery seam, mockable in tests
pub trait Transport {
    /// POST a JSON payload; returns the response status, or a transport
    /// error description when no response was received.
    fn post(&self, url: &str, payload: &serde_json::Value) -> std::result::Result<u16, String>;
}

/// Transport backed by ureq
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn post(&self, url: &str, payload: &serde_json::Value) -> std::result::Result<u16, String> {
        match ureq::post(url).send_json(payload) {
            Ok(response) => Ok(response.status().as_u16()),
            Err(ureq::Error::StatusCode(code)) => Ok(code),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Fans messages out to every configured channel.
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
    transport: Box<dyn Transport>,
    test_mode: bool,
}

impl Dispatcher {
    /// Build the dispatcher from configuration, using ureq for delivery.
    pub fn from_config(config: &Config) -> Self {
        Self::with_transport(config, Box::new(UreqTransport))
    }

    /// Build the dispatcher with an explicit transport.
    pub fn with_transport(config: &Config, transport: Box<dyn Transport>) -> Self {
        // Fixed dispatch order: card, block, markdown
        let mut channels: Vec<Box<dyn Notifier>> = Vec::new();
        if !config.webhooks.feishu_url.is_empty() {
            channels.push(Box::new(CardNotifier::new(&config.webhooks.feishu_url)));
        }
        if !config.webhooks.slack_url.is_empty() {
            channels.push(Box::new(BlockNotifier::new(&config.webhooks.slack_url)));
        }
        if !config.webhooks.mattermost_url.is_empty() {
            channels.push(Box::new(MarkdownNotifier::new(
                &config.webhooks.mattermost_url,
            )));
        }

        Self {
            channels,
            transport,
            test_mode: config.test_mode,
        }
    }

    /// Deliver a message to every configured channel in order.
    ///
    /// Returns true when at least one channel accepted the message. With no
    /// channels configured this is a warning and a vacuous false, never an
    /// error: the agent keeps running in alert-detection-only mode.
    pub fn dispatch(&self, message: &Message) -> bool {
        if self.channels.is_empty() {
            warn!("no notification webhooks configured, running in alert-detection-only mode");
            return false;
        }

        let mut delivered = false;

        for channel in &self.channels {
            let payload = channel.format(message);

            if self.test_mode {
                info!(
                    channel = channel.name(),
                    payload = %serde_json::to_string_pretty(&payload).unwrap_or_default(),
                    "TEST MODE: would send notification"
                );
                delivered = true;
                continue;
            }

            match self.transport.post(channel.url(), &payload) {
                Ok(200) => {
                    info!(channel = channel.name(), "notification sent");
                    delivered = true;
                }
                Ok(code) => {
                    error!(
                        channel = channel.name(),
                        status = code,
                        "notification rejected"
                    );
                }
                Err(e) => {
                    error!(channel = channel.name(), error = %e, "notification failed");
                }
            }
        }

        delivered
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Transport;
    use std::sync::{Arc, Mutex};

    /// Transport that records posts and answers with scripted statuses.
    pub(crate) struct RecordingTransport {
        pub posts: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
        /// Status returned per call, last entry repeating
        pub statuses: Vec<u16>,
    }

    impl RecordingTransport {
        pub(crate) fn ok() -> (Self, Arc<Mutex<Vec<(String, serde_json::Value)>>>) {
            Self::with_statuses(vec![200])
        }

        pub(crate) fn with_statuses(
            statuses: Vec<u16>,
        ) -> (Self, Arc<Mutex<Vec<(String, serde_json::Value)>>>) {
            let posts = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    posts: Arc::clone(&posts),
                    statuses,
                },
                posts,
            )
        }
    }

    impl Transport for RecordingTransport {
        fn post(
            &self,
            url: &str,
            payload: &serde_json::Value,
        ) -> std::result::Result<u16, String> {
            let mut posts = self.posts.lock().unwrap();
            let index = posts.len().min(self.statuses.len() - 1);
            posts.push((url.to_string(), payload.clone()));
            Ok(self.statuses[index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingTransport;
    use super::*;
    use crate::config::Config;

    fn message() -> Message {
        Message::new("Server Resource Alert - web-01", Severity::Critical, "2026-08-05 10:00:00")
            .section(
                Section::lead("The following resources have exceeded thresholds:")
                    .item("CPU: 92.0% (threshold: 90%)"),
            )
    }

    fn config_with(feishu: &str, slack: &str, mattermost: &str) -> Config {
        let mut config = Config::baseline();
        config.webhooks.feishu_url = feishu.to_string();
        config.webhooks.slack_url = slack.to_string();
        config.webhooks.mattermost_url = mattermost.to_string();
        config
    }

    #[test]
    fn test_dispatch_without_channels_is_vacuous() {
        // Scenario: no webhooks configured, alert set non-empty
        let config = Config::baseline();
        let (transport, posts) = RecordingTransport::ok();
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        assert!(!dispatcher.dispatch(&message()));
        assert!(posts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_order_is_deterministic() {
        let config = config_with(
            "https://feishu.example/hook",
            "https://slack.example/hook",
            "https://mm.example/hook",
        );
        let (transport, posts) = RecordingTransport::ok();
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        assert!(dispatcher.dispatch(&message()));

        let posts = posts.lock().unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].0, "https://feishu.example/hook");
        assert_eq!(posts[1].0, "https://slack.example/hook");
        assert_eq!(posts[2].0, "https://mm.example/hook");
    }

    #[test]
    fn test_one_failing_channel_does_not_block_others() {
        let config = config_with("https://feishu.example/hook", "https://slack.example/hook", "");
        let (transport, posts) = RecordingTransport::with_statuses(vec![500, 200]);
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        // First channel rejects, second accepts: overall success
        assert!(dispatcher.dispatch(&message()));
        assert_eq!(posts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_non_200_everywhere_is_failure() {
        let config = config_with("https://feishu.example/hook", "", "");
        let (transport, _posts) = RecordingTransport::with_statuses(vec![302]);
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        assert!(!dispatcher.dispatch(&message()));
    }

    #[test]
    fn test_test_mode_posts_nothing() {
        let mut config = config_with("https://feishu.example/hook", "", "");
        config.test_mode = true;
        let (transport, posts) = RecordingTransport::ok();
        let dispatcher = Dispatcher::with_transport(&config, Box::new(transport));

        // Simulated sends count as delivered but never hit the transport
        assert!(dispatcher.dispatch(&message()));
        assert!(posts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_section_rendering() {
        let section = Section::titled("Current System Stats")
            .item("Memory: 55.0%")
            .item("CPU: 91.0%");

        let rendered = section.render("• ", "**");
        assert_eq!(
            rendered,
            "**Current System Stats**\n• Memory: 55.0%\n• CPU: 91.0%"
        );
    }
}
