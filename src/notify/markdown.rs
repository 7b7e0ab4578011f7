//! Plain-markdown webhook formatting (Mattermost-style)

use super::{Message, Notifier};
use serde_json::json;

/// Markdown channel: the entire message is a single `text` field with a
/// heading line, emoji shortcode, and markdown bullets.
pub struct MarkdownNotifier {
    url: String,
}

impl MarkdownNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

impl Notifier for MarkdownNotifier {
    fn name(&self) -> &'static str {
        "mattermost"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn format(&self, message: &Message) -> serde_json::Value {
        let mut text = format!(
            "#### {} {}\n",
            message.severity.shortcode(),
            message.title
        );

        for section in &message.sections {
            text.push('\n');
            text.push_str(&section.render("* ", "**"));
            text.push('\n');
        }

        text.push_str(&format!("\n*Check Time: {}*", message.timestamp));

        json!({ "text": text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Section, Severity};

    #[test]
    fn test_markdown_envelope_shape() {
        let notifier = MarkdownNotifier::new("https://mm.example/hook");
        let message = Message::new("Network Down - web-01", Severity::Critical, "2026-08-05 10:00:00")
            .section(
                Section::lead("Network connectivity issue detected:")
                    .item("HTTP request failed: Connection error"),
            );

        let payload = notifier.format(&message);
        let text = payload["text"].as_str().unwrap();

        assert!(text.starts_with("#### :exclamation: Network Down - web-01"));
        assert!(text.contains("* HTTP request failed: Connection error"));
        assert!(text.contains("*Check Time: 2026-08-05 10:00:00*"));
    }

    #[test]
    fn test_recovered_message_uses_positive_shortcode() {
        let notifier = MarkdownNotifier::new("https://mm.example/hook");
        let message = Message::new("Resources Recovered - web-01", Severity::Info, "t");

        let payload = notifier.format(&message);
        assert!(payload["text"].as_str().unwrap().contains(":white_check_mark:"));
    }
}
