//! Interactive-card webhook formatting (Feishu-style)

use super::{Message, Notifier, Severity};
use serde_json::json;

/// Rich "interactive card" channel: colored header, lark_md body blocks
/// separated by rules, and a plain-text timestamp note.
pub struct CardNotifier {
    url: String,
}

impl CardNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    fn header_template(severity: Severity) -> &'static str {
        match severity {
            Severity::Info => "green",
            Severity::Warning => "orange",
            Severity::Critical => "red",
        }
    }
}

impl Notifier for CardNotifier {
    fn name(&self) -> &'static str {
        "feishu"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn format(&self, message: &Message) -> serde_json::Value {
        let mut elements = Vec::new();

        for (index, section) in message.sections.iter().enumerate() {
            if index > 0 {
                elements.push(json!({ "tag": "hr" }));
            }
            elements.push(json!({
                "tag": "div",
                "text": {
                    "tag": "lark_md",
                    "content": section.render("• ", "**"),
                }
            }));
        }

        elements.push(json!({
            "tag": "note",
            "elements": [
                {
                    "tag": "plain_text",
                    "content": format!("Check Time: {}", message.timestamp),
                }
            ]
        }));

        json!({
            "msg_type": "interactive",
            "card": {
                "config": {
                    "wide_screen_mode": true,
                },
                "header": {
                    "title": {
                        "tag": "plain_text",
                        "content": format!("{} {}", message.severity.emoji(), message.title),
                    },
                    "template": Self::header_template(message.severity),
                },
                "elements": elements,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Section;

    fn sample_message() -> Message {
        Message::new("Server Resource Alert - web-01", Severity::Critical, "2026-08-05 10:00:00")
            .section(
                Section::lead("Resources over threshold:").item("CPU: 92.0% (threshold: 90%)"),
            )
            .section(Section::titled("Current System Stats").item("Memory: 55.0%"))
    }

    #[test]
    fn test_card_envelope_shape() {
        let notifier = CardNotifier::new("https://feishu.example/hook");
        let payload = notifier.format(&sample_message());

        assert_eq!(payload["msg_type"], "interactive");
        assert_eq!(payload["card"]["header"]["template"], "red");

        let title = payload["card"]["header"]["title"]["content"]
            .as_str()
            .unwrap();
        assert!(title.contains("Server Resource Alert - web-01"));
    }

    #[test]
    fn test_card_sections_are_separated_by_rules() {
        let notifier = CardNotifier::new("https://feishu.example/hook");
        let payload = notifier.format(&sample_message());

        let elements = payload["card"]["elements"].as_array().unwrap();
        // div, hr, div, note
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[1]["tag"], "hr");
        assert_eq!(elements[3]["tag"], "note");

        let body = elements[0]["text"]["content"].as_str().unwrap();
        assert!(body.contains("• CPU: 92.0% (threshold: 90%)"));

        let note = elements[3]["elements"][0]["content"].as_str().unwrap();
        assert_eq!(note, "Check Time: 2026-08-05 10:00:00");
    }

    #[test]
    fn test_info_severity_gets_green_header() {
        let notifier = CardNotifier::new("https://feishu.example/hook");
        let message = Message::new("Resources Recovered - web-01", Severity::Info, "t");
        let payload = notifier.format(&message);
        assert_eq!(payload["card"]["header"]["template"], "green");
    }
}
