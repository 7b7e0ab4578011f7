//! Block-kit webhook formatting (Slack-style)

use super::{Message, Notifier};
use serde_json::json;

/// Block-based channel: a bold mrkdwn title block, one section block per
/// message section, and a context element carrying the timestamp.
pub struct BlockNotifier {
    url: String,
}

impl BlockNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

impl Notifier for BlockNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn format(&self, message: &Message) -> serde_json::Value {
        let mut blocks = vec![json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("{} *{}*", message.severity.emoji(), message.title),
            }
        })];

        for section in &message.sections {
            blocks.push(json!({
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": section.render("• ", "*"),
                }
            }));
        }

        blocks.push(json!({
            "type": "context",
            "elements": [
                {
                    "type": "mrkdwn",
                    "text": format!("_Check Time: {}_", message.timestamp),
                }
            ]
        }));

        json!({
            "text": message.title,
            "blocks": blocks,
        })
    }
}
