use async_trait::async_trait;
use serde_json::json;

use crate::models::AlertEvaluationResult;
use crate::valuation;

/// Delivery target for triggered alerts. Evaluation and delivery are
/// decoupled: a sink must absorb its own failures. They are never retried
/// and never affect the evaluation that produced the result.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, result: &AlertEvaluationResult);
}

/// Sink that writes triggered alerts to the log. The default when no
/// external channel is configured.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, result: &AlertEvaluationResult) {
        tracing::info!(
            rule_id = %result.rule_id,
            kind = %result.kind,
            message = result.message.as_deref().unwrap_or(""),
            "Alert triggered"
        );
    }
}

/// Telegram delivery. Failures are logged as warnings and dropped.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(http: reqwest::Client, bot_token: String, chat_id: String) -> Self {
        Self {
            http,
            bot_token,
            chat_id,
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn deliver(&self, result: &AlertEvaluationResult) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        let body = json!({
            "chat_id": self.chat_id,
            "text": format_alert(result),
            "parse_mode": "Markdown",
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    tracing::warn!(
                        status = %resp.status(),
                        rule_id = %result.rule_id,
                        "Telegram sendMessage returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, rule_id = %result.rule_id, "Failed to deliver alert notification");
            }
        }
    }
}

/// Format a triggered evaluation for delivery.
pub fn format_alert(result: &AlertEvaluationResult) -> String {
    let mut text = format!("*Alert: {}*\nKind: {}", result.rule_name, result.kind);

    if let Some(message) = &result.message {
        text.push('\n');
        text.push_str(message);
    }
    if let (Some(observed), Some(target)) = (result.observed, result.target) {
        text.push_str(&format!(
            "\nObserved: {}\nTarget: {}",
            valuation::display(observed),
            target,
        ));
    }

    text
}
