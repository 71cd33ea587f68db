//! Text rendering of lifecycle records

use colored::Colorize;

use crate::lifecycle::{LifecycleRecord, RecordState};
use crate::transport::ResponseMetadata;

/// Line shown while a record is pending
pub fn render_pending(record: &LifecycleRecord) -> String {
    format!("{} {}", "…".dimmed(), format!("waiting for orchestrator [{}]", record.id().short()).dimmed())
}

/// Answer or inline error for a settled record
pub fn render_settled(record: &LifecycleRecord, show_metadata: bool) -> String {
    match (record.response(), record.error()) {
        (Some(response), _) => {
            let mut out = response.primary_text.clone();
            if show_metadata {
                out.push('\n');
                out.push_str(&render_metadata(&response.metadata, record));
            }
            out
        }
        (None, Some(error)) => format!("{} {}", "Error:".red().bold(), error.message.red()),
        (None, None) => render_pending(record),
    }
}

/// Debug panel for a successful answer
pub fn render_metadata(meta: &ResponseMetadata, record: &LifecycleRecord) -> String {
    let duration = record
        .duration()
        .map(|d| format!("{}ms", d.as_millis()))
        .unwrap_or_else(|| "unknown".to_string());

    let lines = [
        format!("agent: {}", meta.agent.as_deref().unwrap_or("unknown")),
        format!("confidence: {}", meta.confidence_label()),
        format!("latency: {} (round trip {})", meta.latency_label(), duration),
        format!("tier: {}", meta.tier),
        format!("cost: {}", meta.cost_estimate),
        format!("policy: {}", meta.policy_status),
        format!("tokens: {}", meta.tokens_label()),
        format!("routing: {}", meta.routing_reason),
    ];

    lines
        .iter()
        .map(|l| format!("  {}", l.dimmed()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line of `/history` output
pub fn render_history_line(index: usize, record: &LifecycleRecord) -> String {
    let state = match record.state() {
        RecordState::Pending => "pending".yellow(),
        RecordState::Succeeded => "ok".green(),
        RecordState::Failed => "failed".red(),
    };
    let message = &record.request().message;
    let preview: String = message.chars().take(50).collect();
    let preview = if message.chars().count() > 50 {
        format!("{}...", preview)
    } else {
        preview
    };
    let duration = record
        .duration()
        .map(|d| format!(" ({}ms)", d.as_millis()))
        .unwrap_or_default();

    format!("  {}. [{}] {}{}", index + 1, state, preview, duration)
}

/// Full record as pretty JSON, as `/raw` shows it
pub fn render_raw(record: &LifecycleRecord) -> serde_json::Result<String> {
    serde_json::to_string_pretty(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{RequestEnvelope, ResponseEnvelope, TransportError};
    use std::time::Duration;

    fn settled_ok(text: &str, meta: ResponseMetadata) -> LifecycleRecord {
        let mut record = LifecycleRecord::pending(RequestEnvelope::new("s", "ping"));
        let response = ResponseEnvelope {
            primary_text: text.to_string(),
            metadata: meta,
        };
        record.settle(&Ok(response), Duration::from_millis(12)).unwrap();
        record
    }

    #[test]
    fn test_render_success_without_metadata() {
        let record = settled_ok("pong", ResponseMetadata::default());

        let out = render_settled(&record, false);

        assert_eq!(out, "pong");
    }

    #[test]
    fn test_render_success_with_metadata() {
        let meta = ResponseMetadata {
            confidence: Some(0.9),
            agent: Some("echo".to_string()),
            ..ResponseMetadata::default()
        };
        let record = settled_ok("pong", meta);

        let out = render_settled(&record, true);

        assert!(out.starts_with("pong\n"));
        assert!(out.contains("confidence: 90%"));
        assert!(out.contains("agent: echo"));
        assert!(out.contains("tokens: unknown"));
        assert!(out.contains("tier: default"));
        assert!(out.contains("round trip 12ms"));
    }

    #[test]
    fn test_render_failure_inline() {
        let mut record = LifecycleRecord::pending(RequestEnvelope::new("s", "ping"));
        let err = TransportError::ServerError {
            status: 500,
            detail: Some("overload".to_string()),
        };
        record.settle(&Err(err), Duration::from_millis(1)).unwrap();

        let out = render_settled(&record, true);

        assert!(out.contains("overload"));
    }

    #[test]
    fn test_history_line_truncates_long_messages() {
        let long = "x".repeat(80);
        let record = LifecycleRecord::pending(RequestEnvelope::new("s", long));

        let line = render_history_line(0, &record);

        assert!(line.contains(&format!("{}...", "x".repeat(50))));
        assert!(!line.contains(&"x".repeat(51)));
    }

    #[test]
    fn test_render_raw_includes_metadata_and_timing() {
        let meta = ResponseMetadata {
            latency_ms: Some(40),
            ..ResponseMetadata::default()
        };
        let record = settled_ok("pong", meta);

        let raw = render_raw(&record).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert!(raw.contains('\n'));
        assert_eq!(value["state"], "succeeded");
        assert_eq!(value["response"]["primary_text"], "pong");
        assert_eq!(value["response"]["metadata"]["latency_ms"], 40);
        assert!(value.get("settled_at").is_some());
    }
}
