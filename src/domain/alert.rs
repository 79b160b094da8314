//! Alert Payload - Alertmanager Webhook Model
//!
//! Only the fields the rollback decision needs are modelled; unknown
//! fields in the notification are ignored. Fields are loosely typed:
//! a `null` status or a non-string label is treated as "not firing" or
//! "no severity" rather than rejecting the whole notification.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status value of an alert that is currently firing.
pub const FIRING: &str = "firing";

/// Severities that trigger a rollback.
pub const ROLLBACK_SEVERITIES: [&str; 2] = ["critical", "warning"];

/// Webhook notification body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlertPayload {
    /// Alerts grouped into this notification.
    #[serde(default, deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
}

/// A single alert.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Alert {
    /// `firing` or `resolved`; anything else (including `null`) is neither.
    #[serde(default, deserialize_with = "string_or_none")]
    pub status: Option<String>,
    /// Alert labels (`severity`, `alertname`, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: HashMap<String, Value>,
}

impl Alert {
    /// Build an alert with an optional `severity` label.
    pub fn new(status: impl Into<String>, severity: Option<&str>) -> Self {
        Self {
            status: Some(status.into()),
            labels: severity
                .map(|s| HashMap::from([("severity".to_string(), Value::from(s))]))
                .unwrap_or_default(),
        }
    }

    /// Whether this alert is currently firing.
    pub fn is_firing(&self) -> bool {
        self.status.as_deref() == Some(FIRING)
    }

    /// `severity` label, or an empty string when unset or not a string.
    pub fn severity(&self) -> &str {
        self.labels
            .get("severity")
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

impl AlertPayload {
    /// Severities of the firing alerts, in payload order.
    pub fn firing_severities(&self) -> Vec<String> {
        self.alerts
            .iter()
            .filter(|a| a.is_firing())
            .map(|a| a.severity().to_string())
            .collect()
    }
}

/// Whether any of `severities` warrants a rollback.
pub fn requires_rollback(severities: &[String]) -> bool {
    severities
        .iter()
        .any(|s| ROLLBACK_SEVERITIES.contains(&s.as_str()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}
