use serde::{Deserialize, Serialize};

use super::classification::StateLabel;
use super::error::PipelineError;

/// Longest state label the device reports (bytes).
pub const MAX_STATE_LABEL_LEN: usize = 19;

/// Upper bound on a serialized telemetry payload (bytes).
pub const MAX_PAYLOAD_LEN: usize = 128;

/// Telemetry record published once per successful cycle.
///
/// Field order is part of the wire format: device id, state, duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(rename = "DeviceID")]
    pub device_id: u32,

    #[serde(rename = "State")]
    pub state: String,

    /// Time spent in the reported state, in milliseconds
    #[serde(rename = "Duration")]
    pub duration_ms: u32,

    #[serde(rename = "Anomaly", default, skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<f32>,
}

impl StateRecord {
    pub fn new(device_id: u32, state: &StateLabel, duration_ms: u32) -> Self {
        Self {
            device_id,
            state: state.name().to_string(),
            duration_ms,
            anomaly: None,
        }
    }

    pub fn with_anomaly(mut self, anomaly: Option<f32>) -> Self {
        self.anomaly = anomaly;
        self
    }

    /// Compact JSON payload handed to the transport.
    pub fn to_payload(&self) -> Result<String, PipelineError> {
        if self.state.len() > MAX_STATE_LABEL_LEN {
            return Err(PipelineError::PublishFault(format!(
                "state label '{}' exceeds {} bytes",
                self.state, MAX_STATE_LABEL_LEN
            )));
        }

        let payload = serde_json::to_string(self)
            .map_err(|e| PipelineError::PublishFault(format!("serialize record: {}", e)))?;

        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(PipelineError::PublishFault(format!(
                "payload of {} bytes exceeds {} bytes",
                payload.len(),
                MAX_PAYLOAD_LEN
            )));
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_field_order() {
        let record = StateRecord::new(1583, &StateLabel::trained(3, "Walk"), 400);
        assert_eq!(
            record.to_payload().unwrap(),
            r#"{"DeviceID":1583,"State":"Walk","Duration":400}"#
        );
    }

    #[test]
    fn test_payload_with_anomaly_score() {
        let record = StateRecord::new(7, &StateLabel::anomaly(), 400).with_anomaly(Some(0.5));
        assert_eq!(
            record.to_payload().unwrap(),
            r#"{"DeviceID":7,"State":"Anomaly","Duration":400,"Anomaly":0.5}"#
        );
    }

    #[test]
    fn test_overlong_label_rejected() {
        let record = StateRecord::new(1, &StateLabel::trained(0, "a".repeat(20)), 400);
        assert!(matches!(record.to_payload(), Err(PipelineError::PublishFault(_))));
    }
}
