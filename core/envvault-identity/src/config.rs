//! Device configuration record (`config.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which KDF parameter generation protects the private key on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfGeneration {
    Current,
    Legacy,
}

/// Written once at identity init; read-only thereafter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "deviceLabel")]
    pub device_label: String,
    pub fingerprint: String,
    /// Absent in configs written before the parameter upgrade; treated
    /// as legacy by the doctor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<KdfGeneration>,
}
