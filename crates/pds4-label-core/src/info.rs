use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LabelError, LabelResult};

/// Identifier of one fixed-layout binary record type (e.g. an SFDU data type).
pub type SegmentKind = u8;

/// Sample width the label templates are written for.
pub const SUPPORTED_SAMPLE_BITS: u8 = 16;

/// Facts decoded from a tracking data file by an external reader.
///
/// The decoder itself lives outside this crate; its output is handed over as
/// a JSON document with this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub records: u64,
    /// Record count per segment kind.
    #[serde(default)]
    pub segments: BTreeMap<SegmentKind, u64>,
    #[serde(default)]
    pub record_length: Option<u64>,
    #[serde(default)]
    pub sample_bits: Option<u8>,
    #[serde(default)]
    pub downlink_dss_ids: Vec<String>,
    #[serde(default)]
    pub downlink_bands: Vec<String>,
    #[serde(default)]
    pub uplink_dss_ids: Vec<String>,
    #[serde(default)]
    pub uplink_bands: Vec<String>,
    /// Doppler count times in seconds.
    #[serde(default)]
    pub count_times: Vec<f64>,
    /// Recording bandwidth in Hz.
    #[serde(default)]
    pub recording_bandwidth: Option<f64>,
    /// Free text placed after the label's `<comment>` line.
    #[serde(default)]
    pub summary: Option<String>,
}

impl FileInfo {
    pub fn load(path: impl AsRef<Path>) -> LabelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| LabelError::io(path, err))?;
        serde_json::from_str(&text).map_err(|source| LabelError::InvalidInfo {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `(kind, count)` pairs for every kind with at least one record, ascending.
    pub fn census(&self) -> impl Iterator<Item = (SegmentKind, u64)> + '_ {
        self.segments
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(kind, count)| (*kind, *count))
    }

    pub fn check_sample_width(&self) -> LabelResult<()> {
        match self.sample_bits {
            Some(bits) if bits != SUPPORTED_SAMPLE_BITS => Err(LabelError::UnsupportedSampleWidth {
                bits,
                supported: SUPPORTED_SAMPLE_BITS,
            }),
            _ => Ok(()),
        }
    }
}
