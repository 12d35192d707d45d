use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};

use crate::error::{LabelError, LabelResult};
use crate::info::FileInfo;

/// Base file name of `data`, e.g. `mroagr_2023_101.tnf`.
pub fn file_name(data: &Path) -> String {
    data.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name up to its first `.`; used for identifiers and the label name.
pub fn product_id(data: &Path) -> String {
    let name = file_name(data);
    name.split('.').next().unwrap_or_default().to_string()
}

/// Label path for `data`: same directory, product id, `extension`.
pub fn label_path(data: &Path, extension: &str) -> PathBuf {
    let label = format!("{}.{}", product_id(data), extension.trim_start_matches('.'));
    match data.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(label),
        _ => PathBuf::from(label),
    }
}

/// Values available to `{token}` placeholders in a rename pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTokens {
    values: BTreeMap<String, String>,
}

impl RenameTokens {
    pub fn from_info(info: &FileInfo) -> Self {
        let mut tokens = Self::default();
        let start = info.start_time;
        let end = info.end_time;

        tokens.insert("start_year", start.format("%Y").to_string());
        tokens.insert("start_doy", start.format("%j").to_string());
        tokens.insert("start_time", start.format("%H%M").to_string());
        tokens.insert("end_year", end.format("%Y").to_string());
        tokens.insert("end_doy", end.format("%j").to_string());

        let count_time = match info.count_times.as_slice() {
            [single] => format!("{:04}", *single as i64),
            _ => "mmmm".to_string(),
        };
        tokens.insert("count_time", count_time);

        let dl_dss = single_or(&info.downlink_dss_ids, "mm");
        let ul_dss = single_or(&info.uplink_dss_ids, "mm");
        let dl_band = single_or(&info.downlink_bands, "m").to_lowercase();
        let ul_band = single_or(&info.uplink_bands, "m").to_lowercase();
        tokens.insert("dl_dss_id", dl_dss);
        tokens.insert("ul_dss_id", ul_dss);
        tokens.insert("dnlink_band", dl_band.clone());
        tokens.insert("dl_band", dl_band);
        tokens.insert("uplink_band", ul_band.clone());
        tokens.insert("ul_band", ul_band);

        if let Some(bandwidth) = info.recording_bandwidth {
            tokens.insert("bw", format!("{:03}", (bandwidth / 1000.0).round() as u64));
        }

        tokens
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

fn single_or(values: &[String], fallback: &str) -> String {
    match values {
        [single] => single.clone(),
        _ => fallback.to_string(),
    }
}

/// Substitute every `{token}` in `pattern`. Unknown tokens are an error so a
/// typo never produces a half-expanded file name.
pub fn expand_rename(pattern: &str, tokens: &RenameTokens) -> LabelResult<String> {
    let placeholder = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|err| LabelError::InvalidRenamePattern(err.to_string()))?;

    let unknown: Vec<&str> = placeholder
        .captures_iter(pattern)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
        .filter(|name| tokens.get(name).is_none())
        .collect();
    if !unknown.is_empty() {
        return Err(LabelError::InvalidRenamePattern(format!(
            "unknown token(s) in '{pattern}': {}",
            unknown.join(", ")
        )));
    }

    let expanded = placeholder.replace_all(pattern, |caps: &Captures<'_>| {
        tokens.get(&caps[1]).unwrap_or_default().to_string()
    });
    Ok(expanded.into_owned())
}
