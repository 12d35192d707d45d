use std::path::PathBuf;

use pds4_template::fs::write_atomic;
use pds4_template::{Occurrence, Template};
use tracing::info;

use crate::error::{LabelError, LabelResult};
use crate::markers;
use crate::naming::label_path;

use super::{LabelContext, DATE_FORMAT};

const ROW_ENDING: &str = "\r\n";

/// Add product labels to a collection inventory.
#[derive(Debug, Clone)]
pub struct InventoryRequest {
    /// The collection inventory CSV; its label sits next to it.
    pub collection: PathBuf,
    pub labels: Vec<PathBuf>,
    pub message: String,
    /// Keep the rows already in the inventory instead of replacing them.
    pub keep: bool,
}

#[derive(Debug, Clone)]
pub struct InventoryOutcome {
    pub csv_path: PathBuf,
    pub csv: String,
    pub label_path: PathBuf,
    pub label: Template,
    pub identifiers: Vec<String>,
    pub records: u64,
    pub version: String,
}

impl InventoryOutcome {
    pub fn write(&self) -> LabelResult<()> {
        write_atomic(&self.csv_path, &self.csv).map_err(|err| LabelError::io(&self.csv_path, err))?;
        self.label.write(&self.label_path)?;
        Ok(())
    }
}

/// Build the new inventory rows and the updated collection label.
pub fn update_inventory(
    request: &InventoryRequest,
    context: &LabelContext,
) -> LabelResult<InventoryOutcome> {
    let mut identifiers = Vec::with_capacity(request.labels.len());
    for path in &request.labels {
        let product = Template::load(path)?;
        let lid = product.read(markers::LOGICAL_IDENTIFIER, Occurrence::First)?;
        let version = product.read(markers::VERSION_ID, Occurrence::First)?;
        identifiers.push(format!("{lid}::{version}"));
    }
    info!(count = identifiers.len(), "collected product identifiers");

    let label_path = label_path(&request.collection, &context.settings.extension);
    let mut label = Template::load(&label_path)?;

    let raw_records = label.read(markers::RECORDS, Occurrence::First)?;
    let current_records: u64 = raw_records
        .trim()
        .parse()
        .map_err(|_| LabelError::malformed(markers::RECORDS, &raw_records))?;

    // The first version_id is the collection's own; the rest come from the
    // modification history.
    let versions = label.read_all(markers::VERSION_ID);
    if versions.len() < 2 {
        return Err(LabelError::InvalidCollection(
            "modification history carries no version_id entries".into(),
        ));
    }
    let history: Vec<f64> = versions[1..]
        .iter()
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| LabelError::malformed(markers::VERSION_ID, raw))
        })
        .collect::<LabelResult<_>>()?;

    let dates = label.read_all(markers::MODIFICATION_DATE);
    if dates.len() != history.len() {
        return Err(LabelError::InvalidCollection(format!(
            "{} modification dates for {} history versions",
            dates.len(),
            history.len()
        )));
    }

    let mut csv = String::new();
    let records = if request.keep {
        let existing = std::fs::read_to_string(&request.collection)
            .map_err(|err| LabelError::io(&request.collection, err))?;
        csv.push_str(&existing);
        if !csv.is_empty() && !csv.ends_with('\n') {
            csv.push_str(ROW_ENDING);
        }
        current_records + identifiers.len() as u64
    } else {
        identifiers.len() as u64
    };
    for identifier in &identifiers {
        csv.push_str("P,");
        csv.push_str(identifier);
        csv.push_str(ROW_ENDING);
    }

    let next_version = history.iter().copied().fold(f64::MIN, f64::max) + 1.0;
    let version = format!("{next_version:.1}");
    let detail = modification_detail(
        &context.today.format(DATE_FORMAT).to_string(),
        &version,
        &request.message,
    );
    label.insert(markers::MODIFICATION_HISTORY, [detail], Occurrence::First);
    label.replace(markers::RECORDS, &records.to_string());

    info!(records, version = %version, "updated collection inventory");

    Ok(InventoryOutcome {
        csv_path: request.collection.clone(),
        csv,
        label_path,
        label,
        identifiers,
        records,
        version,
    })
}

fn modification_detail(date: &str, version: &str, description: &str) -> String {
    format!(
        "            <Modification_Detail>\n\
         \x20               <modification_date>{date}</modification_date>\n\
         \x20               <version_id>{version}</version_id>\n\
         \x20               <description>{description}</description>\n\
         \x20           </Modification_Detail>\n"
    )
}
