//! Label workflows: fill a template for one product and decide where the
//! label goes. Nothing is written until [`LabelOutcome::write`] is called.

mod inventory;
mod segmented;
mod simple;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};
use pds4_label_config::LabelSettings;
use pds4_template::{Occurrence, Template};

use crate::checksum::md5_file;
use crate::error::{LabelError, LabelResult};
use crate::info::FileInfo;
use crate::layout::SegmentPlacement;
use crate::markers;
use crate::naming::{file_name, product_id};

pub use inventory::{update_inventory, InventoryOutcome, InventoryRequest};
pub use segmented::label_segmented;
pub use simple::label_simple;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Run-wide inputs shared by every workflow.
#[derive(Debug, Clone)]
pub struct LabelContext {
    pub settings: LabelSettings,
    pub today: NaiveDate,
}

impl LabelContext {
    pub fn new(settings: LabelSettings) -> Self {
        Self {
            settings,
            today: Local::now().date_naive(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// Facts about the data file itself, gathered from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFacts {
    pub path: PathBuf,
    pub file_name: String,
    pub product_id: String,
    pub size: u64,
    pub md5: String,
}

impl ProductFacts {
    pub fn gather(path: &Path) -> LabelResult<Self> {
        let metadata = std::fs::metadata(path).map_err(|err| LabelError::io(path, err))?;
        let md5 = md5_file(path).map_err(|err| LabelError::io(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            file_name: file_name(path),
            product_id: product_id(path),
            size: metadata.len(),
            md5,
        })
    }
}

/// A filled label and where it belongs.
#[derive(Debug, Clone)]
pub struct LabelOutcome {
    pub label: Template,
    pub output: PathBuf,
    pub placements: Vec<SegmentPlacement>,
}

impl LabelOutcome {
    pub fn write(&self) -> LabelResult<()> {
        self.label.write(&self.output)?;
        Ok(())
    }
}

fn format_date_time(value: &DateTime<Utc>) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

/// Values every product label carries, whatever the file kind.
/// `lowercase_lid` applies to the product part of the identifier only.
fn fill_common(
    label: &mut Template,
    facts: &ProductFacts,
    info: &FileInfo,
    context: &LabelContext,
    lowercase_lid: bool,
) -> LabelResult<()> {
    let current_lid = label.read(markers::LOGICAL_IDENTIFIER, Occurrence::First)?;
    let prefix = current_lid
        .rsplit_once(':')
        .map(|(prefix, _)| prefix)
        .unwrap_or(current_lid.as_str());
    let product = if lowercase_lid {
        facts.product_id.to_lowercase()
    } else {
        facts.product_id.clone()
    };
    let lid = format!("{prefix}:{product}");

    label.replace(markers::LOGICAL_IDENTIFIER, &lid);
    label.replace(
        markers::MODIFICATION_DATE,
        &context.today.format(DATE_FORMAT).to_string(),
    );
    label.replace(markers::START_DATE_TIME, &format_date_time(&info.start_time));
    label.replace(markers::STOP_DATE_TIME, &format_date_time(&info.end_time));
    label.replace(markers::FILE_NAME, &facts.file_name);
    label.replace(markers::LOCAL_IDENTIFIER, &facts.product_id);
    label.replace(markers::CREATION_DATE_TIME, &format_date_time(&info.end_time));
    label.replace(markers::MD5_CHECKSUM, &facts.md5);
    label.replace(markers::FILE_SIZE, &facts.size.to_string());
    label.replace_first(markers::RECORDS, &info.records.to_string());
    Ok(())
}
