use pds4_label_config::SegmentSettings;
use pds4_template::{Occurrence, Template};

use crate::error::LabelResult;
use crate::info::FileInfo;
use crate::layout::{LayoutAssembler, SegmentCatalog};
use crate::markers;
use crate::naming::label_path;

use super::{fill_common, LabelContext, LabelOutcome, ProductFacts};

/// Label a tracking file holding several segment kinds, assumed already
/// grouped by kind in ascending order. The identifier's product part is
/// lowercased unless the configuration says otherwise.
pub fn label_segmented(
    template: Template,
    facts: &ProductFacts,
    info: &FileInfo,
    catalog: &SegmentCatalog,
    segments: &SegmentSettings,
    context: &LabelContext,
) -> LabelResult<LabelOutcome> {
    let mut label = template;
    fill_common(
        &mut label,
        facts,
        info,
        context,
        context.settings.lowercase_lid_or(true),
    )?;

    if let Some(summary) = &info.summary {
        label.insert(markers::COMMENT, [summary.as_str()], Occurrence::First);
    }

    let placements =
        LayoutAssembler::from_settings(catalog, segments).assemble(&mut label, info.census())?;

    Ok(LabelOutcome {
        output: label_path(&facts.path, &context.settings.extension),
        label,
        placements,
    })
}
