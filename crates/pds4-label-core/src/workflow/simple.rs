use pds4_template::Template;

use crate::error::LabelResult;
use crate::info::FileInfo;
use crate::markers;
use crate::naming::label_path;

use super::{fill_common, LabelContext, LabelOutcome, ProductFacts};

/// Label a file made of one record layout (weather, media or open-loop
/// products). The sample width is checked before the template is touched.
pub fn label_simple(
    template: Template,
    facts: &ProductFacts,
    info: &FileInfo,
    context: &LabelContext,
) -> LabelResult<LabelOutcome> {
    info.check_sample_width()?;

    let mut label = template;
    fill_common(
        &mut label,
        facts,
        info,
        context,
        context.settings.lowercase_lid_or(false),
    )?;
    if let Some(length) = info.record_length {
        label.replace(markers::RECORD_LENGTH, &length.to_string());
    }

    Ok(LabelOutcome {
        output: label_path(&facts.path, &context.settings.extension),
        label,
        placements: Vec::new(),
    })
}
