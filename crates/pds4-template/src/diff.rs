use similar::TextDiff;

/// Unified diff between a template and the label rendered from it, or `None`
/// when nothing changed.
pub fn build_unified_diff(original: &str, modified: &str, from: &str, to: &str) -> Option<String> {
    if original == modified {
        return None;
    }

    let diff = TextDiff::from_lines(original, modified);
    let header_old = format!("a/{from}");
    let header_new = format!("b/{to}");

    Some(
        diff.unified_diff()
            .header(&header_old, &header_new)
            .to_string(),
    )
}
