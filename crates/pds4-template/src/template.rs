use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::Document;
use crate::error::{TemplateError, TemplateResult};

/// Which matching line an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    First,
    Last,
}

/// Result of a mutating call. A marker that matches nothing is a skip, not
/// an error; templates are trusted to carry the markers a workflow needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Number of lines rewritten or inserted.
    Applied(usize),
    Skipped,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Before,
    After,
}

/// A label template addressed by marker substrings.
///
/// A marker selects every line that contains it. On such a line the value is
/// whatever sits between the first `>` and the last `<`; lines without that
/// shape are ignored by reads and replacements. No XML structure is parsed,
/// so a marker that also appears inside unrelated text will match there too.
#[derive(Debug, Clone, Default)]
pub struct Template {
    source: Option<PathBuf>,
    document: Document,
}

impl Template {
    pub fn load(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        Ok(Self {
            source: Some(path.to_path_buf()),
            document: Document::load(path)?,
        })
    }

    pub fn parse(content: &str) -> Self {
        Self::from_document(Document::parse(content))
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            source: None,
            document,
        }
    }

    /// Path the template was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.document.contains(marker)
    }

    pub fn read(&self, marker: &str, occurrence: Occurrence) -> TemplateResult<String> {
        let mut values = self.values(marker);
        let found = match occurrence {
            Occurrence::First => values.next(),
            Occurrence::Last => values.last(),
        };
        found
            .map(str::to_string)
            .ok_or_else(|| TemplateError::not_found(marker))
    }

    /// Every value for `marker` in document order; empty when nothing matches.
    pub fn read_all(&self, marker: &str) -> Vec<String> {
        self.values(marker).map(str::to_string).collect()
    }

    pub fn replace(&mut self, marker: &str, value: &str) -> Mutation {
        self.replace_values(marker, value, false)
    }

    /// Like [`Template::replace`] but stops after the first rewritten line.
    pub fn replace_first(&mut self, marker: &str, value: &str) -> Mutation {
        self.replace_values(marker, value, true)
    }

    /// Insert `block` right after the first or last line containing `marker`.
    ///
    /// Each item may hold several physical lines; an item whose last line has
    /// no terminator gets the document's line ending.
    pub fn insert<I, S>(&mut self, marker: &str, block: I, occurrence: Occurrence) -> Mutation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_block(marker, block, occurrence, Side::After)
    }

    /// Insert `block` right before the first or last line containing `marker`.
    pub fn insert_before<I, S>(
        &mut self,
        marker: &str,
        block: I,
        occurrence: Occurrence,
    ) -> Mutation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_block(marker, block, occurrence, Side::Before)
    }

    pub fn render(&self) -> String {
        self.document.render()
    }

    pub fn write(&self, path: impl AsRef<Path>) -> TemplateResult<()> {
        self.document.write(path)
    }

    fn values<'a>(&'a self, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.document.positions(marker).filter_map(move |index| {
            let line = self.document.line(index)?;
            value_span(line).map(|span| &line[span])
        })
    }

    fn replace_values(&mut self, marker: &str, value: &str, only_first: bool) -> Mutation {
        let candidates: Vec<usize> = self.document.positions(marker).collect();
        let mut rewritten = 0;

        for index in candidates {
            let Some(line) = self.document.line(index) else {
                continue;
            };
            let Some(span) = value_span(line) else {
                continue;
            };

            let updated = format!("{}{}{}", &line[..span.start], value, &line[span.end..]);
            self.document.set_line(index, updated);
            rewritten += 1;

            if only_first {
                break;
            }
        }

        if rewritten == 0 {
            debug!(marker, "replace skipped: no value line carries the marker");
            return Mutation::Skipped;
        }
        Mutation::Applied(rewritten)
    }

    fn insert_block<I, S>(
        &mut self,
        marker: &str,
        block: I,
        occurrence: Occurrence,
        side: Side,
    ) -> Mutation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let anchor = {
            let mut positions = self.document.positions(marker);
            match occurrence {
                Occurrence::First => positions.next(),
                Occurrence::Last => positions.last(),
            }
        };
        let Some(anchor) = anchor else {
            debug!(marker, "insert skipped: marker not present");
            return Mutation::Skipped;
        };

        let lines = self.physical_lines(block);
        let count = lines.len();
        let at = match side {
            Side::Before => anchor,
            Side::After => {
                self.document.terminate_line(anchor);
                anchor + 1
            }
        };
        self.document.splice(at, lines);
        Mutation::Applied(count)
    }

    fn physical_lines<I, S>(&self, block: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ending = self.document.line_ending();
        let mut lines = Vec::new();
        for item in block {
            let text: String = item.into();
            for piece in text.split_inclusive('\n') {
                let mut line = piece.to_string();
                if !line.ends_with('\n') {
                    line.push_str(ending);
                }
                lines.push(line);
            }
        }
        lines
    }
}

/// Byte range strictly between the first `>` and the last `<` of `line`.
fn value_span(line: &str) -> Option<Range<usize>> {
    let start = line.find('>')? + 1;
    let stop = line.rfind('<')?;
    (start <= stop).then_some(start..stop)
}
