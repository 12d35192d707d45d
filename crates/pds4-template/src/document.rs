use std::fmt;
use std::path::Path;

use crate::error::{TemplateError, TemplateResult};
use crate::fs::write_atomic;

/// Ordered lines of a template file.
///
/// Each entry is one physical line including its terminator (`\n` or `\r\n`),
/// so rendering the document concatenates the lines without touching them.
/// Line order is the only position information a label template carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn load(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|err| TemplateError::io(path, err))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Indices of every line containing `marker` as a literal substring, in
    /// document order.
    pub fn positions<'a>(&'a self, marker: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.lines
            .iter()
            .enumerate()
            .filter(move |(_, line)| line.contains(marker))
            .map(|(index, _)| index)
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.lines.iter().any(|line| line.contains(marker))
    }

    /// Overwrite one line, returning the previous text. Out-of-range indices
    /// leave the document untouched.
    pub fn set_line(&mut self, index: usize, line: String) -> Option<String> {
        self.lines
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, line))
    }

    /// Insert `lines` so the first of them lands at `index`; everything from
    /// `index` onwards shifts down.
    pub fn splice(&mut self, index: usize, lines: Vec<String>) {
        let at = index.min(self.lines.len());
        self.lines.splice(at..at, lines);
    }

    /// Terminator used by the first line, defaulting to `\n`.
    pub fn line_ending(&self) -> &'static str {
        match self.lines.first() {
            Some(line) if line.ends_with("\r\n") => "\r\n",
            _ => "\n",
        }
    }

    /// Give the line at `index` a terminator if it has none, which only
    /// happens for the final line of a file.
    pub(crate) fn terminate_line(&mut self, index: usize) {
        let ending = self.line_ending();
        if let Some(line) = self.lines.get_mut(index) {
            if !line.ends_with('\n') {
                line.push_str(ending);
            }
        }
    }

    pub fn render(&self) -> String {
        self.lines.concat()
    }

    pub fn write(&self, path: impl AsRef<Path>) -> TemplateResult<()> {
        let path = path.as_ref();
        write_atomic(path, &self.render()).map_err(|err| TemplateError::io(path, err))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}
