pub mod diff;
pub mod document;
pub mod error;
pub mod fs;
pub mod template;

pub use diff::build_unified_diff;
pub use document::Document;
pub use error::{TemplateError, TemplateResult};
pub use template::{Mutation, Occurrence, Template};
