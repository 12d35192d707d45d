pub mod checksum;
pub mod error;
pub mod info;
pub mod layout;
pub mod markers;
pub mod naming;
pub mod workflow;

pub use error::{ExitCode, LabelError, LabelResult};
pub use info::{FileInfo, SegmentKind, SUPPORTED_SAMPLE_BITS};
pub use layout::{LayoutAssembler, SegmentCatalog, SegmentPlacement};
pub use naming::{expand_rename, label_path, product_id, RenameTokens};
pub use workflow::{
    label_segmented, label_simple, update_inventory, InventoryOutcome, InventoryRequest,
    LabelContext, LabelOutcome, ProductFacts,
};
