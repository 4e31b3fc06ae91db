//! `stagekit_io_fs` v1:
//! Filesystem core for staging a source tree into an isolated workspace.
//!
//! Modules:
//! - `walk`   : depth-bounded leaf directory resolution
//! - `scan`   : source validation and inventory
//! - `copy`   : platform copy strategies
//! - `stage`  : workspace staging and count verification
//! - `spec`   : enums/counts/errors
//! - `report` : scan and stage report models
//! - `util`   : shared helper functions

pub mod copy;
pub mod report;
pub mod scan;
pub mod spec;
pub mod stage;
mod util;
pub mod walk;

pub use copy::{CopyStrategy, ManualWalkCopy, NativeCommandCopy, select_copy_strategy};
pub use report::{ReportScan, ReportStage, SpecTreeVerification};
pub use scan::scan_tree;
pub use spec::{
    EnumPlatform, EnumScanExtensionScope, ScanTreeError, SpecCopyError, SpecTreeCounts,
    StageError,
};
pub use stage::{WorkspaceStager, verify_copy};
pub use util::{is_extension_allowed, split_extension};
pub use walk::resolve_leaf_dirs;
