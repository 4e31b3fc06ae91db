//! `stagekit_pass` v1:
//! Transformation passes over a staged workspace and the run pipeline.
//!
//! Modules:
//! - `spec`     : run/plugin config models and error types
//! - `registry` : plugin contract and name -> factory registry
//! - `series`   : `underscore_number` series consolidation
//! - `relocate` : `file_relocator` file moves
//! - `select`   : depth/pattern leaf directory selection
//! - `report`   : per-pass processing log
//! - `pipeline` : scan -> stage -> passes orchestration

pub mod pipeline;
pub mod registry;
pub mod relocate;
pub mod report;
pub mod select;
pub mod series;
pub mod spec;

pub use pipeline::{PipelineError, ReportRun, SpecPipelineOptions, run_pipeline};
pub use registry::{FnPluginFactory, Plugin, PluginRegistry};
pub use relocate::{Relocator, SpecRelocatorConfig};
pub use report::{ReportPass, ReportPassBuilder, SpecPathChange, is_pass_log, write_pass_log};
pub use select::{EnumDirSelection, TypePatternMatcher};
pub use series::{
    SeriesConsolidator, SpecSeriesConfig, SpecSeriesFile, SpecSeriesKey, SpecSeriesName,
    parse_series_file_name,
};
pub use spec::{
    EnumFileOperation, EnumPatternMode, PluginError, SpecFailedOperation, SpecPassContext,
    SpecPlugin, SpecRunConfig, join_location,
};
