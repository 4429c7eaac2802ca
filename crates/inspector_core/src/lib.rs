//! Exports image metadata from a vision-labeling service to a CSV report.
//!
//! The pipeline is [`client`] → [`enrich`] → [`decode`] → [`row`] →
//! [`csv_utils`], driven by [`export::export_report`].

pub mod client;
pub mod csv_utils;
pub mod decode;
pub mod enrich;
pub mod errors;
pub mod export;
pub mod models;
pub mod row;
pub mod timestamp;

pub use client::{normalize_base_url, ClientOptions, VisionClient};
pub use csv_utils::{header_row, read_report, ReportWriter, FIXED_FIELDNAMES, METADATA_COLUMNS};
pub use decode::{decode_filename, DecodedFilename, TRAINING_TYPE};
pub use enrich::{enrich_file, label_url};
pub use errors::{ExportError, InspectorError};
pub use export::{
    export_report,
    export_report_blocking,
    ExportOptions,
    ExportProgress,
    ExportSummary,
    ProgressCallback,
};
pub use models::{DatasetRecord, EnrichedFile, FileRecord};
pub use row::{format_row, RowOutcome};
pub use timestamp::reformat_raw_date;
