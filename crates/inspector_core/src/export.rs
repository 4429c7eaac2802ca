use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Builder;
use tracing::{debug, info, warn};

use crate::client::{ClientOptions, VisionClient};
use crate::csv_utils::ReportWriter;
use crate::decode::decode_filename;
use crate::enrich::{encode_thumbnail, enrich_file};
use crate::errors::{ExportError, InspectorError};
use crate::models::{DatasetRecord, EnrichedFile};
use crate::row::{format_row, RowOutcome};

#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub dataset: String,
    pub current: u64,
    pub total: u64,
}

pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ExportOptions {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Restricts the report to one dataset; `None` exports every dataset.
    pub dataset_id: Option<String>,
    pub csv_path: PathBuf,
    pub encoding: String,
    /// Also emit training-flagged and hand-uploaded images.
    pub show_all: bool,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            dataset_id: None,
            csv_path: PathBuf::from("out.csv"),
            encoding: "utf-8".to_string(),
            show_all: false,
            timeout_secs: 30,
            accept_invalid_certs: true,
            progress_callback: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub csv_path: PathBuf,
    pub datasets: usize,
    pub candidates: usize,
    pub rows_written: usize,
}

impl ExportSummary {
    pub fn filtered_out(&self) -> usize {
        self.candidates.saturating_sub(self.rows_written)
    }
}

pub async fn export_report(options: ExportOptions) -> Result<ExportSummary, ExportError> {
    let client_options = ClientOptions {
        base_url: options.base_url.clone(),
        timeout: Duration::from_secs(options.timeout_secs),
        accept_invalid_certs: options.accept_invalid_certs,
    };
    let mut client = VisionClient::new(client_options)?;

    info!("setting up auth token");
    client
        .authenticate(&options.username, &options.password)
        .await
        .map_err(|err| ExportError::from(err).context("authenticating"))?;

    info!("retrieving global dataset list");
    let mut datasets = client
        .list_datasets()
        .await
        .map_err(|err| ExportError::from(err).context("listing datasets"))?;
    if let Some(dataset_id) = options.dataset_id.as_deref() {
        datasets.retain(|dataset| dataset.id == dataset_id);
    }
    info!("retrieved {} datasets", datasets.len());

    // All network work happens before the report file is touched.
    let mut batches = Vec::with_capacity(datasets.len());
    for dataset in &datasets {
        let files = collect_dataset(&client, dataset).await?;
        batches.push((dataset.name.clone(), files));
    }

    let candidates: usize = batches.iter().map(|(_, files)| files.len()).sum();
    let mut report = ReportWriter::create(&options.csv_path, &options.encoding)
        .map_err(|err| ExportError::from(err).context("creating report"))?;

    for (dataset_name, files) in &batches {
        debug!("writing rows for dataset {dataset_name}");
        let total = files.len() as u64;
        for (index, file) in files.iter().enumerate() {
            let decoded = decode_filename(&file.file.original_file_name);
            match format_row(&decoded, file, options.show_all) {
                RowOutcome::Written(row) => report.write_row(&row)?,
                RowOutcome::Filtered => {
                    debug!(file = %file.file.id, "filtered {}", file.file.original_file_name)
                }
            }
            if let Some(callback) = options.progress_callback.as_ref() {
                callback(ExportProgress {
                    dataset: dataset_name.clone(),
                    current: index as u64 + 1,
                    total,
                });
            }
        }
    }

    let rows_written = report.finish()?;
    let summary = ExportSummary {
        csv_path: options.csv_path.clone(),
        datasets: datasets.len(),
        candidates,
        rows_written,
    };
    info!(
        "wrote {} rows to {}, filtered out {} items",
        summary.rows_written,
        summary.csv_path.display(),
        summary.filtered_out()
    );
    Ok(summary)
}

pub fn export_report_blocking(options: ExportOptions) -> Result<ExportSummary, ExportError> {
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| InspectorError::Other(format!("failed to start runtime: {err}")))?;
    rt.block_on(export_report(options))
}

async fn collect_dataset(
    client: &VisionClient,
    dataset: &DatasetRecord,
) -> Result<Vec<EnrichedFile>, ExportError> {
    let files = client
        .list_files(&dataset.id)
        .await
        .map_err(|err| ExportError::from(err).context(format!("listing files of {}", dataset.id)))?;
    info!(
        "fetched {:>7} items in dataset {} = {}",
        files.len(),
        dataset.id,
        dataset.name
    );

    let thumbnail = dataset_thumbnail(client, dataset).await;
    Ok(files
        .into_iter()
        .map(|file| enrich_file(file, dataset, client.base_url(), &thumbnail))
        .collect())
}

/// Base64 of the dataset thumbnail, or an empty string when there is none
/// or it cannot be fetched.
async fn dataset_thumbnail(client: &VisionClient, dataset: &DatasetRecord) -> Arc<str> {
    let Some(path) = dataset
        .thumbnail_path
        .as_deref()
        .filter(|path| !path.is_empty())
    else {
        return encode_thumbnail(None);
    };
    match client.fetch_thumbnail(path).await {
        Ok(bytes) => encode_thumbnail(Some(&bytes)),
        Err(err) => {
            warn!("thumbnail for dataset {} unavailable: {err}", dataset.id);
            encode_thumbnail(None)
        }
    }
}
