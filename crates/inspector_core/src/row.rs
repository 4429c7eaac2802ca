use crate::decode::{DecodedFilename, RAW_DATE_SEGMENT};
use crate::models::EnrichedFile;
use crate::timestamp::reformat_raw_date;

/// Pseudo-segment the inspector appends for the file extension.
pub const EXTENSION_SEGMENT: &str = ".jpeg";
/// Second column of rows emitted for hand-uploaded images.
pub const UNSTRUCTURED_MARKER: &str = "LABELED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Written(Vec<String>),
    Filtered,
}

/// Appends report fields in column order.
#[derive(Debug, Default)]
pub struct RowBuilder {
    fields: Vec<String>,
}

impl RowBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn field(mut self, value: impl Into<String>) -> Self {
        self.fields.push(value.into());
        self
    }

    pub fn build(self) -> Vec<String> {
        self.fields
    }
}

pub fn format_row(decoded: &DecodedFilename, file: &EnrichedFile, show_all: bool) -> RowOutcome {
    match decoded {
        DecodedFilename::Unstructured if show_all => RowOutcome::Written(
            RowBuilder::with_capacity(2)
                .field(file.url.as_str())
                .field(UNSTRUCTURED_MARKER)
                .build(),
        ),
        DecodedFilename::Unstructured => RowOutcome::Filtered,
        DecodedFilename::Structured {
            segments,
            top_class,
            top_score,
        } => {
            if !show_all && decoded.is_training() {
                return RowOutcome::Filtered;
            }
            let formatted_date = decoded.raw_date().map(reformat_raw_date).unwrap_or_default();
            RowOutcome::Written(structured_row(
                segments,
                top_class,
                top_score,
                formatted_date,
                file,
            ))
        }
    }
}

fn structured_row(
    segments: &[String],
    top_class: &str,
    top_score: &str,
    formatted_date: String,
    file: &EnrichedFile,
) -> Vec<String> {
    let mut builder = RowBuilder::with_capacity(segments.len() + 8)
        .field(&*file.thumbnail_data)
        .field(file.dataset_id.as_str())
        .field(file.dataset_name.as_str())
        .field(top_class)
        .field(top_score)
        .field(file.owner.as_str())
        .field(file.url.as_str());

    let mut formatted_date = Some(formatted_date);
    for (index, segment) in segments.iter().enumerate() {
        if index == RAW_DATE_SEGMENT {
            if let Some(date) = formatted_date.take() {
                builder = builder.field(date);
            }
        }
        builder = builder.field(segment.as_str());
    }
    // No raw date segment: the (empty) formatted date still takes its slot.
    if let Some(date) = formatted_date {
        builder = builder.field(date);
    }

    let mut row = builder.build();
    if let Some(position) = row.iter().position(|field| field == EXTENSION_SEGMENT) {
        row.remove(position);
    }
    row
}
