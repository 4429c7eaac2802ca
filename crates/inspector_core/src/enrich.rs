use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::models::{DatasetRecord, EnrichedFile, FileRecord};

/// Deep link into the labeling UI for one image.
pub fn label_url(base_url: &str, dataset_id: &str, file_id: &str) -> String {
    format!(
        "{}/#/datasets/{dataset_id}/label?imageId={file_id}",
        base_url.trim_end_matches('/')
    )
}

pub fn encode_thumbnail(bytes: Option<&[u8]>) -> Arc<str> {
    bytes
        .map(|data| Arc::from(STANDARD.encode(data)))
        .unwrap_or_else(|| Arc::from(""))
}

/// Copies the dataset-level fields onto `file`. `thumbnail_data` is the
/// already encoded dataset thumbnail, empty when it could not be fetched;
/// every file of a dataset shares the same allocation.
pub fn enrich_file(
    file: FileRecord,
    dataset: &DatasetRecord,
    base_url: &str,
    thumbnail_data: &Arc<str>,
) -> EnrichedFile {
    let url = label_url(base_url, &dataset.id, &file.id);
    EnrichedFile {
        file,
        dataset_id: dataset.id.clone(),
        dataset_name: dataset.name.clone(),
        owner: dataset.owner.clone(),
        url,
        thumbnail_data: Arc::clone(thumbnail_data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> DatasetRecord {
        DatasetRecord {
            id: "ds-42".to_string(),
            name: "Line 3".to_string(),
            owner: "admin".to_string(),
            thumbnail_path: Some("uploads/ds-42/thumb.jpg".to_string()),
        }
    }

    fn file() -> FileRecord {
        FileRecord {
            id: "f-7".to_string(),
            original_file_name: "plainupload.png".to_string(),
            thumbnail_path: Some("uploads/ds-42/f-7.jpg".to_string()),
        }
    }

    #[test]
    fn enrich_copies_dataset_fields_and_builds_url() {
        let thumbnail = encode_thumbnail(Some(b"jpeg-bytes"));
        let enriched = enrich_file(file(), &dataset(), "https://vision.local/powerai-vision", &thumbnail);
        assert_eq!(enriched.dataset_id, "ds-42");
        assert_eq!(enriched.dataset_name, "Line 3");
        assert_eq!(enriched.owner, "admin");
        assert_eq!(
            enriched.url,
            "https://vision.local/powerai-vision/#/datasets/ds-42/label?imageId=f-7"
        );
        assert_eq!(&*enriched.thumbnail_data, "anBlZy1ieXRlcw==");
        assert_eq!(enriched.file, file());
    }

    #[test]
    fn files_of_a_dataset_share_one_thumbnail() {
        let thumbnail = encode_thumbnail(Some(b"jpeg-bytes"));
        let first = enrich_file(file(), &dataset(), "http://host", &thumbnail);
        let second = enrich_file(file(), &dataset(), "http://host", &thumbnail);
        assert!(Arc::ptr_eq(&first.thumbnail_data, &second.thumbnail_data));
        assert_eq!(Arc::strong_count(&thumbnail), 3);
    }

    #[test]
    fn missing_thumbnail_becomes_empty() {
        assert_eq!(&*encode_thumbnail(None), "");
        let enriched = enrich_file(file(), &dataset(), "http://host/", &encode_thumbnail(None));
        assert!(enriched.thumbnail_data.is_empty());
        assert_eq!(enriched.url, "http://host/#/datasets/ds-42/label?imageId=f-7");
    }
}
