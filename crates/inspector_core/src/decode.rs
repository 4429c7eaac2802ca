//! Decoder for the structured filenames produced by the inspector edge
//! devices.
//!
//! An inspected image is uploaded with a name such as
//! `img1___a___b___c___d___e___f___PRODUCTION___p___20230115093000___cat__dog___0.9__0.5`:
//! fields separated by `___`, with the class and score lists further split
//! on `__`. Images uploaded by hand carry an ordinary filename without the
//! delimiter.

pub const SEGMENT_DELIMITER: &str = "___";
pub const LIST_DELIMITER: &str = "__";

pub const TYPE_SEGMENT: usize = 7;
pub const RAW_DATE_SEGMENT: usize = 9;
pub const CLASSES_SEGMENT: usize = 10;
pub const SCORES_SEGMENT: usize = 11;

/// Item type marking images reserved for model training.
pub const TRAINING_TYPE: &str = "TRAINING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFilename {
    /// User-uploaded image without the inspector encoding.
    Unstructured,
    Structured {
        segments: Vec<String>,
        top_class: String,
        top_score: String,
    },
}

impl DecodedFilename {
    pub fn is_structured(&self) -> bool {
        matches!(self, DecodedFilename::Structured { .. })
    }

    pub fn segments(&self) -> &[String] {
        match self {
            DecodedFilename::Structured { segments, .. } => segments,
            DecodedFilename::Unstructured => &[],
        }
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments().get(index).map(String::as_str)
    }

    pub fn item_type(&self) -> Option<&str> {
        self.segment(TYPE_SEGMENT)
    }

    pub fn raw_date(&self) -> Option<&str> {
        self.segment(RAW_DATE_SEGMENT)
    }

    pub fn is_training(&self) -> bool {
        self.item_type() == Some(TRAINING_TYPE)
    }
}

pub fn decode_filename(original_file_name: &str) -> DecodedFilename {
    if !original_file_name.contains(SEGMENT_DELIMITER) {
        return DecodedFilename::Unstructured;
    }

    let segments: Vec<String> = original_file_name
        .split(SEGMENT_DELIMITER)
        .map(str::to_string)
        .collect();

    let (top_class, top_score) = if segments.len() > CLASSES_SEGMENT {
        (
            leading_token(segments.get(CLASSES_SEGMENT)),
            leading_token(segments.get(SCORES_SEGMENT)),
        )
    } else {
        (String::new(), String::new())
    };

    DecodedFilename::Structured {
        segments,
        top_class,
        top_score,
    }
}

fn leading_token(segment: Option<&String>) -> String {
    segment
        .and_then(|value| value.split(LIST_DELIMITER).next())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "img1___a___b___c___d___e___f___PRODUCTION___p___20230115093000___cat__dog__10___0.9__0.5__0.1";

    #[test]
    fn plain_filename_is_unstructured() {
        for name in ["plainupload.png", "", "two__underscores.jpg", "a_b_c"] {
            let decoded = decode_filename(name);
            assert_eq!(decoded, DecodedFilename::Unstructured, "{name:?}");
            assert!(decoded.segments().is_empty());
            assert!(!decoded.is_training());
        }
    }

    #[test]
    fn full_filename_yields_top_class_and_score() {
        let decoded = decode_filename(SAMPLE);
        let DecodedFilename::Structured {
            segments,
            top_class,
            top_score,
        } = &decoded
        else {
            panic!("expected structured decode");
        };
        assert_eq!(segments.len(), 12);
        assert_eq!(top_class, "cat");
        assert_eq!(top_score, "0.9");
        assert_eq!(decoded.item_type(), Some("PRODUCTION"));
        assert_eq!(decoded.raw_date(), Some("20230115093000"));
        assert!(!decoded.is_training());
    }

    #[test]
    fn short_filename_has_empty_class_and_score() {
        let decoded = decode_filename("a___b___c___d___e___f___g___TRAINING___i___20230115093000");
        match &decoded {
            DecodedFilename::Structured {
                segments,
                top_class,
                top_score,
            } => {
                assert_eq!(segments.len(), 10);
                assert!(top_class.is_empty());
                assert!(top_score.is_empty());
            }
            DecodedFilename::Unstructured => panic!("expected structured decode"),
        }
        assert!(decoded.is_training());
    }

    #[test]
    fn eleven_segments_leave_score_empty() {
        let decoded = decode_filename("0___1___2___3___4___5___6___7___8___9___bird__fish");
        match decoded {
            DecodedFilename::Structured {
                top_class,
                top_score,
                ..
            } => {
                assert_eq!(top_class, "bird");
                assert_eq!(top_score, "");
            }
            DecodedFilename::Unstructured => panic!("expected structured decode"),
        }
    }

    #[test]
    fn single_delimiter_is_structured_without_named_fields() {
        let decoded = decode_filename("left___right");
        assert!(decoded.is_structured());
        assert_eq!(decoded.segments(), ["left", "right"]);
        assert_eq!(decoded.item_type(), None);
        assert_eq!(decoded.raw_date(), None);
    }
}
