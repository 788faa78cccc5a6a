use std::path::PathBuf;

use thiserror::Error;

/// Why a dataset could not be turned into a question pool.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed GeoJSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not a FeatureCollection")]
    NotFeatureCollection(PathBuf),
}

impl DatasetError {
    /// Short label for the menu, in place of the question count.
    pub fn menu_label(&self) -> &'static str {
        match self {
            DatasetError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                "file not found"
            }
            DatasetError::Io { .. } => "file unreadable",
            DatasetError::Parse { .. } | DatasetError::NotFeatureCollection(_) => "invalid data",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuizError {
    #[error("there are no missed questions to review")]
    NoReviewMaterial,

    /// Fewer than four distinct names exist in the pool. `options` holds
    /// every distinct name that was found, correct answer included.
    #[error("only {} distinct answer names available", .options.len())]
    OptionsExhausted { options: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_label_distinguishes_missing_files() {
        let missing = DatasetError::Io {
            path: "street.geojson".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let denied = DatasetError::Io {
            path: "street.geojson".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(missing.menu_label(), "file not found");
        assert_eq!(denied.menu_label(), "file unreadable");
        assert_eq!(
            DatasetError::NotFeatureCollection("x".into()).menu_label(),
            "invalid data"
        );
    }

    #[test]
    fn exhausted_message_counts_options() {
        let err = QuizError::OptionsExhausted {
            options: vec!["A".into(), "B".into()],
        };
        assert_eq!(err.to_string(), "only 2 distinct answer names available");
    }
}
