//! Loading the street and intersection datasets into question pools.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use crate::error::DatasetError;
use crate::feature::{parse_feature_collection, Feature};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum DatasetKind {
    #[strum(serialize = "streets")]
    Streets,
    #[strum(serialize = "intersections")]
    Intersections,
}

impl DatasetKind {
    fn is_eligible(&self, feature: &Feature) -> bool {
        match self {
            DatasetKind::Streets => feature.is_quiz_street(),
            DatasetKind::Intersections => feature.is_quiz_intersection(),
        }
    }
}

/// Features eligible for one kind of quiz. Built once, never mutated.
#[derive(Debug, Clone, Default)]
pub struct QuestionPool(Arc<[Arc<Feature>]>);

impl QuestionPool {
    pub fn new(features: Vec<Arc<Feature>>) -> Self {
        Self(features.into())
    }

    pub fn features(&self) -> &[Arc<Feature>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A loaded dataset: every feature of the file plus its quiz pool.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub features: Arc<[Arc<Feature>]>,
    pub pool: QuestionPool,
}

impl Dataset {
    pub fn from_features(kind: DatasetKind, features: Vec<Arc<Feature>>) -> Self {
        let pool = QuestionPool::new(
            features
                .iter()
                .filter(|f| kind.is_eligible(f))
                .cloned()
                .collect(),
        );
        Self {
            kind,
            features: features.into(),
            pool,
        }
    }
}

/// Where a dataset is in its one-shot load.
#[derive(Debug, Default)]
pub enum DatasetStatus {
    #[default]
    Loading,
    Ready(Dataset),
    Unavailable(DatasetError),
}

impl DatasetStatus {
    /// The quiz pool, empty while loading or after a failure.
    pub fn pool(&self) -> QuestionPool {
        match self {
            DatasetStatus::Ready(dataset) => dataset.pool.clone(),
            _ => QuestionPool::default(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DatasetStatus::Unavailable(_))
    }
}

/// Completion message of a background load.
#[derive(Debug)]
pub struct DatasetEvent {
    pub kind: DatasetKind,
    pub result: Result<Dataset, DatasetError>,
}

pub fn load_dataset(kind: DatasetKind, path: &Path) -> Result<Dataset, DatasetError> {
    let bytes = fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let features = parse_feature_collection(&bytes)
        .map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| DatasetError::NotFeatureCollection(path.to_path_buf()))?;

    let dataset = Dataset::from_features(kind, features);
    info!(
        %kind,
        path = %path.display(),
        features = dataset.features.len(),
        questions = dataset.pool.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Loads one dataset on its own thread and reports the outcome through `tx`.
/// A closed channel is not an error: the app has gone away.
pub fn spawn_loader<T>(kind: DatasetKind, path: PathBuf, tx: Sender<T>) -> thread::JoinHandle<()>
where
    T: From<DatasetEvent> + Send + 'static,
{
    thread::spawn(move || {
        let result = load_dataset(kind, &path);
        if let Err(err) = &result {
            warn!(%kind, error = %err, "dataset unavailable");
        }
        let _ = tx.send(T::from(DatasetEvent { kind, result }));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;
    use tempfile::tempdir;

    const STREETS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "Karasuma-dori", "rank": 1},
         "geometry": {"type": "LineString", "coordinates": [[135.759, 34.98], [135.759, 35.03]]}},
        {"type": "Feature", "properties": {"name": "Oike-dori", "rank": 2},
         "geometry": {"type": "LineString", "coordinates": [[135.74, 35.01], [135.78, 35.01]]}},
        {"type": "Feature", "properties": {"name": "Side lane", "rank": 3},
         "geometry": {"type": "LineString", "coordinates": [[135.75, 35.0], [135.751, 35.0]]}},
        {"type": "Feature", "properties": {"rank": 1},
         "geometry": {"type": "LineString", "coordinates": [[135.75, 35.0], [135.752, 35.0]]}}
    ]}"#;

    const INTERSECTIONS: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"交差点名": "烏丸御池", "Street1": "烏丸通", "street2": "御池通"},
         "geometry": {"type": "Point", "coordinates": [135.759, 35.010]}},
        {"type": "Feature", "properties": {"交差点名": "", "Street1": "烏丸通", "street2": "四条通"},
         "geometry": {"type": "Point", "coordinates": [135.759, 35.003]}},
        {"type": "Feature", "properties": {"交差点名": "四条河原町", "Street1": "四条通"},
         "geometry": {"type": "Point", "coordinates": [135.769, 35.003]}}
    ]}"#;

    #[test]
    fn street_pool_keeps_named_rank_one_and_two() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("street.geojson");
        fs::write(&path, STREETS).unwrap();

        let dataset = load_dataset(DatasetKind::Streets, &path).unwrap();
        assert_eq!(dataset.features.len(), 4);
        let names: Vec<_> = dataset
            .pool
            .features()
            .iter()
            .filter_map(|f| f.street_name())
            .collect();
        assert_eq!(names, vec!["Karasuma-dori", "Oike-dori"]);
    }

    #[test]
    fn intersection_pool_requires_all_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("intersection_pro.geojson");
        fs::write(&path, INTERSECTIONS).unwrap();

        let dataset = load_dataset(DatasetKind::Intersections, &path).unwrap();
        assert_eq!(dataset.pool.len(), 1);
        assert_eq!(dataset.pool.features()[0].crossing_name(), Some("烏丸御池"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_dataset(DatasetKind::Streets, &dir.path().join("nope.geojson")).unwrap_err();
        assert_matches!(err, DatasetError::Io { .. });
        assert_eq!(err.menu_label(), "file not found");
    }

    #[test]
    fn malformed_and_wrong_documents_fail() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.geojson");
        fs::write(&broken, "{ not json").unwrap();
        assert_matches!(
            load_dataset(DatasetKind::Streets, &broken),
            Err(DatasetError::Parse { .. })
        );

        let single = dir.path().join("single.geojson");
        fs::write(&single, r#"{"type": "Feature", "properties": {}}"#).unwrap();
        assert_matches!(
            load_dataset(DatasetKind::Streets, &single),
            Err(DatasetError::NotFeatureCollection(_))
        );
    }

    #[test]
    fn loaders_report_independently() {
        let dir = tempdir().unwrap();
        let streets = dir.path().join("street.geojson");
        fs::write(&streets, STREETS).unwrap();

        let (tx, rx) = mpsc::channel::<DatasetEvent>();
        let a = spawn_loader(DatasetKind::Streets, streets, tx.clone());
        let b = spawn_loader(
            DatasetKind::Intersections,
            dir.path().join("missing.geojson"),
            tx,
        );
        a.join().unwrap();
        b.join().unwrap();

        let mut events: Vec<DatasetEvent> = rx.iter().collect();
        events.sort_by_key(|e| e.kind == DatasetKind::Intersections);
        assert_eq!(events.len(), 2);
        assert_matches!(&events[0].result, Ok(d) if d.pool.len() == 2);
        assert_matches!(&events[1].result, Err(DatasetError::Io { .. }));
    }

    #[test]
    fn status_pool_is_empty_unless_ready() {
        assert!(DatasetStatus::Loading.pool().is_empty());
        let failed = DatasetStatus::Unavailable(DatasetError::NotFeatureCollection("x".into()));
        assert!(failed.pool().is_empty());
        assert!(failed.is_unavailable());
    }
}
