//! Model artifact loading and the process-wide artifact store

use crate::config::{ArtifactsConfig, ClassifierBackend};
use crate::error::{PipelineError, Result};
use crate::models::classifier::{Classifier, DenseNetwork, DenseNetworkSpec};
use crate::models::decoder::LabelDecoder;
use crate::models::scaler::{ScalerParams, StandardScaler};
use crate::schema::FeatureSchema;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// The four training artifacts, validated against each other
pub struct Artifacts {
    pub classifier: Box<dyn Classifier>,
    pub scaler: StandardScaler,
    pub decoder: LabelDecoder,
    pub schema: FeatureSchema,
}

impl std::fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifacts")
            .field("classifier", &self.classifier.backend())
            .field("features", &self.schema.width())
            .field("classes", &self.decoder.classes())
            .finish()
    }
}

/// Either a bare JSON list or an object wrapping it under one key
#[derive(Deserialize)]
#[serde(untagged)]
enum NamedList {
    Bare(Vec<String>),
    Columns { columns: Vec<String> },
    Classes { classes: Vec<String> },
}

impl NamedList {
    fn into_inner(self) -> Vec<String> {
        match self {
            NamedList::Bare(v) | NamedList::Columns { columns: v } | NamedList::Classes { classes: v } => v,
        }
    }
}

/// Loader for the artifact directory
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
    classifier_file: String,
    scaler_file: String,
    label_encoder_file: String,
    columns_file: String,
    backend: ClassifierBackend,
    onnx_threads: usize,
}

impl ArtifactLoader {
    pub fn new(config: &ArtifactsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            classifier_file: config.classifier_file.clone(),
            scaler_file: config.scaler_file.clone(),
            label_encoder_file: config.label_encoder_file.clone(),
            columns_file: config.columns_file.clone(),
            backend: config.backend,
            onnx_threads: config.onnx_threads,
        }
    }

    /// Loader for `dir` with default file names and the dense backend
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        let config = ArtifactsConfig {
            dir: dir.as_ref().to_string_lossy().into_owned(),
            ..ArtifactsConfig::default()
        };
        Self::new(&config)
    }

    /// Human-readable description of the files this loader expects
    pub fn expected_layout(&self) -> String {
        format!(
            "{dir}/ must contain: {c} (classifier), {s} (scaler), {l} (label encoder), {m} (feature columns)",
            dir = self.dir.display(),
            c = self.classifier_file,
            s = self.scaler_file,
            l = self.label_encoder_file,
            m = self.columns_file,
        )
    }

    /// Load and cross-validate all four artifacts
    pub fn load(&self) -> Result<Artifacts> {
        info!(dir = %self.dir.display(), backend = ?self.backend, "Loading model artifacts");

        let schema = self.load_schema()?;
        let scaler = self.load_scaler(&schema)?;
        let decoder = self.load_decoder()?;
        let classifier = self.load_classifier(&schema, &decoder)?;

        info!(
            features = schema.width(),
            classes = ?decoder.classes(),
            backend = classifier.backend(),
            "Model artifacts loaded"
        );

        Ok(Artifacts {
            classifier,
            scaler,
            decoder,
            schema,
        })
    }

    fn load_schema(&self) -> Result<FeatureSchema> {
        let path = self.dir.join(&self.columns_file);
        let columns = read_json::<NamedList>("feature columns", &path)?.into_inner();

        if columns.is_empty() {
            return Err(PipelineError::artifact("feature columns", &path, "schema is empty"));
        }

        FeatureSchema::new(columns).map_err(|dup| {
            PipelineError::artifact("feature columns", &path, format!("duplicate column {}", dup))
        })
    }

    fn load_scaler(&self, schema: &FeatureSchema) -> Result<StandardScaler> {
        let path = self.dir.join(&self.scaler_file);
        let params = read_json::<ScalerParams>("scaler", &path)?;
        let scaler =
            StandardScaler::from_params(params).map_err(|e| PipelineError::artifact("scaler", &path, e))?;

        if scaler.width() != schema.width() {
            return Err(PipelineError::artifact(
                "scaler",
                &path,
                format!(
                    "fitted on {} columns but schema has {}",
                    scaler.width(),
                    schema.width()
                ),
            ));
        }

        debug!(width = scaler.width(), "Scaler loaded");
        Ok(scaler)
    }

    fn load_decoder(&self) -> Result<LabelDecoder> {
        let path = self.dir.join(&self.label_encoder_file);
        let classes = read_json::<NamedList>("label encoder", &path)?.into_inner();

        if classes.is_empty() {
            return Err(PipelineError::artifact("label encoder", &path, "no classes"));
        }

        Ok(LabelDecoder::new(classes))
    }

    fn load_classifier(
        &self,
        schema: &FeatureSchema,
        decoder: &LabelDecoder,
    ) -> Result<Box<dyn Classifier>> {
        let path = self.dir.join(&self.classifier_file);

        let classifier: Box<dyn Classifier> = match self.backend {
            ClassifierBackend::Dense => {
                let spec = read_json::<DenseNetworkSpec>("classifier", &path)?;
                let network = DenseNetwork::from_spec(spec)
                    .map_err(|e| PipelineError::artifact("classifier", &path, e))?;
                Box::new(network)
            }
            ClassifierBackend::Onnx => self.load_onnx(&path, schema, decoder)?,
        };

        if classifier.input_width() != schema.width() {
            return Err(PipelineError::artifact(
                "classifier",
                &path,
                format!(
                    "expects {} inputs but schema has {} columns",
                    classifier.input_width(),
                    schema.width()
                ),
            ));
        }
        if classifier.output_width() != decoder.len() {
            return Err(PipelineError::artifact(
                "classifier",
                &path,
                format!(
                    "produces {} outputs but label encoder has {} classes",
                    classifier.output_width(),
                    decoder.len()
                ),
            ));
        }

        Ok(classifier)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(
        &self,
        path: &Path,
        schema: &FeatureSchema,
        decoder: &LabelDecoder,
    ) -> Result<Box<dyn Classifier>> {
        use crate::models::classifier::OnnxClassifier;

        if !path.exists() {
            return Err(PipelineError::artifact("classifier", path, "file not found"));
        }
        let model = OnnxClassifier::load(path, self.onnx_threads, schema.width(), decoder.len())
            .map_err(|e| PipelineError::artifact("classifier", path, e))?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(
        &self,
        path: &Path,
        _schema: &FeatureSchema,
        _decoder: &LabelDecoder,
    ) -> Result<Box<dyn Classifier>> {
        Err(PipelineError::artifact(
            "classifier",
            path,
            format!(
                "onnx backend requested ({} threads) but the crate was built without the `onnx` feature",
                self.onnx_threads
            ),
        ))
    }
}

fn read_json<T: DeserializeOwned>(artifact: &'static str, path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::artifact(artifact, path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| PipelineError::artifact(artifact, path, e))
}

/// Loads artifacts at most once per process and hands out shared handles.
///
/// Concurrent first callers block on a single load and all observe the same
/// instance. A failed load caches nothing.
#[derive(Debug)]
pub struct ArtifactStore {
    loader: ArtifactLoader,
    cell: OnceCell<Arc<Artifacts>>,
    loads: AtomicUsize,
}

impl ArtifactStore {
    pub fn new(loader: ArtifactLoader) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Loaded artifacts, loading them on first use
    pub fn get(&self) -> Result<Arc<Artifacts>> {
        self.cell
            .get_or_try_init(|| {
                self.loads.fetch_add(1, Ordering::SeqCst);
                self.loader.load().map(Arc::new)
            })
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Number of load attempts made so far
    pub fn load_attempts(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn loader(&self) -> &ArtifactLoader {
        &self.loader
    }
}
