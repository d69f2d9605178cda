//! Classifier contracts, model readiness, and prediction decoding.

// crates.io
use image::imageops::{self, FilterType};
// self
use crate::{
	_prelude::*,
	insight::{ImageBuffer, InsightError},
};

/// Square edge length the classifier expects.
pub const MODEL_INPUT_SIZE: u32 = 224;

/// Classifier input: the image resized to [`MODEL_INPUT_SIZE`] with nearest-neighbour sampling,
/// as raw `f32` RGB values in `[1, H, W, 3]` (NHWC) order. Values are not normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelInput {
	/// Tensor shape, always `[1, 224, 224, 3]`.
	pub shape: [usize; 4],
	/// Row-major tensor data.
	pub data: Vec<f32>,
}
impl ModelInput {
	/// Resizes and flattens `image`, dropping the alpha channel.
	pub fn from_image(image: &ImageBuffer) -> Self {
		let side = MODEL_INPUT_SIZE;
		let resized = imageops::resize(image.pixels(), side, side, FilterType::Nearest);
		let data = resized.pixels().flat_map(|px| px.0[..3].iter().map(|&c| f32::from(c))).collect();
		let side = side as usize;

		Self { shape: [1, side, side, 3], data }
	}
}

/// Pre-trained model mapping a [`ModelInput`] to per-class scores.
pub trait Classifier
where
	Self: Send + Sync,
{
	/// Runs one forward pass.
	fn predict(&self, input: &ModelInput) -> Result<Vec<f32>, InsightError>;
}

/// Source of a [`Classifier`], invoked at most once per successful load.
pub trait ModelLoader
where
	Self: Send + Sync,
{
	/// Loads the model.
	fn load(&self) -> Result<Arc<dyn Classifier>, InsightError>;
}

/// Top class chosen from a score vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prediction {
	/// Index of the highest score; ties resolve to the lowest index.
	pub class_index: usize,
}
impl Prediction {
	/// Picks the first maximum, ignoring NaN scores. Returns `None` when nothing is comparable.
	pub fn from_scores(scores: &[f32]) -> Option<Self> {
		let mut best: Option<(usize, f32)> = None;

		for (index, &score) in scores.iter().enumerate() {
			if score.is_nan() {
				continue;
			}
			if best.is_none_or(|(_, top)| score > top) {
				best = Some((index, score));
			}
		}

		best.map(|(class_index, _)| Self { class_index })
	}
}
impl Display for Prediction {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Class {}", self.class_index)
	}
}

/// Observable model state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadinessKind {
	/// Not loaded yet.
	Pending,
	/// A load is in flight.
	Loading,
	/// Loaded and serving predictions.
	Ready,
	/// Last load attempt failed; the next classification retries.
	Failed(String),
	/// No model configured.
	Unavailable,
}

enum Readiness {
	Pending,
	Loading,
	Ready(Arc<dyn Classifier>),
	Failed(String),
	Unavailable,
}

/// Lazily loaded, shared classifier.
///
/// Loads are serialized by a gate separate from the state cell, so concurrent uploads wait for
/// a single load while [`readiness`](Self::readiness) keeps answering immediately.
pub struct ModelHandle {
	loader: Option<Arc<dyn ModelLoader>>,
	load_gate: Mutex<()>,
	state: Mutex<Readiness>,
}
impl ModelHandle {
	/// Handle that loads from `loader` on first use.
	pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
		Self {
			loader: Some(loader),
			load_gate: Mutex::new(()),
			state: Mutex::new(Readiness::Pending),
		}
	}

	/// Handle without a model; every classification fails with
	/// [`InsightError::ModelUnavailable`].
	pub fn unavailable() -> Self {
		Self { loader: None, load_gate: Mutex::new(()), state: Mutex::new(Readiness::Unavailable) }
	}

	/// Current readiness. Never waits for an in-flight load.
	pub fn readiness(&self) -> ReadinessKind {
		match &*self.state.lock() {
			Readiness::Pending => ReadinessKind::Pending,
			Readiness::Loading => ReadinessKind::Loading,
			Readiness::Ready(_) => ReadinessKind::Ready,
			Readiness::Failed(message) => ReadinessKind::Failed(message.clone()),
			Readiness::Unavailable => ReadinessKind::Unavailable,
		}
	}

	/// Returns the loaded classifier, loading it first if needed. Blocks during the load.
	pub fn classifier(&self) -> Result<Arc<dyn Classifier>, InsightError> {
		if let Some(classifier) = self.loaded() {
			return Ok(classifier);
		}

		let loader = self.loader.as_ref().ok_or(InsightError::ModelUnavailable)?;
		let _gate = self.load_gate.lock();

		// Another caller may have finished the load while this one waited at the gate.
		if let Some(classifier) = self.loaded() {
			return Ok(classifier);
		}

		*self.state.lock() = Readiness::Loading;

		let loaded = loader.load();
		let mut state = self.state.lock();

		match loaded {
			Ok(classifier) => {
				tracing::info!("Classification model loaded.");

				*state = Readiness::Ready(classifier.clone());

				Ok(classifier)
			},
			Err(e) => {
				*state = Readiness::Failed(e.to_string());

				Err(e)
			},
		}
	}

	fn loaded(&self) -> Option<Arc<dyn Classifier>> {
		match &*self.state.lock() {
			Readiness::Ready(classifier) => Some(classifier.clone()),
			_ => None,
		}
	}
}
impl Debug for ModelHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ModelHandle").field("readiness", &self.readiness()).finish()
	}
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxModelLoader;

#[cfg(feature = "onnx")]
mod onnx {
	// std
	use std::path::PathBuf;
	// crates.io
	use tract_onnx::prelude::*;
	// self
	use super::{Classifier, MODEL_INPUT_SIZE, ModelInput, ModelLoader};
	use crate::insight::InsightError;

	type Plan = TypedRunnableModel<TypedModel>;

	/// Loads an ONNX image classifier taking `[1, 224, 224, 3]` `f32` input.
	#[derive(Clone, Debug)]
	pub struct OnnxModelLoader {
		path: PathBuf,
	}
	impl OnnxModelLoader {
		/// Loader for the model file at `path`.
		pub fn new(path: impl Into<PathBuf>) -> Self {
			Self { path: path.into() }
		}
	}
	impl ModelLoader for OnnxModelLoader {
		fn load(&self) -> Result<std::sync::Arc<dyn Classifier>, InsightError> {
			let side = MODEL_INPUT_SIZE as usize;
			let plan = tract_onnx::onnx()
				.model_for_path(&self.path)
				.and_then(|model| model.with_input_fact(0, f32::fact([1, side, side, 3]).into()))
				.and_then(|model| model.into_optimized())
				.and_then(|model| model.into_runnable())
				.map_err(|e| InsightError::ModelLoad {
					message: format!("{}: {e}", self.path.display()),
				})?;

			Ok(std::sync::Arc::new(OnnxClassifier { plan }))
		}
	}

	struct OnnxClassifier {
		plan: Plan,
	}
	impl Classifier for OnnxClassifier {
		fn predict(&self, input: &ModelInput) -> Result<Vec<f32>, InsightError> {
			let inference = |e: TractError| InsightError::Inference { message: e.to_string() };
			let tensor = Tensor::from_shape(&input.shape, &input.data).map_err(inference)?;
			let outputs = self.plan.run(tvec!(tensor.into())).map_err(inference)?;
			let scores = outputs[0].to_array_view::<f32>().map_err(inference)?;

			Ok(scores.iter().copied().collect())
		}
	}
}
