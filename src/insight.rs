//! Image insight widget: classification and dominant-color palette for uploaded images.
//!
//! Both analyses run on the blocking pool against the same decoded [`ImageBuffer`]. A failure
//! on either side is logged and leaves that half of the [`Insight`] empty; it never affects the
//! other half or the response status.

pub mod classify;
pub mod palette;
pub mod upload;
pub mod view;

pub use classify::*;
pub use palette::*;
pub use upload::*;
pub use view::*;

// crates.io
use tokio::task;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Failures raised while analyzing an upload.
#[derive(Debug, ThisError)]
pub enum InsightError {
	/// Upload is not an image in a supported format.
	#[error("Upload could not be decoded as an image.")]
	Decode {
		/// Underlying decoder failure.
		#[source]
		source: image::ImageError,
	},
	/// No classifier is configured for this process.
	#[error("No classification model is configured.")]
	ModelUnavailable,
	/// Model could not be loaded.
	#[error("Model failed to load: {message}.")]
	ModelLoad {
		/// Loader-supplied message.
		message: String,
	},
	/// Forward pass failed.
	#[error("Inference failed: {message}.")]
	Inference {
		/// Classifier-supplied message.
		message: String,
	},
	/// Model produced no usable scores.
	#[error("Model returned no comparable scores.")]
	EmptyScores,
	/// Quantizer rejected the image.
	#[error("Palette extraction failed: {message}.")]
	Palette {
		/// Quantizer-supplied message.
		message: String,
	},
	/// Blocking analysis task panicked or was cancelled.
	#[error("Analysis task did not complete.")]
	Task(#[from] task::JoinError),
}

/// Analysis results for one upload.
#[derive(Clone, Debug)]
pub struct Insight {
	/// Decoded upload, rendered back into the image container.
	pub image: Arc<ImageBuffer>,
	/// Top class, when classification succeeded.
	pub prediction: Option<Prediction>,
	/// Dominant colors, when extraction succeeded.
	pub palette: Option<Palette>,
}

/// Runs both analyses for uploads, sharing one lazily loaded model across requests.
#[derive(Debug)]
pub struct Analyzer {
	model: Arc<ModelHandle>,
	palette_size: u8,
}
impl Analyzer {
	/// Creates an analyzer extracting `palette_size` colors per image.
	pub fn new(model: ModelHandle, palette_size: u8) -> Result<Self, ConfigError> {
		validate_palette_size(palette_size)?;

		Ok(Self { model: Arc::new(model), palette_size })
	}

	/// Shared model handle.
	pub fn model(&self) -> &Arc<ModelHandle> {
		&self.model
	}

	/// Number of colors extracted per image.
	pub fn palette_size(&self) -> u8 {
		self.palette_size
	}

	/// Decodes `bytes` and runs classification and palette extraction concurrently.
	///
	/// Only a decode failure is returned as an error; analysis failures are logged and leave
	/// the corresponding field empty.
	pub async fn analyze(&self, bytes: Vec<u8>) -> Result<Insight, InsightError> {
		let image = Arc::new(task::spawn_blocking(move || ImageBuffer::decode(bytes)).await??);
		let classify = {
			let image = image.clone();
			let model = self.model.clone();

			task::spawn_blocking(move || {
				run_analysis(FlowKind::Classification, || classify_image(&model, &image))
			})
		};
		let extract = {
			let image = image.clone();
			let count = self.palette_size;

			task::spawn_blocking(move || {
				run_analysis(FlowKind::Palette, || extract_palette(&image, count))
			})
		};
		let (prediction, palette) = tokio::join!(classify, extract);

		Ok(Insight {
			image,
			prediction: settle(FlowKind::Classification, prediction),
			palette: settle(FlowKind::Palette, palette),
		})
	}
}

fn classify_image(model: &ModelHandle, image: &ImageBuffer) -> Result<Prediction, InsightError> {
	let classifier = model.classifier()?;
	let scores = classifier.predict(&ModelInput::from_image(image))?;

	Prediction::from_scores(&scores).ok_or(InsightError::EmptyScores)
}

fn run_analysis<T, F>(kind: FlowKind, f: F) -> Option<T>
where
	F: FnOnce() -> Result<T, InsightError>,
{
	let _guard = FlowSpan::new(kind, "analyze").entered();

	obs::record_flow_outcome(kind, FlowOutcome::Attempt);

	match f() {
		Ok(value) => {
			obs::record_flow_outcome(kind, FlowOutcome::Success);

			Some(value)
		},
		Err(e) => {
			tracing::warn!(flow = %kind, error = %e, "Analysis failed.");
			obs::record_flow_outcome(kind, FlowOutcome::Failure);

			None
		},
	}
}

fn settle<T>(kind: FlowKind, joined: Result<Option<T>, task::JoinError>) -> Option<T> {
	joined.unwrap_or_else(|e| {
		tracing::error!(flow = %kind, error = %InsightError::from(e), "Analysis task aborted.");

		None
	})
}
