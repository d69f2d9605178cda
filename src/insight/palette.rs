//! Dominant-color extraction delegated to the `color_thief` quantizer.

// crates.io
use color_thief::ColorFormat;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	insight::{ImageBuffer, InsightError},
};

/// Colors extracted per image unless configured otherwise.
pub const DEFAULT_PALETTE_SIZE: u8 = 5;

// 1 is the best quality; 10 matches the browser library's default sampling.
const QUALITY: u8 = 10;

/// RGB color triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
	/// Red component.
	pub r: u8,
	/// Green component.
	pub g: u8,
	/// Blue component.
	pub b: u8,
}
impl Display for Rgb {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
	}
}

/// Ordered dominant colors, most dominant first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette(Vec<Rgb>);
impl Palette {
	/// Number of colors.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the palette holds no colors.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates the colors in order.
	pub fn iter(&self) -> impl Iterator<Item = &Rgb> {
		self.0.iter()
	}
}

impl From<Vec<Rgb>> for Palette {
	fn from(colors: Vec<Rgb>) -> Self {
		Self(colors)
	}
}

/// Rejects sizes the quantizer cannot serve (it takes `2..=255` and is asked for one extra).
pub fn validate_palette_size(count: u8) -> Result<(), ConfigError> {
	if (2..=254).contains(&count) {
		Ok(())
	} else {
		Err(ConfigError::PaletteSize { size: count })
	}
}

/// Extracts up to `count` dominant colors from `image`.
///
/// The quantizer may return one color fewer than requested, so one extra is requested and
/// the result truncated.
pub fn extract_palette(image: &ImageBuffer, count: u8) -> Result<Palette, InsightError> {
	validate_palette_size(count)
		.map_err(|e| InsightError::Palette { message: e.to_string() })?;

	let colors =
		color_thief::get_palette(image.pixels().as_raw(), ColorFormat::Rgba, QUALITY, count + 1)
			.map_err(|e| InsightError::Palette { message: format!("{e:?}") })?;

	Ok(colors
		.into_iter()
		.take(usize::from(count))
		.map(|c| Rgb { r: c.r, g: c.g, b: c.b })
		.collect::<Vec<_>>()
		.into())
}
