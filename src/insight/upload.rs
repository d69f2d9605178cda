//! Decoded upload shared by both analyses.

// std
use std::io::Cursor;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, ImageReader, RgbaImage};
// self
use crate::{_prelude::*, insight::InsightError};

/// Decoded RGBA image plus the original bytes it was decoded from.
#[derive(Clone)]
pub struct ImageBuffer {
	pixels: RgbaImage,
	format: ImageFormat,
	encoded: Vec<u8>,
}
impl ImageBuffer {
	/// Sniffs the format from the magic bytes and decodes the upload.
	pub fn decode(bytes: Vec<u8>) -> Result<Self, InsightError> {
		let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
			.with_guessed_format()
			.map_err(|e| InsightError::Decode { source: e.into() })?;
		let format = reader
			.format()
			.ok_or(InsightError::Decode { source: unsupported_format() })?;
		let pixels =
			reader.decode().map_err(|source| InsightError::Decode { source })?.to_rgba8();

		Ok(Self { pixels, format, encoded: bytes })
	}

	/// Decoded pixels.
	pub fn pixels(&self) -> &RgbaImage {
		&self.pixels
	}

	/// Width in pixels.
	pub fn width(&self) -> u32 {
		self.pixels.width()
	}

	/// Height in pixels.
	pub fn height(&self) -> u32 {
		self.pixels.height()
	}

	/// MIME type of the original upload.
	pub fn mime_type(&self) -> &'static str {
		self.format.to_mime_type()
	}

	/// `data:` URL embedding the original upload, for rendering it back to the browser.
	pub fn data_url(&self) -> String {
		format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.encoded))
	}
}
impl Debug for ImageBuffer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ImageBuffer")
			.field("format", &self.format)
			.field("width", &self.width())
			.field("height", &self.height())
			.field("encoded_len", &self.encoded.len())
			.finish()
	}
}

fn unsupported_format() -> image::ImageError {
	image::ImageError::Unsupported(image::error::UnsupportedError::from_format_and_kind(
		image::error::ImageFormatHint::Unknown,
		image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
	))
}

#[cfg(test)]
pub(crate) mod fixtures {
	// std
	use std::io::Cursor;
	// crates.io
	use image::{ImageFormat, Rgba, RgbaImage};

	/// PNG-encoded gradient without near-white pixels.
	pub(crate) fn gradient_png(width: u32, height: u32) -> Vec<u8> {
		let image = RgbaImage::from_fn(width, height, |x, y| {
			let r = (x * 255 / width.max(1)) as u8;
			let g = (y * 255 / height.max(1)) as u8;
			let b = ((x + y) * 127 / (width + height).max(1)) as u8;

			Rgba([r, g, b, 255])
		});
		let mut out = Cursor::new(Vec::new());

		image.write_to(&mut out, ImageFormat::Png).expect("Gradient fixture should encode.");

		out.into_inner()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn decodes_png_and_keeps_original_bytes() {
		let bytes = fixtures::gradient_png(8, 4);
		let image = ImageBuffer::decode(bytes.clone()).expect("PNG fixture should decode.");

		assert_eq!((image.width(), image.height()), (8, 4));
		assert_eq!(image.mime_type(), "image/png");
		assert_eq!(image.data_url(), format!("data:image/png;base64,{}", STANDARD.encode(bytes)));
	}

	#[test]
	fn rejects_unknown_payloads() {
		assert!(matches!(
			ImageBuffer::decode(b"GIF? no.".to_vec()),
			Err(InsightError::Decode { .. })
		));
	}
}
