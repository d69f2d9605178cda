//! Server-rendered widget markup.
//!
//! Element ids are part of the page contract: `image-upload`, `image-container`, `prediction`,
//! and `palette-container`.

// std
use std::fmt::Write as _;
// self
use crate::insight::{Insight, Palette, ReadinessKind};

/// Widget page for one render.
#[derive(Debug)]
pub struct WidgetView<'a> {
	/// Results of the latest upload, if any.
	pub insight: Option<&'a Insight>,
	/// Model state shown while no prediction is available.
	pub readiness: ReadinessKind,
}
impl WidgetView<'_> {
	/// Renders the full HTML document.
	pub fn render(&self) -> String {
		let mut html = String::from(concat!(
			"<!doctype html><html><head><meta charset=\"utf-8\"><title>Image Insight</title>",
			"<style>.color-box{display:inline-block;width:48px;height:48px;margin:4px}",
			"#image-container img{max-width:320px}</style></head><body>",
			"<h1>Image Insight</h1>",
			"<form method=\"post\" action=\"/insight\" enctype=\"multipart/form-data\">",
			"<input type=\"file\" id=\"image-upload\" name=\"image\" accept=\"image/*\">",
			"<button type=\"submit\">Analyze</button></form>",
			"<div id=\"image-container\">",
		));

		if let Some(insight) = self.insight {
			let _ = write!(
				html,
				"<img id=\"uploaded-image\" src=\"{}\" width=\"{}\" height=\"{}\">",
				insight.image.data_url(),
				insight.image.width(),
				insight.image.height(),
			);
		}

		html.push_str("</div><p id=\"prediction\">");

		match self.insight.and_then(|insight| insight.prediction) {
			Some(prediction) => {
				let _ = write!(html, "Prediction: {prediction}");
			},
			None if self.insight.is_none() => html.push_str(self.status()),
			None => {},
		}

		html.push_str("</p><div id=\"palette-container\">");

		let palette = self.insight.and_then(|insight| insight.palette.as_ref());

		for color in palette.into_iter().flat_map(Palette::iter) {
			let _ =
				write!(html, "<div class=\"color-box\" style=\"background-color: {color}\"></div>");
		}

		html.push_str("</div></body></html>");

		html
	}

	fn status(&self) -> &'static str {
		match self.readiness {
			ReadinessKind::Pending => "Model loads on first upload.",
			ReadinessKind::Loading => "Model loading.",
			ReadinessKind::Ready => "Model ready.",
			ReadinessKind::Failed(_) => "Model unavailable; retrying on next upload.",
			ReadinessKind::Unavailable => "Classification disabled.",
		}
	}
}
