//! Image insight widget handlers.

// crates.io
use axum::{
	extract::{Multipart, State, multipart::MultipartError},
	http::StatusCode,
	response::Html,
};
// self
use crate::{
	insight::{Insight, WidgetView},
	server::AppContext,
};

/// Form field carrying the upload.
const UPLOAD_FIELD: &str = "image";

pub(super) async fn show(State(ctx): State<AppContext>) -> Html<String> {
	render(&ctx, None)
}

// Analysis failures degrade to an empty widget; only an unreadable form body is a client error.
pub(super) async fn analyze(
	State(ctx): State<AppContext>,
	mut multipart: Multipart,
) -> (StatusCode, Html<String>) {
	let upload = match read_upload(&mut multipart).await {
		Ok(Some(bytes)) => bytes,
		Ok(None) => {
			tracing::debug!("Upload form carried no image.");

			return (StatusCode::OK, render(&ctx, None));
		},
		Err(e) => {
			tracing::warn!(error = %e, "Upload form is unreadable.");

			return (StatusCode::BAD_REQUEST, render(&ctx, None));
		},
	};

	match ctx.analyzer.analyze(upload).await {
		Ok(insight) => (StatusCode::OK, render(&ctx, Some(&insight))),
		Err(e) => {
			tracing::warn!(error = %e, "Upload rejected.");

			(StatusCode::OK, render(&ctx, None))
		},
	}
}

async fn read_upload(multipart: &mut Multipart) -> Result<Option<Vec<u8>>, MultipartError> {
	while let Some(field) = multipart.next_field().await? {
		if field.name() != Some(UPLOAD_FIELD) {
			continue;
		}

		let bytes = field.bytes().await?;

		return Ok(Some(bytes.to_vec()).filter(|bytes| !bytes.is_empty()));
	}

	Ok(None)
}

fn render(ctx: &AppContext, insight: Option<&Insight>) -> Html<String> {
	Html(WidgetView { insight, readiness: ctx.analyzer.model().readiness() }.render())
}
