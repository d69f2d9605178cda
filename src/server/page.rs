//! HTML pages for the login relay.

// std
use std::fmt::Write as _;
// self
use crate::{auth::Identity, provider::ProviderDescriptor};

/// Entry page linking to every registered provider.
pub fn index<'a>(providers: impl IntoIterator<Item = &'a ProviderDescriptor>) -> String {
	let mut html = String::from("<h1>Login using OAuth</h1>");
	let links = providers
		.into_iter()
		.map(|descriptor| {
			format!(
				"<a href=\"/auth/{}\">Login with {}</a>",
				escape(&descriptor.id),
				escape(&descriptor.label)
			)
		})
		.collect::<Vec<_>>();

	if links.is_empty() {
		html.push_str("<p>No identity providers are configured.</p>");
	} else {
		html.push_str(&links.join("<br>"));
	}

	html
}

/// Protected profile page.
pub fn profile(identity: &Identity) -> String {
	let mut html = format!("<h1>Hello {}</h1>", escape(&identity.display_name));

	if let Some(email) = identity.email.as_deref() {
		let _ = write!(html, "<p>{}</p>", escape(email));
	}

	html.push_str("<a href=\"/logout\">Logout</a>");

	html
}

/// Body for unknown routes and providers.
pub fn not_found() -> &'static str {
	"<h1>Not Found</h1><a href=\"/\">Back to login</a>"
}

/// Body for unexpected failures. Carries no error detail.
pub fn error() -> &'static str {
	"<h1>Something went wrong</h1><a href=\"/\">Back to login</a>"
}

/// Escapes text for element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());

	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#x27;"),
			_ => out.push(c),
		}
	}

	out
}
