#![allow(dead_code)]

// std
use std::{io::Cursor, sync::Arc};
// crates.io
use axum::{
	body::{Body, to_bytes},
	http::{HeaderMap, Response, header},
};
use httpmock::prelude::*;
use image::{ImageFormat, Rgba, RgbaImage};
use time::Duration;
// self
use gatehouse::{
	auth::{ProviderId, ScopeSet},
	insight::{Analyzer, ModelHandle},
	provider::{ProviderDescriptor, ProviderStrategy},
	relay::{ProviderClient, ReqwestRelay},
	server::{AppContext, CookiePolicy},
	store::{MemoryStore, SessionStore},
	url::Url,
};

pub const BASE_URL: &str = "http://localhost:3000";
pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const SESSION_SECRET: &str = "integration-secret";

pub fn mock_descriptor(server: &MockServer, provider: &str, with_email: bool) -> ProviderDescriptor {
	let endpoint = |path: &str| Url::parse(&server.url(path)).expect("Mock URL should parse.");
	let mut builder = ProviderDescriptor::builder(
		ProviderId::new(provider).expect("Provider fixture should be valid."),
	)
	.label(format!("Mock {provider}"))
	.authorization_endpoint(endpoint("/authorize"))
	.token_endpoint(endpoint("/token"))
	.profile_endpoint(endpoint("/user"))
	.default_scope(ScopeSet::new(["profile", "email"]).expect("Scope fixture should be valid."));

	if with_email {
		builder = builder.email_endpoint(endpoint("/user/emails"));
	}

	builder.build().expect("Mock descriptor should validate.")
}

pub fn mock_relay(
	server: &MockServer,
	provider: &str,
	strategy: Arc<dyn ProviderStrategy>,
	with_email: bool,
) -> ReqwestRelay {
	let base = Url::parse(BASE_URL).expect("Base URL fixture should parse.");
	let client = ProviderClient::new(mock_descriptor(server, provider, with_email), strategy, CLIENT_ID)
		.with_client_secret(CLIENT_SECRET);

	ReqwestRelay::new(base).expect("Relay should build.").register(client)
}

pub fn app_context(relay: ReqwestRelay, sessions: Arc<dyn SessionStore>) -> AppContext {
	let cookies = CookiePolicy::new(SESSION_SECRET, false).expect("Cookie policy should build.");
	let analyzer = Analyzer::new(ModelHandle::unavailable(), 5).expect("Analyzer should build.");

	AppContext::new(relay, sessions, cookies, analyzer, Duration::hours(1))
}

pub fn memory_context(relay: ReqwestRelay) -> (AppContext, MemoryStore) {
	let store = MemoryStore::default();

	(app_context(relay, Arc::new(store.clone())), store)
}

pub async fn mock_token<'a>(server: &'a MockServer, code: &str) -> httpmock::Mock<'a> {
	let code = format!("code={code}");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes(code);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"access-it","token_type":"bearer","expires_in":3600}"#);
		})
		.await
}

pub async fn mock_json<'a>(server: &'a MockServer, path: &str, body: &str) -> httpmock::Mock<'a> {
	let path = path.to_owned();
	let body = body.to_owned();

	server
		.mock_async(|when, then| {
			when.method(GET).path(path).header("authorization", "Bearer access-it");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// Returns the `name=value` pair of the response's `Set-Cookie` header.
pub fn set_cookie(headers: &HeaderMap) -> Option<String> {
	headers
		.get(header::SET_COOKIE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.map(|pair| pair.trim().to_owned())
}

pub fn location(headers: &HeaderMap) -> String {
	headers
		.get(header::LOCATION)
		.and_then(|value| value.to_str().ok())
		.expect("Redirect should carry a Location header.")
		.to_owned()
}

pub async fn body_text(response: Response<Body>) -> String {
	let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8.")
}

pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
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
