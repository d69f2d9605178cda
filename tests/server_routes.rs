mod common;

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use axum::{
	Router,
	body::Body,
	http::{HeaderMap, Request, Response, StatusCode, header},
};
use clap::Parser;
use httpmock::prelude::*;
use tower::ServiceExt;
// self
use common::*;
use gatehouse::{
	auth::SessionId,
	config::{Cli, Config},
	provider::{GitHubStrategy, OidcStrategy},
	server::{self, AppContext, SESSION_COOKIE},
	store::{MemoryStore, PENDING_LOGIN_TTL, Session, SessionStore, StoreError, StoreFuture},
	url::Url,
};

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
	let mut request = Request::builder().uri(uri);

	if let Some(cookie) = cookie {
		request = request.header(header::COOKIE, cookie);
	}

	app.clone()
		.oneshot(request.body(Body::empty()).expect("Request should build."))
		.await
		.expect("Router is infallible.")
}

fn state_of(location: &str) -> String {
	let url = Url::parse(location).expect("Authorize URL should parse.");
	let query = url.query_pairs().into_owned().collect::<HashMap<_, _>>();

	query.get("state").cloned().expect("Authorize URL should carry a state.")
}

#[tokio::test]
async fn index_lists_registered_providers() {
	let server = MockServer::start_async().await;
	let (ctx, _) = memory_context(mock_relay(&server, "google", Arc::new(OidcStrategy), false));
	let app = server::router(ctx);
	let response = get(&app, "/", None).await;

	assert_eq!(response.status(), StatusCode::OK);

	let html = body_text(response).await;

	assert!(html.contains("<h1>Login using OAuth</h1>"));
	assert!(html.contains("<a href=\"/auth/google\">Login with Mock google</a>"));
}

fn max_age(headers: &HeaderMap) -> i64 {
	headers
		.get(header::SET_COOKIE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split("; ").find_map(|attr| attr.strip_prefix("Max-Age=")))
		.and_then(|secs| secs.parse().ok())
		.expect("Session cookie should carry a Max-Age.")
}

async fn github_login(server: &MockServer, app: &Router) -> String {
	let _token = mock_token(server, "code-it").await;
	let _profile = mock_json(server, "/user", r#"{"id":42,"login":"octocat"}"#).await;
	let _emails = mock_json(server, "/user/emails", "[]").await;
	let entry = get(app, "/auth/github", None).await;
	let cookie = set_cookie(entry.headers()).expect("Login entry should issue a session cookie.");
	let state = state_of(&location(entry.headers()));
	let back =
		get(app, &format!("/auth/github/callback?code=code-it&state={state}"), Some(&cookie)).await;

	assert_eq!(location(back.headers()), "/profile");

	set_cookie(back.headers()).expect("Callback should issue a fresh cookie.")
}

#[tokio::test]
async fn index_lists_configured_providers_in_declaration_order() {
	let cli = Cli::try_parse_from([
		"gatehouse",
		"--session-secret",
		SESSION_SECRET,
		"--facebook-app-id",
		"fb-id",
		"--facebook-app-secret",
		"fb-secret",
		"--github-client-id",
		"gh-id",
		"--github-client-secret",
		"gh-secret",
		"--google-client-id",
		"g-id",
		"--google-client-secret",
		"g-secret",
	])
	.expect("Arguments should parse.");
	let config = Config::from_cli(cli).expect("Configuration should validate.");
	let ctx = AppContext::from_config(&config, Arc::new(MemoryStore::default()))
		.expect("Context should build.");
	let html = body_text(get(&server::router(ctx), "/", None).await).await;
	let position = |provider: &str| {
		html.find(&format!("href=\"/auth/{provider}\""))
			.unwrap_or_else(|| panic!("{provider} should be listed."))
	};

	assert!(position("google") < position("github"));
	assert!(position("github") < position("facebook"));
}

#[tokio::test]
async fn login_entry_cookie_lives_only_as_long_as_the_pending_login() {
	let server = MockServer::start_async().await;
	let (ctx, _) = memory_context(mock_relay(&server, "github", Arc::new(GitHubStrategy), true));
	let app = server::router(ctx);
	let entry = get(&app, "/auth/github", None).await;
	let pending = max_age(entry.headers());

	assert!(pending > 0);
	assert!(pending <= PENDING_LOGIN_TTL.whole_seconds());

	let _token = mock_token(&server, "code-it").await;
	let _profile = mock_json(&server, "/user", r#"{"id":42,"login":"octocat"}"#).await;
	let _emails = mock_json(&server, "/user/emails", "[]").await;
	let cookie = set_cookie(entry.headers()).expect("Login entry should issue a session cookie.");
	let state = state_of(&location(entry.headers()));
	let back =
		get(&app, &format!("/auth/github/callback?code=code-it&state={state}"), Some(&cookie)).await;

	assert!(max_age(back.headers()) > PENDING_LOGIN_TTL.whole_seconds());
}

#[tokio::test]
async fn failed_callback_keeps_an_authenticated_session() {
	let server = MockServer::start_async().await;
	let (ctx, store) = memory_context(mock_relay(&server, "github", Arc::new(GitHubStrategy), true));
	let app = server::router(ctx);
	let cookie = github_login(&server, &app).await;
	let back = get(&app, "/auth/github/callback?error=access_denied", Some(&cookie)).await;

	assert_eq!(back.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(back.headers()), "/");
	assert!(set_cookie(back.headers()).is_none());
	assert_eq!(store.len(), 1);

	let profile = get(&app, "/profile", Some(&cookie)).await;

	assert_eq!(profile.status(), StatusCode::OK);
	assert!(body_text(profile).await.contains("<h1>Hello octocat</h1>"));
}

#[tokio::test]
async fn full_login_reaches_profile_then_logout_ends_it() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "code-it").await;
	let _profile =
		mock_json(&server, "/user", r#"{"id":42,"login":"octocat","name":"Mona <Octocat>"}"#).await;
	let _emails = mock_json(
		&server,
		"/user/emails",
		r#"[{"email":"mona@example.com","primary":true,"verified":true}]"#,
	)
	.await;
	let (ctx, store) = memory_context(mock_relay(&server, "github", Arc::new(GitHubStrategy), true));
	let app = server::router(ctx);

	// Login entry.
	let entry = get(&app, "/auth/github", None).await;

	assert_eq!(entry.status(), StatusCode::SEE_OTHER);

	let authorize = location(entry.headers());
	let cookie = set_cookie(entry.headers()).expect("Login entry should issue a session cookie.");

	assert!(authorize.starts_with(&server.url("/authorize")));
	assert!(authorize.contains("scope=email+profile"));
	assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));
	assert_eq!(store.len(), 1);

	// Provider callback.
	let state = state_of(&authorize);
	let back = get(&app, &format!("/auth/github/callback?code=code-it&state={state}"), Some(&cookie))
		.await;

	assert_eq!(back.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(back.headers()), "/profile");

	let rotated = set_cookie(back.headers()).expect("Callback should issue a fresh cookie.");

	assert_ne!(rotated, cookie);
	assert_eq!(store.len(), 1);

	// The pre-login cookie no longer grants anything.
	let stale = get(&app, "/profile", Some(&cookie)).await;

	assert_eq!(location(stale.headers()), "/");

	let profile = get(&app, "/profile", Some(&rotated)).await;

	assert_eq!(profile.status(), StatusCode::OK);

	let html = body_text(profile).await;

	assert!(html.contains("<h1>Hello Mona &lt;Octocat&gt;</h1>"));
	assert!(html.contains("mona@example.com"));
	assert!(html.contains("<a href=\"/logout\">Logout</a>"));

	// Logout.
	let out = get(&app, "/logout", Some(&rotated)).await;

	assert_eq!(out.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(out.headers()), "/");
	assert_eq!(set_cookie(out.headers()).as_deref(), Some(&*format!("{SESSION_COOKIE}=")));
	assert!(store.is_empty());

	let after = get(&app, "/profile", Some(&rotated)).await;

	assert_eq!(after.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(after.headers()), "/");
}

#[tokio::test]
async fn profile_without_session_redirects_home() {
	let server = MockServer::start_async().await;
	let (ctx, _) = memory_context(mock_relay(&server, "google", Arc::new(OidcStrategy), false));
	let app = server::router(ctx);

	for cookie in [None, Some("gatehouse.sid=forged.signature")] {
		let response = get(&app, "/profile", cookie).await;

		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(location(response.headers()), "/");
	}
}

#[tokio::test]
async fn callback_with_wrong_state_redirects_home_without_exchange() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "code-it").await;
	let (ctx, _) = memory_context(mock_relay(&server, "google", Arc::new(OidcStrategy), false));
	let app = server::router(ctx);
	let entry = get(&app, "/auth/google", None).await;
	let cookie = set_cookie(entry.headers()).expect("Login entry should issue a session cookie.");
	let back =
		get(&app, "/auth/google/callback?code=code-it&state=forged", Some(&cookie)).await;

	assert_eq!(back.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(back.headers()), "/");
	token.assert_calls_async(0).await;

	let profile = get(&app, "/profile", Some(&cookie)).await;

	assert_eq!(location(profile.headers()), "/");
}

#[tokio::test]
async fn callback_with_provider_error_redirects_home() {
	let server = MockServer::start_async().await;
	let (ctx, _) = memory_context(mock_relay(&server, "google", Arc::new(OidcStrategy), false));
	let app = server::router(ctx);
	let back = get(&app, "/auth/google/callback?error=access_denied", None).await;

	assert_eq!(back.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(back.headers()), "/");
}

#[tokio::test]
async fn unknown_provider_and_path_are_not_found() {
	let server = MockServer::start_async().await;
	let (ctx, _) = memory_context(mock_relay(&server, "google", Arc::new(OidcStrategy), false));
	let app = server::router(ctx);

	for uri in ["/auth/myspace", "/auth/myspace/callback?code=x&state=y", "/nowhere"] {
		let response = get(&app, uri, None).await;

		assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri} should be missing.");
		assert!(set_cookie(response.headers()).is_none());
	}
}

struct FailingStore;
impl SessionStore for FailingStore {
	fn load<'a>(&'a self, _: &'a SessionId) -> StoreFuture<'a, Option<Session>> {
		Box::pin(async { Err(StoreError::Backend { message: "offline".into() }) })
	}

	fn save(&self, _: Session) -> StoreFuture<'_, ()> {
		Box::pin(async { Err(StoreError::Backend { message: "offline".into() }) })
	}

	fn destroy<'a>(&'a self, _: &'a SessionId) -> StoreFuture<'a, bool> {
		Box::pin(async { Err(StoreError::Backend { message: "offline".into() }) })
	}
}

#[tokio::test]
async fn store_failures_render_a_generic_error() {
	let server = MockServer::start_async().await;
	let ctx = app_context(
		mock_relay(&server, "google", Arc::new(OidcStrategy), false),
		Arc::new(FailingStore),
	);
	let cookie = format!("{SESSION_COOKIE}={}", ctx.cookies.sign(&SessionId::generate()));
	let app = server::router(ctx);

	for uri in ["/auth/google", "/logout", "/profile"] {
		let response = get(&app, uri, Some(&cookie)).await;

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri} should fail.");

		let html = body_text(response).await;

		assert!(html.contains("Something went wrong"));
		assert!(!html.contains("offline"));
	}
}
