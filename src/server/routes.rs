//! Login relay handlers.

// crates.io
use axum::{
	extract::{Path, Query, State},
	http::{HeaderMap, StatusCode, header::SET_COOKIE},
	response::{Html, IntoResponse, Redirect, Response},
};
// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	relay::CallbackParams,
	server::{AppContext, ServerError, page},
	store::Session,
};

pub(super) async fn index(State(ctx): State<AppContext>) -> Html<String> {
	Html(page::index(ctx.relay.providers()))
}

pub(super) async fn login(
	State(ctx): State<AppContext>,
	Path(provider): Path<String>,
	headers: HeaderMap,
) -> Result<Response, ServerError> {
	let redirect = ctx.relay.start_login(&provider)?;
	let mut session = match load_session(&ctx, &headers).await? {
		Some(session) => session,
		None => Session::new(ctx.session_ttl),
	};

	session.begin_login(redirect.pending());

	let cookie = session_cookie(&ctx, &session);

	ctx.sessions.save(session).await?;

	Ok(([(SET_COOKIE, cookie)], Redirect::to(redirect.authorize_url.as_str())).into_response())
}

pub(super) async fn callback(
	State(ctx): State<AppContext>,
	Path(provider): Path<String>,
	Query(params): Query<CallbackParams>,
	headers: HeaderMap,
) -> Result<Response, ServerError> {
	let session = load_session(&ctx, &headers).await?;
	let pending = session.as_ref().and_then(Session::pending).cloned();

	match ctx.relay.complete_login(&provider, params, pending.as_ref()).await {
		Ok(identity) => {
			let previous = session.unwrap_or_else(|| Session::new(ctx.session_ttl));

			ctx.sessions.destroy(&previous.id).await?;

			let session = previous.authenticate(identity, ctx.session_ttl);
			let cookie = session_cookie(&ctx, &session);

			ctx.sessions.save(session).await?;

			Ok(([(SET_COOKIE, cookie)], Redirect::to("/profile")).into_response())
		},
		Err(e @ Error::UnknownProvider { .. }) => Err(e.into()),
		Err(_) => {
			// An authenticated session outlives a stray or failed callback.
			if let Some(mut session) = session.filter(|session| session.pending().is_some()) {
				session.abandon_login();
				ctx.sessions.save(session).await?;
			}

			Ok(Redirect::to("/").into_response())
		},
	}
}

pub(super) async fn profile(
	State(ctx): State<AppContext>,
	headers: HeaderMap,
) -> Result<Response, ServerError> {
	let session = load_session(&ctx, &headers).await?;

	Ok(match session.as_ref().and_then(Session::identity) {
		Some(identity) => Html(page::profile(identity)).into_response(),
		None => Redirect::to("/").into_response(),
	})
}

pub(super) async fn logout(
	State(ctx): State<AppContext>,
	headers: HeaderMap,
) -> Result<Response, ServerError> {
	const KIND: FlowKind = FlowKind::Logout;

	let span = FlowSpan::new(KIND, "logout");

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span
		.instrument(async {
			match ctx.cookies.session_id(&headers) {
				Some(id) => ctx.sessions.destroy(&id).await.map_err(Error::from),
				None => Ok(false),
			}
		})
		.await;

	match result {
		Ok(destroyed) => {
			tracing::debug!(destroyed, "Logout completed.");
			obs::record_flow_outcome(KIND, FlowOutcome::Success);

			Ok(([(SET_COOKIE, ctx.cookies.clear())], Redirect::to("/")).into_response())
		},
		Err(e) => {
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);

			Err(e.into())
		},
	}
}

pub(super) async fn not_found() -> (StatusCode, Html<&'static str>) {
	(StatusCode::NOT_FOUND, Html(page::not_found()))
}

async fn load_session(ctx: &AppContext, headers: &HeaderMap) -> Result<Option<Session>> {
	match ctx.cookies.session_id(headers) {
		Some(id) => Ok(ctx.sessions.load(&id).await?),
		None => Ok(None),
	}
}

fn session_cookie(ctx: &AppContext, session: &Session) -> String {
	ctx.cookies.issue(&session.id, session.expires_at - OffsetDateTime::now_utc())
}
