//! Session-backed OAuth 2.0 login relay for Google, GitHub, and Facebook, bundled with an
//! image insight widget that classifies uploads and extracts dominant-color palettes.
//!
//! The relay is built around an explicit [`server::AppContext`] constructed once at startup:
//! provider descriptors + strategies live in a [`relay::Relay`], sessions live behind a
//! [`store::SessionStore`], and the widget's model readiness is tracked by
//! [`insight::Analyzer`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod insight;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod relay;
pub mod server;
pub mod store;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
