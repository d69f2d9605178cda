//! Provider-facing descriptors (data), strategies (behavior), and profile mapping.
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, the scope requested at login entry, client authentication preferences, and
//! provider quirks (scope delimiter). `strategy` defines [`ProviderStrategy`], an
//! HTTP-client-agnostic hook used by the relay to classify token errors and to map a
//! provider's profile payload into a typed [`Identity`](crate::auth::Identity).
//! `builtin` wires the Google, GitHub, and Facebook descriptors together with their
//! profile strategies.

pub mod builtin;
pub mod descriptor;
pub mod profile;
pub mod strategy;

pub use builtin::*;
pub use descriptor::*;
pub use profile::*;
pub use strategy::*;
