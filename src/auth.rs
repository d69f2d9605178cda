//! Auth-domain identifiers, scope sets, identities, and token secrets.

pub mod id;
pub mod identity;
pub mod scope;
pub mod token;

pub use id::*;
pub use identity::*;
pub use scope::*;
pub use token::*;
