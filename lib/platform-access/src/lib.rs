//! Sign-in policy for the stickers portal.
//!
//! This crate provides:
//! - The allow-list of identities permitted to sign in (`AllowList`)
//! - Claims of a validated identity (`ClaimSet`)
//! - Post-authentication authorization (`Authorizer`, `Decision`)
//! - The login prompt rule for outgoing provider requests
//!   (`should_force_login_prompt`)
//! - OIDC configuration (`OidcConfig`) and session tickets (`Session`)
//!
//! # Access Control Model
//!
//! Token validation belongs to the OIDC client. Once a token is valid, the
//! identity is resolved from the `upn` claim, falling back to `email`, and
//! admitted only if it appears in the configured allow-list. An empty
//! allow-list admits nobody.
//!
//! # Example
//!
//! ```
//! use stickers_platform_access::{AllowList, Authorizer, ClaimSet, claim_type};
//!
//! let authorizer = Authorizer::new(AllowList::load(Some("alice@example.com; bob@example.com")));
//!
//! let alice = ClaimSet::new().with_claim(claim_type::UPN, "Alice@Example.com");
//! assert!(authorizer.authorize(&alice).is_allowed());
//!
//! let guest = ClaimSet::new().with_claim(claim_type::EMAIL, "bob smith@x.com");
//! let decision = authorizer.authorize(&guest);
//! assert_eq!(
//!     decision.redirect_location().as_deref(),
//!     Some("/Account/InvalidUser?upn=bob%20smith%40x.com"),
//! );
//! ```

pub mod allow_list;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod oidc;
pub mod prompt;
pub mod session;

// Re-export main types at crate root
pub use allow_list::AllowList;
pub use authorize::{
    Authorizer, Decision, INVALID_USER_PARAM, INVALID_USER_PATH, invalid_user_location,
    resolve_identity,
};
pub use claims::{ClaimSet, claim_type};
pub use error::{AuthenticationError, AuthorizationError, Result};
pub use oidc::OidcConfig;
pub use prompt::{RequestKind, should_force_login_prompt};
pub use session::{Session, SessionId};
