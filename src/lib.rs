//! # Sesio (Session Token Lifecycle)
//!
//! `sesio` is the authentication core of a posting API: it issues, rotates,
//! validates, and revokes paired access/refresh tokens.
//!
//! ## Token Model
//!
//! Every login mints a pair of signed tokens carrying the same random session
//! nonce: a short-lived access token (default 1 hour) and a long-lived,
//! single-use refresh token (default 7 days). The set of currently valid
//! refresh tokens is the only session state; an access token is accepted only
//! while a stored refresh token carries its nonce.
//!
//! ## Rotation & Reuse Detection
//!
//! Exchanging a refresh token removes it from the active set and inserts a
//! freshly minted pair under a new nonce, as a single atomic swap against the
//! credential store. Presenting a refresh token that is no longer in the set
//! is treated as a replay of a stolen or already-consumed token: every session
//! for the account is revoked before the request is denied.
//!
//! ## Session Policy
//!
//! - A successful password login replaces the active set; it does not append.
//!   Concurrent multi-device sessions are created by rotation, not by login.
//! - Logout clears the whole active set ("log out everywhere").
//! - Expiry is checked lazily at verification time; nothing is swept in the
//!   background.

pub mod api;
pub mod cli;
pub mod session;
pub mod store;
pub mod token;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
