//! Client-side session protocol for the JustEase chat relay.
//!
//! Provides:
//! - Connection lifecycle (connect, disconnect, automatic reconnect with
//!   bounded exponential backoff)
//! - Send gating on connection state (suppressed, never errored)
//! - Identity derivation from the stored auth session
//!
//! The UI layer owns a [`RoomClient`] per open chat view, drives its event
//! receiver, and enables the send affordance only while connected.

pub mod auth;
pub mod backoff;
pub mod client;

pub use auth::{AuthSession, UserRecord};
pub use client::{ClientError, ClientEvent, ConnectionState, RoomClient};
