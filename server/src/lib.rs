//! JustEase chat relay — per-case chat rooms over WebSocket.
//!
//! Victims and the lawyers handling their cases talk through a room named
//! after the case. The relay keeps no history: it admits authenticated
//! sessions into rooms, fans each inbound message out to the room's current
//! members, and forgets everything on restart.

pub mod auth;
pub mod config;
pub mod engine;
pub mod web;

mod integration_tests;
