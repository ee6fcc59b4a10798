// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingress for the Wahook engine.
//!
//! A small axum server with one job: acknowledge the provider's delivery
//! immediately, then run normalization, recovery capture, and rule
//! dispatch off the request path.

pub mod handlers;
pub mod server;

pub use server::{start_server, GatewayState, ServerConfig};
