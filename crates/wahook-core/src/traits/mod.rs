// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the ingestion core and its collaborators.

pub mod actions;
pub mod notify;
pub mod store;

pub use actions::ActionSink;
pub use notify::{Notifier, NullNotifier};
pub use store::StoreGateway;
