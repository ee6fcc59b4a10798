// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event-type mappers from raw record objects to canonical records.
//!
//! Each mapper is pure: given one record object produced by shape
//! detection, it yields one canonical record (or a tagged alternative,
//! for the reaction special case) without touching the store.

pub mod calls;
pub mod chats;
pub mod contacts;
pub mod groups;
pub mod messages;
