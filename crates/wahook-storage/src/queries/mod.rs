// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for natural-key upserts and reads on canonical entities.

pub mod calls;
pub mod chats;
pub mod contacts;
pub mod groups;
pub mod messages;
pub mod reactions;
pub mod rules;
pub mod status_updates;
