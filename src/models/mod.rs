// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod user;

pub use profile::NormalizedProfile;
pub use user::{ProfileUpdate, TokenUpdate, User, UserUpsert};
