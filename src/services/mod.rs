// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cipher;
pub mod linkedin;
pub mod profile;
pub mod session;

pub use cipher::TokenCipher;
pub use linkedin::{LinkedInClient, LinkedInService, RefreshOutcome};
pub use session::{AuthUser, SessionCodec};
