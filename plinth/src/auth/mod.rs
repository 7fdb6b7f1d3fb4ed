// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
pub mod clock;
pub mod cookie;
mod credentials;
pub mod middleware;
mod password;
pub mod payload;
mod service;
pub mod session;
mod store;
pub(crate) mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use cookie::{SESSION_COOKIE_NAME, clear_session_cookie, session_cookie, session_token};
pub use credentials::CredentialStore;
pub use middleware::{AuthRequest, RequireAuth};
pub use password::{PasswordParams, hash_password, verify_password};
pub use payload::{Payload, PayloadError, SessionValue};
pub use service::{AuthService, Authenticator};
pub use session::{Session, SessionManager};
pub use store::AuthStore;
pub use types::{AuthError, User};
