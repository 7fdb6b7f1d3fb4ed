// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use actix_web::http::header::{
    REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use actix_web::middleware::DefaultHeaders;

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Fixed security headers added to every response that does not set them itself.
pub fn security_headers(dev_mode: bool) -> DefaultHeaders {
    let headers = DefaultHeaders::new()
        .add((X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((X_FRAME_OPTIONS, "DENY"))
        .add((REFERRER_POLICY, "strict-origin-when-cross-origin"));
    if dev_mode {
        headers
    } else {
        headers.add((STRICT_TRANSPORT_SECURITY, HSTS_VALUE))
    }
}
