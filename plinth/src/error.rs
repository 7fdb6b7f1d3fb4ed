// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
//! Generic error pages. Bodies never carry internal detail.

use actix_web::HttpResponse;

const INTERNAL_ERROR_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>500 - Internal Server Error</title></head>
<body><h1>500 - Internal Server Error</h1></body></html>"#;

const NOT_FOUND_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>404 - Page Not Found</title></head>
<body><h1>404 - Page Not Found</h1></body></html>"#;

pub fn internal_error_response() -> HttpResponse {
    HttpResponse::InternalServerError()
        .content_type("text/html; charset=utf-8")
        .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
        .body(INTERNAL_ERROR_HTML)
}

pub fn not_found_response() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
        .body(NOT_FOUND_HTML)
}
