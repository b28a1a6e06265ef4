// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the jwks-server project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! 405 Method Not Allowed routes
//!
//! Rocket answers a request whose method matches no route with 404. The key
//! set and token endpoints must instead answer 405, so every other method on
//! those paths is mounted onto a handler returning it along with an `Allow`
//! header.

use log::debug;
use rocket::http::{Header, Method};
use rocket::route::{Handler, Outcome};
use rocket::{Data, Request, Responder, Route};

/// Methods answered with 405 when not the allowed one
const GUARDED_METHODS: [Method; 7] = [
    Method::Get,
    Method::Head,
    Method::Post,
    Method::Put,
    Method::Delete,
    Method::Patch,
    Method::Options,
];

#[derive(Responder)]
#[response(status = 405, content_type = "plain")]
struct NotAllowed {
    body: &'static str,
    allow: Header<'static>,
}

/// Route handler rejecting every request with 405
#[derive(Clone)]
pub struct MethodNotAllowed {
    allow: Method,
}

#[rocket::async_trait]
impl Handler for MethodNotAllowed {
    async fn handle<'r>(&self, req: &'r Request<'_>, _data: Data<'r>) -> Outcome<'r> {
        debug!("Rejecting {} {} (allowed: {})", req.method(), req.uri(), self.allow);
        Outcome::from(
            req,
            NotAllowed {
                body: "method not allowed",
                allow: Header::new("Allow", self.allow.as_str()),
            },
        )
    }
}

/// Routes answering 405 on `path` for every method except `allow`
///
/// `HEAD` stays routed to `GET` when `GET` is the allowed method.
pub fn method_not_allowed_routes(path: &str, allow: Method) -> Vec<Route> {
    GUARDED_METHODS
        .iter()
        .copied()
        .filter(|method| *method != allow)
        .filter(|method| !(allow == Method::Get && *method == Method::Head))
        .map(|method| Route::new(method, path, MethodNotAllowed { allow }))
        .collect()
}
