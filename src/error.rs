//! Error types for the placeholder API.
//!
//! - [`ConfigError`]: startup configuration that cannot be recovered from.
//! - [`ServerError`]: binding or running the listener.
//! - [`ApiError`]: a request the service rejects. It converts into a JSON
//!   response via [`IntoResponse`], so handlers can return
//!   `Result<Payload, ApiError>` and let axum render either side.

use std::{io, num::ParseIntError};

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::payload::Payload;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid SERVICE_PORT `{value}`: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("accept loop failed: {0}")]
    Serve(#[source] io::Error),

    #[error("server task ended abnormally: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A request the service does not serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("no route for the requested path")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn payload(self) -> Payload {
        match self {
            Self::NotFound => Payload::new("not_found"),
            Self::MethodNotAllowed => Payload::new("method_not_allowed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), self.payload()).into_response();
        if self == Self::MethodNotAllowed {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET"));
        }
        response
    }
}
