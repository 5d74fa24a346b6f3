//! The JSON body returned by every endpoint.

use std::io;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::ser::Formatter;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// `{"status": "<value>"}`. Built fresh for each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payload {
    status: &'static str,
}

impl Payload {
    pub const fn new(status: &'static str) -> Self {
        Self { status }
    }

    pub const fn ok() -> Self {
        Self::new("ok")
    }

    /// Encode as `{"status": "ok"}`, with a space after `:` and `,`.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut body = Vec::with_capacity(32);
        let mut ser = serde_json::Serializer::with_formatter(&mut body, SpacedFormatter);
        self.serialize(&mut ser)?;
        Ok(body)
    }
}

/// Compact JSON with `": "` between key and value and `", "` between entries.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }
}

/// Renders as `200 OK` with [`JSON_CONTENT_TYPE`]. Pair with a status code,
/// e.g. `(StatusCode::NOT_FOUND, payload)`, for anything else.
impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        match self.to_json() {
            Ok(body) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode payload");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
