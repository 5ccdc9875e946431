//! Response recording sink.
//!
//! [`ResponseRecorder`] keeps a copy of what the handler wrote: the status,
//! the headers and every body chunk, in order. The response itself is not
//! held back; chunks are copied here as they stream past (see
//! `middleware::recording_body`).

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, response::Parts};
use bytes::BytesMut;

#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any existing value of `name`.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    /// Sets the status code. Only the first call has an effect.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    /// Appends body bytes, committing a 200 status if none was written yet.
    pub fn write(&mut self, chunk: &[u8]) {
        self.write_header(StatusCode::OK);
        self.body.extend_from_slice(chunk);
    }

    /// Records the status line and headers of a response about to be sent.
    pub fn record_head(&mut self, parts: &Parts) {
        self.write_header(parts.status);
        for (name, value) in &parts.headers {
            self.append_header(name.clone(), value.clone());
        }
    }

    /// Recorded status, 200 when nothing was set explicitly.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use axum::response::{IntoResponse, Response};

    #[test]
    fn test_first_status_wins() {
        let mut rec = ResponseRecorder::new();
        assert_eq!(rec.status(), StatusCode::OK);

        rec.write_header(StatusCode::NOT_FOUND);
        rec.write_header(StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(rec.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_write_commits_ok_and_concatenates() {
        let mut rec = ResponseRecorder::new();
        rec.write(b"Hello ");
        rec.write(b"World");
        rec.write(b"!");
        rec.write_header(StatusCode::BAD_GATEWAY);

        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(rec.body_text(), "Hello World!");
    }

    #[test]
    fn test_record_head_copies_status_and_headers() {
        let response = (
            StatusCode::CREATED,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"id":1}"#,
        )
            .into_response();
        let (parts, _) = response.into_parts();

        let mut rec = ResponseRecorder::new();
        rec.record_head(&parts);

        assert_eq!(rec.status(), StatusCode::CREATED);
        assert_eq!(rec.headers()[header::CONTENT_TYPE], "application/json");
        assert!(rec.body().is_empty());
    }

    #[test]
    fn test_record_head_keeps_multi_value_headers() {
        let response = Response::builder()
            .header(header::SET_COOKIE, "a=1")
            .header(header::SET_COOKIE, "b=2")
            .body(Body::empty())
            .unwrap();
        let (parts, _) = response.into_parts();

        let mut rec = ResponseRecorder::new();
        rec.record_head(&parts);

        let cookies: Vec<_> = rec.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
    }
}
