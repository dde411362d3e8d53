use std::fmt;

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::{RequestConfig, ResponseType};
use crate::headers::Headers;
use crate::transport::{BodyStream, RawResponse};

/// Decoded response data.
#[derive(Clone, Debug, PartialEq)]
pub enum Data {
    /// No body was decoded (stream responses, or a failed body read).
    None,
    /// Body text that did not parse as JSON.
    Text(String),
    /// Parsed JSON value.
    Json(serde_json::Value),
    /// Raw bytes ([`ResponseType::Bytes`]).
    Bytes(Bytes),
}

impl Data {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Data::None)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Data::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Data::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Data::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Response envelope returned to callers.
///
/// Created fresh per call and owned by the call's future; response
/// interceptors may replace it wholesale.
pub struct Response {
    pub status: StatusCode,
    pub status_text: String,
    /// The effective options this call ran with.
    pub config: RequestConfig,
    pub data: Data,
    pub headers: Headers,
    /// Final dispatched URL (base URL + query applied).
    pub url: String,
    /// Raw body stream handle, set only for [`ResponseType::Stream`].
    pub body: Option<BodyStream>,
}

impl Response {
    /// Deserialize the decoded data into a typed value.
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error when the data does not
    /// match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            Data::Json(value) => serde_json::from_value(value.clone()),
            Data::Text(text) => serde_json::from_str(text),
            Data::Bytes(bytes) => serde_json::from_slice(bytes),
            Data::None => serde_json::from_value(serde_json::Value::Null),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl Clone for Response {
    fn clone(&self) -> Self {
        // The raw stream handle is not duplicable; stream responses bypass
        // the tag cache, which is the only cloner.
        Self {
            status: self.status,
            status_text: self.status_text.clone(),
            config: self.config.clone(),
            data: self.data.clone(),
            headers: self.headers.clone(),
            url: self.url.clone(),
            body: None,
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("data", &self.data)
            .field("headers", &self.headers)
            .field("url", &self.url)
            .field("has_body_stream", &self.body.is_some())
            .finish()
    }
}

/// Read and decode the body per the declared response type.
///
/// `Text` and `Json` both read text and then unconditionally attempt a
/// JSON parse, keeping the raw text when parsing fails. Body read failures
/// are swallowed the same way ([`Data::None`]); decoding never rejects.
/// `Stream` never reaches here; the pipeline short-circuits first.
pub(crate) async fn decode_body(raw: RawResponse, response_type: ResponseType) -> Data {
    match response_type {
        ResponseType::Bytes => match raw.bytes().await {
            Ok(bytes) => Data::Bytes(bytes),
            Err(_) => Data::None,
        },
        ResponseType::Text | ResponseType::Json | ResponseType::Stream => {
            match raw.text().await {
                Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(value) => Data::Json(value),
                    Err(_) => Data::Text(text),
                },
                Err(_) => Data::None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn raw(body: &str) -> RawResponse {
        RawResponse::new(
            StatusCode::OK,
            Headers::new(),
            Bytes::copy_from_slice(body.as_bytes()),
        )
    }

    #[tokio::test]
    async fn json_bodies_parse_even_for_text_response_type() {
        let data = decode_body(raw(r#"{"a":1}"#), ResponseType::Text).await;
        assert_eq!(data, Data::Json(serde_json::json!({"a": 1})));
    }

    #[tokio::test]
    async fn non_json_bodies_fall_back_to_raw_text() {
        let data = decode_body(raw("plain text, not json"), ResponseType::Json).await;
        assert_eq!(data, Data::Text("plain text, not json".into()));
    }

    #[tokio::test]
    async fn bytes_reader_skips_json_parse() {
        let data = decode_body(raw(r#"{"a":1}"#), ResponseType::Bytes).await;
        assert_eq!(data, Data::Bytes(Bytes::from_static(br#"{"a":1}"#)));
    }

    #[test]
    fn typed_accessor_reads_json_data() {
        #[derive(Deserialize)]
        struct Item {
            a: u32,
        }

        let response = Response {
            status: StatusCode::OK,
            status_text: "OK".into(),
            config: RequestConfig::default(),
            data: Data::Json(serde_json::json!({"a": 7})),
            headers: Headers::new(),
            url: String::new(),
            body: None,
        };

        let item: Item = response.json().unwrap();
        assert_eq!(item.a, 7);
    }

    #[test]
    fn clone_drops_stream_handle() {
        let response = Response {
            status: StatusCode::OK,
            status_text: "OK".into(),
            config: RequestConfig::default(),
            data: Data::None,
            headers: Headers::new(),
            url: String::new(),
            body: Some(Box::pin(futures::stream::empty())),
        };

        let cloned = response.clone();
        assert!(cloned.body.is_none());
        assert!(response.body.is_some());
    }
}
