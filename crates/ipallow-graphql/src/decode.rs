//! Response decoding and error classification.
//!
//! Classification order: status, envelope, API errors, typed data. Each step
//! only runs when the previous one succeeded.

use serde::de::DeserializeOwned;

use crate::error::{BatchError, GraphqlClientError};
use crate::operation::GraphqlResponse;
use crate::transport::HttpResponse;

/// Classify a completed exchange and decode its `data` into `R`.
pub fn classify<R: DeserializeOwned>(response: &HttpResponse) -> Result<R, GraphqlClientError> {
    if response.status.as_u16() >= 300 {
        return Err(GraphqlClientError::HttpStatus {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        });
    }

    let envelope: GraphqlResponse = serde_json::from_slice(&response.body)
        .map_err(|err| GraphqlClientError::Decode(err.to_string()))?;

    decode_envelope(envelope)
}

/// Turn a parsed envelope into typed data or a batch error.
pub fn decode_envelope<R: DeserializeOwned>(
    envelope: GraphqlResponse,
) -> Result<R, GraphqlClientError> {
    if !envelope.errors.is_empty() {
        return Err(GraphqlClientError::Batch(BatchError::new(envelope.errors)));
    }

    let data = envelope.data.as_deref().map_or("null", |raw| raw.get());
    serde_json::from_str(data).map_err(|err| GraphqlClientError::FieldDecode(err.to_string()))
}
