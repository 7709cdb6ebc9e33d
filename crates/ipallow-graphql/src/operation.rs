//! Request envelope, raw response and typed operation traits.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::GraphqlError;

/// Named variable bindings of a request.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Variable name the pagination engine uses for the continuation cursor.
pub const AFTER_VARIABLE: &str = "after";

/// GraphQL request envelope: query text plus its variables.
///
/// `variables` always serializes as a JSON object, never `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    /// Query text.
    pub query: String,
    /// Variables.
    #[serde(default)]
    pub variables: Variables,
}

impl GraphqlRequest {
    /// Create a request without variables.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Variables::new(),
        }
    }

    /// Create a request with the given variables.
    #[must_use]
    pub fn with_variables(query: impl Into<String>, variables: Variables) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }

    /// Bind a variable, replacing any previous value.
    #[must_use]
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Bind a variable in place, replacing any previous value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Look up a bound variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&serde_json::Value> {
        self.variables.get(name)
    }
}

/// Typed GraphQL operation definition.
///
/// Implement this trait for each query or mutation.
pub trait GraphqlOperation {
    /// Shape of the `data` payload.
    type ResponseData: DeserializeOwned + Send;

    /// GraphQL query text.
    const QUERY: &'static str;
    /// Operation name, used for logging.
    const OPERATION_NAME: &'static str;

    /// Build the request envelope for the given variables.
    fn request(variables: Variables) -> GraphqlRequest {
        GraphqlRequest::with_variables(Self::QUERY, variables)
    }
}

/// Raw response envelope with `data` left undecoded.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
    /// Response data, decoded only when no errors were reported.
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
    /// GraphQL errors.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<GraphqlError>,
}

impl GraphqlResponse {
    /// Returns `true` if no GraphQL errors were returned.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_empty_variables_as_object() {
        let request = GraphqlRequest::new("query { viewer { id } }");
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"query": "query { viewer { id } }", "variables": {}})
        );
    }

    #[test]
    fn set_variable_overwrites_previous_value() {
        let mut request = GraphqlRequest::new("q").with_variable(AFTER_VARIABLE, "c1");
        request.set_variable(AFTER_VARIABLE, "c2");
        assert_eq!(
            request.variable(AFTER_VARIABLE),
            Some(&serde_json::Value::from("c2"))
        );
        assert_eq!(request.variables.len(), 1);
    }

    #[test]
    fn response_accepts_null_errors_and_missing_data() {
        let response: GraphqlResponse =
            serde_json::from_str(r#"{"errors": null}"#).expect("response");
        assert!(response.is_ok());
        assert!(response.data.is_none());
    }

    #[test]
    fn response_keeps_data_alongside_errors() {
        let response: GraphqlResponse = serde_json::from_str(
            r#"{"data": {"viewer": {"id": "1"}}, "errors": [{"message": "partial"}]}"#,
        )
        .expect("response");
        assert!(!response.is_ok());
        assert!(response.data.is_some());
    }
}
