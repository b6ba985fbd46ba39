//! Request parameter encoding
//!
//! Callers pick the wire shape explicitly: `Params::Form` for URL-encoded
//! key/value pairs, `Params::Json` for a JSON document. GET and DELETE
//! requests append the encoded pairs to the query string; POST and PUT
//! send them as the body with the matching Content-Type.

use serde_json::Value;

use crate::error::{Error, Result};

/// Parameters for one API request.
#[derive(Debug, Clone)]
pub enum Params {
    /// Key/value pairs, URL-encoded into the query string or form body
    Form(Vec<(String, String)>),
    /// JSON document, sent verbatim as the body on POST/PUT
    Json(Value),
}

impl Params {
    /// No parameters.
    pub fn none() -> Self {
        Params::Form(Vec::new())
    }

    /// URL-encoded key/value parameters.
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Params::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// JSON parameters.
    pub fn json(value: Value) -> Self {
        Params::Json(value)
    }

    /// Encode for a query string (GET/DELETE).
    ///
    /// JSON params are accepted here when the document is a flat object;
    /// null entries are skipped, nested values are rejected rather than
    /// flattened into an undocumented bracket syntax.
    pub(crate) fn to_query(&self) -> Result<String> {
        match self {
            Params::Form(pairs) => serde_urlencoded::to_string(pairs)
                .map_err(|e| Error::Encode(format!("query string: {e}"))),
            Params::Json(Value::Null) => Ok(String::new()),
            Params::Json(Value::Object(map)) => {
                let mut pairs: Vec<(&str, String)> = Vec::with_capacity(map.len());
                for (key, value) in map {
                    match value {
                        Value::Null => {}
                        Value::String(s) => pairs.push((key, s.clone())),
                        Value::Bool(b) => pairs.push((key, b.to_string())),
                        Value::Number(n) => pairs.push((key, n.to_string())),
                        Value::Array(_) | Value::Object(_) => {
                            return Err(Error::Encode(format!(
                                "query parameter `{key}` is nested; only scalar values can be query-encoded"
                            )));
                        }
                    }
                }
                serde_urlencoded::to_string(&pairs)
                    .map_err(|e| Error::Encode(format!("query string: {e}")))
            }
            Params::Json(_) => Err(Error::Encode(
                "JSON query parameters must be an object of scalar values".into(),
            )),
        }
    }

    /// Encode for a request body (POST/PUT): bytes plus Content-Type.
    pub(crate) fn to_body(&self) -> Result<(Vec<u8>, &'static str)> {
        match self {
            Params::Form(pairs) => {
                let encoded = serde_urlencoded::to_string(pairs)
                    .map_err(|e| Error::Encode(format!("form body: {e}")))?;
                Ok((encoded.into_bytes(), "application/x-www-form-urlencoded"))
            }
            Params::Json(value) => {
                let encoded = serde_json::to_vec(value)
                    .map_err(|e| Error::Encode(format!("JSON body: {e}")))?;
                Ok((encoded, "application/json"))
            }
        }
    }
}
