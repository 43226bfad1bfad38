//! HTTP(S) plumbing, everything is based on async reqwest driven by the
//! blocking facade of [`crate::tokio`].

use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::header;
use reqwest::{Client, ClientBuilder, Method};
use serde_json::Value;


/// The user agent used on every HTTP request made by this crate.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Get a new client builder for async HTTP(S) requests.
pub(crate) fn builder() -> ClientBuilder {
    Client::builder().user_agent(USER_AGENT)
}

/// Return the singleton client instance used internally by the crate.
pub(crate) fn client() -> reqwest::Result<Client> {
    static INSTANCE: OnceCell<Client> = OnceCell::new();
    let inst = INSTANCE.get_or_try_init(|| {
        builder().build()
    })?;
    Ok(inst.clone())
}

/// Body of a [`json_request`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Body<'a> {
    /// No request body.
    None,
    /// A JSON body with `Content-Type: application/json`.
    Json(&'a Value),
    /// An url-encoded form body.
    Form(&'a [(&'a str, &'a str)]),
}

/// Make a request against a JSON endpoint and return the status code together
/// with the parsed document. The status is returned as-is, error statuses also
/// carry a JSON body on the APIs this crate talks to.
///
/// When the response body cannot be parsed as JSON, the function returns
/// [`JsonRequestError::InvalidResponseNotJson`], unless `ignore_error` is set,
/// in which case the raw body is returned under a single `raw` key.
pub(crate) fn json_request(
    method: Method,
    url: &str,
    body: Body,
    bearer: Option<&str>,
    ignore_error: bool,
    timeout: Option<Duration>,
) -> Result<(u16, Value), JsonRequestError> {
    crate::tokio::sync(json_request_async(method, url, body, bearer, ignore_error, timeout))
}

/// Shortcut for a GET [`json_request`] that fails on non-JSON responses.
pub(crate) fn json_simple_request(url: &str, timeout: Option<Duration>) -> Result<Value, JsonRequestError> {
    json_request(Method::GET, url, Body::None, None, false, timeout).map(|(_, data)| data)
}

async fn json_request_async(
    method: Method,
    url: &str,
    body: Body<'_>,
    bearer: Option<&str>,
    ignore_error: bool,
    timeout: Option<Duration>,
) -> Result<(u16, Value), JsonRequestError> {

    let mut req = client()?
        .request(method.clone(), url)
        .header(header::ACCEPT, "application/json");

    req = match body {
        Body::None => req,
        Body::Json(value) => req.json(value),
        Body::Form(pairs) => req.form(pairs),
    };

    if let Some(bearer) = bearer {
        req = req.bearer_auth(bearer);
    }

    if let Some(timeout) = timeout {
        req = req.timeout(timeout);
    }

    let res = req.send().await?;
    let status = res.status().as_u16();
    let data = res.bytes().await?;

    match serde_json::from_slice::<Value>(&data) {
        Ok(value) => Ok((status, value)),
        // A 204 has no body at all, it should not be treated as malformed.
        Err(_) if data.is_empty() => Ok((status, Value::Null)),
        Err(_) if ignore_error => {
            let raw = String::from_utf8_lossy(&data).into_owned();
            Ok((status, serde_json::json!({ "raw": raw })))
        }
        Err(_) => Err(JsonRequestError::InvalidResponseNotJson {
            url: url.to_string(),
            method: method.as_str().to_string(),
            status,
            body: String::from_utf8_lossy(&data).into_owned(),
        }),
    }

}

/// Error while requesting a JSON endpoint.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum JsonRequestError {
    /// The endpoint returned a body that cannot be parsed as JSON.
    #[error("invalid non-json response: {status} @ {method} {url}")]
    InvalidResponseNotJson {
        url: String,
        method: String,
        status: u16,
        body: String,
    },
    /// Reqwest transport-level error.
    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
}
