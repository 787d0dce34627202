//! Mapping of HTTP and payload failures onto `RemoteError`

use std::error::Error as StdError;

use listsync_core::RemoteError;
use listsync_domain::TransportErrorCodes;
use serde_json::Value;

/// Classify a reqwest failure using the configured transport codes.
///
/// Timeouts, name resolution failures and other connect failures get their
/// transport code; everything else is a protocol error.
pub fn transport_error(err: reqwest::Error, codes: &TransportErrorCodes) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::transport(codes.timeout, err.to_string());
    }
    if err.is_connect() {
        let message = error_chain(&err);
        let code = if is_name_lookup_failure(&message) { codes.name_lookup } else { codes.connect };
        return RemoteError::transport(code, message);
    }
    RemoteError::Protocol(error_chain(&err))
}

/// `{ "error": "...", "code": 215 }` style fault payload, if `value` is one.
pub(crate) fn fault_from(value: &Value) -> Option<RemoteError> {
    let object = value.as_object()?;
    let message = object.get("error")?;
    let code = match object.get("code")? {
        Value::Number(number) => number.as_i64().and_then(|code| i32::try_from(code).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }?;
    let message = message.as_str().map_or_else(|| message.to_string(), str::to_string);
    Some(RemoteError::Fault { code, message })
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_name_lookup_failure(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
        || lower.contains("no such host")
}
