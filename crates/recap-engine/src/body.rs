use recap_common::{ChunkBytes, RequestBody};
use serde_json::Value;
use tracing::debug;

/// Decodes the first raw chunk of a request body into `parsed` (JSON) or
/// `text` (anything else). Does nothing once either is set, so repeated
/// merges never decode twice.
pub fn decode_request_body(body: &mut RequestBody) {
    if body.parsed.is_some() || body.text.is_some() {
        return;
    }
    let Some(raw) = &body.raw else {
        return;
    };
    let Some(first) = raw.first() else {
        body.parsed = Some(Value::Null);
        return;
    };

    let text = match &first.bytes {
        Some(ChunkBytes::Octets(bytes)) => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(e) => {
                debug!(error = %e, "Request body is not valid UTF-8; decoding lossily");
                String::from_utf8_lossy(bytes).into_owned()
            }
        },
        Some(ChunkBytes::Text(text)) => text.clone(),
        None => return,
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(parsed) => body.parsed = Some(parsed),
        Err(e) => {
            debug!(error = %e, "Request body is not JSON; keeping decoded text");
            body.text = Some(text);
        }
    }
}
