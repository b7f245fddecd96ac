//! Socket endpoint URL construction.

use url::Url;

use crate::{error::ClientError, transport::SocketParams};

/// Serializer version negotiated through the `vsn` query parameter
pub const PROTOCOL_VERSION: &str = "2.0.0";

/// Build the WebSocket URL for a Phoenix socket mounted at `base_url`.
///
/// Phoenix serves the WebSocket transport under `<mount>/websocket`; the
/// connection parameters and the serializer version go into the query string.
pub fn endpoint_url(base_url: &str, params: &SocketParams) -> Result<Url, ClientError> {
    let joined = format!("{}/websocket", base_url.trim_end_matches('/'));
    let mut url = Url::parse(&joined).map_err(|source| ClientError::InvalidEndpoint {
        url: base_url.to_string(),
        source,
    })?;

    {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
        query.append_pair("vsn", PROTOCOL_VERSION);
    }

    Ok(url)
}

/// Endpoint for log lines, with the query string (and its token) stripped
pub(crate) fn display_endpoint(url: &Url) -> String {
    let mut display = url.clone();
    display.set_query(None);
    display.to_string()
}
