use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

use crate::core::config::{LAUNCHER_NAME, LAUNCHER_VERSION};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared client for every manifest and artifact request.
///
/// `identity` encoding keeps byte counts equal to the declared artifact
/// sizes, which progress accounting depends on.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(format!("{}/{}", LAUNCHER_NAME, LAUNCHER_VERSION))
        .default_headers(default_headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
}
