use crate::http::HttpClient;
use crate::DartError;
use tracing::warn;

/// The ZIP-packaged registry of every company filing with OpenDart.
pub mod corp_code;

/// Parsed `CORPCODE.xml`; company identifiers, names and stock codes.
pub mod registry;

/// Single-company key accounts (`fnlttSinglAcnt`).
pub mod statement;

pub const BASE_URL: &str = "https://opendart.fss.or.kr/api";

/// Length of the authentication key issued by OpenDart.
pub const KEY_LENGTH: usize = 40;

/// OpenDart authentication key (`crtfc_key`).
///
/// `Debug` and `Display` only show the first 8 characters.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, trimming surrounding whitespace.
    ///
    /// Keys of an unexpected length are accepted (the API is the judge), with a warning.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into().trim().to_string();
        if key.chars().count() != KEY_LENGTH {
            warn!(
                "API key has {} characters, expected {KEY_LENGTH}",
                key.chars().count()
            );
        }
        Self(key)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn has_expected_length(&self) -> bool {
        self.0.chars().count() == KEY_LENGTH
    }

    fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        format!("{prefix}...")
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKey").field(&self.redacted()).finish()
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Handle on the OpenDart API: an HTTP client, the endpoint root and the key.
#[derive(Clone, Debug)]
pub struct DartClient {
    http_client: HttpClient,
    base_url: String,
    key: ApiKey,
}

impl DartClient {
    pub fn new(key: ApiKey) -> Result<Self, DartError> {
        Ok(Self::with_client(crate::std_client_build(None)?, key))
    }

    pub fn with_client(http_client: HttpClient, key: ApiKey) -> Self {
        Self {
            http_client,
            base_url: BASE_URL.to_string(),
            key,
        }
    }

    /// Point the client at another endpoint root (a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn key(&self) -> &ApiKey {
        &self.key
    }

    pub(crate) fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http_client
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
