use super::registry::{registry_filename, Registry, Summary};
use super::DartClient;
use crate::fs::{find_files, save_response, unzip, write_json};
use crate::{DartError, Status};
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

// 1. GET corpCode.xml?crtfc_key=...
// 2. XML content => status envelope; map the code and abort
// 3. anything else => the zip; stream it to corpCode_YYYYMMDD.zip
// 4. OPTIONAL: unzip, parse CORPCODE.xml, clean up

const ENDPOINT: &str = "corpCode.xml";

/// Scratch directory, inside the output directory, that the registry is unzipped into.
pub const SCRATCH_DIR: &str = "corpcode_temp";

/// The status document OpenDart sends, in place of a file, when a request fails.
///
/// ```xml
/// <result>
///     <status>013</status>
///     <message>조회된 데이타가 없습니다.</message>
/// </result>
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorEnvelope {
    pub fn from_xml(bytes: &[u8]) -> Result<Self, DartError> {
        let text = String::from_utf8_lossy(bytes);
        let envelope: ErrorEnvelope = quick_xml::de::from_str(&text)?;
        Ok(envelope)
    }

    pub fn known_status(&self) -> Option<Status> {
        Status::from_code(&self.status)
    }
}

impl From<ErrorEnvelope> for DartError {
    fn from(envelope: ErrorEnvelope) -> Self {
        DartError::Api {
            status: envelope.status.trim().to_string(),
            message: envelope.message.trim().to_string(),
        }
    }
}

/// A registry archive saved to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub size: u64,
}

/// Name of the saved archive for `date`; e.g., `corpCode_20240131.zip`.
pub fn corp_code_filename(date: NaiveDate) -> String {
    format!("corpCode_{}.zip", date.format("%Y%m%d"))
}

/// Whether the response declares itself as XML (`application/xml`, `text/xml`, ...).
pub fn is_xml(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("xml"))
}

impl DartClient {
    /// Download the company-code registry into `out_dir`, named for `date`.
    ///
    /// Nothing is written when the API answers with a status envelope; the envelope is
    /// returned as [`DartError::Api`]. Connection failures and non-2xx statuses are returned
    /// as [`DartError::Http`], untouched.
    pub async fn download_corp_code(
        &self,
        out_dir: &Path,
        date: NaiveDate,
        tui: bool,
    ) -> Result<Download, DartError> {
        let time = std::time::Instant::now();
        let url = self.endpoint(ENDPOINT);
        info!("requesting {url} with key {}", self.key());

        let response = self
            .http()
            .get(&url)
            .query(&[("crtfc_key", self.key().expose())])
            .send()
            .await
            .map_err(|err| {
                error!("failed to request {url}, error({err})");
                err
            })?
            .error_for_status()
            .map_err(|err| {
                error!("{url} responded with an error status, error({err})");
                err
            })?;
        trace!("response headers: {:?}", response.headers());

        // an XML body is the status envelope, never the registry
        if is_xml(response.headers()) {
            let body = response.bytes().await?;
            let envelope = ErrorEnvelope::from_xml(&body).map_err(|err| {
                error!("failed to parse status envelope, error({err})");
                err
            })?;
            match envelope.known_status() {
                Some(status) => error!("OpenDart refused the download: {status}"),
                None => warn!(
                    "OpenDart refused the download with unknown status {}",
                    envelope.status
                ),
            }
            return Err(envelope.into());
        }

        let path = out_dir.join(corp_code_filename(date));
        let size = save_response(response, &path, tui).await.map_err(|err| {
            error!("failed to save {}, error({err})", path.display());
            err
        })?;

        info!(
            "registry saved to {} ({size} bytes). {}",
            path.display(),
            crate::time_elapsed(time)
        );

        Ok(Download { path, size })
    }
}

/// Unzip a registry archive into `scratch_dir`, parse the first `.xml` file found, and remove
/// `scratch_dir` again.
///
/// A leftover `scratch_dir` from an earlier run is removed first.
pub async fn extract_registry(
    zip_file: &Path,
    scratch_dir: &Path,
    tui: bool,
) -> Result<Registry, DartError> {
    if tokio::fs::try_exists(scratch_dir).await? {
        debug!("removing stale scratch directory {}", scratch_dir.display());
        tokio::fs::remove_dir_all(scratch_dir).await?;
    }

    unzip(zip_file, scratch_dir, tui).await.map_err(|err| {
        error!("failed to unzip {}, error({err})", zip_file.display());
        err
    })?;

    let result = parse_first_xml(scratch_dir).await;

    debug!("removing scratch directory {}", scratch_dir.display());
    if let Err(err) = tokio::fs::remove_dir_all(scratch_dir).await {
        warn!(
            "failed to remove scratch directory {}, error({err})",
            scratch_dir.display()
        );
    }

    result
}

/// A registry converted to JSON.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub json_path: PathBuf,
    pub registry: Registry,
    pub summary: Summary,
}

/// Write `registry` to `out_dir` as `corpcode_YYYYMMDD_HHMMSS.json`, stamped with `now`.
pub async fn export_registry(
    registry: Registry,
    out_dir: &Path,
    now: NaiveDateTime,
) -> Result<Conversion, DartError> {
    let json_path = out_dir.join(registry_filename(now));
    write_json(&registry, &json_path).await.map_err(|err| {
        error!("failed to write {}, error({err})", json_path.display());
        err
    })?;

    let summary = registry.summary();
    info!(
        "registry written to {}: {} companies, {} listed, {} unlisted",
        json_path.display(),
        summary.total,
        summary.listed,
        summary.unlisted
    );

    Ok(Conversion {
        json_path,
        registry,
        summary,
    })
}

/// Unzip a downloaded archive, export the registry as JSON into `out_dir` and, unless
/// `keep_zip`, delete the archive.
pub async fn convert_download(
    download: &Download,
    out_dir: &Path,
    keep_zip: bool,
    now: NaiveDateTime,
    tui: bool,
) -> Result<Conversion, DartError> {
    let registry = extract_registry(&download.path, &out_dir.join(SCRATCH_DIR), tui).await?;
    let conversion = export_registry(registry, out_dir, now).await?;

    if !keep_zip {
        debug!("deleting {}", download.path.display());
        tokio::fs::remove_file(&download.path).await?;
    }

    Ok(conversion)
}

async fn parse_first_xml(dir: &Path) -> Result<Registry, DartError> {
    let xml_file = find_files(dir, "xml")?
        .into_iter()
        .next()
        .ok_or_else(|| DartError::MissingXml(dir.display().to_string()))?;
    debug!("parsing registry {}", xml_file.display());

    let bytes = tokio::fs::read(&xml_file).await?;
    Registry::from_xml(&bytes)
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn filename_is_date_stamped() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(corp_code_filename(date), "corpCode_20240131.zip");
    }

    #[test]
    fn xml_content_types() {
        let mut headers = HeaderMap::new();
        assert!(!is_xml(&headers));

        for (value, expected) in [
            ("application/xml;charset=UTF-8", true),
            ("text/XML", true),
            ("application/x-msdownload", false),
            ("application/zip", false),
        ] {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
            assert_eq!(is_xml(&headers), expected, "{value}");
        }
    }

    #[test]
    fn parse_envelope() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
            <result><status>020</status><message>요청 제한을 초과하였습니다.</message></result>";
        let envelope = ErrorEnvelope::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(envelope.status, "020");
        assert_eq!(envelope.message, "요청 제한을 초과하였습니다.");
        assert_eq!(envelope.known_status(), Some(Status::RequestLimitExceeded));

        let err = DartError::from(envelope);
        assert_eq!(err.status(), Some("020"));
    }

    #[test]
    fn envelope_without_message() {
        let envelope = ErrorEnvelope::from_xml(b"<result><status>800</status></result>").unwrap();
        assert_eq!(envelope.known_status(), Some(Status::Maintenance));
        assert!(envelope.message.is_empty());
    }

    #[test]
    fn envelope_without_status_is_rejected() {
        let result = ErrorEnvelope::from_xml(b"<result><message>?</message></result>");
        assert!(matches!(result, Err(DartError::Xml(_))));
    }
}
