pub mod error;
pub mod fs;
pub mod status;

/// Company registry & financial statements from the Financial Supervisory Service's [OpenDart].
///
/// [OpenDart]: https://opendart.fss.or.kr/
pub mod opendart;

pub use error::DartError;
pub use status::Status;

/// Shortcut for required API elements.
pub mod http {
    pub use reqwest::Client as HttpClient;
}

/// Default HTTP client for spider requests.
///
/// `user_agent` is optional; OpenDart does not require one, but it is sent when configured.
pub fn std_client_build(user_agent: Option<&str>) -> Result<http::HttpClient, DartError> {
    let mut builder = reqwest::ClientBuilder::new();
    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }
    Ok(builder.build()?)
}

/// Human readable elapsed time, for trace logs.
pub fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:.3}s", time.elapsed().as_secs_f64())
}
