mod basic;
mod cache;
mod client;

pub use basic::BasicClient;
pub use cache::DiskCache;
pub use client::HttpClient;

use anyhow::Result;
use bytes::Bytes;

use crate::error::DataSourceError;

/// GETs `url` and returns the body. Non-success statuses are errors.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Bytes> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DataSourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        }
        .into());
    }
    Ok(resp.bytes().await?)
}
