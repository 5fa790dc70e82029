use super::DownloadError;
use crate::http;
use crate::prelude::*;
use crate::Result;
use std::path::Path;
use tokio_util::io::ReaderStream;

/// Streams one file to the deployment's DDL endpoint with a PUT per file.
/// The endpoint's reply body is ignored; a non-2xx status fails the upload.
pub(crate) async fn upload_http(
    http: &http::Client,
    endpoint: &url::Url,
    file: &Path,
) -> Result<()> {
    let name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_owned());

    let url = endpoint
        .join(&name)
        .fatal_ctx(|| format!("Couldn't build the DDL upload URL for {name}"))?;

    info!(file = %file.display(), %url, "Uploading to the DDL endpoint");

    let reader = fs_err::tokio::File::open(file).await?;
    let body = reqwest::Body::wrap_stream(ReaderStream::new(reader));

    http.put(url.clone())
        .body(body)
        .send()
        .await
        .and_then(|response| response.error_for_status().map_err(Into::into))
        .map_err(err_ctx!(DownloadError::Request { url: url.clone() }))?;

    Ok(())
}
