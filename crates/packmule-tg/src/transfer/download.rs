use crate::http;
use crate::prelude::*;
use crate::Result;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub(crate) enum DownloadError {
    #[error("Failed to request {url}")]
    Request {
        url: url::Url,
        source: reqwest_middleware::Error,
    },

    #[error("Download of {url} failed")]
    Transfer {
        url: url::Url,
        source: reqwest::Error,
    },
}

/// Streams one direct-download link into the task's work dir and returns
/// the resulting file path.
pub(crate) async fn download_http(
    http: &http::Client,
    url: url::Url,
    dest_dir: &Path,
) -> Result<PathBuf> {
    let response = http
        .get(url.clone())
        .send()
        .await
        .and_then(|response| response.error_for_status().map_err(Into::into))
        .map_err(err_ctx!(DownloadError::Request { url: url.clone() }))?;

    let file_name = response_file_name(&response, &url);
    let path = dest_dir.join(file_name);

    info!(%url, file = %path.display(), "Downloading");

    let mut file = fs_err::tokio::File::create(&path).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(err_ctx!(DownloadError::Transfer { url: url.clone() }))?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;

    Ok(path)
}

/// File name from the `Content-Disposition` header, falling back to the
/// last URL path segment.
fn response_file_name(response: &reqwest::Response, url: &url::Url) -> String {
    let from_header = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition_name);

    if let Some(name) = from_header {
        return name;
    }

    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| "download.bin".to_owned())
}

fn parse_content_disposition_name(header: &str) -> Option<String> {
    let (_, name) = header.split_once("filename=")?;
    let name = name.trim().trim_matches('"').trim_matches('\'');
    let name = name.split(';').next().unwrap_or(name).trim();

    // Keep only the base name: a hostile header must not traverse paths
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);

    (!name.is_empty()).then(|| name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_names() {
        assert_eq!(
            parse_content_disposition_name(r#"attachment; filename="movie.mkv""#),
            Some("movie.mkv".to_owned())
        );
        assert_eq!(
            parse_content_disposition_name("attachment; filename=plain.bin"),
            Some("plain.bin".to_owned())
        );
        assert_eq!(
            parse_content_disposition_name(r#"attachment; filename="../../etc/passwd""#),
            Some("passwd".to_owned())
        );
        assert_eq!(parse_content_disposition_name("attachment"), None);
    }
}
