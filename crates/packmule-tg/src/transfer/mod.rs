//! Destination and credential resolution plus the thin delegated transfer
//! clients. The interesting part is deciding *where* an upload goes and
//! *which* credentials file applies; the transfers themselves are handed
//! to rclone, the HTTP client, or Telegram.

mod credentials;
mod ddl;
mod download;
mod rclone;
mod tg_upload;

pub(crate) use credentials::*;
pub(crate) use ddl::*;
pub(crate) use download::*;
pub(crate) use rclone::*;
pub(crate) use tg_upload::*;

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize)]
pub(crate) struct Config {
    /// Owner rclone config, used unless the user opted into their own
    /// credentials via the `USER_TOKENS` setting.
    #[serde(default = "default_rclone_config")]
    pub(crate) rclone_config: PathBuf,

    /// Directory with per-user credential files, one subdirectory per
    /// user id.
    #[serde(default = "default_user_data_dir")]
    pub(crate) user_data_dir: PathBuf,

    /// Endpoint for `ddl` uploads. Optional: deployments without a DDL
    /// server simply reject the tag.
    #[serde(default)]
    pub(crate) ddl_endpoint: Option<url::Url>,
}

fn default_rclone_config() -> PathBuf {
    PathBuf::from("rclone.conf")
}

fn default_user_data_dir() -> PathBuf {
    PathBuf::from("users")
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum DestinationError {
    #[error(
        "No upload destination is configured. \
        Pass `-up <dest>` or set the `DEFAULT_UPLOAD` setting"
    )]
    Missing,

    #[error("Unknown upload destination tag `{tag}`. Expected one of: gd, rc, mg, yt, ddl")]
    UnknownTag { tag: String },

    #[error("Destination `{tag}` requires a target, e.g. `{tag}:<target>`")]
    MissingTarget { tag: String },

    #[error("Destination `{tag}` is not available in this deployment")]
    Unsupported { tag: String },
}

/// Where the processed files of a task end up. The core only ever decides
/// the tag and the credentials; the transfer itself is delegated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Destination {
    /// Leech: upload back into the Telegram chat.
    Telegram,

    /// `gd:<folder>`: a Google Drive folder via the rclone drive backend.
    GDrive { folder: String },

    /// `rc:<remote:path>`: an arbitrary rclone remote.
    Rclone { remote: String },

    /// `mg:<path>`: Mega via the rclone mega backend.
    Mega { path: String },

    /// `ddl`: HTTP upload to the configured DDL endpoint.
    Ddl,
}

pub(crate) fn resolve_destination(
    raw: Option<&str>,
) -> Result<Destination, DestinationError> {
    let raw = raw.ok_or(DestinationError::Missing)?;

    let (tag, target) = match raw.split_once(':') {
        Some((tag, target)) => (tag, Some(target)),
        None => (raw, None),
    };

    let require_target = |tag: &str| {
        target
            .filter(|target| !target.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| DestinationError::MissingTarget {
                tag: tag.to_owned(),
            })
    };

    match tag {
        "gd" => Ok(Destination::GDrive {
            folder: require_target(tag)?,
        }),
        "rc" => Ok(Destination::Rclone {
            remote: require_target(tag)?,
        }),
        "mg" => Ok(Destination::Mega {
            path: require_target(tag)?,
        }),
        "ddl" => Ok(Destination::Ddl),
        // Mirroring to video hosts needs a delegated uploader that this
        // deployment doesn't ship
        "yt" => Err(DestinationError::Unsupported {
            tag: tag.to_owned(),
        }),
        _ => Err(DestinationError::UnknownTag {
            tag: tag.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn tags_parse_into_destinations() {
        assert_eq!(
            resolve_destination(Some("gd:folder-id")).unwrap(),
            Destination::GDrive {
                folder: "folder-id".to_owned()
            }
        );
        assert_eq!(
            resolve_destination(Some("rc:backup:media/movies")).unwrap(),
            Destination::Rclone {
                remote: "backup:media/movies".to_owned()
            }
        );
        assert_eq!(resolve_destination(Some("ddl")).unwrap(), Destination::Ddl);
    }

    #[test]
    fn missing_and_malformed_destinations() {
        assert_matches!(resolve_destination(None), Err(DestinationError::Missing));
        assert_matches!(
            resolve_destination(Some("gd")),
            Err(DestinationError::MissingTarget { .. })
        );
        assert_matches!(
            resolve_destination(Some("floppy:/a")),
            Err(DestinationError::UnknownTag { .. })
        );
        assert_matches!(
            resolve_destination(Some("yt:channel")),
            Err(DestinationError::Unsupported { .. })
        );
    }
}
