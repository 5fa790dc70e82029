use super::{Config, Destination};
use crate::Result;
use std::path::PathBuf;
use teloxide::types::UserId;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CredentialsError {
    #[error(
        "Credentials file is missing: {path}. \
        Upload it via the settings UI or fix the deployment config"
    )]
    TokenNotFound { path: PathBuf },

    #[error("`ddl` uploads need the DDL endpoint configured for this deployment")]
    MissingDdlEndpoint,
}

/// Which credential files one task uses: the user's own when they opted
/// into `USER_TOKENS`, the owner's otherwise.
pub(crate) struct Credentials<'a> {
    pub(crate) cfg: &'a Config,
    pub(crate) user_id: UserId,
    pub(crate) user_tokens: bool,
}

impl Credentials<'_> {
    pub(crate) fn rclone_config_path(&self) -> PathBuf {
        if self.user_tokens {
            self.cfg
                .user_data_dir
                .join(self.user_id.to_string())
                .join("rclone.conf")
        } else {
            self.cfg.rclone_config.clone()
        }
    }

    /// Fails fast on missing credential files: this is a misconfiguration
    /// the user must fix, not a transient fault worth retrying.
    pub(crate) async fn ensure_for(&self, destination: &Destination) -> Result<()> {
        match destination {
            Destination::Telegram => Ok(()),
            Destination::GDrive { .. } | Destination::Rclone { .. } | Destination::Mega { .. } => {
                let path = self.rclone_config_path();
                if fs_err::tokio::metadata(&path).await.is_err() {
                    return Err(CredentialsError::TokenNotFound { path }.into());
                }
                Ok(())
            }
            Destination::Ddl => {
                if self.cfg.ddl_endpoint.is_none() {
                    return Err(CredentialsError::MissingDdlEndpoint.into());
                }
                Ok(())
            }
        }
    }
}
