use crate::settings::SettingMap;
use crate::{db, tg, transfer};
use serde::{de::DeserializeOwned, Deserialize};
use serde_with::serde_as;
use std::path::PathBuf;
use std::time::Duration;

pub struct Config {
    pub(crate) tg: tg::Config,
    pub(crate) db: db::Config,
    pub(crate) proc: ProcConfig,
    pub(crate) transfer: transfer::Config,
}

impl Config {
    pub fn load_or_panic() -> Config {
        Self {
            tg: from_env_or_panic("TG_"),
            db: from_env_or_panic("DATABASE_"),
            proc: from_env_or_panic("PROC_"),
            transfer: from_env_or_panic("TRANSFER_"),
        }
    }
}

#[serde_as]
#[derive(Deserialize)]
pub(crate) struct ProcConfig {
    /// Directory where task downloads and intermediate outputs live.
    #[serde(default = "default_work_dir")]
    pub(crate) work_dir: PathBuf,

    /// The media tool binary. Deployments alias it to a renamed build.
    #[serde(default = "default_media_tool")]
    pub(crate) media_tool: String,

    #[serde(default = "default_probe_tool")]
    pub(crate) probe_tool: String,

    /// Optional guard against a wedged external tool. `None` preserves the
    /// historical unbounded behavior.
    #[serde(default)]
    pub(crate) tool_timeout_secs: Option<u64>,

    /// Owner-level defaults for the task settings, carried as one JSON
    /// object. The lowest-priority settings tier, shared read-only by all
    /// concurrent tasks.
    #[serde_as(as = "serde_with::json::JsonString")]
    #[serde(default)]
    pub(crate) owner_settings: SettingMap,
}

impl ProcConfig {
    pub(crate) fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_media_tool() -> String {
    "ffmpeg".to_owned()
}

fn default_probe_tool() -> String {
    "ffprobe".to_owned()
}

pub(crate) fn from_env_or_panic<T: DeserializeOwned>(prefix: &str) -> T {
    envy::prefixed(prefix).from_env().unwrap_or_else(|err| {
        panic!(
            "BUG: Couldn't load config from environment for {}: {:#?}",
            std::any::type_name::<T>(),
            err
        );
    })
}
