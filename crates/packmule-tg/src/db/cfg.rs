use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct Config {
    pub(crate) url: url::Url,

    #[serde(default = "default_pool_size")]
    pub(crate) pool_size: u32,
}

fn default_pool_size() -> u32 {
    // A single bot process doesn't need much; leave headroom for ad-hoc
    // administration connections on small Postgres instances.
    16
}
