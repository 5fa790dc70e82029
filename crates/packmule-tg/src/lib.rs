mod config;
mod db;
mod error;
mod http;
mod observability;
mod processing;
mod settings;
mod tg;
mod transfer;

pub mod util;

pub use crate::error::*;
pub use config::*;
pub use observability::*;

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::{err, err_ctx, fatal, OptionExt as _, ResultExt as _};
    pub(crate) use crate::observability::logging::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

/// Run the telegram bot processing loop
pub async fn run(config: Config) -> Result<()> {
    let db = db::init(config.db).await?;

    let opts = tg::RunBotOptions {
        tg_cfg: config.tg,
        proc_cfg: config.proc,
        transfer_cfg: config.transfer,
        db,
    };

    tg::run_bot(opts).await
}
