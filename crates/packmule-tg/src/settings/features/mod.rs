//! One immutable settings struct per post-processing feature, assembled
//! once per task by [`TaskSettings::resolve`](crate::settings::TaskSettings).

mod add;
mod compress;
mod convert;
mod extract;
mod merge;
mod remove;
mod split;
mod trim;
mod watermark;

pub(crate) use add::*;
pub(crate) use compress::*;
pub(crate) use convert::*;
pub(crate) use extract::*;
pub(crate) use merge::*;
pub(crate) use remove::*;
pub(crate) use split::*;
pub(crate) use trim::*;
pub(crate) use watermark::*;
