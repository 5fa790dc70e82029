use crate::prelude::*;
use easy_ext::ext;
use std::future::Future;
use std::time::Duration;

#[ext(FutureExt)]
pub(crate) impl<F: Future> F {
    async fn with_duration(self) -> (F::Output, Duration) {
        let start = std::time::Instant::now();
        let result = self.await;
        (result, start.elapsed())
    }

    async fn with_duration_log(self, msg: &str) -> F::Output {
        let (result, duration) = self.with_duration().await;
        debug!(duration = tracing_duration(duration), "{msg}");
        result
    }
}
