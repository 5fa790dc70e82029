use reqwest_middleware::RequestBuilder;
use reqwest_retry::policies::{ExponentialBackoff, ExponentialBackoffTimed};
use reqwest_retry::RetryTransientMiddleware;
use std::time::Duration;

pub(crate) type Client = reqwest_middleware::ClientWithMiddleware;

pub(crate) fn default_retry_policy() -> ExponentialBackoffTimed {
    // Retry exponentially increasing intervals between attempts.
    ExponentialBackoff::builder()
        .base(2)
        .retry_bounds(Duration::from_millis(100), Duration::from_secs(2))
        .build_with_total_retry_duration(Duration::from_secs(10))
}

pub(crate) fn create_client() -> Client {
    reqwest_middleware::ClientBuilder::new(teloxide::net::client_from_env())
        .with(RetryTransientMiddleware::new_with_policy(
            default_retry_policy(),
        ))
        .with_init(|request_builder: RequestBuilder| {
            request_builder.header(
                "User-Agent",
                concat!("PackmuleTelegramBot/", env!("CARGO_PKG_VERSION")),
            )
        })
        .build()
}
