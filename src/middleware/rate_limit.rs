use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

const WINDOW: Duration = Duration::from_secs(120);
const GENERAL_BURST: NonZeroU32 = NonZeroU32::new(100).unwrap();
const AUTH_BURST: NonZeroU32 = NonZeroU32::new(50).unwrap();

/// 100 requests per two-minute window per client, refilled continuously.
pub fn general_limiter() -> Arc<IpRateLimiter> {
    keyed_limiter(GENERAL_BURST)
}

/// Tighter window for the credential endpoints: 50 per two minutes.
pub fn auth_limiter() -> Arc<IpRateLimiter> {
    keyed_limiter(AUTH_BURST)
}

fn keyed_limiter(burst: NonZeroU32) -> Arc<IpRateLimiter> {
    let quota = Quota::with_period(WINDOW / burst.get())
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);
    Arc::new(RateLimiter::keyed(quota))
}

/// Keyed by peer IP; requests arriving without connect info (in-process
/// tests) share one bucket.
pub async fn enforce(
    State(limiter): State<Arc<IpRateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check_key(&ip).is_err() {
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(req).await)
}
