//! Per-client rate limiting using the token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Rate limiter keyed by the socket peer address.
pub type PeerLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter keyed by `X-Forwarded-For` / `X-Real-IP`, falling back to the peer.
pub type ProxyLayer =
    GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn build<K: KeyExtractor>(
    key: K,
    per_second: u64,
    burst: u32,
) -> GovernorLayer<K, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(key)
            .per_second(per_second)
            .burst_size(burst)
            .finish()
            .expect("rate limit quota is non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

/// Limiter for read-only endpoints.
///
/// # Limits
///
/// - **Rate**: 2 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
pub fn layer() -> PeerLayer {
    build(PeerIpKeyExtractor, 2, 100)
}

/// Proxy-aware variant of [`layer`].
pub fn proxy_layer() -> ProxyLayer {
    build(SmartIpKeyExtractor, 2, 100)
}

/// Stricter limiter for pulls and balance changes.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
pub fn pull_layer() -> PeerLayer {
    build(PeerIpKeyExtractor, 1, 10)
}

/// Proxy-aware variant of [`pull_layer`].
pub fn pull_proxy_layer() -> ProxyLayer {
    build(SmartIpKeyExtractor, 1, 10)
}
