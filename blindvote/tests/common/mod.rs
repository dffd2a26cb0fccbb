//! Helpers shared by the integration tests.

use blindvote::{BigUint, PublicParts, SigningParts};

/// Install a tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call does anything.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blindvote=info"));

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

/// RSA with p = 61, q = 53: N = 3233, e = 17, d = 2753
#[allow(dead_code)]
pub fn toy_key() -> (PublicParts, SigningParts) {
    let n = BigUint::from(3233u32);
    (
        PublicParts::new(n.clone(), BigUint::from(17u32)),
        SigningParts::new(n, BigUint::from(2753u32)),
    )
}
