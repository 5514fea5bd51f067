//! Compiled-in defaults for every environment knob
//!
//! These are the lowest-precedence source; builder values and process-wide
//! overrides both take priority.

use std::sync::OnceLock;

use crate::retry::{Delay, TimeUnit};

pub const DCP_ENABLED: bool = false;
pub const SSL_ENABLED: bool = false;
pub const QUERY_ENABLED: bool = false;
pub const QUERY_PORT: u16 = 8093;
pub const BOOTSTRAP_HTTP_ENABLED: bool = true;
pub const BOOTSTRAP_CARRIER_ENABLED: bool = true;
pub const BOOTSTRAP_HTTP_DIRECT_PORT: u16 = 8091;
pub const BOOTSTRAP_HTTP_SSL_PORT: u16 = 18091;
pub const BOOTSTRAP_CARRIER_DIRECT_PORT: u16 = 11210;
pub const BOOTSTRAP_CARRIER_SSL_PORT: u16 = 11207;
pub const REQUEST_BUFFER_SIZE: usize = 16384;
pub const RESPONSE_BUFFER_SIZE: usize = 16384;
pub const KEYVALUE_ENDPOINTS: usize = 1;
pub const VIEW_ENDPOINTS: usize = 1;
pub const QUERY_ENDPOINTS: usize = 1;

/// 100us growing tenfold per round up to 100ms.
pub const OBSERVE_INTERVAL_DELAY: Delay =
    Delay::exponential(TimeUnit::Microseconds, 100, 100_000, 10);

/// 32ms growing 32-fold per attempt up to 4096ms.
pub const RECONNECT_DELAY: Delay = Delay::exponential(TimeUnit::Milliseconds, 32, 4096, 32);

/// 100us growing a hundredfold per attempt up to 100ms.
pub const RETRY_DELAY: Delay = Delay::exponential(TimeUnit::Microseconds, 100, 100_000, 100);

pub const MAX_REQUEST_LIFETIME_MS: u64 = 75_000;

/// Values <= 0 disable the idle keep-alive check.
pub const KEEP_ALIVE_INTERVAL_MS: i64 = 30_000;

pub const AUTORELEASE_AFTER_MS: u64 = 2_000;

/// Live environments tolerated before a warning is logged.
pub const MAX_ALLOWED_INSTANCES: usize = 1;

/// Pool size for both the I/O pool and the computation scheduler.
pub fn pool_size() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// `kvlink/<version>`
pub fn package_name_and_version() -> &'static str {
    static VALUE: OnceLock<String> = OnceLock::new();
    VALUE.get_or_init(|| format!("kvlink/{}", env!("CARGO_PKG_VERSION")))
}

/// Package name and version followed by the platform.
pub fn user_agent() -> &'static str {
    static VALUE: OnceLock<String> = OnceLock::new();
    VALUE.get_or_init(|| {
        format!(
            "{} ({}/{})",
            package_name_and_version(),
            std::env::consts::OS,
            std::env::consts::ARCH
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_package_and_platform() {
        let expected = format!(
            "kvlink/{} ({}/{})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        assert_eq!(user_agent(), expected);
    }
}
