pub mod rate_limit;

pub use rate_limit::RateLimiter;

use actix_web::dev::ConnectionInfo;

/// Client address used as the throttle key and in the operational log.
/// Kept in one place so both always agree.
pub fn client_addr(info: &ConnectionInfo) -> String {
    info.realip_remote_addr().unwrap_or("unknown").to_string()
}
