use std::time::Duration;

use rand::rngs::OsRng;
use rand::Rng;

/// How long a pending OTP stays valid.
pub const OTP_TTL: Duration = Duration::from_secs(5 * 60);

pub const OTP_DIGITS: usize = 4;

/// Generate a zero-padded 4-digit code, uniform over `0000..=9999`.
///
/// # Panics
///
/// Panics if the operating system's random source is unavailable. That is an
/// environment failure, not something a request can recover from.
pub fn generate_otp() -> String {
    let code: u16 = OsRng.gen_range(0..10_000);
    format!("{:0width$}", code, width = OTP_DIGITS)
}
