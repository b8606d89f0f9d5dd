use log::warn;

use common::error::Errno;

/// Calls `f` up to `max_attempts` times with no delay in between and returns
/// the first success or the last error. Values below 1 mean a single attempt.
pub fn retry_immediately<T, F>(max_attempts: i64, what: &str, mut f: F) -> Result<T, Errno>
where
    F: FnMut() -> Result<T, Errno>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match f() {
            Ok(ret) => {
                return Ok(ret);
            }
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                warn!("{} failed at attempt {}/{}, err: {}", what, attempt, max_attempts, err);
                attempt += 1;
            }
        }
    }
}
