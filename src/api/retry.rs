use tracing::warn;

use crate::error::Result;

/// Run `op`, issuing it again up to `retries` times while the failure is retryable.
pub fn with_retry<T>(retries: u32, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries && err.is_retryable() => {
                attempt += 1;
                warn!(request = what, attempt, error = %err, "retrying failed request");
            }
            Err(err) => return Err(err),
        }
    }
}
