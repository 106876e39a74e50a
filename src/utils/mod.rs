use tracing::warn;

pub fn remove_trailing_slash(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// Kupo pattern for every output whose payment credential is `script_hash_bech32`.
pub fn credential_pattern(script_hash_bech32: &str) -> String {
    format!("{}/*", script_hash_bech32)
}

/// Kupo pattern for every output holding `unit` (policy id + asset name hex).
pub fn asset_pattern(unit: &str) -> String {
    match (unit.get(..56), unit.get(56..)) {
        (Some(policy), Some(name)) if !name.is_empty() => format!("{}.{}", policy, name),
        _ => format!("{}.*", unit),
    }
}

pub async fn retry<T, E, F, Fut>(mut retries: u32, base_delay_ms: u64, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if retries == 0 => return Err(e),
            Err(e) => {
                // Exponential backoff: base_delay * 2^attempt, capped at 30s
                let delay = (base_delay_ms * (1u64 << attempt.min(5))).min(30_000);
                warn!(attempt = attempt + 1, error = ?e, delay_ms = delay, "request failed, retrying");
                tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                retries -= 1;
                attempt += 1;
            }
        }
    }
}
