/// Returns a cached value or computes, caches and returns it.
///
/// On a hit the value from Redis is returned as-is. On a miss `$block` is
/// awaited, its value queued for a background write with `$ttl` seconds to
/// live, then returned. Errors from either path propagate with `?`, so the
/// macro must be used inside a function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// let urls: Vec<String> = cached!(self.cache, key, IMAGE_CACHE_TTL, async move {
///     self.fetch_from_api(query, limit).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get(&$key).await? {
            tracing::debug!(key = %$key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
