/// Number of leading characters kept by [`shorten`].
pub const SHORTEN_LEN: usize = 20;

/// Truncates a token, URI or blob key for log output: the first 20 characters followed by `...`.
pub fn shorten(value: &str) -> String {
    let prefix: String = value.chars().take(SHORTEN_LEN).collect();
    format!("{prefix}...")
}
