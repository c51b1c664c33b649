use serde::de::DeserializeOwned;

/// Parse an enum tag using serde-deserialization.
///
/// Hyphens become underscores; if the tag does not match as given, the
/// upper-cased form is tried so `enrolled-in` matches `ENROLLED_IN`.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized.clone()))
        .or_else(|_| serde_json::from_value(serde_json::Value::String(normalized.to_ascii_uppercase())))
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}
