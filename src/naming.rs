//! Stored-file and job identifier generation.
//!
//! Names combine the wall clock with a random suffix, so concurrent uploads
//! landing in the same millisecond still get distinct names.

use std::time::{SystemTime, UNIX_EPOCH};

/// Random bits carried by the hex suffix.
const SUFFIX_BITS: u32 = 52;

/// Clock and randomness behind generated names.
pub trait NameSource: Send + Sync + 'static {
    /// Milliseconds since the unix epoch
    fn now_millis(&self) -> u128;

    /// Lowercase hex suffix
    fn random_hex(&self) -> String;
}

/// System clock + thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNames;

impl NameSource for SystemNames {
    fn now_millis(&self) -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    }

    fn random_hex(&self) -> String {
        let bits = rand::random::<u64>() >> (64 - SUFFIX_BITS);
        format!("{bits:013x}")
    }
}

/// Strip directory components and replace anything outside `[a-zA-Z0-9._-]` with `_`.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extension including the leading dot, or `""`.
///
/// A leading dot alone (`.env`) is a hidden file, not an extension.
pub fn extension(name: &str) -> &str {
    match name.rfind('.') {
        None | Some(0) => "",
        Some(_) if name == ".." => "",
        Some(idx) => &name[idx..],
    }
}

/// `<field>-<millis>-<hex><ext>`; only the extension of the client name survives.
pub fn stored_name(source: &dyn NameSource, field: &str, original: &str) -> String {
    let safe = sanitize_filename(original);
    format!(
        "{field}-{}-{}{}",
        source.now_millis(),
        source.random_hex(),
        extension(&safe)
    )
}

/// `job_<millis>_<hex>`
pub fn job_id(source: &dyn NameSource) -> String {
    format!("job_{}_{}", source.now_millis(), source.random_hex())
}
