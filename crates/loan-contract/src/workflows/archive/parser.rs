use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) const PAYLOAD_START: &str = "SYSTEM_DATA_START:";
pub(crate) const PAYLOAD_END: &str = ":SYSTEM_DATA_END";

static PAYLOAD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"SYSTEM_DATA_START:([A-Za-z0-9+/=\s]*):SYSTEM_DATA_END")
        .expect("valid archive payload regex")
});

/// Base64 text between the archive markers, with any line wrapping removed.
///
/// When an archive was pasted together with an older one the last block wins.
pub(crate) fn extract_payload(text: &str) -> Option<String> {
    let captures = PAYLOAD_PATTERN.captures_iter(text).last()?;
    let payload: String = captures
        .get(1)?
        .as_str()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    (!payload.is_empty()).then_some(payload)
}

pub(crate) fn payload_line(encoded: &str) -> String {
    format!("{PAYLOAD_START}{encoded}{PAYLOAD_END}")
}
