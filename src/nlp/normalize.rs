/// Normalize raw document text before analysis.
///
/// Converts Windows (`\r\n`) and old Mac (`\r`) line endings to `\n` and
/// strips leading/trailing whitespace. Pure and idempotent; an empty result
/// is valid and callers must guard against analyzing it.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}
