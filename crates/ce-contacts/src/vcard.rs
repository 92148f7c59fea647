//! vCard payload cleanup

/// Strip carriage returns and surrounding whitespace from a fetched vCard.
///
/// Servers send CRLF line endings; the combined file uses bare LF.
pub fn normalize(content: &str) -> String {
    content.replace('\r', "").trim().to_string()
}
