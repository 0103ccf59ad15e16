//! Parse header lines collected by curl into (name, value) pairs.

/// Keep only the headers of the final response.
///
/// curl reports the header block of every response it sees (100 Continue,
/// redirects), each starting with a status line; a new status line resets
/// the collected set.
pub(crate) fn parse_headers(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}
