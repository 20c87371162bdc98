//! Small helpers shared by the library and the CLI.

/// Longest file stem produced by [`download_filename`]
pub const MAX_FILENAME_STEM: usize = 100;

/// `http://` or `https://` prefix, case-insensitive
pub fn is_url(s: &str) -> bool {
    ["http://", "https://"].iter().any(|prefix| {
        s.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// File name for a downloaded QR image.
///
/// Uses the page title when there is one, otherwise the content without its
/// URL scheme.
pub fn download_filename(content: &str, title: Option<&str>) -> String {
    let source = match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => title,
        None => strip_scheme(content),
    };
    let stem: String = sanitize_filename(source)
        .chars()
        .take(MAX_FILENAME_STEM)
        .collect();
    format!("QR Code for {stem}.png")
}

fn strip_scheme(s: &str) -> &str {
    ["http://", "https://"]
        .iter()
        .find(|prefix| {
            s.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
        .map_or(s, |prefix| &s[prefix.len()..])
}

/// Replace characters that are illegal in file names with `_`
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '?' | '<' | '>' | '\\' | ':' | '*' | '|' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "." | ".." => "_".to_owned(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com"));
        assert!(is_url("HTTP://EXAMPLE.COM"));
        assert!(!is_url("ftp://example.com"));
        assert!(!is_url("see https://example.com"));
        assert!(!is_url("http:"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(
            download_filename("https://example.com/a?b", None),
            "QR Code for example.com_a_b.png"
        );
        assert_eq!(
            download_filename("https://example.com", Some("Example: Home")),
            "QR Code for Example_ Home.png"
        );
        assert_eq!(download_filename("hello", Some("  ")), "QR Code for hello.png");
    }

    #[test]
    fn test_download_filename_truncates() {
        let name = download_filename(&"é".repeat(300), None);
        let stem = name
            .trim_start_matches("QR Code for ")
            .trim_end_matches(".png");
        assert_eq!(stem.chars().count(), MAX_FILENAME_STEM);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b\\c\n"), "a_b_c_");
        assert_eq!(sanitize_filename(".."), "_");
        assert_eq!(sanitize_filename("plain name"), "plain name");
    }
}
