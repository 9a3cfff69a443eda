//! Helpers turning browser address bar contents into website keys.

/// Browsers whose address bar is read by default.
pub const DEFAULT_BROWSERS: [&str; 6] = ["chrome", "msedge", "firefox", "brave", "opera", "vivaldi"];

fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}

/// Whether `process_name` is one of `browsers`. Case and a trailing `.exe` are ignored.
pub fn is_browser<S: AsRef<str>>(process_name: &str, browsers: &[S]) -> bool {
    let name = strip_exe(process_name);
    browsers
        .iter()
        .any(|browser| strip_exe(browser.as_ref()).eq_ignore_ascii_case(name))
}

/// Extracts the host from an address bar value, lowercased and without `www.`.
///
/// Returns `None` for values that aren't web addresses: search terms, `about:` pages or
/// browser internal schemes.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains(char::is_whitespace) {
        return None;
    }
    let lowered = raw.to_ascii_lowercase();
    let rest = match lowered.split_once("://") {
        Some(("http" | "https", rest)) => rest,
        Some(_) => return None,
        None => lowered.as_str(),
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = host.rsplit_once('@').map_or(host, |(_, host)| host);
    let host = match host.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return None,
        None => host,
    };
    let host = host.trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);

    let valid_chars = host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    let has_labels = host.contains('.') && host.split('.').all(|label| !label.is_empty());
    if valid_chars && (has_labels || host == "localhost") {
        Some(host.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{is_browser, normalize_domain, DEFAULT_BROWSERS};

    #[test]
    fn test_is_browser() {
        assert!(is_browser("chrome", &DEFAULT_BROWSERS));
        assert!(is_browser("Chrome.EXE", &DEFAULT_BROWSERS));
        assert!(is_browser("msedge", &["msedge.exe"]));
        assert!(!is_browser("notepad", &DEFAULT_BROWSERS));
        assert!(!is_browser("chrome", &[] as &[&str]));
    }

    #[test]
    fn test_normalize_plain_hosts() {
        assert_eq!(normalize_domain("github.com").as_deref(), Some("github.com"));
        assert_eq!(
            normalize_domain("www.YouTube.com/watch?v=1").as_deref(),
            Some("youtube.com")
        );
        assert_eq!(
            normalize_domain("  docs.rs/chrono/latest  ").as_deref(),
            Some("docs.rs")
        );
    }

    #[test]
    fn test_normalize_full_urls() {
        assert_eq!(
            normalize_domain("https://www.rust-lang.org:443/learn#top").as_deref(),
            Some("rust-lang.org")
        );
        assert_eq!(
            normalize_domain("http://user@intranet.example.org/").as_deref(),
            Some("intranet.example.org")
        );
        assert_eq!(
            normalize_domain("http://localhost:8080/api").as_deref(),
            Some("localhost")
        );
    }

    #[test]
    fn test_normalize_rejects_non_addresses() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("rust ownership rules"), None);
        assert_eq!(normalize_domain("about:blank"), None);
        assert_eq!(normalize_domain("chrome://settings"), None);
        assert_eq!(normalize_domain("file:///home/user/a.html"), None);
        assert_eq!(normalize_domain("intranet"), None);
        assert_eq!(normalize_domain("a..b"), None);
    }
}
