//! Cookie access for the anti-forgery token.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use reqwest::cookie::CookieStore as _;

/// Read access to the cookies visible to the page.
pub trait CookieStore {
    /// Returns the decoded value of cookie `name`, if set.
    fn get(&self, name: &str) -> Option<String>;
}

/// Looks up `name` in a `Cookie:`-style header (`a=1; b=2`).
///
/// The first match wins; values are percent-decoded when valid UTF-8
/// results, otherwise returned as-is.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(decode_value)
}

fn decode_value(raw: &str) -> String {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// In-memory cookie set.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a jar from a `Cookie:`-style header.
    pub fn from_header(header: &str) -> Self {
        let mut jar = Self::new();
        for pair in header.split(';').map(str::trim) {
            if let Some((name, value)) = pair.split_once('=') {
                if !name.is_empty() && jar.get(name).is_none() {
                    jar.cookies.push((name.to_string(), decode_value(value)));
                }
            }
        }
        jar
    }

    /// Sets or replaces a cookie.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.cookies.push((name, value)),
        }
    }

    /// Removes a cookie if present.
    pub fn remove(&mut self, name: &str) {
        self.cookies.retain(|(n, _)| n != name);
    }
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
    }
}

/// View of a `reqwest` cookie jar scoped to one origin.
#[derive(Debug, Clone)]
pub struct SharedJarCookies {
    jar: Arc<reqwest::cookie::Jar>,
    url: reqwest::Url,
}

impl SharedJarCookies {
    /// Creates a view of `jar` for `url`.
    pub fn new(jar: Arc<reqwest::cookie::Jar>, url: reqwest::Url) -> Self {
        Self { jar, url }
    }
}

impl CookieStore for SharedJarCookies {
    fn get(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.url)?;
        find_cookie(header.to_str().ok()?, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_find_cookie() {
        let header = "sessionid=abc; csrftoken=Tok%20en; theme=dark";
        assert_eq!(find_cookie(header, "csrftoken"), Some("Tok en".to_string()));
        assert_eq!(find_cookie(header, "theme"), Some("dark".to_string()));
        assert_eq!(find_cookie(header, "missing"), None);
        assert_eq!(find_cookie("", "csrftoken"), None);
    }

    #[test]
    fn test_find_cookie_requires_exact_name() {
        let header = "xcsrftoken=bad; csrftokenx=bad; csrftoken=good";
        assert_eq!(find_cookie(header, "csrftoken"), Some("good".to_string()));
    }

    #[test]
    fn test_first_match_wins() {
        let header = "csrftoken=first; csrftoken=second";
        assert_eq!(find_cookie(header, "csrftoken"), Some("first".to_string()));
        assert_eq!(
            CookieJar::from_header(header).get("csrftoken"),
            Some("first".to_string())
        );
    }

    #[test]
    fn test_jar_set_and_remove() {
        let mut jar = CookieJar::new();
        jar.set("csrftoken", "one");
        jar.set("csrftoken", "two");
        assert_eq!(jar.get("csrftoken"), Some("two".to_string()));
        jar.remove("csrftoken");
        assert_eq!(jar.get("csrftoken"), None);
    }

    #[test]
    fn test_shared_jar_scoped_to_origin() {
        let url: reqwest::Url = "http://127.0.0.1:8000/".parse().unwrap();
        let jar = Arc::new(reqwest::cookie::Jar::default());
        jar.add_cookie_str("csrftoken=abc123; Path=/", &url);

        let cookies = SharedJarCookies::new(Arc::clone(&jar), url);
        assert_eq!(cookies.get("csrftoken"), Some("abc123".to_string()));

        let other = SharedJarCookies::new(jar, "http://example.com/".parse().unwrap());
        assert_eq!(other.get("csrftoken"), None);
    }

    proptest! {
        #[test]
        fn prop_token_found_among_other_cookies(
            token in "[A-Za-z0-9]{1,64}",
            before in "[a-z]{1,8}",
        ) {
            let header = format!("{}=x; csrftoken={}; other=y", before, token);
            prop_assert_eq!(find_cookie(&header, "csrftoken"), Some(token));
        }
    }
}
