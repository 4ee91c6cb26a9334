use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

const BROWSER_HEADERS: [(&str, &str); 6] = [
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.5"),
    ("referer", "https://www.google.com/"),
    ("dnt", "1"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
];

/// Browser-like header set with a user agent drawn from the rotation pool.
pub(crate) fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    let ua = USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);
    headers.insert(USER_AGENT, HeaderValue::from_static(ua));

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_comes_from_pool() {
        for _ in 0..20 {
            let headers = browser_headers();
            let ua = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()).unwrap();
            assert!(USER_AGENTS.contains(&ua));
        }
    }

    #[test]
    fn referer_is_a_search_engine() {
        let headers = browser_headers();
        assert_eq!(
            headers.get("referer").and_then(|v| v.to_str().ok()),
            Some("https://www.google.com/")
        );
        assert!(headers.contains_key("accept-language"));
    }
}
