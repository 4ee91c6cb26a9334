//! Resolution of schema.org `image` values.
//!
//! Publishers give `image` as a string, a list of strings, a list of
//! `ImageObject`s, a single `ImageObject`, or an `{"@id": ...}` reference to an
//! object elsewhere on the page. All shapes collapse to a single URL here.

use serde_json::Value;
use url::Url;

use crate::harvest::ObjectPool;

/// Picks the URL with the largest `width` query parameter.
///
/// Ties go to the earlier entry; URLs without a width count as width 0.
pub fn best_image_url<S: AsRef<str>>(urls: &[S]) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for url in urls {
        let url = url.as_ref();
        let width = image_width(url);
        match best {
            Some((_, best_width)) if width <= best_width => {}
            _ => best = Some((url, width)),
        }
    }
    best.map(|(url, _)| url)
}

fn image_width(url: &str) -> u64 {
    let base = Url::parse("https://localhost/").ok();
    Url::options()
        .base_url(base.as_ref())
        .parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "width")
                .and_then(|(_, value)| value.parse::<u64>().ok())
        })
        .unwrap_or(0)
}

/// Resolves an `image` value to a URL, or `None` if it cannot be resolved.
pub fn resolve_image(candidate: Option<&Value>, pool: &ObjectPool) -> Option<String> {
    match candidate? {
        Value::String(url) => Some(url.trim()).filter(|u| !u.is_empty()).map(str::to_string),
        Value::Array(items) => {
            let urls: Vec<&str> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(url) => Some(url.as_str()),
                    Value::Object(obj) => obj.get("url").and_then(Value::as_str),
                    _ => None,
                })
                .filter(|url| !url.trim().is_empty())
                .collect();
            best_image_url(&urls).map(str::to_string)
        }
        Value::Object(obj) => {
            if let Some(url) = obj.get("url").and_then(Value::as_str) {
                return Some(url.to_string()).filter(|u| !u.is_empty());
            }
            let id = obj.get("@id").and_then(Value::as_str)?;
            pool.find_by_id(id)
                .and_then(|target| target.str_field("url"))
                .map(str::to_string)
        }
        _ => None,
    }
}

/// Resolves an `image` value, falling back to `placeholder` when it is absent or unresolvable.
pub fn resolve_image_or(candidate: Option<&Value>, pool: &ObjectPool, placeholder: &str) -> String {
    resolve_image(candidate, pool).unwrap_or_else(|| placeholder.to_string())
}
