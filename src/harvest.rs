//! JSON-LD harvesting.
//!
//! Every `application/ld+json` block on a page is parsed and flattened into an
//! [`ObjectPool`]: top-level objects (including `@graph` members) followed by
//! any schema.org entities nested one level inside them.

use log::debug;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn json_ld_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| {
        Selector::parse("script[type='application/ld+json']").expect("valid JSON-LD selector")
    })
}

/// One JSON-LD node, kept untyped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StructuredObject(Map<String, Value>);

impl StructuredObject {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The `@type` values, whether given as a string or a list.
    pub fn types(&self) -> Vec<&str> {
        match self.0.get("@type") {
            Some(Value::String(t)) => vec![t.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Case-insensitive match against any of `wanted`.
    pub fn is_type(&self, wanted: &[&str]) -> bool {
        self.types()
            .iter()
            .any(|t| wanted.iter().any(|w| t.eq_ignore_ascii_case(w)))
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("@id").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A non-empty string field, trimmed.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Objects nested directly under this one that look like entities themselves.
    fn second_level(&self) -> Vec<StructuredObject> {
        let mut nested = Vec::new();
        for value in self.0.values() {
            match value {
                Value::Object(map) if has_entity_key(map) => {
                    nested.push(StructuredObject(map.clone()));
                }
                Value::Array(items) => {
                    nested.extend(items.iter().filter_map(|item| match item {
                        Value::Object(map) if has_entity_key(map) => {
                            Some(StructuredObject(map.clone()))
                        }
                        _ => None,
                    }));
                }
                _ => {}
            }
        }
        nested
    }
}

fn has_entity_key(map: &Map<String, Value>) -> bool {
    map.keys().any(|k| k.starts_with('@'))
}

/// Flat, ordered collection of every object harvested from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ObjectPool {
    objects: Vec<StructuredObject>,
}

impl ObjectPool {
    /// Builds a pool from top-level objects, appending each one's nested entities after it.
    pub fn from_top_level(top_level: Vec<StructuredObject>) -> Self {
        let mut objects = Vec::with_capacity(top_level.len());
        for object in top_level {
            let nested = object.second_level();
            objects.push(object);
            objects.extend(nested);
        }
        Self { objects }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructuredObject> {
        self.objects.iter()
    }

    pub fn first_of_type(&self, wanted: &[&str]) -> Option<&StructuredObject> {
        self.objects.iter().find(|o| o.is_type(wanted))
    }

    pub fn all_of_type<'a>(&'a self, wanted: &'a [&'a str]) -> impl Iterator<Item = &'a StructuredObject> {
        self.objects.iter().filter(move |o| o.is_type(wanted))
    }

    /// The object defining `id`. Bare `{"@id": ...}` references are skipped.
    pub fn find_by_id(&self, id: &str) -> Option<&StructuredObject> {
        self.objects
            .iter()
            .find(|o| o.id() == Some(id) && o.as_map().len() > 1)
    }
}

/// Collects every JSON-LD object on the page. Malformed blocks are skipped.
pub fn harvest(document: &Html) -> ObjectPool {
    let mut top_level = Vec::new();

    for (index, script) in document.select(json_ld_selector()).enumerate() {
        let raw = script.text().collect::<String>();
        match parse_block(&raw) {
            Some(value) => collect_top_level(value, &mut top_level),
            None => debug!("Skipping malformed JSON-LD block {}", index),
        }
    }

    let pool = ObjectPool::from_top_level(top_level);
    debug!("Harvested {} structured objects", pool.len());
    pool
}

fn parse_block(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(value);
    }
    serde_json::from_str::<Value>(&sanitize_json(raw)).ok()
}

fn collect_top_level(value: Value, out: &mut Vec<StructuredObject>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_top_level(item, out);
            }
        }
        Value::Object(mut map) => match map.remove("@graph") {
            Some(Value::Array(graph)) => {
                out.extend(graph.into_iter().filter_map(|item| match item {
                    Value::Object(member) => Some(StructuredObject(member)),
                    _ => None,
                }));
            }
            Some(Value::Object(member)) => out.push(StructuredObject(member)),
            Some(other) => {
                map.insert("@graph".to_string(), other);
                out.push(StructuredObject(map));
            }
            None => out.push(StructuredObject(map)),
        },
        _ => {}
    }
}

/// Strips the wrappers CMSes put around JSON-LD and trailing commas.
fn sanitize_json(json_str: &str) -> String {
    let cleaned = json_str
        .trim()
        .trim_start_matches("<![CDATA[")
        .trim_end_matches("]]>")
        .replace("<!--", "")
        .replace("-->", "");

    let mut result = String::with_capacity(cleaned.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = cleaned.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    result
}
