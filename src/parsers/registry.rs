//! Mapping from site host to parser variant and fetch mode.

use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

use super::{
    GenericParser, GuardianParser, HouseAndGardenParser, PinchOfYumParser, RecipeTinEatsParser,
    SiteParser, UnknownParser,
};
use crate::fetchers::FetchMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    Generic,
    Unknown,
    RecipeTinEats,
    Guardian,
    HouseAndGarden,
    PinchOfYum,
}

impl ParserKind {
    pub fn build(self) -> Box<dyn SiteParser> {
        match self {
            ParserKind::Generic => Box::new(GenericParser),
            ParserKind::Unknown => Box::new(UnknownParser),
            ParserKind::RecipeTinEats => Box::new(RecipeTinEatsParser),
            ParserKind::Guardian => Box::new(GuardianParser),
            ParserKind::HouseAndGarden => Box::new(HouseAndGardenParser),
            ParserKind::PinchOfYum => Box::new(PinchOfYumParser),
        }
    }
}

/// How one site is fetched and parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SiteEntry {
    pub parser: ParserKind,
    #[serde(default)]
    pub archive: bool,
    #[serde(default)]
    pub render: bool,
}

impl SiteEntry {
    pub const fn new(parser: ParserKind) -> Self {
        Self {
            parser,
            archive: false,
            render: false,
        }
    }

    pub const fn archived(parser: ParserKind) -> Self {
        Self {
            parser,
            archive: true,
            render: false,
        }
    }

    pub fn fetch_mode(&self) -> FetchMode {
        FetchMode {
            archive: self.archive,
            render: self.render,
        }
    }
}

const BUILT_IN: [(&str, SiteEntry); 7] = [
    ("recipetineats.com", SiteEntry::new(ParserKind::RecipeTinEats)),
    ("theguardian.com", SiteEntry::new(ParserKind::Guardian)),
    ("houseandgarden.co.uk", SiteEntry::new(ParserKind::HouseAndGarden)),
    ("pinchofyum.com", SiteEntry::new(ParserKind::PinchOfYum)),
    ("bbcgoodfood.com", SiteEntry::new(ParserKind::Generic)),
    ("seriouseats.com", SiteEntry::new(ParserKind::Generic)),
    ("cooking.nytimes.com", SiteEntry::archived(ParserKind::Generic)),
];

/// Registrable host of `url`: lowercased, without a leading `www.` or a port.
pub fn site_host(url: &str) -> String {
    let host = match Url::parse(url) {
        Ok(parsed) => parsed.host_str().unwrap_or_default().to_string(),
        // schemeless input such as "www.example.com/recipe"
        Err(_) => url
            .split('/')
            .next()
            .unwrap_or_default()
            .split(':')
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let host = host.to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

#[derive(Debug, Clone)]
pub struct SiteRegistry {
    sites: HashMap<String, SiteEntry>,
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SiteRegistry {
    pub fn builtin() -> Self {
        Self {
            sites: BUILT_IN
                .iter()
                .map(|(host, entry)| (host.to_string(), *entry))
                .collect(),
        }
    }

    /// Built-in registrations with `overrides` layered on top.
    pub fn with_overrides(overrides: &HashMap<String, SiteEntry>) -> Self {
        let mut registry = Self::builtin();
        for (host, entry) in overrides {
            registry.register(host, *entry);
        }
        registry
    }

    pub fn register(&mut self, host: &str, entry: SiteEntry) {
        self.sites.insert(site_host(host), entry);
    }

    /// Entry for the site serving `url`; unregistered sites get the unknown parser.
    pub fn lookup(&self, url: &str) -> SiteEntry {
        self.sites
            .get(&site_host(url))
            .copied()
            .unwrap_or(SiteEntry::new(ParserKind::Unknown))
    }

    pub fn is_registered(&self, url: &str) -> bool {
        self.sites.contains_key(&site_host(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_host_normalisation() {
        assert_eq!(
            site_host("https://www.theguardian.com/food/article/2024/jun/30/x"),
            "theguardian.com"
        );
        assert_eq!(site_host("https://Cooking.NYTimes.com/recipes/1"), "cooking.nytimes.com");
        assert_eq!(site_host("http://127.0.0.1:8080/r"), "127.0.0.1");
        assert_eq!(site_host("www.pinchofyum.com/tacos"), "pinchofyum.com");
    }

    #[test]
    fn test_lookup_falls_back_to_unknown() {
        let registry = SiteRegistry::builtin();
        assert_eq!(
            registry.lookup("https://www.recipetineats.com/chasseur/").parser,
            ParserKind::RecipeTinEats
        );
        assert!(registry.lookup("https://cooking.nytimes.com/r/1").archive);
        assert_eq!(
            registry.lookup("https://blog.example.org/soup").parser,
            ParserKind::Unknown
        );
        assert!(!registry.is_registered("https://blog.example.org/soup"));
    }

    #[test]
    fn test_overrides_replace_builtins() {
        let overrides = HashMap::from([
            ("www.seriouseats.com".to_string(), SiteEntry::archived(ParserKind::Generic)),
            ("localhost".to_string(), SiteEntry::new(ParserKind::Guardian)),
        ]);
        let registry = SiteRegistry::with_overrides(&overrides);

        assert!(registry.lookup("https://seriouseats.com/x").archive);
        assert_eq!(
            registry.lookup("http://localhost:1234/x").parser,
            ParserKind::Guardian
        );
        assert_eq!(registry.lookup("http://localhost:1234/x").fetch_mode(), FetchMode::default());
    }

    #[test]
    fn test_every_kind_builds() {
        for (_, entry) in BUILT_IN {
            assert!(!entry.parser.build().name().is_empty());
        }
        assert!(ParserKind::Unknown.build().always_dump());
        assert!(!ParserKind::Generic.build().always_dump());
    }
}
