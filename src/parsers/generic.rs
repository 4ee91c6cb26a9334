use super::SiteParser;

/// Default extraction for sites whose structured data follows schema.org conventions.
pub struct GenericParser;

impl SiteParser for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }
}

/// Default extraction for unregistered sites. Every page is dumped for inspection.
pub struct UnknownParser;

impl SiteParser for UnknownParser {
    fn name(&self) -> &'static str {
        "unknown"
    }

    fn always_dump(&self) -> bool {
        true
    }
}
