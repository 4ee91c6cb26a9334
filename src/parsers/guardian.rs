use super::heading_scan::scan_headings;
use super::{PageContext, SiteParser};
use crate::model::RecipeDetails;

const SOURCE: &str = "The Guardian";

/// theguardian.com: most food columns publish no Recipe objects, so recipes
/// are read from the article's heading structure.
pub struct GuardianParser;

impl SiteParser for GuardianParser {
    fn name(&self) -> &'static str {
        "guardian"
    }

    fn source(&self, _ctx: &PageContext) -> String {
        SOURCE.to_string()
    }

    fn scan_document(&self, ctx: &PageContext) -> Vec<RecipeDetails> {
        scan_headings(ctx.document)
    }
}
