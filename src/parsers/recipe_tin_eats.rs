use super::{PageContext, SiteParser};
use crate::harvest::StructuredObject;

const SOURCE: &str = "RecipeTin Eats";
const AUTHOR: &str = "Nagi Maehashi";

/// recipetineats.com: single-author site whose Person objects are unreliable.
pub struct RecipeTinEatsParser;

impl SiteParser for RecipeTinEatsParser {
    fn name(&self) -> &'static str {
        "recipe_tin_eats"
    }

    fn source(&self, _ctx: &PageContext) -> String {
        SOURCE.to_string()
    }

    fn page_author(&self, _ctx: &PageContext) -> Option<String> {
        Some(AUTHOR.to_string())
    }

    fn recipe_author(&self, _recipe: &StructuredObject, _ctx: &PageContext) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::Page;
    use crate::harvest::harvest;
    use crate::parsers::testing::FakeImages;
    use crate::parsers::{extract_recipes, ParserSettings};

    #[tokio::test]
    async fn test_fixed_attribution() {
        let page = Page::from_html(
            "https://www.recipetineats.com/chicken-chasseur/",
            r#"<script type="application/ld+json">{"@graph": [
                {"@type": "Organization", "name": "Some Network"},
                {"@type": "Person", "name": "admin"},
                {"@type": "Recipe", "name": "Chicken Chasseur", "author": {"name": "Guest"}}
            ]}</script>"#,
        );
        let pool = harvest(page.document());
        let report = extract_recipes(
            &RecipeTinEatsParser,
            &page,
            &pool,
            &ParserSettings::default(),
            &FakeImages::default(),
        )
        .await;

        let recipes = report.extraction.recipes();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].source, "RecipeTin Eats");
        assert_eq!(recipes[0].author.as_deref(), Some("Nagi Maehashi"));
    }
}
