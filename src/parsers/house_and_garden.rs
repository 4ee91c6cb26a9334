use super::{decode_html_symbols, PageContext, SiteParser, RECIPE_TYPES};
use crate::harvest::{ObjectPool, StructuredObject};

const SOURCE: &str = "House and Garden";

/// houseandgarden.co.uk: pages carry a Recipe but no Article, so the Recipe
/// supplies the page title and its alternative headline.
pub struct HouseAndGardenParser;

impl SiteParser for HouseAndGardenParser {
    fn name(&self) -> &'static str {
        "house_and_garden"
    }

    fn article_object<'a>(&self, pool: &'a ObjectPool) -> Option<&'a StructuredObject> {
        pool.first_of_type(&RECIPE_TYPES)
    }

    fn source(&self, _ctx: &PageContext) -> String {
        SOURCE.to_string()
    }

    fn title(&self, article: Option<&StructuredObject>) -> Option<String> {
        article?.str_field("name").map(decode_html_symbols)
    }

    fn alternative_title(&self, article: Option<&StructuredObject>) -> Option<String> {
        article?
            .str_field("alternativeHeadline")
            .map(decode_html_symbols)
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
    async fn test_recipe_stands_in_for_article() {
        let page = Page::from_html(
            "https://www.houseandgarden.co.uk/recipe/plum-tart",
            r#"<script type="application/ld+json">[
                {"@type": "NewsArticle", "headline": "Ignored headline"},
                {"@type": "Recipe", "name": "Plum tart",
                 "alternativeHeadline": "A late summer classic",
                 "datePublished": "2023-09-01"}
            ]</script>"#,
        );
        let pool = harvest(page.document());
        let report = extract_recipes(
            &HouseAndGardenParser,
            &page,
            &pool,
            &ParserSettings::default(),
            &FakeImages::default(),
        )
        .await;

        assert_eq!(report.base.article_title.as_deref(), Some("Plum tart"));
        assert_eq!(
            report.base.alternative_title.as_deref(),
            Some("A late summer classic")
        );
        assert_eq!(report.base.published_date.as_deref(), Some("2023-09-01"));
        assert_eq!(report.base.source, "House and Garden");

        let recipes = report.extraction.recipes();
        assert_eq!(recipes.len(), 1);
        assert_eq!(
            recipes[0].alternative_title.as_deref(),
            Some("A late summer classic")
        );
    }
}
