use scraper::Selector;
use std::sync::OnceLock;

use super::{decode_html_symbols, PageContext, SiteParser};
use crate::harvest::StructuredObject;

/// pinchofyum.com: the publisher is a `WebSite` object and the recipe's
/// structured image is a thumbnail, so the full photo is read from the page.
pub struct PinchOfYumParser;

const IMAGE_WIDTH: &str = "width=1200";

fn img_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("img[alt][src]").expect("valid img selector"))
}

impl SiteParser for PinchOfYumParser {
    fn name(&self) -> &'static str {
        "pinch_of_yum"
    }

    fn source(&self, ctx: &PageContext) -> String {
        ctx.pool
            .first_of_type(&["WebSite"])
            .and_then(|site| site.str_field("name"))
            .map(decode_html_symbols)
            .unwrap_or_else(|| self.default_source(ctx))
    }

    fn recipe_image(&self, recipe: &StructuredObject, ctx: &PageContext) -> Option<String> {
        let name = self.recipe_name(recipe)?;
        let src = ctx
            .document
            .select(img_selector())
            .find(|img| {
                img.value()
                    .attr("alt")
                    .is_some_and(|alt| alt.trim().eq_ignore_ascii_case(name.trim()))
            })
            .and_then(|img| img.value().attr("src"))?;

        let separator = if src.contains('?') { '&' } else { '?' };
        Some(format!("{src}{separator}{IMAGE_WIDTH}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::Page;
    use crate::harvest::harvest;
    use crate::parsers::testing::FakeImages;
    use crate::parsers::{extract_recipes, ParserSettings};

    const PAGE: &str = r#"<html><head>
        <script type="application/ld+json">{"@graph": [
            {"@type": "WebSite", "name": "Pinch of Yum"},
            {"@type": "Recipe", "name": "Crockpot Chicken Tacos", "image": ["https://pinchofyum.com/thumb-150x150.jpg"]}
        ]}</script></head>
        <body>
            <img alt="Something else" src="https://pinchofyum.com/other.jpg">
            <img alt="Crockpot Chicken Tacos" src="https://pinchofyum.com/tacos.jpg">
        </body></html>"#;

    #[tokio::test]
    async fn test_source_and_image_from_page() {
        let page = Page::from_html("https://pinchofyum.com/crockpot-chicken-tacos", PAGE);
        let pool = harvest(page.document());
        let images = FakeImages::default();
        let report = extract_recipes(
            &PinchOfYumParser,
            &page,
            &pool,
            &ParserSettings::default(),
            &images,
        )
        .await;

        let recipes = report.extraction.recipes();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].source, "Pinch of Yum");
        assert_eq!(
            *images.requests.lock().unwrap(),
            vec!["https://pinchofyum.com/tacos.jpg?width=1200".to_string()]
        );
    }
}
