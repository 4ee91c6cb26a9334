//! Recipe detection from page structure, for pages without structured data.
//!
//! A recipe title is an `h2`/`h3` whose `id` and visible text start with the
//! same word. Its body is every sibling element up to the next `h1`-`h3`.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

use crate::model::RecipeDetails;

const TIMING_KEYWORDS: [&str; 5] = ["prep", "cook", "total", "serves", "makes"];

fn heading_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("h2[id], h3[id]").expect("valid heading selector"))
}

fn img_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("img[src]").expect("valid img selector"))
}

fn br_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("br").expect("valid br selector"))
}

fn leading_token(text: &str, separators: &[char]) -> Option<String> {
    text.split(separators)
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn is_title_heading(heading: &ElementRef) -> bool {
    let Some(id) = heading.value().id() else {
        return false;
    };
    let text = element_text(heading);
    match (
        leading_token(id, &['-', '_']),
        leading_token(&text, &[' ', '\t', '\n']),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn is_section_break(element: &ElementRef) -> bool {
    matches!(element.value().name(), "h1" | "h2" | "h3")
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A timing line opens with a keyword immediately followed by a quantity,
/// as in "Prep 20 min" or "Serves: 4".
fn is_timing(text: &str) -> bool {
    let mut words = text.split_whitespace();
    let keyword = words
        .next()
        .and_then(|first| leading_token(first, &[':']))
        .is_some_and(|first| TIMING_KEYWORDS.contains(&first.as_str()));
    keyword
        && words
            .next()
            .is_some_and(|quantity| quantity.starts_with(|c: char| c.is_ascii_digit()))
}

fn assign_timing(keyword: &str, value: String, details: &mut RecipeDetails) {
    if value.is_empty() {
        return;
    }
    match keyword {
        "prep" => details.prep_time = Some(value),
        "cook" => details.cook_time = Some(value),
        "total" => details.total_time = Some(value),
        _ => details.recipe_yield = Some(Value::String(value)),
    }
}

/// Splits "Prep 15 min Cook 1 hr Serves 4" into its keyword/value pairs.
fn apply_timing(text: &str, details: &mut RecipeDetails) {
    let mut current: Option<String> = None;
    let mut words: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        let token = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if TIMING_KEYWORDS.contains(&token.as_str()) {
            if let Some(keyword) = current.replace(token) {
                assign_timing(&keyword, words.join(" "), details);
            }
            words.clear();
        } else {
            words.push(word);
        }
    }
    if let Some(keyword) = current {
        assign_timing(&keyword, words.join(" "), details);
    }
}

fn list_lines(paragraph: &ElementRef) -> Vec<Value> {
    paragraph
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Value::String(line.to_string()))
        .collect()
}

fn scan_recipe(heading: ElementRef) -> RecipeDetails {
    let mut details = RecipeDetails {
        recipe_name: Some(element_text(&heading)),
        ..Default::default()
    };
    let mut ingredients: Vec<Value> = Vec::new();
    let mut instructions: Vec<Value> = Vec::new();

    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        if is_section_break(&sibling) {
            break;
        }

        if details.image.is_none() {
            let src = if sibling.value().name() == "img" {
                sibling.value().attr("src")
            } else {
                sibling
                    .select(img_selector())
                    .next()
                    .and_then(|img| img.value().attr("src"))
            };
            details.image = src.map(str::to_string);
        }

        if sibling.value().name() != "p" {
            continue;
        }
        let text = element_text(&sibling);
        if text.is_empty() {
            continue;
        }

        if is_timing(&text) && details.prep_time.is_none() && details.cook_time.is_none() {
            apply_timing(&text, &mut details);
        } else if sibling.select(br_selector()).next().is_some() {
            ingredients.extend(list_lines(&sibling));
        } else if details.description.is_none() {
            details.description = Some(text);
        } else {
            instructions.push(Value::String(text));
        }
    }

    if !ingredients.is_empty() {
        details.ingredients = Some(Value::Array(ingredients));
    }
    if !instructions.is_empty() {
        details.instructions = Some(Value::Array(instructions));
    }
    details
}

pub(crate) fn scan_headings(document: &Html) -> Vec<RecipeDetails> {
    document
        .select(heading_selector())
        .filter(is_title_heading)
        .map(scan_recipe)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ARTICLE: &str = r#"<html><body><div class="article-body">
        <p>Two summer dishes from the weekend.</p>
        <h2 id="carrot-and-cucumber-pickle"><strong>Carrot and cucumber pickle</strong></h2>
        <figure><img src="https://i.guim.co.uk/pickle.jpg" alt="pickle"></figure>
        <p>A sharp, bright pickle for cold meats.</p>
        <p>Prep 20 min Cook 5 min Serves 6</p>
        <p>2 carrots<br>1 cucumber<br>200ml cider vinegar</p>
        <p>Peel the carrots into ribbons.</p>
        <p>Warm the vinegar and pour over.</p>
        <h2 id="gooseberry-flapjacks">Gooseberry flapjacks</h2>
        <p>Buttery and tart.</p>
        <h2 id="related">More from Nigel</h2>
        <p>Not a recipe.</p>
    </div></body></html>"#;

    #[test]
    fn test_headings_with_matching_ids_become_recipes() {
        let document = Html::parse_document(ARTICLE);
        let recipes = scan_headings(&document);

        assert_eq!(recipes.len(), 2);
        let pickle = &recipes[0];
        assert_eq!(pickle.recipe_name.as_deref(), Some("Carrot and cucumber pickle"));
        assert_eq!(pickle.image.as_deref(), Some("https://i.guim.co.uk/pickle.jpg"));
        assert_eq!(
            pickle.description.as_deref(),
            Some("A sharp, bright pickle for cold meats.")
        );
        assert_eq!(pickle.prep_time.as_deref(), Some("20 min"));
        assert_eq!(pickle.cook_time.as_deref(), Some("5 min"));
        assert_eq!(pickle.recipe_yield, Some(json!("6")));
        assert_eq!(
            pickle.ingredients,
            Some(json!(["2 carrots", "1 cucumber", "200ml cider vinegar"]))
        );
        assert_eq!(
            pickle.instructions,
            Some(json!([
                "Peel the carrots into ribbons.",
                "Warm the vinegar and pour over."
            ]))
        );

        let flapjacks = &recipes[1];
        assert_eq!(flapjacks.recipe_name.as_deref(), Some("Gooseberry flapjacks"));
        assert_eq!(flapjacks.description.as_deref(), Some("Buttery and tart."));
        assert!(flapjacks.image.is_none());
        assert!(flapjacks.ingredients.is_none());
    }

    #[test]
    fn test_cooking_step_is_not_a_timing_line() {
        let document = Html::parse_document(
            r#"<h2 id="onion-tart">Onion tart</h2>
               <p>Sweet and savoury.</p>
               <p>4 onions<br>1 sheet puff pastry</p>
               <p>Cook the onions slowly until golden.</p>
               <p>Serves: 4</p>"#,
        );
        let recipes = scan_headings(&document);

        assert_eq!(recipes.len(), 1);
        let tart = &recipes[0];
        assert!(tart.cook_time.is_none());
        assert_eq!(
            tart.instructions,
            Some(json!(["Cook the onions slowly until golden."]))
        );
        assert_eq!(tart.recipe_yield, Some(json!("4")));
    }

    #[test]
    fn test_page_without_matching_headings_yields_nothing() {
        let document = Html::parse_document(
            r#"<h2 id="intro">Welcome</h2><p>Prep 5 min</p><h3>Untitled</h3>"#,
        );
        assert!(scan_headings(&document).is_empty());
    }
}
