use recipe_harvest::parsers::registry::{ParserKind, SiteEntry};
use recipe_harvest::{HarvestConfig, RecipeHarvester};
use serde_json::json;

#[tokio::test]
async fn test_guardian_column_without_json_ld() {
    let mut server = mockito::Server::new_async().await;
    let page = include_str!("fixtures/guardian_column.html").replace("{{SERVER}}", &server.url());
    let _page = server
        .mock("GET", "/food/article/2024/jun/30/nigel-slaters-recipes-for-carrot-and-cucumber-pickle")
        .with_status(200)
        .with_body(page)
        .create_async()
        .await;
    let _image = server
        .mock("GET", "/pickle.jpg")
        .with_status(200)
        .with_body("jpeg")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = HarvestConfig::default();
    config.images_dir = dir.path().join("images");
    config.dump_dir = dir.path().join("unprocessed");
    config.output_file = dir.path().join("recipes.json");
    config.url_delay_ms = 0;
    config.fetch.retries = 1;
    config
        .sites
        .insert("127.0.0.1".to_string(), SiteEntry::new(ParserKind::Guardian));

    let mut harvester = RecipeHarvester::builder().config(config).build().unwrap();
    let url = format!(
        "{}/food/article/2024/jun/30/nigel-slaters-recipes-for-carrot-and-cucumber-pickle",
        server.url()
    );
    let recipes = harvester.recipes_from_url(&url).await.unwrap();

    assert_eq!(recipes.len(), 2);

    let pickle = &recipes[0];
    assert_eq!(pickle.recipe_name, "Carrot and cucumber pickle");
    assert_eq!(pickle.source, "The Guardian");
    assert_eq!(
        pickle.description.as_deref(),
        Some("A quick pickle to serve with cold roast pork.")
    );
    assert_eq!(pickle.prep_time.as_deref(), Some("20 min"));
    assert_eq!(pickle.cook_time.as_deref(), Some("5 min"));
    assert_eq!(pickle.recipe_yield, Some(json!("6")));
    assert_eq!(
        pickle.ingredients,
        Some(json!([
            "carrots 2 medium",
            "cucumber 1",
            "cider vinegar 200ml",
            "caster sugar 2 tbsp"
        ]))
    );
    assert_eq!(
        pickle.instructions.as_ref().and_then(|i| i.as_array()).map(Vec::len),
        Some(2)
    );
    assert_eq!(
        pickle.image.as_deref(),
        Some("The_Guardian/Carrot and cucumber pickle.jpg")
    );

    let flapjacks = &recipes[1];
    assert_eq!(flapjacks.recipe_name, "Gooseberry flapjacks");
    assert_eq!(flapjacks.recipe_yield, Some(json!("12")));
    assert!(flapjacks.image.is_none());
}
