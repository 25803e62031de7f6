mod common;

use common::{post, words, MockSource};
use fetcher::{plan_run, FetchOptions, OutputDocument, Runner};
use rfetcher_core::{Category, RunConfig};
use serde_json::json;
use std::time::Duration;

fn runner(source: &MockSource) -> Runner<'_, MockSource> {
    let options = FetchOptions {
        item_delay: Duration::ZERO,
        ..FetchOptions::default()
    };
    Runner::with_options(source, options, Duration::ZERO)
}

fn source() -> MockSource {
    MockSource::with_posts(vec![
        post("1", "cargo workspaces", ""),
        post("2", "tokio runtime tuning", ""),
        post("3", "cargo and tokio together", "meme"),
        post("4", "lifetimes", ""),
    ])
}

fn categories() -> Vec<Category> {
    vec![
        Category::new("Tooling", words(&["cargo"])),
        Category::new("Async", words(&["tokio"])),
    ]
}

#[tokio::test]
async fn test_unfiltered_run() {
    let source = source();
    let mut config = RunConfig::new("rust");
    config.limit = 10;
    config.post_unwanted = words(&["meme"]);

    let plan = plan_run(&config, &categories()).unwrap();
    let document = runner(&source).run(&config, &plan).await;

    match &document {
        OutputDocument::Unfiltered { posts } => {
            let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids, vec!["1", "2", "4"]);
        }
        other => panic!("expected unfiltered document, got {:?}", other),
    }
    let value = document.to_value().unwrap();
    assert_eq!(value["posts"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_single_category_run() {
    let source = source();
    let mut config = RunConfig::new("rust");
    config.limit = 10;
    config.post_unwanted = words(&["meme"]);
    config.categories = words(&["Tooling"]);

    let plan = plan_run(&config, &categories()).unwrap();
    let document = runner(&source).run(&config, &plan).await;

    let value = document.to_value().unwrap();
    assert_eq!(value["category"], json!("Tooling"));
    let posts = value["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], json!("1"));
    assert!(posts[0].get("category").is_none());
}

#[tokio::test]
async fn test_multi_category_run_tags_posts() {
    let source = source();
    let mut config = RunConfig::new("rust");
    config.limit = 10;
    config.post_unwanted = words(&["meme"]);
    config.categories = words(&["Async", "Tooling"]);

    let plan = plan_run(&config, &categories()).unwrap();
    let document = runner(&source).run(&config, &plan).await;

    // Post-unwanted list does not apply per category, so post 3 shows up in both
    assert_eq!(document.post_count(), 4);

    let value = document.to_value().unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["Async", "Tooling"]);

    let async_posts = value["Async"].as_array().unwrap();
    let async_ids: Vec<&str> = async_posts.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(async_ids, vec!["2", "3"]);
    assert!(async_posts.iter().all(|p| p["category"] == json!("Async")));

    let tooling_ids: Vec<&str> = value["Tooling"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(tooling_ids, vec!["1", "3"]);

    // One probe per category
    assert_eq!(source.probe_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_category_pause_only_between_categories() {
    let source = source();
    let mut config = RunConfig::new("rust");
    config.limit = 10;
    config.categories = words(&["Async", "Tooling"]);

    let plan = plan_run(&config, &categories()).unwrap();
    let runner = Runner::new(&source);

    let start = tokio::time::Instant::now();
    let document = runner.run(&config, &plan).await;
    let elapsed = start.elapsed();

    assert_eq!(document.post_count(), 4);
    // Four admitted posts at 1.5 s plus a single 5 s pause between the two categories
    assert!(elapsed >= Duration::from_millis(11_000), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(11_500), "elapsed {:?}", elapsed);
}
