use vel_adapters::extract_product_page;

const URL: &str = "https://store.acme.test/tools/drill-kit";

fn fixture() -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures/live-page/product.html");
    std::fs::read_to_string(path).expect("fixture present")
}

#[test]
fn live_page_fixture_extracts_grounded_item() {
    let item = extract_product_page(&fixture(), URL).unwrap();

    assert_eq!(item.product.name, "Cordless Drill Kit 20V");
    assert_eq!(item.product.competitor.as_deref(), Some("store.acme.test"));
    assert_eq!(item.product.insight, "Live data extracted from store.acme.test");

    let price = item.price.expect("price extracted");
    assert_eq!(price.price, 129.0);
    assert_eq!(price.source_url.as_deref(), Some(URL));

    let sentiment = item.sentiment.expect("reviews found");
    assert_eq!(sentiment.raw_reviews.len(), 2);
    // (1.0 + -1.0) / 2
    assert_eq!(sentiment.score, 0.0);
    assert_eq!(sentiment.source_url.as_deref(), Some(URL));
}
