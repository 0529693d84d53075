use crate::{FulfilApi, FulfilError, MockFulfil, ModelApi};

use futures_util::TryStreamExt;
use serde_json::{Value, json};

/// Application code under test: deactivates every product.
async fn deactivate_products<F: FulfilApi>(fulfil: &F) -> Result<usize, FulfilError> {
    let product = fulfil.model("product.product");
    let products: Vec<Value> = product
        .search_read_all(json!([]), None, vec![String::from("id")], None)
        .try_collect()
        .await?;
    let ids: Vec<i64> = products.iter().filter_map(|p| p["id"].as_i64()).collect();
    product.write(&ids, json!({"active": false})).await?;
    Ok(ids.len())
}

/// **VALUE**: Verifies code written against `FulfilApi` runs entirely on the mock.
///
/// **WHY THIS MATTERS**: This is the whole point of the mock; business logic gets
/// tested without a tenant.
///
/// **BUG THIS CATCHES**: Would catch the mock handing out a fresh model per call,
/// which loses the programmed values and the recorded calls.
#[tokio::test]
async fn given_programmed_search_read_all_when_app_runs_then_calls_are_recorded() {
    // GIVEN
    let fulfil = MockFulfil::new();
    let product = fulfil.model("product.product");
    product.return_value(
        "search_read_all",
        json!([{"id": 1}, {"id": 2}, {"id": 3}]),
    );

    // WHEN
    let count = deactivate_products(&fulfil).await.unwrap();

    // THEN
    assert_eq!(count, 3);
    product.assert_called("search_read_all");
    product.assert_called_with("search_read_all", &[json!([]), Value::Null, json!(["id"])]);
    product.assert_called_with("write", &[json!([1, 2, 3]), json!({"active": false})]);
}

/// **VALUE**: Verifies reset drops models with their history.
///
/// **BUG THIS CATCHES**: Would catch recorded calls leaking from one test scenario
/// into the next.
#[tokio::test]
async fn given_reset_when_model_requested_again_then_history_is_gone() {
    // GIVEN
    let fulfil = MockFulfil::new();
    deactivate_products(&fulfil).await.unwrap();
    fulfil.model("product.product").assert_called("search_read_all");

    // WHEN
    fulfil.reset();

    // THEN
    let product = fulfil.model("product.product");
    product.assert_not_called("search_read_all");
    assert!(product.calls().is_empty());
}

/// **VALUE**: Verifies side effects answer based on the arguments.
///
/// **BUG THIS CATCHES**: Would catch side effects receiving the wrong argument list
/// or being shadowed by a return value.
#[tokio::test]
async fn given_side_effect_when_search_called_then_answer_depends_on_domain() {
    // GIVEN
    let fulfil = MockFulfil::new();
    let product = fulfil.model("product.product");
    product.return_value("search", json!([99]));
    product.side_effect("search", |args| {
        if args[0] == json!([]) {
            Ok(json!([1, 2, 3, 4, 5]))
        } else {
            Ok(json!([1, 2, 3]))
        }
    });

    // WHEN
    let all = product.search(json!([]), None, None, None).await.unwrap();
    let salable = product
        .search(json!([["salable", "=", true]]), None, None, None)
        .await
        .unwrap();

    // THEN
    assert_eq!(all, vec![1, 2, 3, 4, 5]);
    assert_eq!(salable, vec![1, 2, 3]);
    assert_eq!(product.calls_to("search").len(), 2);
}

#[tokio::test]
async fn given_side_effect_error_when_called_then_error_propagates() {
    let fulfil = MockFulfil::new();
    let sale = fulfil.model("sale.sale");
    sale.side_effect("create", |_| Err(FulfilError::validation("boom")));

    let result = sale.create(vec![json!({"party": 1})]).await;

    assert!(matches!(result, Err(FulfilError::Validation { .. })));
}

/// **VALUE**: Verifies `get` and `find` are recorded with their full argument lists.
///
/// **BUG THIS CATCHES**: Would catch defaults being dropped from the recorded call,
/// making `assert_called_with` comparisons brittle.
#[tokio::test]
async fn given_get_and_find_when_called_then_recorded_with_arguments() {
    let fulfil = MockFulfil::new();
    let party = fulfil.model("party.party");
    party.return_value("get", json!({"id": 5, "name": "ACME"}));

    let record = party.get(5).await.unwrap();
    let found = party
        .find(&crate::FindQuery::new(json!([["name", "ilike", "a%"]])).fields(["name"]))
        .await
        .unwrap();

    assert_eq!(record["name"], "ACME");
    assert!(found.is_empty());
    party.assert_called_with("get", &[json!(5)]);
    party.assert_called_with(
        "find",
        &[
            json!([["name", "ilike", "a%"]]),
            json!(1),
            json!(10),
            json!(["name"]),
            Value::Null,
        ],
    );
}

/// **VALUE**: Verifies unprogrammed pagination runs through `search_read` pages.
///
/// **BUG THIS CATCHES**: Would catch the offset not advancing or the stream not
/// stopping on a short page.
#[tokio::test]
async fn given_paged_search_read_when_streamed_then_each_record_once() {
    // GIVEN
    let fulfil = MockFulfil::new();
    let product = fulfil.model("product.product");
    product.side_effect("search_read", |args| {
        let offset = args[1].as_u64().unwrap_or(0);
        let limit = args[2].as_u64().unwrap_or(0);
        let page: Vec<Value> = (offset..(offset + limit).min(5))
            .map(|id| json!({"id": id}))
            .collect();
        Ok(Value::Array(page))
    });

    // WHEN
    let records: Vec<Value> = product
        .search_read_all(json!([]), None, vec![String::from("id")], Some(2))
        .try_collect()
        .await
        .unwrap();

    // THEN
    let ids: Vec<u64> = records.iter().filter_map(|r| r["id"].as_u64()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(product.calls_to("search_read").len(), 3);
}

#[test]
#[should_panic(expected = "expected product.product.write to have been called")]
fn given_uncalled_method_when_asserted_called_then_panics() {
    let fulfil = MockFulfil::new();

    fulfil.model("product.product").assert_called("write");
}
