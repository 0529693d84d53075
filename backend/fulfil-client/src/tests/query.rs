use crate::{FulfilApi, FulfilError, MockFulfil, ModelApi};

use serde_json::{Value, json};

/// **VALUE**: Verifies the builder composes domain, window and order into one
/// `search_read`.
///
/// **WHY THIS MATTERS**: The query is only sugar; the call it produces must be the
/// exact positional form the server takes.
///
/// **BUG THIS CATCHES**: Would catch offset and limit swapping places, or clauses
/// from `filter_by` replacing each other instead of accumulating.
#[tokio::test]
async fn given_chained_query_when_all_then_single_search_read_with_every_part() {
    // GIVEN
    let fulfil = MockFulfil::new();
    let sale = fulfil.model("sale.sale");
    sale.return_value("search_read", json!([{"id": 4}, {"id": 9}]));
    let query = fulfil
        .model("sale.sale")
        .query()
        .filter_by("state", "processing")
        .filter_by("channel", 2)
        .fields(["reference", "total_amount"])
        .order_by(json!([["sale_date", "DESC"]]))
        .offset(10)
        .limit(5);

    // WHEN
    let records = query.all().await.unwrap();

    // THEN
    assert_eq!(records, vec![json!({"id": 4}), json!({"id": 9})]);
    sale.assert_called_with(
        "search_read",
        &[
            json!([["state", "=", "processing"], ["channel", "=", 2]]),
            json!(10),
            json!(5),
            json!([["sale_date", "DESC"]]),
            json!(["reference", "total_amount"]),
        ],
    );
    let call = sale.calls().pop().unwrap();
    assert_eq!(call.context.get("active_test"), Some(&json!(true)));
}

/// **VALUE**: Verifies refining a clone leaves the original query untouched.
///
/// **BUG THIS CATCHES**: Would catch shared clause lists between branches of one
/// base query.
#[tokio::test]
async fn given_base_query_when_branched_then_branches_are_independent() {
    let fulfil = MockFulfil::new();
    let base = fulfil.model("product.product").query().filter_by("salable", true);

    let narrowed = base.clone().filter_by("type", "goods");
    let replaced = base.clone().filter_by_domain(json!([["code", "like", "AB%"]]));

    assert_eq!(base.domain(), json!([["salable", "=", true]]));
    assert_eq!(
        narrowed.domain(),
        json!([["salable", "=", true], ["type", "=", "goods"]])
    );
    assert_eq!(replaced.domain(), json!([["code", "like", "AB%"]]));
}

#[tokio::test]
async fn given_count_programmed_when_count_and_exists_then_follow_search_count() {
    let fulfil = MockFulfil::new();
    let party = fulfil.model("party.party");
    party.return_value("search_count", json!(3));
    let query = fulfil
        .model("party.party")
        .query()
        .filter_by("name", "ACME")
        .show_active_only(false);

    assert_eq!(query.count().await.unwrap(), 3);
    assert!(query.exists().await.unwrap());

    party.assert_called_with("search_count", &[json!([["name", "=", "ACME"]])]);
    let call = party.calls().pop().unwrap();
    assert_eq!(call.context.get("active_test"), Some(&json!(false)));

    party.return_value("search_count", json!(0));
    assert!(!query.exists().await.unwrap());
}

#[tokio::test]
async fn given_matches_when_first_then_limit_one_and_first_record() {
    let fulfil = MockFulfil::new();
    let product = fulfil.model("product.product");
    product.return_value("search_read", json!([{"id": 7}]));
    let query = fulfil.model("product.product").query();

    let first = query.first().await.unwrap();

    assert_eq!(first, Some(json!({"id": 7})));
    let args = product.calls_to("search_read").pop().unwrap();
    assert_eq!(args[2], json!(1));

    product.return_value("search_read", json!([]));
    assert_eq!(query.first().await.unwrap(), None);
}

/// **VALUE**: Verifies `one` distinguishes none, one and many.
///
/// **BUG THIS CATCHES**: Would catch `one` silently returning the first of several
/// matches, which hides ambiguous lookups.
#[tokio::test]
async fn given_result_sizes_when_one_then_exactly_one_accepted() {
    // GIVEN
    let fulfil = MockFulfil::new();
    let product = fulfil.model("product.product");
    let query = fulfil.model("product.product").query().filter_by("code", "AB-1");

    // WHEN / THEN
    product.return_value("search_read", json!([{"id": 1}]));
    assert_eq!(query.one().await.unwrap(), json!({"id": 1}));
    assert_eq!(product.calls_to("search_read").pop().unwrap()[2], json!(2));

    product.return_value("search_read", json!([]));
    assert!(matches!(
        query.one().await,
        Err(FulfilError::NoResultFound { .. })
    ));

    product.return_value("search_read", json!([{"id": 1}, {"id": 2}]));
    assert!(matches!(
        query.one().await,
        Err(FulfilError::MultipleResultsFound { .. })
    ));
}

#[tokio::test]
async fn given_id_when_get_then_archived_records_included() {
    let fulfil = MockFulfil::new();
    let product = fulfil.model("product.product");
    product.return_value("search_read", json!([{"id": 12, "active": false}]));

    let record = fulfil
        .model("product.product")
        .query()
        .filter_by("salable", true)
        .get(12)
        .await
        .unwrap();

    assert_eq!(record, Some(json!({"id": 12, "active": false})));
    let call = product.calls().pop().unwrap();
    assert_eq!(call.args[0], json!([["id", "=", 12]]));
    assert_eq!(call.context.get("active_test"), Some(&json!(false)));
}

/// **VALUE**: Verifies bulk delete and archive act on the ids the domain matches.
///
/// **WHY THIS MATTERS**: These are destructive; the ids passed on must be exactly the
/// ones searched for.
///
/// **BUG THIS CATCHES**: Would catch archive deleting instead of writing
/// `active = false`, or an empty match still issuing a write.
#[tokio::test]
async fn given_matching_ids_when_delete_and_archive_then_ids_forwarded() {
    // GIVEN
    let fulfil = MockFulfil::new();
    let line = fulfil.model("sale.line");
    line.return_value("search", json!([21, 22]));
    let query = fulfil.model("sale.line").query().filter_by("sale", 5);

    // WHEN
    let deleted = query.delete().await.unwrap();
    let archived = query.archive().await.unwrap();

    // THEN
    assert_eq!(deleted, vec![21, 22]);
    assert_eq!(archived, vec![21, 22]);
    line.assert_called_with(
        "search",
        &[json!([["sale", "=", 5]]), Value::Null, Value::Null, Value::Null],
    );
    line.assert_called_with("delete", &[json!([21, 22])]);
    line.assert_called_with("write", &[json!([21, 22]), json!({"active": false})]);
}

#[tokio::test]
async fn given_no_matches_when_archived_then_nothing_written() {
    let fulfil = MockFulfil::new();
    let line = fulfil.model("sale.line");
    line.return_value("search", json!([]));

    let archived = fulfil.model("sale.line").query().archive().await.unwrap();

    assert!(archived.is_empty());
    line.assert_not_called("write");
}
