use crate::model::decode;
use crate::{Client, FindQuery, ModelApi};

use serde_json::{Value, json};

/// **VALUE**: Verifies the listing defaults match the server's own defaults.
///
/// **BUG THIS CATCHES**: Would catch page numbering starting at 0, which silently
/// skips the first page.
#[test]
fn given_default_find_query_when_encoded_then_page_one_of_ten() {
    // GIVEN
    let query = FindQuery::default();

    // WHEN
    let pairs = query.to_query().unwrap();

    // THEN
    assert_eq!(
        pairs,
        vec![
            (String::from("filter"), String::from("[]")),
            (String::from("page"), String::from("1")),
            (String::from("per_page"), String::from("10")),
        ]
    );
}

/// **VALUE**: Verifies fields are sent as repeated `field` params and order only
/// when set.
///
/// **BUG THIS CATCHES**: Would catch fields being comma-joined into one param, which
/// the server reads as a single unknown field.
#[test]
fn given_fields_and_order_when_encoded_then_field_repeats_and_order_is_json() {
    let query = FindQuery::new(json!([["state", "=", "done"]]))
        .page(2)
        .per_page(50)
        .fields(["number", "shipment_address.country.code"])
        .order(json!([["create_date", "DESC"]]));

    let pairs = query.to_query().unwrap();

    let fields: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k == "field")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(fields, vec!["number", "shipment_address.country.code"]);
    assert!(pairs.contains(&(String::from("page"), String::from("2"))));
    assert!(pairs.contains(&(
        String::from("order"),
        String::from(r#"[["create_date","DESC"]]"#)
    )));
}

#[test]
fn given_null_result_when_decoded_then_empty_value() {
    let ids: Vec<i64> = decode(Value::Null).unwrap();
    let count: u64 = decode(Value::Null).unwrap();

    assert!(ids.is_empty());
    assert_eq!(count, 0);
}

/// **VALUE**: Verifies a result of the wrong shape is a decoding error, not a panic.
///
/// **BUG THIS CATCHES**: Would catch `search` returning records instead of ids being
/// accepted and truncated.
#[test]
fn given_wrong_shape_when_decoded_then_json_error() {
    let result: Result<Vec<i64>, _> = decode(json!([{"id": 1}]));

    assert_eq!(result.unwrap_err().error_category(), "decode");
}

#[test]
fn given_model_name_when_proxy_created_then_path_and_record_follow_name() {
    let client = Client::new("acme").unwrap();

    let model = client.model("sale.sale");
    let record = client.record("sale.sale", 42);

    assert_eq!(model.path(), "model/sale.sale");
    assert_eq!(model.name(), "sale.sale");
    assert_eq!(record.id(), 42);
    assert_eq!(record.model().name(), "sale.sale");
}
