use crate::support::client_for;

use fulfil_client::{FindQuery, ModelApi};

use futures_util::TryStreamExt;
use serde_json::{Map, Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Routing
// ============================================================================

/// **VALUE**: Verifies proxies are stateless: two proxies for one name hit the same
/// endpoint with the same payload.
///
/// **BUG THIS CATCHES**: Would catch per-proxy state leaking into paths or bodies.
#[tokio::test]
async fn given_two_proxies_for_same_model_when_called_then_requests_are_identical() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/product.product/search"))
        .and(body_json(json!([[["salable", "=", true]], null, 5, null])))
        .and(query_param("context", "{}"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([3, 1])))
        .expect(2)
        .mount(&server)
        .await;
    let client = client_for(&server);

    // WHEN
    let first = client
        .model("product.product")
        .search(json!([["salable", "=", true]]), None, Some(5), None)
        .await
        .unwrap();
    let second = client
        .model("product.product")
        .search(json!([["salable", "=", true]]), None, Some(5), None)
        .await
        .unwrap();

    // THEN
    assert_eq!(first, vec![3, 1]);
    assert_eq!(first, second);
}

/// **VALUE**: Verifies created ids can be read back with `get`.
///
/// **BUG THIS CATCHES**: Would catch `create` wrapping records twice or `get` using
/// the call endpoint instead of the record path.
#[tokio::test]
async fn given_created_record_when_fetched_then_values_match() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/party.party/create"))
        .and(body_json(json!([[{"name": "ACME"}]])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([11])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/model/party.party/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 11, "name": "ACME"})))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    let party = client.model("party.party");

    // WHEN
    let ids = party.create(vec![json!({"name": "ACME"})]).await.unwrap();
    let record = party.get(ids[0]).await.unwrap();

    // THEN
    assert_eq!(ids, vec![11]);
    assert_eq!(record["name"], "ACME");
}

#[tokio::test]
async fn given_record_when_updated_then_write_called_with_single_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/sale.sale/write"))
        .and(body_json(json!([[5], {"comment": "rush"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let mut values = Map::new();
    values.insert(String::from("comment"), json!("rush"));
    client.record("sale.sale", 5).update(values).await.unwrap();
}

/// **VALUE**: Verifies `find` uses the listing endpoint with its query parameters.
///
/// **BUG THIS CATCHES**: Would catch `find` sending its filter in a body on a GET.
#[tokio::test]
async fn given_find_query_when_sent_then_listing_params_on_query_string() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/model/sale.sale"))
        .and(query_param("filter", r#"[["state","=","done"]]"#))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "25"))
        .and(query_param("field", "number"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "number": "SO1"}])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    let query = FindQuery::new(json!([["state", "=", "done"]]))
        .page(2)
        .per_page(25)
        .fields(["number"]);

    // WHEN
    let records = client.model("sale.sale").find(&query).await.unwrap();

    // THEN
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["number"], "SO1");
}

/// **VALUE**: Verifies per-proxy context is merged over the client context.
///
/// **BUG THIS CATCHES**: Would catch the proxy context replacing, rather than
/// extending, the client-wide context.
#[tokio::test]
async fn given_proxy_context_when_called_then_merged_over_client_context() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/product.product/search_count"))
        .and(query_param("context", r#"{"company":1,"locations":[4]}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(12)))
        .expect(1)
        .mount(&server)
        .await;
    let mut client = client_for(&server);
    let mut client_context = Map::new();
    client_context.insert(String::from("company"), json!(1));
    client.set_context(client_context);

    let mut proxy_context = Map::new();
    proxy_context.insert(String::from("locations"), json!([4]));
    let count = client
        .model("product.product")
        .with_context(proxy_context)
        .search_count(json!([]))
        .await
        .unwrap();

    assert_eq!(count, 12);
}

// ============================================================================
// Lazy pagination
// ============================================================================

fn page_mock(offset: usize, batch: usize, ids: &[i64]) -> Mock {
    let records: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/stock.move/search_read"))
        .and(body_json(json!([[], offset, batch, null, ["id"]])))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(records)))
        .expect(1)
}

/// **VALUE**: Verifies 7 matches with batch 3 take exactly 3 requests and yield every
/// record once, in order.
///
/// **WHY THIS MATTERS**: This is the only multi-request operation. Off-by-one offsets
/// duplicate or skip records; a missing short-page stop costs a request per stream.
///
/// **BUG THIS CATCHES**: Would catch offsets advancing by page number instead of
/// records seen, or a trailing empty-page request.
#[tokio::test]
async fn given_seven_records_and_batch_three_when_streamed_then_three_requests_each_record_once() {
    // GIVEN
    let server = MockServer::start().await;
    page_mock(0, 3, &[1, 2, 3]).mount(&server).await;
    page_mock(3, 3, &[4, 5, 6]).mount(&server).await;
    page_mock(6, 3, &[7]).mount(&server).await;
    let client = client_for(&server);

    // WHEN
    let records: Vec<Value> = client
        .model("stock.move")
        .search_read_all(json!([]), None, vec![String::from("id")], Some(3))
        .try_collect()
        .await
        .unwrap();

    // THEN
    let ids: Vec<i64> = records.iter().filter_map(|r| r["id"].as_i64()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn given_exact_multiple_when_streamed_then_stops_on_empty_page() {
    let server = MockServer::start().await;
    page_mock(0, 2, &[1, 2]).mount(&server).await;
    page_mock(2, 2, &[]).mount(&server).await;
    let client = client_for(&server);

    let records: Vec<Value> = client
        .model("stock.move")
        .search_read_all(json!([]), None, vec![String::from("id")], Some(2))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
}

/// **VALUE**: Verifies the stream is lazy: nothing is fetched until it is polled.
///
/// **BUG THIS CATCHES**: Would catch the first page being requested eagerly when the
/// stream is created.
#[tokio::test]
async fn given_unpolled_stream_when_dropped_then_no_request_sent() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let model = client.model("stock.move");

    let stream = model.search_read_all(json!([]), None, Vec::new(), None);
    drop(stream);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn given_failing_page_when_streamed_then_error_surfaces() {
    let server = MockServer::start().await;
    page_mock(0, 2, &[1, 2]).mount(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/stock.move/search_read"))
        .and(body_json(json!([[], 2, 2, null, ["id"]])))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let result: Result<Vec<Value>, _> = client
        .model("stock.move")
        .search_read_all(json!([]), None, vec![String::from("id")], Some(2))
        .try_collect()
        .await;

    assert_eq!(result.unwrap_err().status_code(), Some(500));
}

// ============================================================================
// Record-level verbs
// ============================================================================

/// **VALUE**: Verifies `read` sends the ids and field names as two positional lists.
///
/// **BUG THIS CATCHES**: Would catch the field list being flattened into the id list.
#[tokio::test]
async fn given_ids_and_fields_when_read_then_body_is_two_lists() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/product.product/read"))
        .and(body_json(json!([[1, 2], ["code", "list_price"]])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "code": "A"},
            {"id": 2, "code": "B"},
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    // WHEN
    let records = client
        .model("product.product")
        .read(&[1, 2], &["code", "list_price"])
        .await
        .unwrap();

    // THEN
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["code"], "B");
}

#[tokio::test]
async fn given_ids_when_deleted_then_body_wraps_id_list() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/sale.line/delete"))
        .and(body_json(json!([[21, 22]])))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Null))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    client.model("sale.line").delete(&[21, 22]).await.unwrap();
}

/// **VALUE**: Verifies attachments go through `ir.attachment` with a `model,id`
/// resource reference.
///
/// **BUG THIS CATCHES**: Would catch the call being sent to the record's own model
/// or the resource being encoded as a pair instead of `"sale.sale,5"`.
#[tokio::test]
async fn given_record_when_file_attached_then_attachment_model_called() {
    // GIVEN
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/ir.attachment/add_attachment_from_url"))
        .and(body_json(json!([
            "f.pdf",
            "https://files.example.com/f.pdf",
            "sale.sale,5",
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(31)))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    // WHEN
    let attachment = client
        .model("sale.sale")
        .attach(5, "f.pdf", "https://files.example.com/f.pdf")
        .await
        .unwrap();

    // THEN
    assert_eq!(attachment, json!(31));
}

/// **VALUE**: Verifies queries reach the server with `active_test` in the context.
///
/// **BUG THIS CATCHES**: Would catch the active-only flag never leaving the client,
/// so archived records show up in counts.
#[tokio::test]
async fn given_query_when_counted_then_active_test_sent_in_context() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v2/model/party.party/search_count"))
        .and(body_json(json!([[["name", "=", "ACME"]]])))
        .and(query_param("context", r#"{"active_test":true}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(2)))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let count = client
        .model("party.party")
        .query()
        .filter_by("name", "ACME")
        .count()
        .await
        .unwrap();

    assert_eq!(count, 2);
}
