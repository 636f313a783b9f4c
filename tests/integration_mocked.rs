/// Integration tests with a mocked Placekey API
/// Exercises the real HTTP client and the full run without hitting the hosted service
use placekey_join::config::Config;
use placekey_join::errors::AppError;
use placekey_join::merge::MatchPolicy;
use placekey_join::models::PlacekeyQuery;
use placekey_join::placekey::{PlacekeyClient, PlacekeyLookup};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(base_url: String, batch_size: usize) -> Config {
    Config {
        api_key: "test_key".to_string(),
        base_url,
        data_dir: "data".into(),
        batch_size,
        timeout_secs: 5,
        verbose: true,
        match_policy: MatchPolicy::Permissive,
    }
}

fn query(id: &str) -> PlacekeyQuery {
    PlacekeyQuery {
        query_id: id.to_string(),
        street_address: Some(format!("{} WOODWARD AVE", id)),
        city: Some("Detroit".to_string()),
        iso_country_code: "US".to_string(),
        ..Default::default()
    }
}

/// Answers every query in the request body with `pk-<query_id>`.
fn echo_placekeys(req: &Request) -> ResponseTemplate {
    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    let results: Vec<serde_json::Value> = body["queries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| {
            let id = q["query_id"].as_str().unwrap();
            serde_json::json!({"query_id": id, "placekey": format!("pk-{}", id)})
        })
        .collect();
    ResponseTemplate::new(200).set_body_json(results)
}

#[tokio::test]
async fn test_lookup_sends_api_key_and_queries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/placekeys"))
        .and(header("apikey", "test_key"))
        .and(body_partial_json(serde_json::json!({
            "queries": [{"query_id": "1", "city": "Detroit", "iso_country_code": "US"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"query_id": "1", "placekey": "@5vg-82n-kzz"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PlacekeyClient::new(&create_test_config(mock_server.uri(), 100)).unwrap();
    let results = client.lookup_placekeys(&[query("1")], true).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].query_id, "1");
    assert_eq!(results[0].placekey.as_deref(), Some("@5vg-82n-kzz"));
}

#[tokio::test]
async fn test_lookup_splits_into_batches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/placekeys"))
        .respond_with(echo_placekeys)
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = PlacekeyClient::new(&create_test_config(mock_server.uri(), 2)).unwrap();
    let queries: Vec<PlacekeyQuery> = ["1", "2", "3", "4", "5"].iter().map(|id| query(id)).collect();

    let results = client.lookup_placekeys(&queries, false).await.unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.query_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert!(results
        .iter()
        .all(|r| r.placekey.as_deref() == Some(format!("pk-{}", r.query_id).as_str())));
}

#[tokio::test]
async fn test_per_query_errors_are_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/placekeys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"query_id": "1", "placekey": "@5vg-82n-kzz"},
            {"query_id": "2", "error": "Invalid address"}
        ])))
        .mount(&mock_server)
        .await;

    let client = PlacekeyClient::new(&create_test_config(mock_server.uri(), 100)).unwrap();
    let results = client
        .lookup_placekeys(&[query("1"), query("2")], false)
        .await
        .unwrap();

    assert_eq!(results[1].placekey, None);
    assert_eq!(results[1].error.as_deref(), Some("Invalid address"));
}

#[tokio::test]
async fn test_unauthorized_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/placekeys"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid apikey"))
        .mount(&mock_server)
        .await;

    let client = PlacekeyClient::new(&create_test_config(mock_server.uri(), 100)).unwrap();
    let result = client.lookup_placekeys(&[query("1")], false).await;

    match result {
        Err(AppError::ExternalApiError(msg)) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("Invalid apikey"));
        }
        other => panic!("Expected ExternalApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_quota_error_stops_remaining_batches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/placekeys"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit exceeded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PlacekeyClient::new(&create_test_config(mock_server.uri(), 1)).unwrap();
    let result = client
        .lookup_placekeys(&[query("1"), query("2"), query("3")], false)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_malformed_response_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/placekeys"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let client = PlacekeyClient::new(&create_test_config(mock_server.uri(), 100)).unwrap();
    let result = client.lookup_placekeys(&[query("1")], false).await;

    assert!(matches!(result, Err(AppError::ExternalApiError(_))));
}

#[tokio::test]
async fn test_full_run_against_mock_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/placekeys"))
        .and(header("apikey", "test_key"))
        .respond_with(echo_placekeys)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Blight_Violations.csv"),
        "ticket_id,violation_address,city,state,zip_code,country,X,Y,fine_amount\n\
         18645,2566 GRAND BLVD,Detroit,MI,48208,USA,42.3638,-83.0923,250\n\
         18646,19014 ASHTON,Detroit,MI,48219,USA,,,750\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("Property_Sales.csv"),
        "sale_id,address,X,Y,sale_price\n501,100 MACK AVE,42.35,-83.05,12000\n",
    )
    .unwrap();

    let data_dir = dir.path().to_string_lossy().to_string();
    let uri = mock_server.uri();
    let reports = placekey_join::pipeline::run_from_vars(|key| match key {
        "PLACEKEY_API_KEY" => Some("test_key".to_string()),
        "PLACEKEY_BASE_URL" => Some(uri.clone()),
        "PLACEKEY_DATA_DIR" => Some(data_dir.clone()),
        _ => None,
    })
    .await
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].placekeys_found, 2);
    assert_eq!(reports[1].placekeys_found, 1);

    for name in [
        "placekeys_Blight_Violations.csv",
        "Blight_Violations_w_placekeys.csv",
        "placekeys_Property_Sales.csv",
        "Property_Sales_w_placekeys.csv",
    ] {
        assert!(dir.path().join(name).exists(), "{} missing", name);
    }

    let enriched =
        std::fs::read_to_string(dir.path().join("Property_Sales_w_placekeys.csv")).unwrap();
    assert_eq!(
        enriched,
        "sale_id,address,X,Y,sale_price,query_id,placekey\n\
         501,100 MACK AVE,42.35,-83.05,12000,501,pk-501\n"
    );
}
