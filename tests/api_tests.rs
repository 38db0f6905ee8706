//! API integration tests
//!
//! These talk to a running server and a migrated database.
//! Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Register a throwaway user and return (token, user id)
async fn register_and_login(client: &Client, name: &str, phone: Option<&str>) -> (String, String) {
    let email = format!("{}-{}@example.org", name, uuid::Uuid::new_v4());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": name,
            "email": email,
            "phone": phone,
            "password": "correct-horse-battery"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "correct-horse-battery"
        }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let user_id = body["user"]["id"].as_str().expect("No user id").to_string();
    (token, user_id)
}

async fn create_item(client: &Client, token: &str, name: &str) -> String {
    let response = client
        .post(format!("{}/items", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "name": name, "condition": "good" }))
        .send()
        .await
        .expect("Failed to send create item request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse item response");
    body["id"].as_str().expect("No item id").to_string()
}

async fn create_borrow_request(client: &Client, token: &str, item_id: &str) -> Value {
    let return_date = chrono::Utc::now() + chrono::Duration::days(30);
    let response = client
        .post(format!("{}/borrow-requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "item_id": item_id,
            "requested_return_date": return_date.to_rfc3339(),
            "request_message": "may I?"
        }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse borrow response")
}

async fn apply_action(
    client: &Client,
    token: &str,
    request_id: &str,
    action: &str,
    body: Value,
) -> reqwest::Response {
    client
        .post(format!("{}/borrow-requests/{}/{}", BASE_URL, request_id, action))
        .header("Authorization", format!("Bearer {}", token))
        .json(&body)
        .send()
        .await
        .expect("Failed to send action request")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/items", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_full_borrow_lifecycle() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550101")).await;
    let (borrower_token, _) = register_and_login(&client, "borrower", Some("+15555550102")).await;

    let item_id = create_item(&client, &lender_token, "Pressure washer").await;

    // create: PENDING, item still free
    let request = create_borrow_request(&client, &borrower_token, &item_id).await;
    assert_eq!(request["status"], "PENDING");
    let request_id = request["id"].as_str().unwrap().to_string();

    // approve: APPROVED, item held
    let response = apply_action(
        &client,
        &lender_token,
        &request_id,
        "approve",
        json!({ "message": "ok, pick up Friday" }),
    )
    .await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["previous_status"], "PENDING");

    let item: Value = client
        .get(format!("{}/items/{}", BASE_URL, item_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(item["current_borrow_request_id"], request_id.as_str());

    // pickup: ACTIVE
    let response = apply_action(&client, &borrower_token, &request_id, "pickup", json!({})).await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ACTIVE");

    // return: RETURNED, item free again
    let response = apply_action(
        &client,
        &borrower_token,
        &request_id,
        "return",
        json!({ "message": "all good" }),
    )
    .await;
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "RETURNED");

    let item: Value = client
        .get(format!("{}/items/{}", BASE_URL, item_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(item["current_borrow_request_id"].is_null());

    // a second borrower can request the freed item
    let (second_token, _) = register_and_login(&client, "neighbor", Some("+15555550103")).await;
    let request = create_borrow_request(&client, &second_token, &item_id).await;
    assert_eq!(request["status"], "PENDING");
}

#[tokio::test]
#[ignore]
async fn test_approve_twice_conflicts() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550104")).await;
    let (borrower_token, _) = register_and_login(&client, "borrower", Some("+15555550105")).await;

    let item_id = create_item(&client, &lender_token, "Tent").await;
    let request = create_borrow_request(&client, &borrower_token, &item_id).await;
    let request_id = request["id"].as_str().unwrap();

    let response = apply_action(&client, &lender_token, request_id, "approve", json!({})).await;
    assert!(response.status().is_success());

    let response = apply_action(&client, &lender_token, request_id, "approve", json!({})).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_second_request_loses_once_item_is_held() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550115")).await;
    let (first_token, _) = register_and_login(&client, "first", Some("+15555550116")).await;
    let (second_token, _) = register_and_login(&client, "second", Some("+15555550117")).await;

    let item_id = create_item(&client, &lender_token, "Chainsaw").await;

    // two PENDING requests may coexist for the same item
    let first = create_borrow_request(&client, &first_token, &item_id).await;
    let second = create_borrow_request(&client, &second_token, &item_id).await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let response = apply_action(&client, &lender_token, first_id, "approve", json!({})).await;
    assert!(response.status().is_success());

    // the item is held now, so approving the other request must lose
    let response = apply_action(&client, &lender_token, second_id, "approve", json!({})).await;
    assert_eq!(response.status(), 409);

    // declining it instead still works
    let response = apply_action(&client, &lender_token, second_id, "decline", json!({})).await;
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_cancelling_an_approved_request_frees_the_item() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550118")).await;
    let (borrower_token, _) = register_and_login(&client, "borrower", Some("+15555550119")).await;
    let (neighbor_token, _) = register_and_login(&client, "neighbor", Some("+15555550120")).await;

    let item_id = create_item(&client, &lender_token, "Wheelbarrow").await;
    let request = create_borrow_request(&client, &borrower_token, &item_id).await;
    let request_id = request["id"].as_str().unwrap();

    apply_action(&client, &lender_token, request_id, "approve", json!({})).await;

    let item: Value = client
        .get(format!("{}/items/{}", BASE_URL, item_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(item["current_borrow_request_id"], *request_id);

    let response = apply_action(
        &client,
        &borrower_token,
        request_id,
        "cancel",
        json!({ "message": "plans changed" }),
    )
    .await;
    assert!(response.status().is_success());

    // cancelling while APPROVED must release the availability marker
    let item: Value = client
        .get(format!("{}/items/{}", BASE_URL, item_id))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(item["current_borrow_request_id"].is_null());

    // and the item is approvable again for someone else
    let request = create_borrow_request(&client, &neighbor_token, &item_id).await;
    let request_id = request["id"].as_str().unwrap();
    let response = apply_action(&client, &lender_token, request_id, "approve", json!({})).await;
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_request_history_visible_to_parties_only() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550121")).await;
    let (borrower_token, _) = register_and_login(&client, "borrower", Some("+15555550122")).await;
    let (stranger_token, _) = register_and_login(&client, "stranger", Some("+15555550123")).await;

    let item_id = create_item(&client, &lender_token, "Hedge trimmer").await;
    let request = create_borrow_request(&client, &borrower_token, &item_id).await;
    let request_id = request["id"].as_str().unwrap();

    apply_action(&client, &lender_token, request_id, "approve", json!({})).await;
    apply_action(&client, &borrower_token, request_id, "pickup", json!({})).await;

    let response = client
        .get(format!("{}/borrow-requests/{}/history", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", lender_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let entries: Value = response.json().await.unwrap();
    let entries = entries.as_array().expect("history should be an array");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["to_status"], "PENDING");
    assert!(entries[0]["from_status"].is_null());
    assert_eq!(entries[1]["to_status"], "APPROVED");
    assert_eq!(entries[2]["from_status"], "APPROVED");
    assert_eq!(entries[2]["to_status"], "ACTIVE");

    let response = client
        .get(format!("{}/borrow-requests/{}/history", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", stranger_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_lender_cannot_cancel_approved() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550106")).await;
    let (borrower_token, _) = register_and_login(&client, "borrower", Some("+15555550107")).await;

    let item_id = create_item(&client, &lender_token, "Ladder").await;
    let request = create_borrow_request(&client, &borrower_token, &item_id).await;
    let request_id = request["id"].as_str().unwrap();

    apply_action(&client, &lender_token, request_id, "approve", json!({})).await;

    let response = apply_action(&client, &lender_token, request_id, "cancel", json!({})).await;
    assert_eq!(response.status(), 403);

    // the borrower still can
    let response = apply_action(&client, &borrower_token, request_id, "cancel", json!({})).await;
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_cannot_borrow_own_item() {
    let client = Client::new();
    let (token, _) = register_and_login(&client, "owner", Some("+15555550108")).await;
    let item_id = create_item(&client, &token, "Bike pump").await;

    let return_date = chrono::Utc::now() + chrono::Duration::days(7);
    let response = client
        .post(format!("{}/borrow-requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "item_id": item_id,
            "requested_return_date": return_date.to_rfc3339()
        }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_phone_number_required() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550109")).await;
    let (no_phone_token, _) = register_and_login(&client, "phoneless", None).await;

    let item_id = create_item(&client, &lender_token, "Sewing machine").await;

    let return_date = chrono::Utc::now() + chrono::Duration::days(7);
    let response = client
        .post(format!("{}/borrow-requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", no_phone_token))
        .json(&json!({
            "item_id": item_id,
            "requested_return_date": return_date.to_rfc3339()
        }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_past_return_date_rejected() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550110")).await;
    let (borrower_token, _) = register_and_login(&client, "borrower", Some("+15555550111")).await;

    let item_id = create_item(&client, &lender_token, "Projector").await;

    let return_date = chrono::Utc::now() - chrono::Duration::days(1);
    let response = client
        .post(format!("{}/borrow-requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", borrower_token))
        .json(&json!({
            "item_id": item_id,
            "requested_return_date": return_date.to_rfc3339()
        }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_stranger_cannot_view_request() {
    let client = Client::new();
    let (lender_token, _) = register_and_login(&client, "lender", Some("+15555550112")).await;
    let (borrower_token, _) = register_and_login(&client, "borrower", Some("+15555550113")).await;
    let (stranger_token, _) = register_and_login(&client, "stranger", Some("+15555550114")).await;

    let item_id = create_item(&client, &lender_token, "Telescope").await;
    let request = create_borrow_request(&client, &borrower_token, &item_id).await;
    let request_id = request["id"].as_str().unwrap();

    let response = client
        .get(format!("{}/borrow-requests/{}", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", stranger_token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}
