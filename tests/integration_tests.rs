//! End-to-end tests against a locally running service.
//!
//! Start the service with `RECREATE_DB=1`, an empty `CAS_URL` (dev-mode login
//! takes the ticket as the netid), `ADMIN_USERNAMES=admin01` and a scratch
//! database, then run with `cargo test -- --ignored`.

use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE: &str = "http://localhost:3000";

async fn login(client: &Client, netid: &str) -> String {
    let response = client
        .post(format!("{BASE}/auth/login"))
        .json(&json!({ "ticket": netid, "service": BASE }))
        .send()
        .await
        .expect("login request failed");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("login body unreadable");
    body["token"].as_str().expect("no token").to_string()
}

async fn post_item(client: &Client, token: &str, name: &str, price: i64, condition: i64) -> i64 {
    let deadline = (Utc::now().date_naive() + Duration::days(30)).to_string();
    let response = client
        .post(format!("{BASE}/items"))
        .bearer_auth(token)
        .json(&json!({
            "name": name,
            "deadline": deadline,
            "price": price,
            "negotiable": false,
            "condition_index": condition,
            "description": "integration test listing",
            "image": "https://images.example/x.jpg",
        }))
        .send()
        .await
        .expect("item create failed");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().expect("no item id")
}

async fn gallery_pks(client: &Client, query: &str) -> Vec<i64> {
    let response = client
        .get(format!("{BASE}/items/get_relative?{query}"))
        .send()
        .await
        .expect("gallery request failed");
    assert!(response.status().is_success());
    let body: Vec<Value> = response.json().await.unwrap();
    body.iter().map(|v| v["pk"].as_i64().unwrap()).collect()
}

#[tokio::test]
#[ignore = "requires a running service against a scratch database"]
async fn purchase_happy_path_completes_and_hides_item() {
    let client = Client::new();
    let seller = login(&client, "seller01").await;
    let buyer = login(&client, "buyer01").await;

    let item_pk = post_item(&client, &seller, "happy path bike", 12000, 1).await;

    // buyer starts the purchase; the item leaves the gallery
    let response = client
        .post(format!("{BASE}/purchases"))
        .bearer_auth(&buyer)
        .json(&json!({ "item_pk": item_pk }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string(), "expected a message, got {body}");

    let visible = gallery_pks(&client, "count=50&direction=forward&base_item_pk=-1").await;
    assert!(!visible.contains(&item_pk));

    // the transaction pk is on the seller's sales page
    let sales: Vec<Value> = client
        .get(format!("{BASE}/sales/list"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let transaction_pk = sales
        .iter()
        .find(|s| s["item_pk"].as_i64() == Some(item_pk))
        .and_then(|s| s["pk"].as_i64())
        .expect("sale not listed");

    for (token, path) in [
        (&seller, format!("/sales/{transaction_pk}/acknowledge")),
        (&buyer, format!("/purchases/{transaction_pk}/confirm")),
        (&seller, format!("/sales/{transaction_pk}/confirm")),
    ] {
        let body: Value = client
            .post(format!("{BASE}{path}"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(body["message"].is_string(), "step {path} refused: {body}");
    }

    let sales: Vec<Value> = client
        .get(format!("{BASE}/sales/list"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sale = sales
        .iter()
        .find(|s| s["pk"].as_i64() == Some(transaction_pk))
        .unwrap();
    assert_eq!(sale["status_label"].as_str(), Some("complete"));
}

#[tokio::test]
#[ignore = "requires a running service against a scratch database"]
async fn double_confirm_comes_back_as_warning_not_error() {
    let client = Client::new();
    let seller = login(&client, "seller02").await;
    let buyer = login(&client, "buyer02").await;

    let item_pk = post_item(&client, &seller, "warning lamp", 900, 0).await;
    client
        .post(format!("{BASE}/purchases"))
        .bearer_auth(&buyer)
        .json(&json!({ "item_pk": item_pk }))
        .send()
        .await
        .unwrap();

    let sales: Vec<Value> = client
        .get(format!("{BASE}/sales/list"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let transaction_pk = sales
        .iter()
        .find(|s| s["item_pk"].as_i64() == Some(item_pk))
        .and_then(|s| s["pk"].as_i64())
        .unwrap();

    // buyer confirm before the seller acknowledged: 200 with a warning
    let response = client
        .post(format!("{BASE}/purchases/{transaction_pk}/confirm"))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["warning"].is_string(), "expected a warning, got {body}");

    // a stranger acting as the seller is an error, not a warning
    let stranger = login(&client, "stranger02").await;
    let response = client
        .post(format!("{BASE}/sales/{transaction_pk}/acknowledge"))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running service against a scratch database"]
async fn relative_pages_concatenate_and_reject_filtered_cursor() {
    let client = Client::new();
    let seller = login(&client, "pager01").await;

    let mut posted = Vec::new();
    for i in 0..5 {
        let condition = if i % 2 == 0 { 0 } else { 3 };
        posted.push(post_item(&client, &seller, &format!("pager item {i}"), 100 + i, condition).await);
    }

    // walk forward in pages of 2 and compare with one big page
    let all = gallery_pks(&client, "count=50&direction=forward&base_item_pk=-1").await;
    let mut walked = Vec::new();
    let mut base = -1;
    loop {
        let page =
            gallery_pks(&client, &format!("count=2&direction=forward&base_item_pk={base}")).await;
        if page.is_empty() {
            break;
        }
        base = *page.last().unwrap();
        walked.extend(page);
    }
    assert_eq!(walked, all);

    // a cursor excluded by the active condition filter is a 400
    let excluded = posted
        .iter()
        .zip(0..)
        .find(|&(_, i)| i % 2 == 1)
        .map(|(pk, _)| *pk)
        .unwrap();
    let response = client
        .get(format!(
            "{BASE}/items/get_relative?count=2&direction=forward&base_item_pk={excluded}&condition_indexes=0"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running service against a scratch database"]
async fn messaging_is_gated_on_the_contact_relation() {
    let client = Client::new();
    let seller = login(&client, "seller03").await;
    let buyer = login(&client, "buyer03").await;

    let seller_account: Value = client
        .get(format!("{BASE}/account"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let seller_pk = seller_account["id"].as_i64().unwrap();

    // no acknowledged transaction yet: sending is forbidden
    let response = client
        .post(format!("{BASE}/messages"))
        .bearer_auth(&buyer)
        .json(&json!({ "receiver_pk": seller_pk, "text": "hi there" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // purchase + acknowledge opens the relation
    let item_pk = post_item(&client, &seller, "contact opener", 500, 2).await;
    client
        .post(format!("{BASE}/purchases"))
        .bearer_auth(&buyer)
        .json(&json!({ "item_pk": item_pk }))
        .send()
        .await
        .unwrap();
    let sales: Vec<Value> = client
        .get(format!("{BASE}/sales/list"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let transaction_pk = sales
        .iter()
        .find(|s| s["item_pk"].as_i64() == Some(item_pk))
        .and_then(|s| s["pk"].as_i64())
        .unwrap();
    client
        .post(format!("{BASE}/sales/{transaction_pk}/acknowledge"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{BASE}/messages"))
        .bearer_auth(&buyer)
        .json(&json!({ "receiver_pk": seller_pk, "text": "hi there" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // the thread pages back with the message on the sent side
    let thread: Value = client
        .get(format!(
            "{BASE}/messages/get_relative?contact_pk={seller_pk}&count=10&direction=backward&base_message_pk=-1"
        ))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(thread["sent"].as_array().map(Vec::len), Some(1));

    // and the seller received a notification for it
    let count: Value = client
        .get(format!("{BASE}/notifications/count"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(count["count"].as_i64().unwrap_or(0) >= 1);

    // a bare POST with no body marks everything seen
    let response = client
        .post(format!("{BASE}/notifications/see"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let count: Value = client
        .get(format!("{BASE}/notifications/count"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"].as_i64(), Some(0));
}

#[tokio::test]
#[ignore = "requires a running service against a scratch database"]
async fn admin_delete_refuses_an_item_mid_transaction() {
    let client = Client::new();
    let seller = login(&client, "seller04").await;
    let buyer = login(&client, "buyer04").await;
    let admin = login(&client, "admin01").await;

    let item_pk = post_item(&client, &seller, "moderated kettle", 700, 1).await;
    client
        .post(format!("{BASE}/purchases"))
        .bearer_auth(&buyer)
        .json(&json!({ "item_pk": item_pk }))
        .send()
        .await
        .unwrap();

    // the item is frozen by the purchase: moderation must refuse, not cascade
    let response = client
        .delete(format!("{BASE}/admin/items/{item_pk}"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["warning"].is_string(), "expected a warning, got {body}");

    // the transaction survived
    let sales: Vec<Value> = client
        .get(format!("{BASE}/sales/list"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(sales.iter().any(|s| s["item_pk"].as_i64() == Some(item_pk)));
}
