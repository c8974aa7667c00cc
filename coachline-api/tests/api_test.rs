use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use coachline_api::{app, middleware::Claims, AppState, AuthConfig};
use coachline_catalog::CatalogRules;
use coachline_core::MemoryDocumentStore;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn router() -> Router {
    let state = AppState::new(
        Arc::new(MemoryDocumentStore::new()),
        AuthConfig { secret: SECRET.to_string() },
        CatalogRules::default(),
    );
    app(state)
}

fn token(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    user: &str,
    body: Option<Value>,
    master_password: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token(user)))
        .header("Content-Type", "application/json");
    if let Some(password) = master_password {
        builder = builder.header("x-master-password", password);
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

/// Layout with seats 1-3, one travel, two passengers.
async fn seed(app: &Router, user: &str) -> (String, String, String) {
    let (status, layout) = call(
        app,
        "POST",
        "/v1/seat-layouts",
        user,
        Some(json!({
            "name": "Leito",
            "floors": [{ "rows": [[
                { "kind": "SEAT", "number": 1 },
                { "kind": "AISLE" },
                { "kind": "SEAT", "number": 2 },
                { "kind": "SEAT", "number": 3 }
            ]]}]
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", layout);

    let (status, travel) = call(
        app,
        "POST",
        "/v1/travels",
        user,
        Some(json!({
            "origin": "Maringa",
            "destination": "Foz do Iguacu",
            "departure": "2030-07-10T23:00:00",
            "return_at": "2030-07-13T08:00:00",
            "seat_layout_id": layout["id"]
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", travel);

    let mut passengers = Vec::new();
    for passport in ["PT100", "PT200"] {
        let (status, passenger) = call(
            app,
            "POST",
            "/v1/passengers",
            user,
            Some(json!({
                "name": format!("Viajante {}", passport),
                "birth_date": "1990-03-03",
                "documents": { "kind": "FOREIGN", "passport": passport }
            })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", passenger);
        passengers.push(passenger["id"].as_str().unwrap().to_string());
    }

    (
        travel["id"].as_str().unwrap().to_string(),
        passengers[0].clone(),
        passengers[1].clone(),
    )
}

fn order_body(seats: &[(u32, &str)], total: i64, paid: i64) -> Value {
    json!({
        "payer": { "name": "Joana Lima", "document": "11144477735", "method": "PIX" },
        "total_cents": total,
        "paid_cents": paid,
        "payment_date": "2030-06-01",
        "seats": seats.iter().map(|(n, p)| json!({ "seat_number": n, "passenger_id": p })).collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = router();
    let response = app
        .oneshot(Request::builder().uri("/v1/travels").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_booking_flow() {
    let app = router();
    let (travel, ana, bia) = seed(&app, "agency-a").await;
    let orders = format!("/v1/travels/{}/orders", travel);

    let (status, order) = call(&app, "POST", &orders, "agency-a", Some(order_body(&[(1, &ana), (2, &bia)], 10_000, 5_000)), None).await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(order["status"], "PENDING_PAYMENT");
    assert_eq!(order["detalhesPagamento"]["valorRestante"], 5_000);
    assert_eq!(order["reservations"].as_array().unwrap().len(), 2);

    let (status, conflict) = call(&app, "POST", &orders, "agency-a", Some(order_body(&[(2, &ana)], 5_000, 0)), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["kind"], "SEAT_UNAVAILABLE");

    let (status, invalid) = call(&app, "POST", &orders, "agency-a", Some(order_body(&[(7, &ana)], 5_000, 0)), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(invalid["kind"], "INVALID_SEAT");

    let order_id = order["id"].as_str().unwrap();
    let (status, paid) = call(
        &app,
        "POST",
        &format!("{}/{}/payments", orders, order_id),
        "agency-a",
        Some(json!({ "date": "2030-06-20", "valor": 5_000, "metodo": "CASH" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", paid);
    assert_eq!(paid["status"], "PAID");
    assert_eq!(paid["detalhesPagamento"]["valorPago"], 10_000);

    let (_, seats) = call(&app, "GET", &format!("/v1/travels/{}/seats", travel), "agency-a", None, None).await;
    assert_eq!(seats["taken_seats"], 2);

    let (status, report) = call(&app, "GET", "/v1/reports/receivables?month=7&year=2030", "agency-a", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_received_cents"], 10_000);
    assert_eq!(report["total_receivable_cents"], 0);

    let (_, grouped) = call(&app, "GET", &format!("/v1/travels/{}/reservations", travel), "agency-a", None, None).await;
    assert_eq!(grouped.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_master_password_gates_cancellation() {
    let app = router();
    let (travel, ana, _) = seed(&app, "agency-b").await;
    let orders = format!("/v1/travels/{}/orders", travel);
    let (_, order) = call(&app, "POST", &orders, "agency-b", Some(order_body(&[(3, &ana)], 4_000, 0)), None).await;
    let cancel = format!("{}/{}/cancel", orders, order["id"].as_str().unwrap());

    let (status, _) = call(
        &app,
        "PUT",
        "/v1/security/master-password",
        "agency-b",
        Some(json!({ "new_password": "Chave123" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&app, "POST", &cancel, "agency-b", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "MASTER_PASSWORD_REQUIRED");

    let (status, body) = call(&app, "POST", &cancel, "agency-b", None, Some("chave123")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "MASTER_PASSWORD_INCORRECT");

    let (status, body) = call(&app, "POST", &cancel, "agency-b", None, Some("Chave123")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let (_, rebooked) = call(&app, "POST", &orders, "agency-b", Some(order_body(&[(3, &ana)], 4_000, 0)), None).await;
    assert_eq!(rebooked["status"], "PENDING_PAYMENT");
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let app = router();
    let (travel, _, _) = seed(&app, "agency-c").await;

    let (status, body) = call(&app, "GET", &format!("/v1/travels/{}", travel), "agency-d", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");

    let (_, list) = call(&app, "GET", "/v1/travels", "agency-d", None, None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_layout_grid_edits_keep_booked_seats() {
    let app = router();
    let (travel, ana, _) = seed(&app, "agency-e").await;
    let orders = format!("/v1/travels/{}/orders", travel);
    let (status, _) = call(&app, "POST", &orders, "agency-e", Some(order_body(&[(3, &ana)], 4_000, 0)), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, stored) = call(&app, "GET", &format!("/v1/travels/{}", travel), "agency-e", None, None).await;
    let grid = format!("/v1/seat-layouts/{}/grid", stored["seat_layout_id"].as_str().unwrap());

    let drop_booked = json!([{ "op": "SET_CELL", "floor": 0, "row": 0, "column": 3, "cell": { "kind": "EMPTY" } }]);
    let (status, body) = call(&app, "POST", &grid, "agency-e", Some(drop_booked), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "VALIDATION_FAILED");

    let renumber_free = json!([
        { "op": "SET_CELL", "floor": 0, "row": 0, "column": 0, "cell": { "kind": "SEAT", "number": 5 } },
        { "op": "ADD_SECOND_FLOOR", "rows": 1, "columns": 2 },
        { "op": "SET_CELL", "floor": 1, "row": 0, "column": 0, "cell": { "kind": "SEAT", "number": 9 } }
    ]);
    let (status, layout) = call(&app, "POST", &grid, "agency-e", Some(renumber_free), None).await;
    assert_eq!(status, StatusCode::OK, "{}", layout);
    assert_eq!(layout["floors"].as_array().unwrap().len(), 2);

    let (_, seats) = call(&app, "GET", &format!("/v1/travels/{}/seats", travel), "agency-e", None, None).await;
    assert_eq!(seats["total_seats"], 4);
    assert_eq!(seats["taken_seats"], 1);
}
