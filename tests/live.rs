// Functional suite against the live restful-booker deployment
//
// These tests talk to a shared public service: bookings created here are
// visible to everyone else using it, and the service may be reset at any time.
// All of them are ignored by default. To run:
//     cargo test --test live -- --ignored --test-threads=1
//
// BOOKER_BASE_URL / BOOKER_USERNAME / BOOKER_PASSWORD / BOOKER_TIMEOUT_MS
// point the suite at another deployment.

use anyhow::{Context, Result};
use booker_suite::{
    sample_booking, Booking, BookingApiClient, BookingFilter, BookingRef, CreatedBooking,
};
use serde_json::{json, Value};
use test_case::test_case;
use tokio_test::assert_ok;

fn client() -> Result<BookingApiClient> {
    BookingApiClient::from_env().context("Failed to build booking client")
}

async fn create(client: &BookingApiClient, booking: &Booking) -> Result<CreatedBooking> {
    let response = client.create_booking(booking).await?;
    anyhow::ensure!(response.status == 200, "create returned {}", response.status);
    Ok(response.json()?)
}

async fn list(client: &BookingApiClient, filter: &BookingFilter) -> Result<Vec<BookingRef>> {
    let response = client.list_booking_ids(filter).await?;
    anyhow::ensure!(response.status == 200, "list returned {}", response.status);
    Ok(response.json()?)
}

fn henry() -> Value {
    json!({
        "firstname": "Henry",
        "lastname": "Kowalski",
        "totalprice": 212,
        "depositpaid": false,
        "bookingdates": {"checkin": "2022-01-01", "checkout": "2022-01-02"},
        "additionalneeds": "no bed"
    })
}

fn henry_without(field: &str) -> Value {
    let mut payload = henry();
    if let Some(fields) = payload.as_object_mut() {
        fields.remove(field);
    }
    payload
}

fn henry_with_wrong_types() -> Value {
    let mut payload = henry();
    payload["firstname"] = json!(true);
    payload["lastname"] = json!(123);
    payload["totalprice"] = json!("Ham");
    payload["depositpaid"] = json!("money");
    payload
}

#[tokio::test]
#[ignore]
async fn live_ping() -> Result<()> {
    assert_eq!(client()?.ping().await?.status, 201);
    Ok(())
}

#[test_case(BookingFilter::new() ; "no filter")]
#[test_case(BookingFilter::new().firstname("Jan").lastname("Kowalski") ; "first and last name")]
#[test_case(BookingFilter::new().firstname("") ; "empty firstname")]
#[test_case(BookingFilter::new().checkin("") ; "empty checkin")]
#[test_case(BookingFilter::new().checkin("2021") ; "year only checkin")]
#[tokio::test]
#[ignore]
async fn live_list_succeeds(filter: BookingFilter) {
    let client = assert_ok!(client());
    assert_ok!(create(&client, &sample_booking()).await);

    let response = assert_ok!(client.list_booking_ids(&filter).await);
    assert_eq!(response.status, 200);
}

#[tokio::test]
#[ignore]
async fn live_list_malformed_checkin() -> Result<()> {
    let client = client()?;
    create(&client, &sample_booking()).await?;

    let response = client
        .list_booking_ids(&BookingFilter::new().checkin("20"))
        .await?;
    assert_eq!(response.status, 500);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_list_by_firstname() -> Result<()> {
    let client = client()?;
    let mut booking = sample_booking();
    booking.firstname = "Januszek".to_string();
    let created = create(&client, &booking).await?;

    let ids = list(&client, &BookingFilter::new().firstname("Januszek")).await?;
    assert!(ids.contains(&BookingRef {
        bookingid: created.bookingid
    }));

    client.delete_booking(created.bookingid).await?;
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_list_by_checkin_contains_new_booking() -> Result<()> {
    let client = client()?;
    let created = create(&client, &sample_booking()).await?;

    let ids = list(&client, &BookingFilter::new().checkin("2022-01-01")).await?;
    assert!(ids.contains(&BookingRef {
        bookingid: created.bookingid
    }));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_get_listed_booking() -> Result<()> {
    let client = client()?;
    create(&client, &sample_booking()).await?;

    let ids = list(&client, &BookingFilter::new()).await?;
    let first = ids.first().context("service returned no bookings")?;
    assert_eq!(client.get_booking(first.bookingid).await?.status, 200);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_get_unknown_id() -> Result<()> {
    assert_eq!(client()?.get_booking(0).await?.status, 404);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_create_and_get() -> Result<()> {
    let client = client()?;
    let created = create(&client, &sample_booking()).await?;
    assert_eq!(created.booking, sample_booking());

    let response = client.get_booking(created.bookingid).await?;
    assert_eq!(response.status, 200);
    assert_eq!(response.json::<Booking>()?, sample_booking());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_create_without_additionalneeds() -> Result<()> {
    let mut payload = serde_json::to_value(sample_booking())?;
    if let Some(fields) = payload.as_object_mut() {
        fields.remove("additionalneeds");
    }

    let response = client()?.create_booking(&payload).await?;
    assert_eq!(response.status, 200);
    assert_eq!(response.json_value()?["booking"], payload);
    Ok(())
}

#[test_case(json!(1) ; "integer firstname")]
#[test_case(Value::Null ; "null firstname")]
#[tokio::test]
#[ignore]
async fn live_create_with_bad_firstname(firstname: Value) {
    let mut payload = assert_ok!(serde_json::to_value(sample_booking()));
    payload["firstname"] = firstname;

    let client = assert_ok!(client());
    let response = assert_ok!(client.create_booking(&payload).await);
    assert_eq!(response.status, 500);
}

#[tokio::test]
#[ignore]
async fn live_admin_credentials_issue_token() -> Result<()> {
    let response = client()?.create_token("admin", "password123").await?;
    assert_eq!(response.status, 200);
    assert!(response.json_value()?["token"].is_string());
    Ok(())
}

#[test_case("admi", "assword123" ; "wrong credentials")]
#[test_case("", "" ; "empty credentials")]
#[tokio::test]
#[ignore]
async fn live_bad_credentials(username: &str, password: &str) {
    let client = assert_ok!(client());
    let response = assert_ok!(client.create_token(username, password).await);
    assert_eq!(response.status, 200);
    assert_eq!(
        assert_ok!(response.json_value()),
        json!({"reason": "Bad credentials"})
    );
}

#[test_case(henry(), 200 ; "full payload")]
#[test_case(henry_without("depositpaid"), 400 ; "missing depositpaid")]
#[test_case(henry_with_wrong_types(), 500 ; "wrong types")]
#[tokio::test]
#[ignore]
async fn live_update_existing(payload: Value, expected: u16) {
    let client = assert_ok!(client());
    let created = assert_ok!(create(&client, &sample_booking()).await);

    let response = assert_ok!(client.update_booking(created.bookingid, &payload).await);
    assert_eq!(response.status, expected);
}

#[tokio::test]
#[ignore]
async fn live_update_unknown_id() -> Result<()> {
    assert_eq!(client()?.update_booking(0, &henry()).await?.status, 405);
    Ok(())
}

#[test_case("firstname", json!("Jan") ; "matching type")]
#[test_case("firstname", json!(2) ; "numeric firstname")]
#[test_case("lastname", json!(true) ; "boolean lastname")]
#[tokio::test]
#[ignore]
async fn live_partial_update_stores_value(field: &str, value: Value) {
    let client = assert_ok!(client());
    let created = assert_ok!(create(&client, &sample_booking()).await);

    let response = assert_ok!(
        client
            .partial_update_booking(created.bookingid, &json!({ field: value.clone() }))
            .await
    );
    assert_eq!(response.status, 200);
    assert_eq!(assert_ok!(response.json_value())[field], value);
}

#[tokio::test]
#[ignore]
async fn live_partial_update_ignores_top_level_checkin() -> Result<()> {
    let client = client()?;
    let created = create(&client, &sample_booking()).await?;

    let response = client
        .partial_update_booking(created.bookingid, &json!({"checkin": true}))
        .await?;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.json_value()?["bookingdates"]["checkin"],
        "2022-01-01"
    );
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_delete() -> Result<()> {
    let client = client()?;
    let created = create(&client, &sample_booking()).await?;

    assert_eq!(client.delete_booking(created.bookingid).await?.status, 201);
    let ids = list(&client, &BookingFilter::new().checkin("2022-01-01")).await?;
    assert!(!ids.contains(&BookingRef {
        bookingid: created.bookingid
    }));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_delete_unknown_id() -> Result<()> {
    assert_eq!(client()?.delete_booking(0).await?.status, 405);
    Ok(())
}
