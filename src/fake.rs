// In-memory stand-in for the restful-booker service
//
// Implements `Transport`, so a `BookingApiClient` pointed at it runs the exact
// request-building code it would run against the live deployment. Status codes
// and bodies follow the public service, including its quirks:
//   - bad credentials on /auth answer 200 {"reason": "Bad credentials"}
//   - mutations on unknown ids answer 405, not 404
//   - PATCH stores whatever JSON value it is given for top-level fields

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::auth::Credentials;
use crate::booking::BookingId;
use crate::client::{BookingApiClient, TOKEN_COOKIE};
use crate::error::ApiError;
use crate::transport::{ApiRequest, ApiResponse, RequestBody, Transport};

const DEFAULT_SEED: u64 = 0x5eed;
const TOKEN_LEN: usize = 15;

const REQUIRED_TEXT: [&str; 2] = ["firstname", "lastname"];
const DATE_FIELDS: [&str; 2] = ["checkin", "checkout"];
const PATCHABLE: [&str; 5] = [
    "firstname",
    "lastname",
    "totalprice",
    "depositpaid",
    "additionalneeds",
];

struct ServiceState {
    bookings: BTreeMap<BookingId, Value>,
    tokens: HashSet<String>,
    next_id: BookingId,
    rng: StdRng,
    recorded: Vec<ApiRequest>,
}

pub struct FakeBookingService {
    state: Mutex<ServiceState>,
    admin: Credentials,
    request_count: AtomicUsize,
    fail_next_requests: AtomicUsize,
}

impl Default for FakeBookingService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBookingService {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    // Same seed, same token sequence
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Mutex::new(ServiceState {
                bookings: BTreeMap::new(),
                tokens: HashSet::new(),
                next_id: 1,
                rng: StdRng::seed_from_u64(seed),
                recorded: Vec::new(),
            }),
            admin: Credentials::admin(),
            request_count: AtomicUsize::new(0),
            fail_next_requests: AtomicUsize::new(0),
        }
    }

    // Client wired to this service, logging in as the default admin
    pub fn into_client(self) -> BookingApiClient<FakeBookingService> {
        BookingApiClient::with_transport(self, Credentials::admin())
    }

    // The next `count` requests fail as if the connection dropped
    pub fn fail_next_requests(&self, count: usize) {
        self.fail_next_requests.store(count, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    // Every answered request since creation or the last `clear_recorded`
    pub fn recorded_requests(&self) -> Vec<ApiRequest> {
        self.state.lock().recorded.clone()
    }

    pub fn clear_recorded(&self) {
        self.state.lock().recorded.clear();
    }

    pub fn booking_count(&self) -> usize {
        self.state.lock().bookings.len()
    }

    pub fn stored_booking(&self, id: BookingId) -> Option<Value> {
        self.state.lock().bookings.get(&id).cloned()
    }

    pub fn issued_tokens(&self) -> usize {
        self.state.lock().tokens.len()
    }

    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let segments: Vec<&str> = request
            .path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match (request.method.as_str(), segments.as_slice()) {
            ("GET", ["ping"]) => created(),
            ("POST", ["auth"]) => self.handle_auth(request),
            ("GET", ["booking"]) => self.handle_list(request),
            ("POST", ["booking"]) => self.handle_create(request),
            ("GET", ["booking", id]) => self.handle_get(id),
            ("PUT", ["booking", id]) => self.authorized(request, |state| {
                handle_update(state, id, &request.body)
            }),
            ("PATCH", ["booking", id]) => self.authorized(request, |state| {
                handle_partial_update(state, id, &request.body)
            }),
            ("DELETE", ["booking", id]) => {
                self.authorized(request, |state| handle_delete(state, id))
            }
            _ => not_found(),
        }
    }

    fn handle_auth(&self, request: &ApiRequest) -> ApiResponse {
        let (username, password) = credentials_from(&request.body);
        if username != self.admin.username || password != self.admin.password {
            return json_response(200, &json!({"reason": "Bad credentials"}));
        }

        let mut state = self.state.lock();
        let token: String = (&mut state.rng)
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        state.tokens.insert(token.clone());
        json_response(200, &json!({ "token": token }))
    }

    fn handle_list(&self, request: &ApiRequest) -> ApiResponse {
        let params = parse_query(request.query.as_deref());
        let param = |key: &str| {
            params
                .iter()
                .find(|(k, v)| k == key && !v.is_empty())
                .map(|(_, v)| v.as_str())
        };

        let checkin = match param("checkin").map(parse_filter_date) {
            Some(None) => return server_error(),
            Some(date) => date,
            None => None,
        };
        let checkout = match param("checkout").map(parse_filter_date) {
            Some(None) => return server_error(),
            Some(date) => date,
            None => None,
        };
        let firstname = param("firstname");
        let lastname = param("lastname");

        let state = self.state.lock();
        let ids: Vec<Value> = state
            .bookings
            .iter()
            .filter(|(_, booking)| {
                firstname.map_or(true, |name| booking["firstname"] == name)
                    && lastname.map_or(true, |name| booking["lastname"] == name)
                    && checkin.map_or(true, |from| {
                        stay_date(booking, "checkin").map_or(false, |d| d >= from)
                    })
                    && checkout.map_or(true, |until| {
                        stay_date(booking, "checkout").map_or(false, |d| d <= until)
                    })
            })
            .map(|(id, _)| json!({ "bookingid": id }))
            .collect();

        json_response(200, &Value::Array(ids))
    }

    fn handle_get(&self, id: &str) -> ApiResponse {
        let state = self.state.lock();
        match parse_id(id).and_then(|id| state.bookings.get(&id)) {
            Some(booking) => json_response(200, booking),
            None => not_found(),
        }
    }

    fn handle_create(&self, request: &ApiRequest) -> ApiResponse {
        let booking = match json_body(&request.body).map(check_booking) {
            Some(Ok(booking)) => booking,
            // The service has no 400 path on create; everything surfaces as 500
            _ => return server_error(),
        };

        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.bookings.insert(id, booking.clone());
        tracing::debug!(bookingid = id, "fake service stored booking");

        json_response(200, &json!({ "bookingid": id, "booking": booking }))
    }

    fn authorized<F>(&self, request: &ApiRequest, handler: F) -> ApiResponse
    where
        F: FnOnce(&mut ServiceState) -> ApiResponse,
    {
        let mut state = self.state.lock();
        let allowed = request
            .cookie(TOKEN_COOKIE)
            .map_or(false, |token| state.tokens.contains(token));
        if !allowed {
            return text_response(403, "Forbidden");
        }
        handler(&mut *state)
    }
}

#[async_trait]
impl Transport for FakeBookingService {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .fail_next_requests
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ApiError::NetworkError(format!(
                "connection reset while sending {} {}",
                request.method, request.path
            )));
        }

        let response = self.handle(&request);
        tracing::debug!(
            method = %request.method,
            path = %request.path_and_query(),
            status = response.status,
            "fake service answered"
        );
        self.state.lock().recorded.push(request);
        Ok(response)
    }
}

fn handle_update(state: &mut ServiceState, id: &str, body: &RequestBody) -> ApiResponse {
    let booking = match json_body(body).map(check_booking) {
        Some(Ok(booking)) => booking,
        Some(Err(PayloadProblem::Missing(field))) => {
            tracing::debug!(field, "update rejected: missing field");
            return text_response(400, "Bad Request");
        }
        Some(Err(PayloadProblem::WrongType(_))) => return server_error(),
        None => return text_response(400, "Bad Request"),
    };

    match booking_mut(state, id) {
        Some(stored) => {
            *stored = booking;
            json_response(200, stored)
        }
        None => method_not_allowed(),
    }
}

fn handle_partial_update(state: &mut ServiceState, id: &str, body: &RequestBody) -> ApiResponse {
    let stored = match booking_mut(state, id) {
        Some(stored) => stored,
        None => return method_not_allowed(),
    };
    let patch = match json_body(body) {
        Some(Value::Object(patch)) => patch,
        _ => return text_response(400, "Bad Request"),
    };

    for field in PATCHABLE {
        if let Some(value) = patch.get(field) {
            stored[field] = value.clone();
        }
    }
    // Dates are only taken when they parse; anything else is silently dropped
    if let Some(Value::Object(dates)) = patch.get("bookingdates") {
        for field in DATE_FIELDS {
            if let Some(date) = dates.get(field).and_then(as_date) {
                stored["bookingdates"][field] = Value::String(date.to_string());
            }
        }
    }

    json_response(200, stored)
}

fn booking_mut<'a>(state: &'a mut ServiceState, id: &str) -> Option<&'a mut Value> {
    let id = parse_id(id)?;
    state.bookings.get_mut(&id)
}

fn handle_delete(state: &mut ServiceState, id: &str) -> ApiResponse {
    match parse_id(id).and_then(|id| state.bookings.remove(&id)) {
        Some(_) => created(),
        None => method_not_allowed(),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PayloadProblem {
    Missing(&'static str),
    WrongType(&'static str),
}

// Full type check of a booking body, returning the record as the service stores it
fn check_booking(body: &Value) -> Result<Value, PayloadProblem> {
    fn field<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, PayloadProblem> {
        obj.get(name).ok_or(PayloadProblem::Missing(name))
    }

    let obj = body
        .as_object()
        .ok_or(PayloadProblem::WrongType("booking"))?;

    let mut record = Map::new();
    for name in REQUIRED_TEXT {
        let value = field(obj, name)?;
        if !value.is_string() {
            return Err(PayloadProblem::WrongType(name));
        }
        record.insert(name.to_string(), value.clone());
    }

    let totalprice = field(obj, "totalprice")?;
    if !totalprice.is_number() {
        return Err(PayloadProblem::WrongType("totalprice"));
    }
    record.insert("totalprice".to_string(), totalprice.clone());

    let depositpaid = field(obj, "depositpaid")?;
    if !depositpaid.is_boolean() {
        return Err(PayloadProblem::WrongType("depositpaid"));
    }
    record.insert("depositpaid".to_string(), depositpaid.clone());

    let dates = field(obj, "bookingdates")?
        .as_object()
        .ok_or(PayloadProblem::WrongType("bookingdates"))?;
    let mut stay = Map::new();
    for name in DATE_FIELDS {
        let date = as_date(field(dates, name)?).ok_or(PayloadProblem::WrongType(name))?;
        stay.insert(name.to_string(), Value::String(date.to_string()));
    }
    record.insert("bookingdates".to_string(), Value::Object(stay));

    match obj.get("additionalneeds") {
        None | Some(Value::Null) => {}
        Some(Value::String(needs)) => {
            record.insert("additionalneeds".to_string(), Value::String(needs.clone()));
        }
        Some(_) => return Err(PayloadProblem::WrongType("additionalneeds")),
    }

    Ok(Value::Object(record))
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn stay_date(booking: &Value, field: &str) -> Option<NaiveDate> {
    as_date(&booking["bookingdates"][field])
}

// Filters accept partial dates the way the service does: 2022-01-01, 2022-01, 2022
fn parse_filter_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    let parts: Vec<&str> = raw.split('-').collect();
    let numeric = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    match parts.as_slice() {
        [year] if numeric(*year, 4) => NaiveDate::from_ymd_opt(year.parse().ok()?, 1, 1),
        [year, month] if numeric(*year, 4) && numeric(*month, 2) => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        _ => None,
    }
}

fn parse_id(raw: &str) -> Option<BookingId> {
    raw.parse().ok()
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|s| s.into_owned())
        .unwrap_or(raw)
}

fn credentials_from(body: &RequestBody) -> (String, String) {
    match body {
        RequestBody::Form(fields) => {
            let get = |key: &str| {
                fields
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            };
            (get("username"), get("password"))
        }
        RequestBody::Json(value) => {
            let get = |key: &str| value[key].as_str().unwrap_or_default().to_string();
            (get("username"), get("password"))
        }
        RequestBody::Empty => (String::new(), String::new()),
    }
}

fn json_body(body: &RequestBody) -> Option<&Value> {
    match body {
        RequestBody::Json(value) => Some(value),
        _ => None,
    }
}

fn json_response(status: u16, body: &Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}

fn text_response(status: u16, body: &str) -> ApiResponse {
    ApiResponse::new(status, body)
}

fn created() -> ApiResponse {
    text_response(201, "Created")
}

fn not_found() -> ApiResponse {
    text_response(404, "Not Found")
}

fn method_not_allowed() -> ApiResponse {
    text_response(405, "Method Not Allowed")
}

fn server_error() -> ApiResponse {
    text_response(500, "Internal Server Error")
}
