// Booking records exchanged with the service
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type BookingId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Booking {
    pub firstname: String,
    pub lastname: String,
    pub totalprice: i64,
    pub depositpaid: bool,
    pub bookingdates: BookingDates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additionalneeds: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookingDates {
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
}

// Element of the GET /booking response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct BookingRef {
    pub bookingid: BookingId,
}

// Body of a successful POST /booking
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreatedBooking {
    pub bookingid: BookingId,
    pub booking: Booking,
}

// A fresh record per call; tests mutate their own copy instead of sharing one
pub fn sample_booking() -> Booking {
    Booking {
        firstname: "Jan".to_string(),
        lastname: "Kowalski".to_string(),
        totalprice: 212,
        depositpaid: true,
        bookingdates: BookingDates {
            checkin: NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid calendar date"),
            checkout: NaiveDate::from_ymd_opt(2022, 1, 2).expect("valid calendar date"),
        },
        additionalneeds: Some("dinner".to_string()),
    }
}

// Optional query filters for GET /booking
//
// Empty strings are treated the same as unset fields. Date filters are kept
// as strings because the service accepts partial dates ("2021") and rejects
// malformed ones itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub checkin: Option<String>,
    pub checkout: Option<String>,
}

impl BookingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn firstname(mut self, value: impl Into<String>) -> Self {
        self.firstname = Some(value.into());
        self
    }

    pub fn lastname(mut self, value: impl Into<String>) -> Self {
        self.lastname = Some(value.into());
        self
    }

    pub fn checkin(mut self, value: impl Into<String>) -> Self {
        self.checkin = Some(value.into());
        self
    }

    pub fn checkout(mut self, value: impl Into<String>) -> Self {
        self.checkout = Some(value.into());
        self
    }

    // Non-empty fields in the fixed order firstname, lastname, checkin, checkout
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("checkin", &self.checkin),
            ("checkout", &self.checkout),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((key, v)),
            _ => None,
        })
        .collect()
    }

    // Percent-encoded query string without the leading '?'. None when no field is set.
    pub fn query_string(&self) -> Option<String> {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return None;
        }
        let query = pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        Some(query)
    }
}
