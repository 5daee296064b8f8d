// Client and functional-test support for the restful-booker hotel booking API

pub mod auth;
pub mod booking;
pub mod client;
pub mod config;
pub mod error;
pub mod fake;
pub mod transport;

// Re-export key types for convenience
pub use auth::{AuthResponse, Credentials, CredentialsTokenProvider, StaticToken, TokenProvider};
pub use booking::{
    sample_booking, Booking, BookingDates, BookingFilter, BookingId, BookingRef, CreatedBooking,
};
pub use client::BookingApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ClientError};
pub use fake::FakeBookingService;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, Transport};
