//! Client for the Cordial rewriting service.
//!
//! Endpoints:
//! - `POST /generate-reply`
//! - `POST /get-credits`
//! - `POST /claim-daily-credits`, `POST /add-credits`
//! - `POST /create-checkout-session`
//! - `GET /auth/login`, `GET /auth/logout`

pub mod api;
mod client;
mod error;

pub use api::{ClaimOutcome, GenerateReplyResponse};
pub use client::ApiClient;
pub use error::ApiError;
