//! JSON bodies returned by the mock API

use serde_json::{json, Value};
use uuid::Uuid;

pub const LISTING_ID: Uuid = Uuid::from_u128(0x42);

pub fn user_json() -> Value {
    json!({
        "id": Uuid::from_u128(7),
        "email": "moderator@propdesk.test",
        "name": "Mia Moderator",
        "role": "moderator"
    })
}

/// Token pair, optionally embedding the user
pub fn tokens_json(access_token: &str, with_user: bool) -> Value {
    let mut body = json!({
        "access_token": access_token,
        "refresh_token": format!("{access_token}-refresh"),
        "token_type": "Bearer",
        "expires_in": 900
    });
    if with_user {
        body["user"] = user_json();
    }
    body
}

pub fn otp_challenge_json() -> Value {
    json!({
        "otp_required": true,
        "otp_token": "otp-123",
        "expires_in": 300
    })
}

pub fn listing_json(status: &str) -> Value {
    json!({
        "id": LISTING_ID,
        "title": "Sunny two-bedroom near the river",
        "description": "Bright flat with a balcony.",
        "price": 1_250_000,
        "currency": "USD",
        "property_type": "apartment",
        "listing_type": "sale",
        "address": {
            "line1": "Rua Augusta 10",
            "city": "Lisbon",
            "country": "Portugal"
        },
        "bedrooms": 2,
        "bathrooms": 1,
        "area_sqm": 84.5,
        "images": ["https://cdn.propdesk.test/42/cover.jpg"],
        "owner": {
            "id": Uuid::from_u128(9),
            "name": "Olivia Owner",
            "email": "owner@propdesk.test"
        },
        "status": status,
        "created_at": "2026-02-01T09:00:00Z",
        "updated_at": "2026-02-02T09:00:00Z"
    })
}

pub fn page_json(listings: Vec<Value>, page: u32, total: u64) -> Value {
    json!({
        "data": listings,
        "meta": {"page": page, "per_page": 20, "total": total}
    })
}
