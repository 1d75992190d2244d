//! Request checks that run before anything reaches the chat core. Lengths
//! are counted in chars, not bytes.

use serde::Deserialize;

use huddle_types::api::RegisterRequest;
use huddle_types::models::PageRequest;

use crate::error::{ApiError, ApiResult};

pub const MAX_PAGE_SIZE: u32 = 100;

const CHANNEL_NAME_MIN: usize = 3;
const CHANNEL_NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;
const CONTENT_MAX: usize = 5000;
const EMAIL_MAX: usize = 255;
const DISPLAY_NAME_MAX: usize = 255;
const PASSWORD_MIN: usize = 8;

/// `?page=&size=` on history endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    PageRequest::default().size
}

pub fn page_request(query: &PageQuery) -> ApiResult<PageRequest> {
    if query.size == 0 {
        return Err(ApiError::bad_request("Page size must be at least 1"));
    }
    Ok(PageRequest::new(query.page, query.size.min(MAX_PAGE_SIZE)))
}

pub fn registration(req: &RegisterRequest) -> ApiResult<()> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') || email.chars().count() > EMAIL_MAX {
        return Err(ApiError::bad_request("Email must be a valid address"));
    }

    let display_name = req.display_name.trim();
    if display_name.is_empty() || display_name.chars().count() > DISPLAY_NAME_MAX {
        return Err(ApiError::bad_request(format!(
            "Display name must be between 1 and {} characters",
            DISPLAY_NAME_MAX
        )));
    }

    if req.password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN
        )));
    }

    Ok(())
}

/// Returns the trimmed name.
pub fn channel_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    let len = name.chars().count();
    if !(CHANNEL_NAME_MIN..=CHANNEL_NAME_MAX).contains(&len) {
        return Err(ApiError::bad_request(format!(
            "Channel name must be between {} and {} characters",
            CHANNEL_NAME_MIN, CHANNEL_NAME_MAX
        )));
    }
    Ok(name.to_string())
}

/// Blank descriptions are stored as absent.
pub fn description(description: Option<String>) -> ApiResult<Option<String>> {
    match description {
        Some(d) if d.chars().count() > DESCRIPTION_MAX => Err(ApiError::bad_request(format!(
            "Description must be at most {} characters",
            DESCRIPTION_MAX
        ))),
        Some(d) if d.trim().is_empty() => Ok(None),
        other => Ok(other),
    }
}

pub fn message_content(content: &str) -> ApiResult<()> {
    if content.trim().is_empty() {
        return Err(ApiError::bad_request("Message content must not be blank"));
    }
    if content.chars().count() > CONTENT_MAX {
        return Err(ApiError::bad_request(format!(
            "Message content must be at most {} characters",
            CONTENT_MAX
        )));
    }
    Ok(())
}

pub fn peer_user_id(peer: &str) -> ApiResult<String> {
    let peer = peer.trim();
    if peer.is_empty() {
        return Err(ApiError::bad_request("Peer user id must not be blank"));
    }
    Ok(peer.to_string())
}
