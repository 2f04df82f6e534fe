//! Validation utilities for dashboard input
//!
//! Each check returns the message shown to the user.

use crate::types::DateRange;

// ============================================================================
// Forecast Validations
// ============================================================================

/// Zone name must be non-empty once trimmed
pub fn validate_zone_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Please enter a Zone Name.");
    }
    if name.trim().chars().count() > 200 {
        return Err("Zone name must be at most 200 characters");
    }
    Ok(())
}

/// Imagery window must not end before it starts
pub fn validate_date_range(range: &DateRange) -> Result<(), &'static str> {
    if range.start > range.end {
        return Err("Start date must be on or before end date.");
    }
    Ok(())
}

/// Layer opacity must be a number in [0, 1]
pub fn validate_opacity(opacity: f64) -> Result<(), &'static str> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err("Opacity must be between 0 and 1");
    }
    Ok(())
}

/// Geocoding query must contain something to search for
pub fn validate_search_query(query: &str) -> Result<(), &'static str> {
    if query.trim().is_empty() {
        return Err("Please enter a location to search.");
    }
    Ok(())
}

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Telegram chat ids are integers; group chats are negative
pub fn validate_chat_id(chat_id: &str) -> Result<(), &'static str> {
    let chat_id = chat_id.trim();
    if chat_id.is_empty() {
        return Err("Please enter your Telegram Chat ID");
    }
    let digits = chat_id.strip_prefix('-').unwrap_or(chat_id);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Telegram Chat ID must be numeric");
    }
    Ok(())
}
