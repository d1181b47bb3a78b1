//! Synchronous name checks shared by client and server. These follow the
//! boolean-return convention: callers that need an error wrap the result in
//! `SignalingError::BadName` themselves.

pub const MAX_NAME_LEN: usize = 64;

fn is_ident(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')'))
}

/// Standard identifier rules for usernames.
pub fn is_name_valid(name: &str) -> bool {
    is_ident(name)
}

pub fn is_room_name_valid(name: &str) -> bool {
    is_ident(name)
}

pub fn is_field_name_valid(name: &str) -> bool {
    is_ident(name)
}

pub fn is_app_name_valid(name: &str) -> bool {
    is_ident(name)
}
