//! Field rules shared by user signup, user patches and task patches. Every rule is a plain
//! predicate so it can be reused by DTO validation and by the domain services.

use lazy_static::lazy_static;
use regex::Regex;
use std::ops::RangeInclusive;

pub const LOGIN_LENGTH: RangeInclusive<usize> = 3..=19;
pub const PASSWORD_LENGTH: RangeInclusive<usize> = 5..=19;
pub const NAME_LENGTH: RangeInclusive<usize> = 3..=30;
pub const TITLE_LENGTH: RangeInclusive<usize> = 1..=255;

lazy_static! {
    static ref LOGIN_PATTERN: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("login pattern is a valid regex");
    static ref PASSWORD_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9!@#$%^&*_.\-]+$").expect("password pattern is a valid regex");
    static ref NAME_PATTERN: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_ ]*$").expect("name pattern is a valid regex");
}

fn length_within(value: &str, bounds: &RangeInclusive<usize>) -> bool {
    bounds.contains(&value.chars().count())
}

/// A login is 3 to 19 word characters and never starts with a digit
pub fn is_login(login: &str) -> bool {
    length_within(login, &LOGIN_LENGTH) && LOGIN_PATTERN.is_match(login)
}

/// A password is 5 to 19 characters from the allowed set and mixes at least one letter with
/// at least one digit
pub fn is_password(password: &str) -> bool {
    length_within(password, &PASSWORD_LENGTH)
        && PASSWORD_PATTERN.is_match(password)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// A display name follows the ASCII login charset, with spaces allowed
pub fn is_name(name: &str) -> bool {
    length_within(name, &NAME_LENGTH) && NAME_PATTERN.is_match(name)
}

/// A task title is non-blank and at most 255 characters
pub fn is_title(title: &str) -> bool {
    !title.trim().is_empty() && length_within(title, &TITLE_LENGTH)
}

/// Checks a requested user patch against the whitelist of patchable user columns
pub fn user_patch_valid(column: &str, value: &str) -> bool {
    super::user::UserPatch::new(column, value).is_ok()
}

/// Checks a requested task patch against the whitelist of patchable task columns
pub fn task_patch_valid(column: &str, value: &str) -> bool {
    super::todo::TaskPatch::new(column, value).is_ok()
}
