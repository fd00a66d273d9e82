use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Explicit request validation, paired with each endpoint's DTO at
/// registration time. Implementations report every failing field at once.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// A managed user account. The password hash never leaves the service:
/// it is skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Query parameters for the paginated user listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

impl ListUsersQuery {
    /// Effective (page, page_size) with defaults applied and the size
    /// clamped to [`MAX_PAGE_SIZE`].
    pub fn pagination(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

impl Validate for ListUsersQuery {
    fn validate(&self) -> Result<()> {
        let mut fields = BTreeMap::new();
        if let Some(search) = &self.search {
            check_max(&mut fields, "search", search, 50);
        }
        finish(fields)
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<()> {
        let mut fields = BTreeMap::new();
        check_required(&mut fields, "email", &self.email);
        check_email(&mut fields, "email", &self.email);
        check_required(&mut fields, "password", &self.password);
        check_min(&mut fields, "password", &self.password, 6);
        finish(fields)
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<()> {
        let mut fields = BTreeMap::new();
        check_required(&mut fields, "name", &self.name);
        check_max(&mut fields, "name", &self.name, 250);
        check_required(&mut fields, "email", &self.email);
        check_email(&mut fields, "email", &self.email);
        check_max(&mut fields, "email", &self.email, 250);
        check_required(&mut fields, "password", &self.password);
        check_min(&mut fields, "password", &self.password, 6);
        check_max(&mut fields, "password", &self.password, 250);
        check_required(&mut fields, "confirm_password", &self.confirm_password);
        if !self.confirm_password.is_empty() && self.confirm_password != self.password {
            fields.insert(
                "confirm_password".to_string(),
                "confirm_password must match password".to_string(),
            );
        }
        finish(fields)
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<()> {
        let mut fields = BTreeMap::new();
        if let Some(name) = &self.name {
            check_max(&mut fields, "name", name, 50);
        }
        if let Some(email) = &self.email {
            check_email(&mut fields, "email", email);
            check_max(&mut fields, "email", email, 50);
        }
        if let Some(password) = &self.password {
            check_min(&mut fields, "password", password, 6);
            check_max(&mut fields, "password", password, 250);
        }
        finish(fields)
    }
}

fn finish(fields: BTreeMap<String, String>) -> Result<()> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(fields))
    }
}

fn check_required(fields: &mut BTreeMap<String, String>, name: &str, value: &str) {
    if value.is_empty() {
        fields.insert(name.to_string(), format!("{name} is required"));
    }
}

fn check_min(fields: &mut BTreeMap<String, String>, name: &str, value: &str, min: usize) {
    if !value.is_empty() && value.chars().count() < min {
        fields.insert(
            name.to_string(),
            format!("{name} must be at least {min} characters long"),
        );
    }
}

fn check_max(fields: &mut BTreeMap<String, String>, name: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        fields.insert(
            name.to_string(),
            format!("{name} must be at most {max} characters long"),
        );
    }
}

fn check_email(fields: &mut BTreeMap<String, String>, name: &str, value: &str) {
    if !value.is_empty() && !is_valid_email(value) {
        fields.insert(
            name.to_string(),
            format!("{name} must be a valid email address"),
        );
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
}
