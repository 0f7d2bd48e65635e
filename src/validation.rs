use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::member::{CreateMember, MemberChanges, NewMember, UpdateMember};
use crate::views::form::FormFields;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?(?:\.[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?)*$",
    )
    .expect("email pattern is valid")
});

static FORM_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("form email pattern is valid"));

static FORM_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-\s()]+$").expect("form phone pattern is valid"));

/// Field-keyed validation messages, rendered as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// First message for `field`, which is what a form shows under the input.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn clear(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// All messages, flattened in field order.
    pub fn messages(&self) -> Vec<&str> {
        self.0.values().flatten().map(String::as_str).collect()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages().join(", "))
    }
}

impl std::error::Error for FieldErrors {}

/// Trim, and treat a blank string as not supplied.
pub fn clean(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping only the date.
pub fn parse_birthday(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

impl CreateMember {
    pub fn normalized(self) -> Self {
        Self {
            name: clean(self.name),
            email: clean(self.email),
            phone: clean(self.phone),
            birthday: clean(self.birthday),
            country: clean(self.country),
            city: clean(self.city),
            district: clean(self.district),
            address: clean(self.address),
        }
    }
}

impl UpdateMember {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(clean),
            email: self.email.map(clean),
            phone: self.phone.map(clean),
            birthday: self.birthday.map(clean),
            country: self.country.map(clean),
            city: self.city.map(clean),
            district: self.district.map(clean),
            address: self.address.map(clean),
        }
    }
}

fn check_email(errors: &mut FieldErrors, email: &str, email_taken: bool) {
    if !is_valid_email(email) {
        errors.add("email", "The email field must be a valid email address.");
    } else if email_taken {
        errors.add("email", "The email has already been taken.");
    }
}

fn check_birthday(errors: &mut FieldErrors, birthday: Option<&str>) -> Option<NaiveDate> {
    let raw = birthday?;
    let parsed = parse_birthday(raw);
    if parsed.is_none() {
        errors.add("birthday", "The birthday field must be a valid date.");
    }
    parsed
}

/// Server rules for creating a member. `input` must already be normalized;
/// `email_taken` is the store's answer for the normalized email.
pub fn validate_create(input: CreateMember, email_taken: bool) -> Result<NewMember, FieldErrors> {
    let mut errors = FieldErrors::new();

    if input.name.is_none() {
        errors.add("name", "The name field is required.");
    }
    match input.email.as_deref() {
        None => errors.add("email", "The email field is required."),
        Some(email) => check_email(&mut errors, email, email_taken),
    }
    let birthday = check_birthday(&mut errors, input.birthday.as_deref());

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewMember {
        name: input.name.unwrap_or_default(),
        email: input.email.unwrap_or_default(),
        phone: input.phone,
        birthday,
        country: input.country,
        city: input.city,
        district: input.district,
        address: input.address,
    })
}

/// Server rules for a partial update. Only supplied keys are checked.
/// `email_taken` must exclude the member being updated.
pub fn validate_update(
    input: UpdateMember,
    email_taken: bool,
) -> Result<MemberChanges, FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(None) = input.name {
        errors.add("name", "The name field is required.");
    }
    match &input.email {
        Some(None) => errors.add("email", "The email field is required."),
        Some(Some(email)) => check_email(&mut errors, email, email_taken),
        None => {}
    }
    let birthday = input
        .birthday
        .as_ref()
        .map(|b| check_birthday(&mut errors, b.as_deref()));

    errors.into_result(MemberChanges {
        name: input.name.flatten(),
        email: input.email.flatten(),
        phone: input.phone,
        birthday,
        country: input.country,
        city: input.city,
        district: input.district,
        address: input.address,
    })
}

/// Form-side rules. Stricter than the server on purpose: phone and city are
/// required here but optional in the API.
pub fn validate_form(fields: &FormFields, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let name = fields.name.trim();
    if name.is_empty() {
        errors.add("name", "Name is required");
    } else if name.chars().count() < 2 {
        errors.add("name", "Name must be at least 2 characters");
    }

    if fields.email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !FORM_EMAIL.is_match(&fields.email) {
        errors.add("email", "Email is not valid");
    }

    if fields.phone.trim().is_empty() {
        errors.add("phone", "Phone number is required");
    } else if !FORM_PHONE.is_match(&fields.phone) {
        errors.add("phone", "Phone number contains invalid characters");
    } else if fields.phone.chars().filter(char::is_ascii_digit).count() < 10 {
        errors.add("phone", "Phone number must be at least 10 digits");
    }

    let city = fields.city.trim();
    if city.is_empty() {
        errors.add("city", "City is required");
    } else if city.chars().count() < 2 {
        errors.add("city", "City must be at least 2 characters");
    }

    if let Some(birthday) = parse_birthday(fields.birthday.trim()) {
        if birthday > today {
            errors.add("birthday", "Birthday cannot be in the future");
        }
    }

    errors
}
