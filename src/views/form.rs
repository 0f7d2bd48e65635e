use chrono::NaiveDate;

use crate::client::{ClientError, MemberClient};
use crate::models::member::{CreateMember, Member, UpdateMember};
use crate::validation::{self, FieldErrors};

pub use crate::models::member::FIELDS;

/// Raw input state, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birthday: String,
    pub country: String,
    pub city: String,
    pub district: String,
    pub address: String,
}

impl FormFields {
    pub fn from_member(member: &Member) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            name: member.name.clone(),
            email: member.email.clone(),
            phone: text(&member.phone),
            birthday: member
                .birthday
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            country: text(&member.country),
            city: text(&member.city),
            district: text(&member.district),
            address: text(&member.address),
        }
    }

    fn slot(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "name" => Some(&mut self.name),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "birthday" => Some(&mut self.birthday),
            "country" => Some(&mut self.country),
            "city" => Some(&mut self.city),
            "district" => Some(&mut self.district),
            "address" => Some(&mut self.address),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        let value = match field {
            "name" => &self.name,
            "email" => &self.email,
            "phone" => &self.phone,
            "birthday" => &self.birthday,
            "country" => &self.country,
            "city" => &self.city,
            "district" => &self.district,
            "address" => &self.address,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Blank fields are sent as-is; the server treats them as not supplied.
    pub fn to_create(&self) -> CreateMember {
        CreateMember {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            phone: Some(self.phone.clone()),
            birthday: Some(self.birthday.clone()),
            country: Some(self.country.clone()),
            city: Some(self.city.clone()),
            district: Some(self.district.clone()),
            address: Some(self.address.clone()),
        }
    }

    /// The form always submits every field; blanking one clears it.
    pub fn to_update(&self) -> UpdateMember {
        let some = |v: &String| Some(Some(v.clone()));
        UpdateMember {
            name: some(&self.name),
            email: some(&self.email),
            phone: some(&self.phone),
            birthday: some(&self.birthday),
            country: some(&self.country),
            city: some(&self.city),
            district: some(&self.district),
            address: some(&self.address),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Client-side rules failed; nothing was sent. See `MemberForm::errors`.
    Invalid,
    /// The server or the network refused the submission.
    Rejected(String),
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Invalid => write!(f, "please fix the highlighted fields"),
            SubmitError::Rejected(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Create/edit form state: field values, per-field errors and the in-flight flag.
#[derive(Debug, Clone)]
pub struct MemberForm {
    mode: FormMode,
    fields: FormFields,
    errors: FieldErrors,
    submitting: bool,
}

impl MemberForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            fields: FormFields::default(),
            errors: FieldErrors::new(),
            submitting: false,
        }
    }

    pub fn edit(member: &Member) -> Self {
        Self {
            mode: FormMode::Edit(member.id),
            fields: FormFields::from_member(member),
            errors: FieldErrors::new(),
            submitting: false,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Add member",
            FormMode::Edit(_) => "Edit member",
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Updates one input and clears its error. Unknown fields are ignored.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> bool {
        let Some(slot) = self.fields.slot(field) else {
            return false;
        };
        *slot = value.into();
        self.errors.clear(field);
        true
    }

    pub fn validate(&mut self, today: NaiveDate) -> bool {
        self.errors = validation::validate_form(&self.fields, today);
        self.errors.is_empty()
    }

    /// Validates locally, then creates or updates. On success the caller
    /// navigates away with the saved member.
    pub async fn submit(
        &mut self,
        client: &MemberClient,
        today: NaiveDate,
    ) -> Result<Member, SubmitError> {
        if self.submitting {
            return Err(SubmitError::Rejected("submission already in progress".to_string()));
        }
        if !self.validate(today) {
            return Err(SubmitError::Invalid);
        }

        self.submitting = true;
        let result = match self.mode {
            FormMode::Create => client.create(&self.fields.to_create()).await,
            FormMode::Edit(id) => client.update(id, &self.fields.to_update()).await,
        };
        self.submitting = false;

        result.map_err(|e| {
            tracing::warn!("error saving member: {e}");
            SubmitError::Rejected(failure_message(&e, self.mode))
        })
    }

    /// Throws away every edit.
    pub fn cancel(self) {}
}

/// Server field errors are listed verbatim; anything else gets a generic line.
pub fn failure_message(err: &ClientError, mode: FormMode) -> String {
    if let Some(errors) = err.field_errors() {
        if !errors.is_empty() {
            return format!("Error: {}", errors.messages().join(", "));
        }
    }
    match mode {
        FormMode::Create => "An error occurred while adding member.".to_string(),
        FormMode::Edit(_) => "An error occurred while updating member.".to_string(),
    }
}
