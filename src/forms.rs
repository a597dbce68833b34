use serde::Deserialize;

use crate::{
    languages::{self, DEFAULT_LANGUAGE},
    validator::{EMAIL_RX, Validator, matches, min_chars, not_blank},
};

pub const BLANK: &str = "This field cannot be blank";
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Form posted to `/create`. The CSRF field is consumed by the guard and ignored here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    /// Blank form shown on the home page.
    pub fn new() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&mut self) -> bool {
        self.validator
            .check_field(not_blank(&self.content), "content", BLANK);
        self.validator.check_field(
            languages::is_known(&self.language),
            "language",
            "Choose a valid language",
        );
        self.validator.valid()
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.language == key
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) -> bool {
        self.validator.check_field(not_blank(&self.name), "name", BLANK);
        self.validator
            .check_field(not_blank(&self.email), "email", BLANK);
        self.validator.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        self.validator
            .check_field(not_blank(&self.password), "password", BLANK);
        self.validator.check_field(
            min_chars(&self.password, MIN_PASSWORD_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
        self.validator.valid()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) -> bool {
        self.validator
            .check_field(not_blank(&self.email), "email", BLANK);
        self.validator.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        self.validator
            .check_field(not_blank(&self.password), "password", BLANK);
        self.validator.valid()
    }
}
