//! Declarative form schemas for the login and register forms.
//!
//! A `Schema` is a list of fields, each with rules checked in declaration
//! order. Validation reports at most one message per field: the first rule
//! that fails.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{LoginInput, RegisterInput};

static LOGIN_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@ ]+@[^@ ]+\.[^@ .]{2,}$").expect("login email pattern"));

static REGISTER_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("register email pattern")
});

#[derive(Debug, Clone)]
pub enum Rule {
    Required(&'static str),
    /// Minimum length in characters.
    MinLength(usize, &'static str),
    Pattern(&'static Regex, &'static str),
}

impl Rule {
    fn check(&self, value: &str) -> Option<&'static str> {
        match self {
            Rule::Required(msg) => value.is_empty().then_some(*msg),
            Rule::MinLength(min, msg) => (value.chars().count() < *min).then_some(*msg),
            Rule::Pattern(re, msg) => (!re.is_match(value)).then_some(*msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: &'static str,
    pub rules: Vec<Rule>,
}

/// Field values a schema can read by name.
pub trait FormValues {
    fn value(&self, field: &str) -> Option<&str>;
}

impl FormValues for LoginInput {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "identifier" => Some(&self.identifier),
            "password" => Some(&self.password),
            _ => None,
        }
    }
}

impl FormValues for RegisterInput {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "username" => Some(&self.username),
            "email" => Some(&self.email),
            "password" => Some(&self.password),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Per-field messages, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn validate(&self, values: &dyn FormValues) -> Result<(), FieldErrors> {
        let errors: Vec<FieldError> = self
            .fields
            .iter()
            .filter_map(|field| {
                let value = values.value(field.name).unwrap_or("");
                field
                    .rules
                    .iter()
                    .find_map(|rule| rule.check(value))
                    .map(|message| FieldError {
                        field: field.name,
                        message,
                    })
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors(errors))
        }
    }
}

pub fn login_schema() -> Schema {
    Schema {
        fields: vec![
            FieldSchema {
                name: "identifier",
                rules: vec![
                    Rule::Required("Email is required"),
                    Rule::Pattern(&LOGIN_EMAIL, "Not a valid email address."),
                ],
            },
            FieldSchema {
                name: "password",
                rules: vec![
                    Rule::Required("Password is required"),
                    Rule::MinLength(8, "Password should be at least 8 characters."),
                ],
            },
        ],
    }
}

pub fn register_schema() -> Schema {
    Schema {
        fields: vec![
            FieldSchema {
                name: "username",
                rules: vec![
                    Rule::Required("Username is required!"),
                    Rule::MinLength(6, "Username must have at least 6 characters"),
                ],
            },
            FieldSchema {
                name: "email",
                rules: vec![
                    Rule::Required("Email is required"),
                    Rule::Pattern(&REGISTER_EMAIL, "Please enter a valid email!"),
                ],
            },
            FieldSchema {
                name: "password",
                rules: vec![
                    Rule::Required("Password is required"),
                    Rule::MinLength(8, "password must have at least 8 characters"),
                ],
            },
        ],
    }
}
