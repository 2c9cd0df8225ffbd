//! Field-level validation of company payloads.
//!
//! Rules are an ordered list of independent predicate + message pairs. Every
//! rule is evaluated (there is no short-circuit between fields), so a payload
//! with several bad fields reports all of them at once. Rules that only apply
//! to present values (the ISIN format, the website) treat an empty value as
//! passing and leave "required" to a separate rule.

use serde::{Deserialize, Serialize};

use crate::company::{CreateCompany, UpdateCompany};
use crate::envelope::ErrorMap;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_EXCHANGE_LEN: usize = 255;
pub const MAX_TICKER_LEN: usize = 10;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outcome of running a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<ValidationFailure>),
}

impl ValidationOutcome {
    pub fn from_failures(failures: Vec<ValidationFailure>) -> Self {
        if failures.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(failures)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        match self {
            Self::Valid => &[],
            Self::Invalid(failures) => failures,
        }
    }

    /// Group failures by field, keeping rule order within each field.
    pub fn into_error_map(self) -> ErrorMap {
        let mut map = ErrorMap::new();
        if let Self::Invalid(failures) = self {
            for failure in failures {
                map.entry(failure.field).or_default().push(failure.message);
            }
        }
        map
    }
}

/// Read access to the fields both payloads share.
trait CompanyFields {
    fn name(&self) -> &str;
    fn exchange(&self) -> &str;
    fn ticker(&self) -> &str;
    fn isin(&self) -> &str;
    fn website(&self) -> Option<&str>;
}

macro_rules! impl_company_fields {
    ($t:ty) => {
        impl CompanyFields for $t {
            fn name(&self) -> &str {
                &self.name
            }
            fn exchange(&self) -> &str {
                &self.exchange
            }
            fn ticker(&self) -> &str {
                &self.ticker
            }
            fn isin(&self) -> &str {
                &self.isin
            }
            fn website(&self) -> Option<&str> {
                self.website.as_deref()
            }
        }
    };
}

impl_company_fields!(CreateCompany);
impl_company_fields!(UpdateCompany);

struct Rule<P> {
    field: &'static str,
    message: &'static str,
    passes: fn(&P) -> bool,
}

impl<P> Rule<P> {
    const fn new(field: &'static str, message: &'static str, passes: fn(&P) -> bool) -> Self {
        Self {
            field,
            message,
            passes,
        }
    }
}

fn shared_rules<P: CompanyFields>() -> Vec<Rule<P>> {
    vec![
        Rule::new(
            "Name",
            "Company name cannot exceed 255 characters.",
            |p: &P| within(p.name(), MAX_NAME_LEN),
        ),
        Rule::new(
            "Exchange",
            "Exchange name cannot exceed 255 characters.",
            |p: &P| within(p.exchange(), MAX_EXCHANGE_LEN),
        ),
        Rule::new(
            "Ticker",
            "Ticker cannot exceed 10 characters.",
            |p: &P| within(p.ticker(), MAX_TICKER_LEN),
        ),
        Rule::new("Isin", "ISIN is required.", |p: &P| !p.isin().is_empty()),
        Rule::new(
            "Isin",
            "ISIN must start with two non-numeric characters.",
            |p: &P| p.isin().is_empty() || has_isin_prefix(p.isin()),
        ),
        Rule::new("Website", "Website URL is not valid.", |p: &P| {
            p.website().is_none_or(|w| w.is_empty() || is_absolute_url(w))
        }),
    ]
}

fn run<P>(payload: &P, rules: &[Rule<P>]) -> ValidationOutcome {
    let failures = rules
        .iter()
        .filter(|rule| !(rule.passes)(payload))
        .map(|rule| ValidationFailure::new(rule.field, rule.message))
        .collect();
    ValidationOutcome::from_failures(failures)
}

/// Validate a creation payload.
pub fn validate_create(payload: &CreateCompany) -> ValidationOutcome {
    run(payload, &shared_rules())
}

/// Validate an update payload (shared rules plus a required id).
pub fn validate_update(payload: &UpdateCompany) -> ValidationOutcome {
    let mut rules = vec![Rule::new(
        "Id",
        "Company ID is required.",
        |p: &UpdateCompany| !p.id.is_nil(),
    )];
    rules.extend(shared_rules());
    run(payload, &rules)
}

fn within(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// First two characters exist and neither is an ASCII digit.
pub fn has_isin_prefix(isin: &str) -> bool {
    let mut chars = isin.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) => !a.is_ascii_digit() && !b.is_ascii_digit(),
        _ => false,
    }
}

/// Absolute URL with both a scheme and a host.
pub fn is_absolute_url(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|url| url.has_host())
        .unwrap_or(false)
}
