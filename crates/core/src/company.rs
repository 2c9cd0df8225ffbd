//! The `Company` record and the payloads that create or change it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::id::CompanyId;

/// Creation payload as received from API callers.
///
/// Missing or `null` string fields deserialize as empty strings so that the
/// field validator, not the JSON decoder, reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCompany {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub exchange: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ticker: String,
    #[serde(deserialize_with = "null_as_default")]
    pub isin: String,
    pub website: Option<String>,
}

/// Update payload as received from API callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateCompany {
    #[serde(deserialize_with = "null_as_default")]
    pub id: CompanyId,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub exchange: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ticker: String,
    #[serde(deserialize_with = "null_as_default")]
    pub isin: String,
    pub website: Option<String>,
    pub updated_by: Option<String>,
}

impl UpdateCompany {
    /// Split into the target identifier and the mutable fields.
    pub fn into_parts(self) -> (CompanyId, CompanyChanges) {
        let changes = CompanyChanges {
            name: self.name,
            exchange: self.exchange,
            ticker: self.ticker,
            isin: self.isin,
            website: normalize_website(self.website),
            updated_by: self.updated_by,
        };
        (self.id, changes)
    }
}

/// The mutable part of a company, applied by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyChanges {
    pub name: String,
    pub exchange: String,
    pub ticker: String,
    pub isin: String,
    pub website: Option<String>,
    pub updated_by: Option<String>,
}

/// Aggregate root: a company record.
///
/// `id` and `date_created` are fixed at creation; only [`Company::apply`]
/// mutates the record and it always stamps `date_updated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    id: CompanyId,
    name: String,
    exchange: String,
    ticker: String,
    isin: String,
    website: Option<String>,
    date_created: DateTime<Utc>,
    date_updated: Option<DateTime<Utc>>,
    updated_by: Option<String>,
}

impl Company {
    /// Build a brand new record with a fresh identifier.
    pub fn create(payload: CreateCompany, now: DateTime<Utc>) -> Self {
        Self {
            id: CompanyId::new(),
            name: payload.name,
            exchange: payload.exchange,
            ticker: payload.ticker,
            isin: payload.isin,
            website: normalize_website(payload.website),
            date_created: now,
            date_updated: None,
            updated_by: None,
        }
    }

    /// Apply an update, keeping identity and creation time.
    pub fn apply(&mut self, changes: CompanyChanges, now: DateTime<Utc>) {
        self.name = changes.name;
        self.exchange = changes.exchange;
        self.ticker = changes.ticker;
        self.isin = changes.isin;
        self.website = changes.website;
        self.updated_by = changes.updated_by;
        self.date_updated = Some(now);
    }

    pub fn id(&self) -> CompanyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn isin(&self) -> &str {
        &self.isin
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    pub fn date_updated(&self) -> Option<DateTime<Utc>> {
        self.date_updated
    }

    pub fn updated_by(&self) -> Option<&str> {
        self.updated_by.as_deref()
    }

    pub fn to_dto(&self) -> CompanyDto {
        CompanyDto::from(self)
    }
}

/// Wire shape of a company (API responses, client payloads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
    pub id: CompanyId,
    pub name: String,
    pub exchange: String,
    pub ticker: String,
    pub isin: String,
    pub website: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl From<&Company> for CompanyDto {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            exchange: company.exchange.clone(),
            ticker: company.ticker.clone(),
            isin: company.isin.clone(),
            website: company.website.clone(),
            date_created: company.date_created,
            date_updated: company.date_updated,
            updated_by: company.updated_by.clone(),
        }
    }
}

/// Rehydrate a record from stored state.
impl From<CompanyDto> for Company {
    fn from(dto: CompanyDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            exchange: dto.exchange,
            ticker: dto.ticker,
            isin: dto.isin,
            website: dto.website,
            date_created: dto.date_created,
            date_updated: dto.date_updated,
            updated_by: dto.updated_by,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// An empty website is "no website".
fn normalize_website(website: Option<String>) -> Option<String> {
    website.filter(|w| !w.is_empty())
}
