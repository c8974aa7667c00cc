use chrono::{DateTime, Datelike, NaiveDate, Utc};
use coachline_core::{CoreError, CoreResult};
use coachline_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CPF+RG for nationals or a passport for foreigners, never both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentityDocuments {
    National { cpf: Masked<String>, rg: Masked<String> },
    Foreign { passport: Masked<String> },
}

impl IdentityDocuments {
    pub fn is_foreign(&self) -> bool {
        matches!(self, IdentityDocuments::Foreign { .. })
    }

    pub fn normalized(self) -> CoreResult<Self> {
        match self {
            IdentityDocuments::National { cpf, rg } => {
                let rg = alphanumeric_upper(rg.expose());
                if rg.is_empty() {
                    return Err(CoreError::validation("RG is required"));
                }
                Ok(IdentityDocuments::National {
                    cpf: Masked::new(normalize_cpf(cpf.expose())?),
                    rg: Masked::new(rg),
                })
            }
            IdentityDocuments::Foreign { passport } => {
                let passport = alphanumeric_upper(passport.expose());
                if passport.is_empty() {
                    return Err(CoreError::validation("Passport number is required"));
                }
                Ok(IdentityDocuments::Foreign { passport: Masked::new(passport) })
            }
        }
    }

    /// (label, value) pairs that must be unique across active passengers.
    pub fn keys(&self) -> Vec<(&'static str, &str)> {
        match self {
            IdentityDocuments::National { cpf, rg } => vec![("CPF", cpf.expose()), ("RG", rg.expose())],
            IdentityDocuments::Foreign { passport } => vec![("PASSPORT", passport.expose())],
        }
    }
}

fn alphanumeric_upper(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_uppercase()
}

/// Strips punctuation and checks both CPF verifier digits.
pub fn normalize_cpf(raw: &str) -> CoreResult<String> {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    let invalid = || CoreError::validation("Invalid CPF");

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return Err(invalid());
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };

    if check(9) != digits[9] || check(10) != digits[10] {
        return Err(invalid());
    }
    Ok(digits.iter().map(|d| char::from_digit(*d, 10).unwrap_or('0')).collect())
}

/// Guardian of a minor: an already registered passenger or one created along with the minor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardianRef {
    Existing { id: Uuid },
    New(Box<PassengerInput>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerInput {
    pub name: String,
    pub birth_date: NaiveDate,
    pub documents: IdentityDocuments,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub guardian: Option<GuardianRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub id: Uuid,
    pub name: String,
    pub birth_date: NaiveDate,
    pub documents: IdentityDocuments,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub guardian_id: Option<Uuid>,
    #[serde(rename = "estaAtivo", alias = "active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Passenger {
    /// Builds a passenger from validated input; guardian linkage is resolved by the caller.
    pub fn new(input: &PassengerInput, guardian_id: Option<Uuid>) -> CoreResult<Self> {
        let now = Utc::now();
        let mut passenger = Self {
            id: Uuid::new_v4(),
            name: String::new(),
            birth_date: input.birth_date,
            documents: input.documents.clone(),
            phone: None,
            address: None,
            guardian_id,
            active: true,
            created_at: now,
            updated_at: now,
        };
        passenger.apply(input, guardian_id)?;
        Ok(passenger)
    }

    pub fn apply(&mut self, input: &PassengerInput, guardian_id: Option<Uuid>) -> CoreResult<()> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("Passenger name is required"));
        }
        if input.birth_date > Utc::now().date_naive() {
            return Err(CoreError::validation("Birth date cannot be in the future"));
        }

        self.name = name.to_string();
        self.birth_date = input.birth_date;
        self.documents = input.documents.clone().normalized()?;
        self.phone = clean(&input.phone);
        self.address = clean(&input.address);
        self.guardian_id = guardian_id;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_foreign(&self) -> bool {
        self.documents.is_foreign()
    }

    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let mut age = today.year() - self.birth_date.year();
        if (today.month(), today.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    pub fn is_minor_on(&self, today: NaiveDate, adult_age: u32) -> bool {
        self.age_on(today) < adult_age
    }

    /// First document label shared with `other`, if any.
    pub fn shared_document(&self, other: &Passenger) -> Option<&'static str> {
        let theirs = other.documents.keys();
        self.documents
            .keys()
            .into_iter()
            .find(|(label, value)| theirs.iter().any(|(l, v)| l == label && v == value))
            .map(|(label, _)| label)
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
