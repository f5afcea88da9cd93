//! Form field records and the confirmation snapshot.
//!
//! Plain value types: a [`FormFieldSet`] is built once per case and never
//! mutated; a [`SubmittedDataSnapshot`] is parsed from the confirmation table
//! and only used for comparison.

use crate::result::{ProbeError, ProbeResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// English month names, January first
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Subjects offered by the subjects autocomplete
pub const SUBJECTS: [&str; 14] = [
    "Maths",
    "Physics",
    "Chemistry",
    "Biology",
    "Computer Science",
    "English",
    "Economics",
    "Arts",
    "Commerce",
    "Accounting",
    "Civics",
    "Hindi",
    "History",
    "Geography",
];

/// States with their cities, in dropdown order
pub const STATE_CITIES: [(&str, &[&str]); 4] = [
    ("NCR", &["Delhi", "Gurgaon", "Noida"]),
    ("Uttar Pradesh", &["Agra", "Lucknow", "Merrut"]),
    ("Haryana", &["Karnal", "Panipat"]),
    ("Rajasthan", &["Jaipur", "Jaiselmer"]),
];

/// Cities of a state, `None` for an unknown state
#[must_use]
pub fn cities_of(state: &str) -> Option<&'static [&'static str]> {
    STATE_CITIES
        .iter()
        .find(|(s, _)| *s == state)
        .map(|(_, cities)| *cities)
}

/// Confirmation labels read back after submission
pub mod labels {
    /// "first last"
    pub const STUDENT_NAME: &str = "Student Name";
    /// Email
    pub const STUDENT_EMAIL: &str = "Student Email";
    /// Phone
    pub const MOBILE: &str = "Mobile";
    /// Gender
    pub const GENDER: &str = "Gender";
    /// Address
    pub const ADDRESS: &str = "Address";
}

/// Gender radio options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Other
    Other,
}

impl Gender {
    /// All genders in radio order
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    /// Label text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    /// Radio input id
    #[must_use]
    pub const fn radio_id(&self) -> &'static str {
        match self {
            Self::Male => "gender-radio-1",
            Self::Female => "gender-radio-2",
            Self::Other => "gender-radio-3",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProbeError::invalid_data(format!("unknown gender: {s}")))
    }
}

/// Hobby checkboxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hobby {
    /// Sports
    Sports,
    /// Reading
    Reading,
    /// Music
    Music,
}

impl Hobby {
    /// All hobbies in checkbox order
    pub const ALL: [Self; 3] = [Self::Sports, Self::Reading, Self::Music];

    /// Label text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sports => "Sports",
            Self::Reading => "Reading",
            Self::Music => "Music",
        }
    }

    /// Checkbox input id
    #[must_use]
    pub const fn checkbox_id(&self) -> &'static str {
        match self {
            Self::Sports => "hobbies-checkbox-1",
            Self::Reading => "hobbies-checkbox-2",
            Self::Music => "hobbies-checkbox-3",
        }
    }
}

impl std::fmt::Display for Hobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date of birth as the date picker sees it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateOfBirth {
    /// Day of month, 1-based
    pub day: u32,
    /// English month name
    pub month: String,
    /// Four-digit year
    pub year: i32,
}

impl DateOfBirth {
    /// Create from parts
    #[must_use]
    pub fn new(day: u32, month: impl Into<String>, year: i32) -> Self {
        Self {
            day,
            month: month.into(),
            year,
        }
    }

    /// Create from a calendar date
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: MONTH_NAMES[date.month0() as usize].to_string(),
            year: date.year(),
        }
    }

    /// Zero-based month index, as the month select expects
    pub fn month_index(&self) -> ProbeResult<u32> {
        MONTH_NAMES
            .iter()
            .position(|m| m.eq_ignore_ascii_case(&self.month))
            .map(|i| i as u32)
            .ok_or_else(|| ProbeError::invalid_data(format!("unknown month: {}", self.month)))
    }

    /// Calendar date, if the parts form a valid date
    pub fn to_date(&self) -> ProbeResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month_index()? + 1, self.day).ok_or_else(|| {
            ProbeError::invalid_data(format!(
                "invalid date: {} {} {}",
                self.day, self.month, self.year
            ))
        })
    }

    /// Whole years between this date and `reference`
    pub fn age_on(&self, reference: NaiveDate) -> ProbeResult<u32> {
        reference.years_since(self.to_date()?).ok_or_else(|| {
            ProbeError::invalid_data(format!("date of birth after {reference}"))
        })
    }

    /// Month abbreviated to three letters ("Apr")
    #[must_use]
    pub fn month_abbrev(&self) -> &str {
        self.month.get(..3).unwrap_or(&self.month)
    }
}

impl std::fmt::Display for DateOfBirth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.day, self.month, self.year)
    }
}

/// One complete set of registration form values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldSet {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email
    pub email: String,
    /// Ten-digit phone number
    pub phone: String,
    /// Gender; `None` leaves the radio group untouched
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Date of birth
    pub date_of_birth: DateOfBirth,
    /// Subjects in entry order
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Hobbies in click order
    #[serde(default)]
    pub hobbies: Vec<Hobby>,
    /// Free-text address
    pub address: String,
    /// State
    pub state: String,
    /// City within the state
    pub city: String,
}

impl FormFieldSet {
    /// The fixed John Doe record used by the reference scenario
    #[must_use]
    pub fn reference_case() -> Self {
        Self {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            phone: "1234567890".to_string(),
            gender: Some(Gender::Male),
            date_of_birth: DateOfBirth::new(20, "April", 1990),
            subjects: vec!["Maths".to_string()],
            hobbies: vec![Hobby::Sports, Hobby::Reading],
            address: "123 Test Street, Test City, 12345".to_string(),
            state: "NCR".to_string(),
            city: "Delhi".to_string(),
        }
    }

    /// "first last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check the record is internally consistent
    pub fn validate(&self) -> ProbeResult<()> {
        if self.phone.len() != 10 || !self.phone.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProbeError::invalid_data(format!(
                "phone must be 10 digits: {}",
                self.phone
            )));
        }
        let _ = self.date_of_birth.to_date()?;
        match cities_of(&self.state) {
            Some(cities) if cities.contains(&self.city.as_str()) => Ok(()),
            Some(_) => Err(ProbeError::invalid_data(format!(
                "{} is not a city of {}",
                self.city, self.state
            ))),
            None => Err(ProbeError::invalid_data(format!(
                "unknown state: {}",
                self.state
            ))),
        }
    }
}

/// Label to value data read back from the confirmation table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedDataSnapshot {
    entries: BTreeMap<String, String>,
}

impl SubmittedDataSnapshot {
    /// Parse table rows: first cell label, second cell value, both trimmed.
    ///
    /// Rows with fewer than two cells, an empty label or the `Label` header
    /// are skipped.
    #[must_use]
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let entries = rows
            .iter()
            .filter(|row| row.len() >= 2)
            .map(|row| (row[0].trim(), row[1].trim()))
            .filter(|(label, _)| !label.is_empty() && *label != "Label")
            .map(|(label, value)| (label.to_string(), value.to_string()))
            .collect();
        Self { entries }
    }

    /// Value for a label
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// Number of labels
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was read back
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate label/value pairs in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every checked field that differs from `expected`.
    ///
    /// Empty expected values are not checked. Gender is checked only when
    /// it was set and the confirmation shows a non-empty value.
    #[must_use]
    pub fn mismatches(&self, expected: &FormFieldSet) -> Vec<ProbeError> {
        let mut checks: Vec<(&str, String)> = Vec::new();
        if !expected.first_name.is_empty() && !expected.last_name.is_empty() {
            checks.push((labels::STUDENT_NAME, expected.full_name()));
        }
        if !expected.email.is_empty() {
            checks.push((labels::STUDENT_EMAIL, expected.email.clone()));
        }
        if !expected.phone.is_empty() {
            checks.push((labels::MOBILE, expected.phone.clone()));
        }
        if let Some(gender) = expected.gender {
            if self.get(labels::GENDER).is_some_and(|v| !v.is_empty()) {
                checks.push((labels::GENDER, gender.to_string()));
            }
        }
        if !expected.address.is_empty() {
            checks.push((labels::ADDRESS, expected.address.clone()));
        }

        checks
            .into_iter()
            .filter_map(|(label, want)| {
                let actual = self.get(label).unwrap_or_default();
                (actual != want).then(|| ProbeError::AssertionMismatch {
                    field: label.to_string(),
                    expected: want,
                    actual: actual.to_string(),
                })
            })
            .collect()
    }

    /// Fail with the first mismatch, if any
    pub fn verify(&self, expected: &FormFieldSet) -> ProbeResult<()> {
        match self.mismatches(expected).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
