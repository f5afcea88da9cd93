//! Seeded test data.
//!
//! [`TestDataProvider`] is a pure function of an explicit seed and a
//! reference date: the same pair always yields the same [`FormFieldSet`], and
//! no generator state is shared between cases.

use crate::model::{
    DateOfBirth, FormFieldSet, Gender, Hobby, STATE_CITIES, SUBJECTS,
};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Base seed for data-driven runs
pub const DEFAULT_BASE_SEED: u64 = 123;

/// Youngest generated age in years
pub const MIN_AGE_YEARS: u32 = 18;

/// Oldest generated age in years
pub const MAX_AGE_YEARS: u32 = 65;

const FIRST_NAMES: &[&str] = &[
    "Aarav", "Alice", "Amelia", "Arjun", "Benjamin", "Chloe", "Daniel", "Diya", "Emma",
    "Ethan", "Grace", "Isha", "Jack", "Kabir", "Liam", "Maya", "Noah", "Olivia", "Priya",
    "Rohan", "Sofia", "Vihaan", "William", "Zara",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Bhatia", "Brown", "Chopra", "Clark", "Das", "Evans", "Garcia", "Gupta",
    "Harris", "Iyer", "Johnson", "Kapoor", "Lee", "Martin", "Mehta", "Nair", "Patel", "Reddy",
    "Robinson", "Sharma", "Singh", "Taylor", "Walker",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "mail.test", "inbox.test"];

const STREET_NAMES: &[&str] = &[
    "Maple", "Oak", "Cedar", "Lakeview", "Hillside", "Park", "Station", "Church", "Mill",
    "Garden", "Sunset", "Riverside",
];

const STREET_SUFFIXES: &[&str] = &["Street", "Avenue", "Road", "Lane", "Drive", "Court"];

/// Deterministic seed for reproducible data sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Seed(u64);

impl Seed {
    /// Create a seed from a u64 value
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw seed value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// xorshift64 PRNG
#[derive(Debug, Clone)]
pub(crate) struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    /// Seeds are scrambled with splitmix64 so adjacent seeds diverge at once
    pub(crate) const fn new(seed: Seed) -> Self {
        let mut z = seed.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        // Ensure non-zero state
        let state = if z == 0 { 1 } else { z };
        Self { state }
    }

    pub(crate) const fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in `[min, max)`
    pub(crate) const fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.next() % (max - min))
    }

    /// Uniform in `[min, max]`
    pub(crate) const fn next_inclusive(&mut self, min: u64, max: u64) -> u64 {
        self.next_range(min, max.saturating_add(1))
    }

    pub(crate) fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_range(0, items.len() as u64) as usize]
    }

    /// `count` distinct items, in the order they were drawn
    pub(crate) fn pick_distinct<T: Clone>(&mut self, items: &[T], count: usize) -> Vec<T> {
        let mut pool = items.to_vec();
        let count = count.min(pool.len());
        for i in 0..count {
            let j = self.next_range(i as u64, pool.len() as u64) as usize;
            pool.swap(i, j);
        }
        pool.truncate(count);
        pool
    }
}

/// Produces form records from seeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDataProvider {
    base_seed: u64,
    reference_date: NaiveDate,
}

impl TestDataProvider {
    /// Create a provider with an explicit base seed and reference date
    #[must_use]
    pub const fn new(base_seed: u64, reference_date: NaiveDate) -> Self {
        Self {
            base_seed,
            reference_date,
        }
    }

    /// Provider anchored on today's local date
    #[must_use]
    pub fn today(base_seed: u64) -> Self {
        Self::new(base_seed, chrono::Local::now().date_naive())
    }

    /// Base seed
    #[must_use]
    pub const fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Date ages are measured against
    #[must_use]
    pub const fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Generate one record from a seed
    #[must_use]
    pub fn generate(&self, seed: u64) -> FormFieldSet {
        let mut rng = Xorshift64::new(Seed::from_u64(seed));

        let first_name = (*rng.pick(FIRST_NAMES)).to_string();
        let last_name = (*rng.pick(LAST_NAMES)).to_string();
        let email = format!(
            "{}.{}{}@{}",
            first_name,
            last_name,
            rng.next_range(1, 100),
            rng.pick(EMAIL_DOMAINS)
        )
        .to_lowercase();
        let phone = (0..10)
            .map(|_| char::from(b'0' + rng.next_range(0, 10) as u8))
            .collect();
        let gender = Some(*rng.pick(&Gender::ALL));
        let date_of_birth = self.date_of_birth(&mut rng);

        let subject_count = rng.next_inclusive(1, 3) as usize;
        let subjects = rng
            .pick_distinct(&SUBJECTS, subject_count)
            .into_iter()
            .map(str::to_string)
            .collect();
        let hobby_count = rng.next_inclusive(1, 2) as usize;
        let hobbies = rng.pick_distinct(&Hobby::ALL, hobby_count);

        let address = street_address(&mut rng);
        let (state, cities) = *rng.pick(&STATE_CITIES);
        let city = *rng.pick(cities);

        FormFieldSet {
            first_name,
            last_name,
            email,
            phone,
            gender,
            date_of_birth,
            subjects,
            hobbies,
            address,
            state: state.to_string(),
            city: city.to_string(),
        }
    }

    /// Generate `count` records; entry `i` is seeded with `base_seed + i`
    #[must_use]
    pub fn generate_many(&self, count: usize) -> Vec<FormFieldSet> {
        (0..count as u64)
            .map(|i| self.generate(self.base_seed.wrapping_add(i)))
            .collect()
    }

    /// Uniform date between (reference - 65 years) and (reference - 18 years)
    fn date_of_birth(&self, rng: &mut Xorshift64) -> DateOfBirth {
        let oldest = self
            .reference_date
            .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
            .unwrap_or(NaiveDate::MIN);
        let youngest = self
            .reference_date
            .checked_sub_months(Months::new(MIN_AGE_YEARS * 12))
            .unwrap_or(oldest);
        let span = (youngest - oldest).num_days().max(0) as u64;
        let offset = rng.next_inclusive(0, span);
        let date = oldest
            .checked_add_days(chrono::Days::new(offset))
            .unwrap_or(youngest);
        DateOfBirth::from_date(date)
    }
}

impl Default for TestDataProvider {
    fn default() -> Self {
        Self::today(DEFAULT_BASE_SEED)
    }
}

fn street_address(rng: &mut Xorshift64) -> String {
    let number = rng.next_inclusive(1, 9999);
    let street = rng.pick(STREET_NAMES);
    let suffix = rng.pick(STREET_SUFFIXES);
    if rng.next_range(0, 2) == 0 {
        format!("{number} {street} {suffix}")
    } else {
        format!("{number} {street} {suffix}, Apt. {}", rng.next_inclusive(1, 999))
    }
}
