//! Locale-aware fake values behind a narrow interface.
//!
//! Generators only talk to [`FakeValues`]; [`LocaleFaker`] is the default
//! implementation backed by the `fake` crate and a seedable RNG.

use std::ops::{Range, RangeInclusive};

use fake::Fake;
use fake::faker::address::raw::{BuildingNumber, CityName, StreetName, ZipCode};
use fake::faker::company::raw::CompanyName;
use fake::faker::lorem::raw::{Paragraph, Sentence, Word, Words};
use fake::faker::name::raw::Name;
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::{EN, FR_FR, PT_BR};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{LogNormal, Poisson};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Locales supported by [`LocaleFaker`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "fr_FR")]
    FrFr,
    #[serde(rename = "pt_BR")]
    PtBr,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::FrFr => "fr_FR",
            Locale::PtBr => "pt_BR",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        [Locale::En, Locale::FrFr, Locale::PtBr]
            .into_iter()
            .find(|locale| locale.as_str().eq_ignore_ascii_case(name))
    }
}

/// Primitive fake values consumed by record generators.
pub trait FakeValues: Send {
    fn full_name(&mut self) -> String;

    /// An email address derived from `name`.
    fn email_for(&mut self, name: &str) -> String;

    fn street_address(&mut self) -> String;

    fn city(&mut self) -> String;

    fn postcode(&mut self) -> String;

    fn phone(&mut self) -> String;

    fn company(&mut self) -> String;

    fn word(&mut self) -> String;

    fn words(&mut self, count: Range<usize>) -> Vec<String>;

    fn sentence(&mut self, words: Range<usize>) -> String;

    fn paragraph(&mut self, sentences: Range<usize>) -> String;

    fn int_in(&mut self, range: RangeInclusive<i64>) -> i64;

    fn float_in(&mut self, range: Range<f64>) -> f64;

    /// True with the given probability, clamped to `0.0..=1.0`.
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform index below `len`. Returns 0 when `len` is 0.
    fn index(&mut self, len: usize) -> usize;

    /// Index drawn proportionally to `weights`. Returns 0 when all weights are zero.
    fn weighted_index(&mut self, weights: &[u32]) -> usize;

    /// Poisson-distributed count with the given mean.
    fn poisson(&mut self, mean: f64) -> u64;

    /// Log-normal sample with the given median and shape. Falls back to the
    /// median on invalid parameters.
    fn log_normal(&mut self, median: f64, sigma: f64) -> f64;

    /// A timestamp up to `max_days` in the past.
    fn past_datetime(&mut self, max_days: i64) -> OffsetDateTime;
}

macro_rules! localized {
    ($self:ident, $faker:ident $(, $arg:expr)*) => {
        match $self.locale {
            Locale::En => $faker(EN $(, $arg)*).fake_with_rng(&mut $self.rng),
            Locale::FrFr => $faker(FR_FR $(, $arg)*).fake_with_rng(&mut $self.rng),
            Locale::PtBr => $faker(PT_BR $(, $arg)*).fake_with_rng(&mut $self.rng),
        }
    };
}

/// [`FakeValues`] backed by the `fake` crate.
pub struct LocaleFaker {
    locale: Locale,
    rng: StdRng,
}

impl LocaleFaker {
    /// Creates a faker seeded from OS entropy.
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible faker.
    pub fn seeded(locale: Locale, seed: u64) -> Self {
        Self {
            locale,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl FakeValues for LocaleFaker {
    fn full_name(&mut self) -> String {
        localized!(self, Name)
    }

    fn email_for(&mut self, name: &str) -> String {
        let normalized: String = name
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(".");
        let local = if normalized.is_empty() {
            "user".to_string()
        } else {
            normalized
        };

        let suffix: u32 = self.rng.gen_range(1..9999);
        let domains = ["example.com", "example.org", "mail.test", "inbox.test"];
        let domain = domains[self.rng.gen_range(0..domains.len())];

        format!("{local}{suffix}@{domain}")
    }

    fn street_address(&mut self) -> String {
        let number: String = localized!(self, BuildingNumber);
        let street: String = localized!(self, StreetName);
        format!("{number} {street}")
    }

    fn city(&mut self) -> String {
        localized!(self, CityName)
    }

    fn postcode(&mut self) -> String {
        localized!(self, ZipCode)
    }

    fn phone(&mut self) -> String {
        localized!(self, PhoneNumber)
    }

    fn company(&mut self) -> String {
        localized!(self, CompanyName)
    }

    fn word(&mut self) -> String {
        localized!(self, Word)
    }

    fn words(&mut self, count: Range<usize>) -> Vec<String> {
        localized!(self, Words, count.clone())
    }

    fn sentence(&mut self, words: Range<usize>) -> String {
        localized!(self, Sentence, words.clone())
    }

    fn paragraph(&mut self, sentences: Range<usize>) -> String {
        localized!(self, Paragraph, sentences.clone())
    }

    fn int_in(&mut self, range: RangeInclusive<i64>) -> i64 {
        if range.is_empty() {
            return *range.start();
        }
        self.rng.gen_range(range)
    }

    fn float_in(&mut self, range: Range<f64>) -> f64 {
        if range.is_empty() {
            return range.start;
        }
        self.rng.gen_range(range)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    fn weighted_index(&mut self, weights: &[u32]) -> usize {
        match WeightedIndex::new(weights) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => 0,
        }
    }

    fn poisson(&mut self, mean: f64) -> u64 {
        match Poisson::new(mean) {
            Ok(dist) => {
                let sample: f64 = dist.sample(&mut self.rng);
                sample as u64
            }
            Err(_) => 0,
        }
    }

    fn log_normal(&mut self, median: f64, sigma: f64) -> f64 {
        match LogNormal::new(median.ln(), sigma) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => median,
        }
    }

    fn past_datetime(&mut self, max_days: i64) -> OffsetDateTime {
        let days = self.int_in(0..=max_days.max(0));
        let minutes = self.int_in(0..=1439);
        OffsetDateTime::now_utc() - Duration::days(days) - Duration::minutes(minutes)
    }
}

/// Explicit weights for plausible-looking categorical values.
///
/// # Example
/// ```ignore
/// const STATUS: WeightTable<CommentStatus> = WeightTable::new(&[
///     (CommentStatus::Approved, 70),
///     (CommentStatus::Pending, 20),
///     (CommentStatus::Spam, 10),
/// ]);
/// let status = STATUS.sample(faker);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WeightTable<T: 'static> {
    entries: &'static [(T, u32)],
}

impl<T: Copy + PartialEq + 'static> WeightTable<T> {
    pub const fn new(entries: &'static [(T, u32)]) -> Self {
        Self { entries }
    }

    /// Draws a value.
    ///
    /// # Panics
    /// Panics if the table is empty. Tables are static and covered by tests.
    pub fn sample(&self, faker: &mut dyn FakeValues) -> T {
        let weights: Vec<u32> = self.entries.iter().map(|(_, weight)| *weight).collect();
        let idx = faker.weighted_index(&weights);
        self.entries[idx].0
    }

    /// Expected share of `value`, between 0 and 1.
    pub fn share(&self, value: T) -> f64 {
        let total: u32 = self.entries.iter().map(|(_, weight)| weight).sum();
        if total == 0 {
            return 0.0;
        }
        let weight: u32 = self
            .entries
            .iter()
            .filter(|(entry, _)| *entry == value)
            .map(|(_, weight)| weight)
            .sum();
        f64::from(weight) / f64::from(total)
    }

    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.entries.iter().map(|(value, _)| *value)
    }
}

/// Picks a random element of a non-empty slice.
pub fn pick<'a, T>(faker: &mut dyn FakeValues, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(faker.index(items.len()))
}

/// Lowercase, dash-separated slug of `text`.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Colour {
        Red,
        Green,
        Blue,
    }

    const COLOURS: WeightTable<Colour> =
        WeightTable::new(&[(Colour::Red, 70), (Colour::Green, 20), (Colour::Blue, 10)]);

    #[test]
    fn test_weight_table_skews_toward_heavy_entries() {
        let mut faker = LocaleFaker::seeded(Locale::En, 7);
        let samples: Vec<Colour> = (0..2000).map(|_| COLOURS.sample(&mut faker)).collect();

        let red = samples.iter().filter(|c| **c == Colour::Red).count();
        let blue = samples.iter().filter(|c| **c == Colour::Blue).count();

        assert!(red > 1200 && red < 1600, "red drawn {red}/2000");
        assert!(blue > 100 && blue < 320, "blue drawn {blue}/2000");
    }

    #[test]
    fn test_weight_table_share() {
        assert!((COLOURS.share(Colour::Red) - 0.7).abs() < f64::EPSILON);
        assert_eq!(COLOURS.values().count(), 3);
    }

    #[test]
    fn test_seeded_faker_is_reproducible() {
        let mut a = LocaleFaker::seeded(Locale::En, 42);
        let mut b = LocaleFaker::seeded(Locale::En, 42);

        assert_eq!(a.full_name(), b.full_name());
        assert_eq!(a.sentence(3..6), b.sentence(3..6));
        assert_eq!(a.int_in(0..=1000), b.int_in(0..=1000));
    }

    #[test]
    fn test_email_for_name() {
        let mut faker = LocaleFaker::seeded(Locale::FrFr, 1);
        let email = faker.email_for("Ada Lovelace");
        assert!(email.starts_with("ada.lovelace"));
        assert!(email.contains('@'));

        let fallback = faker.email_for("!!!");
        assert!(fallback.starts_with("user"));
    }

    #[test]
    fn test_degenerate_inputs() {
        let mut faker = LocaleFaker::seeded(Locale::PtBr, 3);
        assert_eq!(faker.index(0), 0);
        assert_eq!(faker.weighted_index(&[0, 0]), 0);
        assert_eq!(faker.poisson(0.0), 0);
        assert!(!faker.chance(-1.0));
        assert!(faker.chance(2.0));
        assert!(pick::<u8>(&mut faker, &[]).is_none());
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!(Locale::parse("fr_fr"), Some(Locale::FrFr));
        assert_eq!(Locale::parse("en"), Some(Locale::En));
        assert_eq!(Locale::parse("xx"), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World! 2024"), "hello-world-2024");
    }
}
