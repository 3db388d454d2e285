use std::{cmp::Reverse, fmt};

use serde::{Deserialize, Serialize};

/// An FMEA rating on the conventional 1 to 10 scale.
///
/// Used for severity, frequency (occurrence) and detectability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// The lowest valid rating.
    pub const MIN: u8 = 1;
    /// The highest valid rating.
    pub const MAX: u8 = 10;

    /// Creates a rating, checking it lies within `1..=10`.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] if the value is out of range.
    pub const fn new(value: u8) -> Result<Self, RatingError> {
        if value >= Self::MIN && value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(RatingError(value))
        }
    }

    /// Creates a rating from a compiled-in literal.
    ///
    /// # Panics
    ///
    /// Panics if the value is out of range. Literal tables are authored by
    /// hand, so a bad value there is a bug rather than a runtime condition.
    #[must_use]
    pub const fn literal(value: u8) -> Self {
        assert!(
            value >= Self::MIN && value <= Self::MAX,
            "FMEA rating literal out of range"
        );
        Self(value)
    }

    /// Returns the raw rating.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a rating lies outside `1..=10`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid rating {0}: must be between 1 and 10")]
pub struct RatingError(u8);

/// One row of the FMEA worksheet.
///
/// The risk priority number is never stored; it is derived from the three
/// ratings every time it is read, so it always agrees with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FmeaRecord {
    component: String,
    function: String,
    failure_mode: String,
    effect: String,
    severity: Rating,
    frequency: Rating,
    detectability: Rating,
    recommended_action: String,
}

impl FmeaRecord {
    /// Starts building a record for the given component.
    #[must_use]
    pub fn builder(component: impl Into<String>) -> FmeaRecordBuilder {
        FmeaRecordBuilder {
            component: component.into(),
            function: String::new(),
            failure_mode: String::new(),
            effect: String::new(),
            recommended_action: String::new(),
        }
    }

    /// The component under analysis.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// What the component is for.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// How the component fails.
    #[must_use]
    pub fn failure_mode(&self) -> &str {
        &self.failure_mode
    }

    /// The consequence of the failure.
    #[must_use]
    pub fn effect(&self) -> &str {
        &self.effect
    }

    /// Severity rating.
    #[must_use]
    pub const fn severity(&self) -> Rating {
        self.severity
    }

    /// Frequency (occurrence) rating.
    #[must_use]
    pub const fn frequency(&self) -> Rating {
        self.frequency
    }

    /// Detectability rating.
    #[must_use]
    pub const fn detectability(&self) -> Rating {
        self.detectability
    }

    /// The mitigation recommended for this failure mode.
    #[must_use]
    pub fn recommended_action(&self) -> &str {
        &self.recommended_action
    }

    /// Risk priority number: severity × frequency × detectability.
    ///
    /// Always in `1..=1000`.
    #[must_use]
    pub const fn rpn(&self) -> u16 {
        self.severity.0 as u16 * self.frequency.0 as u16 * self.detectability.0 as u16
    }

    /// Sets the severity rating.
    pub const fn set_severity(&mut self, severity: Rating) {
        self.severity = severity;
    }

    /// Sets the frequency rating.
    pub const fn set_frequency(&mut self, frequency: Rating) {
        self.frequency = frequency;
    }

    /// Sets the detectability rating.
    pub const fn set_detectability(&mut self, detectability: Rating) {
        self.detectability = detectability;
    }
}

/// Builder for [`FmeaRecord`].
///
/// The ratings are supplied last, in [`FmeaRecordBuilder::rated`], so a
/// record cannot exist without them.
#[derive(Debug, Clone)]
pub struct FmeaRecordBuilder {
    component: String,
    function: String,
    failure_mode: String,
    effect: String,
    recommended_action: String,
}

impl FmeaRecordBuilder {
    /// Sets the function of the component.
    #[must_use]
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    /// Sets the failure mode.
    #[must_use]
    pub fn failure_mode(mut self, failure_mode: impl Into<String>) -> Self {
        self.failure_mode = failure_mode.into();
        self
    }

    /// Sets the effect of the failure.
    #[must_use]
    pub fn effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = effect.into();
        self
    }

    /// Sets the recommended action.
    #[must_use]
    pub fn recommended_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = action.into();
        self
    }

    /// Finishes the record with its severity, frequency and detectability.
    #[must_use]
    pub fn rated(self, severity: Rating, frequency: Rating, detectability: Rating) -> FmeaRecord {
        FmeaRecord {
            component: self.component,
            function: self.function,
            failure_mode: self.failure_mode,
            effect: self.effect,
            severity,
            frequency,
            detectability,
            recommended_action: self.recommended_action,
        }
    }
}

/// The FMEA worksheet, in the order the records were authored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FmeaTable {
    records: Vec<FmeaRecord>,
}

impl FmeaTable {
    /// Creates a table from records in authoring order.
    #[must_use]
    pub const fn new(records: Vec<FmeaRecord>) -> Self {
        Self { records }
    }

    /// Records in authoring order.
    #[must_use]
    pub fn records(&self) -> &[FmeaRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by descending RPN.
    ///
    /// The sort is stable: records with equal RPN keep their authoring order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&FmeaRecord> {
        let mut ranked: Vec<&FmeaRecord> = self.records.iter().collect();
        ranked.sort_by_key(|record| Reverse(record.rpn()));
        ranked
    }

    /// Ranked records whose RPN is strictly above `threshold`.
    #[must_use]
    pub fn above_threshold(&self, threshold: u16) -> Vec<&FmeaRecord> {
        self.ranked()
            .into_iter()
            .filter(|record| record.rpn() > threshold)
            .collect()
    }
}

impl FromIterator<FmeaRecord> for FmeaTable {
    fn from_iter<T: IntoIterator<Item = FmeaRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
