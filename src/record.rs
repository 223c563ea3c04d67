//! Variant keys, frequency records, and query types.
//!
//! Every stored record is identified by a [`VariantKey`]: chromosome, 1-based position, reference allele, and alternate allele.
//! Chromosome names are stored without the `chr` prefix, and both ingested records and queries are normalized with [`normalize_chrom`].
//! The frequency statistics are stored in [`Frequencies`], which has one nullable value for each [`FrequencyField`].

use crate::{Error, Result};

use std::fmt::Display;
use std::str::FromStr;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Strips a literal `chr` prefix from a chromosome name.
///
/// Only a prefix is removed: `chr21` becomes `21`, while `21` is unchanged.
pub fn normalize_chrom(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

/// Returns `true` if the allele is non-empty and consists only of `A`, `C`, `G`, and `T`.
///
/// The check is case-sensitive.
pub fn is_valid_allele(allele: &str) -> bool {
    !allele.is_empty() && allele.bytes().all(|c| matches!(c, b'A' | b'C' | b'G' | b'T'))
}

//-----------------------------------------------------------------------------

/// A population allele-frequency column.
///
/// The variants are listed in the column order of the database table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrequencyField {
    /// Overall allele frequency.
    Af,
    /// African / African American.
    AfAfr,
    /// East Asian.
    AfEas,
    /// Finnish.
    AfFin,
    /// Non-Finnish European.
    AfNfe,
    /// Ashkenazi Jewish.
    AfAsj,
    /// Other populations.
    AfOth,
    /// Maximum over the populations.
    AfPopmax,
}

impl FrequencyField {
    /// Number of frequency fields.
    pub const COUNT: usize = 8;

    /// All frequency fields in column order.
    pub const ALL: [FrequencyField; Self::COUNT] = [
        FrequencyField::Af,
        FrequencyField::AfAfr,
        FrequencyField::AfEas,
        FrequencyField::AfFin,
        FrequencyField::AfNfe,
        FrequencyField::AfAsj,
        FrequencyField::AfOth,
        FrequencyField::AfPopmax,
    ];

    /// Returns the column name of the field.
    pub fn name(self) -> &'static str {
        match self {
            FrequencyField::Af => "AF",
            FrequencyField::AfAfr => "AF_afr",
            FrequencyField::AfEas => "AF_eas",
            FrequencyField::AfFin => "AF_fin",
            FrequencyField::AfNfe => "AF_nfe",
            FrequencyField::AfAsj => "AF_asj",
            FrequencyField::AfOth => "AF_oth",
            FrequencyField::AfPopmax => "AF_popmax",
        }
    }

    /// Returns the offset of the field in column order.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the field with the given column name, or [`None`] if there is no such field.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.name() == name)
    }
}

impl Display for FrequencyField {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

//-----------------------------------------------------------------------------

/// Selection of frequency fields for query output.
///
/// This replaces free-form projection strings: the selection can only name the frequency columns.
///
/// # Examples
///
/// ```
/// use gnomad_db::{FieldSelector, FrequencyField};
///
/// let all: FieldSelector = "*".parse().unwrap();
/// assert_eq!(all, FieldSelector::All);
/// assert!(all.includes_key());
///
/// let some: FieldSelector = "AF, AF_popmax".parse().unwrap();
/// assert_eq!(some.fields(), vec![FrequencyField::Af, FrequencyField::AfPopmax]);
/// assert!(!some.includes_key());
///
/// assert!("AF; DROP TABLE gnomad_db".parse::<FieldSelector>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSelector {
    /// All frequency fields together with the variant key.
    All,
    /// The listed frequency fields in the given order.
    Fields(Vec<FrequencyField>),
}

impl FieldSelector {
    /// Returns the selected frequency fields.
    pub fn fields(&self) -> Vec<FrequencyField> {
        match self {
            FieldSelector::All => FrequencyField::ALL.to_vec(),
            FieldSelector::Fields(fields) => fields.clone(),
        }
    }

    /// Returns `true` if the output should include the variant key columns.
    pub fn includes_key(&self) -> bool {
        matches!(self, FieldSelector::All)
    }
}

impl Default for FieldSelector {
    fn default() -> Self {
        FieldSelector::Fields(vec![FrequencyField::Af])
    }
}

impl From<FrequencyField> for FieldSelector {
    fn from(field: FrequencyField) -> Self {
        FieldSelector::Fields(vec![field])
    }
}

impl FromStr for FieldSelector {
    type Err = Error;

    /// Parses `*` or a comma-separated list of frequency column names.
    fn from_str(s: &str) -> Result<Self> {
        if s.trim() == "*" {
            return Ok(FieldSelector::All);
        }
        let mut fields = Vec::new();
        for name in s.split(',') {
            let name = name.trim();
            let field = FrequencyField::from_name(name).ok_or_else(|| {
                Error::Parse(format!("Unknown frequency field '{}' in '{}'", name, s))
            })?;
            fields.push(field);
        }
        Ok(FieldSelector::Fields(fields))
    }
}

//-----------------------------------------------------------------------------

/// Nullable allele frequencies for a single variant, indexed by [`FrequencyField`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frequencies {
    values: [Option<f64>; FrequencyField::COUNT],
}

impl Frequencies {
    /// Returns frequencies with every field missing.
    pub fn missing() -> Self {
        Self::default()
    }

    /// Creates frequencies from values in column order.
    pub fn new(values: [Option<f64>; FrequencyField::COUNT]) -> Self {
        Frequencies { values }
    }

    /// Returns the value of the given field.
    #[inline]
    pub fn get(&self, field: FrequencyField) -> Option<f64> {
        self.values[field.index()]
    }

    /// Sets the value of the given field.
    #[inline]
    pub fn set(&mut self, field: FrequencyField, value: Option<f64>) {
        self.values[field.index()] = value;
    }

    /// Returns `true` if every field is missing.
    pub fn is_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Option<f64>; FrequencyField::COUNT] {
        &self.values
    }
}

//-----------------------------------------------------------------------------

/// The identity of a variant: chromosome, 1-based position, reference allele, and alternate allele.
///
/// Keys stored in the database and keys used in queries have normalized chromosome names.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantKey {
    /// Chromosome name without the `chr` prefix.
    pub chrom: String,
    /// 1-based position.
    pub pos: usize,
    /// Reference allele.
    pub reference: String,
    /// Alternate allele.
    pub alternate: String,
}

impl VariantKey {
    /// Creates a new key with a normalized chromosome name.
    pub fn new(chrom: &str, pos: usize, reference: &str, alternate: &str) -> Self {
        VariantKey {
            chrom: normalize_chrom(chrom).to_string(),
            pos,
            reference: reference.to_string(),
            alternate: alternate.to_string(),
        }
    }

    /// Strips the `chr` prefix from the chromosome name in place.
    pub fn normalize(&mut self) {
        if let Some(stripped) = self.chrom.strip_prefix("chr") {
            self.chrom = stripped.to_string();
        }
    }

    /// Returns `true` if both alleles pass [`is_valid_allele`].
    pub fn has_valid_alleles(&self) -> bool {
        is_valid_allele(&self.reference) && is_valid_allele(&self.alternate)
    }
}

impl Display for VariantKey {
    /// Formats the key as `chrom:pos:ref>alt`.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}:{}>{}", self.chrom, self.pos, self.reference, self.alternate)
    }
}

//-----------------------------------------------------------------------------

/// A variant together with its population allele frequencies.
///
/// The record corresponds to one row in table `gnomad_db`.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantRecord {
    /// Variant identity.
    pub key: VariantKey,
    /// Allele frequencies.
    pub frequencies: Frequencies,
}

impl VariantRecord {
    /// Creates a new record.
    pub fn new(key: VariantKey, frequencies: Frequencies) -> Self {
        VariantRecord { key, frequencies }
    }
}

//-----------------------------------------------------------------------------

/// A variant used only as a lookup key.
///
/// The variant does not need to exist in the database.
/// The chromosome name is normalized on construction.
///
/// # Examples
///
/// ```
/// use gnomad_db::VariantQuery;
///
/// let query: VariantQuery = "chr21:9825790:C>T".parse().unwrap();
/// assert_eq!(query.key().chrom, "21");
/// assert_eq!(query.key().pos, 9825790);
/// assert_eq!(query.to_string(), "21:9825790:C>T");
///
/// assert!("21:9825790:C".parse::<VariantQuery>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariantQuery {
    key: VariantKey,
}

impl VariantQuery {
    /// Creates a query from its parts.
    pub fn new(chrom: &str, pos: usize, reference: &str, alternate: &str) -> Self {
        VariantQuery { key: VariantKey::new(chrom, pos, reference, alternate) }
    }

    /// Parses a query of the form `chrom:pos:ref>alt`.
    ///
    /// Returns an error unless the string has exactly three colon-separated fields, a numeric position, and exactly two non-empty `>`-separated alleles.
    pub fn parse(variant: &str) -> Result<Self> {
        let fields: Vec<&str> = variant.split(':').collect();
        if fields.len() != 3 {
            return Err(Error::Parse(format!("Expected chrom:pos:ref>alt, got '{}'", variant)));
        }
        let chrom = fields[0];
        if normalize_chrom(chrom).is_empty() {
            return Err(Error::Parse(format!("Missing chromosome in '{}'", variant)));
        }
        let pos = fields[1].parse::<usize>().map_err(|err| {
            Error::Parse(format!("Invalid position '{}' in '{}': {}", fields[1], variant, err))
        })?;
        let alleles: Vec<&str> = fields[2].split('>').collect();
        if alleles.len() != 2 || alleles[0].is_empty() || alleles[1].is_empty() {
            return Err(Error::Parse(format!("Expected ref>alt alleles, got '{}' in '{}'", fields[2], variant)));
        }
        Ok(Self::new(chrom, pos, alleles[0], alleles[1]))
    }

    /// Returns the normalized key.
    #[inline]
    pub fn key(&self) -> &VariantKey {
        &self.key
    }

    /// Consumes the query and returns the normalized key.
    pub fn into_key(self) -> VariantKey {
        self.key
    }
}

/// Uses the key as is. Keys built with [`VariantKey::new`] are already normalized.
impl From<VariantKey> for VariantQuery {
    fn from(key: VariantKey) -> Self {
        VariantQuery { key }
    }
}

impl FromStr for VariantQuery {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for VariantQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.key.fmt(f)
    }
}

//-----------------------------------------------------------------------------

/// A closed interval `start..=end` of positions on a chromosome.
///
/// An interval with `start > end` contains no positions.
/// The chromosome name is normalized on construction and cannot be changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Interval {
    chrom: String,
    start: usize,
    end: usize,
}

impl Interval {
    /// Creates an interval with a normalized chromosome name.
    pub fn new(chrom: &str, start: usize, end: usize) -> Self {
        Interval { chrom: normalize_chrom(chrom).to_string(), start, end }
    }

    /// Parses an interval of the form `chrom:start-end`.
    pub fn parse(interval: &str) -> Result<Self> {
        let (chrom, range) = interval.rsplit_once(':').ok_or_else(|| {
            Error::Parse(format!("Expected chrom:start-end, got '{}'", interval))
        })?;
        let (start, end) = range.split_once('-').ok_or_else(|| {
            Error::Parse(format!("Expected start-end, got '{}' in '{}'", range, interval))
        })?;
        let start = start.parse::<usize>().map_err(|err| {
            Error::Parse(format!("Invalid start '{}' in '{}': {}", start, interval, err))
        })?;
        let end = end.parse::<usize>().map_err(|err| {
            Error::Parse(format!("Invalid end '{}' in '{}': {}", end, interval, err))
        })?;
        Ok(Self::new(chrom, start, end))
    }

    /// Returns the chromosome name without the `chr` prefix.
    #[inline]
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Returns the first position in the interval.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the last position in the interval.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns `true` if the interval contains no positions.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Returns `true` if the key is on the same chromosome and within the interval.
    pub fn contains(&self, key: &VariantKey) -> bool {
        key.chrom == self.chrom && self.start <= key.pos && key.pos <= self.end
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

//-----------------------------------------------------------------------------
