//! Batch queries for allele frequencies.
//!
//! Keyed queries ([`GnomadBase::lookup_many`], [`GnomadBase::lookup_one`]) have left-outer-join semantics:
//! every query produces exactly one row in the same position, and frequencies are missing when the variant is not in the database.
//! Interval queries ([`GnomadBase::lookup_interval`]) return one row for each stored variant in the interval.
//!
//! The output columns are chosen with a [`FieldSelector`].
//! With [`FieldSelector::All`], each row also carries the variant key.

use crate::{Error, Result};
use crate::{FieldSelector, Frequencies, FrequencyField, GnomadBase, Interval, VariantKey, VariantQuery};

use std::io::{self, Write};

use log::debug;


//-----------------------------------------------------------------------------

/// One output row of a frequency query.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyRow {
    /// Variant key, if the output includes it.
    pub key: Option<VariantKey>,
    /// Selected fields and their values.
    pub values: Vec<(FrequencyField, Option<f64>)>,
}

impl FrequencyRow {
    /// Creates a row by projecting the frequencies to the selected fields.
    pub fn project(key: &VariantKey, frequencies: &Frequencies, selector: &FieldSelector) -> Self {
        let key = if selector.includes_key() { Some(key.clone()) } else { None };
        let values = selector.fields().into_iter().map(|field| (field, frequencies.get(field))).collect();
        FrequencyRow { key, values }
    }

    /// Returns the value of the given field.
    ///
    /// Returns [`None`] if the value is missing or the field was not selected.
    pub fn get(&self, field: FrequencyField) -> Option<f64> {
        self.values.iter().find(|(f, _)| *f == field).and_then(|(_, value)| *value)
    }

    /// Returns `true` if all selected values are missing.
    pub fn is_null(&self) -> bool {
        self.values.iter().all(|(_, value)| value.is_none())
    }
}

//-----------------------------------------------------------------------------

/// The result of a frequency query: a table with the selected columns.
///
/// # Examples
///
/// ```
/// use gnomad_db::{GnomadBase, FieldSelector, FrequencyField, VariantQuery, VariantTable};
/// use gnomad_db::ingest;
///
/// let dir = tempfile::tempdir().unwrap();
/// let db = GnomadBase::open_or_create(dir.path()).unwrap();
/// let mut batch = VariantTable::with_default_columns();
/// batch.push_row(
///     ["chr21", "9825790", "C", "T", "0.42", ".", ".", ".", ".", ".", ".", "0.5"]
///         .iter().map(|x| x.to_string()).collect()
/// );
/// ingest::ingest(&db, &batch).unwrap();
///
/// let queries = vec![
///     VariantQuery::new("21", 9825790, "C", "T"),
///     VariantQuery::new("1", 21, "T", "G"),
/// ];
/// let selector: FieldSelector = "AF, AF_popmax".parse().unwrap();
/// let table = db.lookup_many(&queries, &selector).unwrap();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.column(FrequencyField::Af), vec![Some(0.42), None]);
/// assert_eq!(table.column(FrequencyField::AfPopmax), vec![Some(0.5), None]);
///
/// let mut output = Vec::new();
/// table.write_tsv(&mut output).unwrap();
/// assert_eq!(String::from_utf8(output).unwrap(), "AF\tAF_popmax\n0.42\t0.5\n.\t.\n");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyTable {
    selector: FieldSelector,
    rows: Vec<FrequencyRow>,
}

impl FrequencyTable {
    /// Creates an empty table for the given selection.
    pub fn new(selector: &FieldSelector) -> Self {
        FrequencyTable { selector: selector.clone(), rows: Vec::new() }
    }

    /// Returns the field selection.
    pub fn selector(&self) -> &FieldSelector {
        &self.selector
    }

    /// Returns the selected frequency fields in column order.
    pub fn fields(&self) -> Vec<FrequencyField> {
        self.selector.fields()
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[FrequencyRow] {
        &self.rows
    }

    /// Consumes the table and returns the rows.
    pub fn into_rows(self) -> Vec<FrequencyRow> {
        self.rows
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the values of the given field in row order.
    ///
    /// All values are missing if the field was not selected.
    pub fn column(&self, field: FrequencyField) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.get(field)).collect()
    }

    fn push(&mut self, row: FrequencyRow) {
        self.rows.push(row);
    }

    /// Writes the table in tab-separated format with a header line.
    ///
    /// Missing values are written as `.`.
    pub fn write_tsv<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let mut header: Vec<&str> = Vec::new();
        if self.selector.includes_key() {
            header.extend_from_slice(&GnomadBase::COLUMNS[0..4]);
        }
        let fields = self.fields();
        header.extend(fields.iter().map(|field| field.name()));
        writeln!(output, "{}", header.join("\t"))?;

        for row in self.rows.iter() {
            let mut cells: Vec<String> = Vec::with_capacity(header.len());
            if let Some(key) = &row.key {
                cells.push(key.chrom.clone());
                cells.push(key.pos.to_string());
                cells.push(key.reference.clone());
                cells.push(key.alternate.clone());
            }
            for (_, value) in row.values.iter() {
                match value {
                    Some(value) => cells.push(value.to_string()),
                    None => cells.push(String::from(crate::ingest::MISSING_VALUE)),
                }
            }
            writeln!(output, "{}", cells.join("\t"))?;
        }

        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// Querying allele frequencies.
impl GnomadBase {
    /// Returns the selected frequencies for each query, in the same order as the queries.
    ///
    /// The result has exactly one row for each query, including duplicates.
    /// Unmatched queries produce rows with missing values.
    /// If there are no queries, the result is empty and the database is not accessed.
    ///
    /// Passes through any database errors.
    pub fn lookup_many(&self, queries: &[VariantQuery], fields: &FieldSelector) -> Result<FrequencyTable> {
        let mut result = FrequencyTable::new(fields);
        if queries.is_empty() {
            return Ok(result);
        }

        let keys: Vec<VariantKey> = queries.iter().map(|query| query.key().clone()).collect();
        let frequencies = self.fetch_by_keys(&keys)?;
        for (key, frequencies) in keys.iter().zip(frequencies.iter()) {
            result.push(FrequencyRow::project(key, frequencies, fields));
        }

        debug!("Looked up {} variants", result.len());
        Ok(result)
    }

    /// Returns the selected frequencies for a variant given as `chrom:pos:ref>alt`.
    ///
    /// If the variant is not in the database, the values are missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the variant cannot be parsed, and passes through any database errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use gnomad_db::{GnomadBase, FieldSelector, Frequencies, FrequencyField, VariantKey, VariantRecord};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let db = GnomadBase::open_or_create(dir.path()).unwrap();
    /// let mut frequencies = Frequencies::missing();
    /// frequencies.set(FrequencyField::Af, Some(0.42));
    /// db.upsert_batch(&[VariantRecord::new(VariantKey::new("21", 9825790, "C", "T"), frequencies)]).unwrap();
    ///
    /// let selector = FieldSelector::from(FrequencyField::Af);
    /// let row = db.lookup_one("chr21:9825790:C>T", &selector).unwrap();
    /// assert_eq!(row.get(FrequencyField::Af), Some(0.42));
    /// let row = db.lookup_one("21:9825790:C>G", &selector).unwrap();
    /// assert!(row.is_null());
    /// assert!(db.lookup_one("21:9825790", &selector).is_err());
    /// ```
    pub fn lookup_one(&self, variant: &str, fields: &FieldSelector) -> Result<FrequencyRow> {
        let query = VariantQuery::parse(variant)?;
        let table = self.lookup_many(&[query], fields)?;
        // lookup_many returns one row per query, so this only fails if that invariant is broken.
        table.into_rows().pop().ok_or_else(|| {
            Error::StorageIo(format!("No result row for variant {}", variant))
        })
    }

    /// Returns the selected frequencies for all variants in the closed interval.
    ///
    /// The rows are in the order of the (chrom, pos) index.
    /// Passes through any database errors.
    pub fn lookup_interval(&self, interval: &Interval, fields: &FieldSelector) -> Result<FrequencyTable> {
        let mut result = FrequencyTable::new(fields);
        for record in self.fetch_by_interval(interval)? {
            result.push(FrequencyRow::project(&record.key, &record.frequencies, fields));
        }
        Ok(result)
    }
}

//-----------------------------------------------------------------------------
