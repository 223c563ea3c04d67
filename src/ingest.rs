//! Ingestion of tabular allele-frequency data.
//!
//! The input is produced by an external extraction step, typically
//!
//! ```text
//! bcftools query -f '%CHROM\t%POS\t%REF\t%ALT\t%AF\t%AF_afr\t%AF_eas\t%AF_fin\t%AF_nfe\t%AF_asj\t%AF_oth\t%AF_popmax\n' gnomad.vcf.bgz | gzip > table.tsv.gz
//! ```
//!
//! A batch of such rows is a [`VariantTable`]: named columns and rows of string cells, with [`MISSING_VALUE`] marking missing values.
//! [`ingest`] runs the pipeline for a single batch:
//!
//! 1. [`validate_schema`]: the batch must have exactly the 12 expected columns in any order.
//! 2. [`to_records`]: cells are parsed into [`VariantRecord`]s.
//! 3. [`sanitize`]: the `chr` prefix is removed from chromosome names.
//! 4. [`filter_valid_alleles`]: records with alleles outside `ACGT` are dropped without an error.
//!    Multi-allelic sites (`A,T`), symbolic alleles (`<DEL>`), and `N` are not modelled by the store.
//! 5. [`GnomadBase::upsert_batch`]: the records are inserted, replacing existing records with the same key.
//!
//! Files are ingested with [`ingest_file`], which reads the file in batches of [`IngestParams::batch_size`] rows.

use crate::{Error, Result};
use crate::{Frequencies, FrequencyField, GnomadBase, VariantKey, VariantRecord};
use crate::utils;

use std::io::BufRead;
use std::ops::AddAssign;
use std::path::Path;

use log::{debug, info};


//-----------------------------------------------------------------------------

/// Cell value for a missing frequency in the input.
///
/// Empty cells are also treated as missing.
pub const MISSING_VALUE: &str = ".";

/// A batch of raw input rows with named columns.
///
/// Rows are not checked when they are added; see [`validate_schema`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariantTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl VariantTable {
    /// Creates an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        VariantTable { columns, rows: Vec::new() }
    }

    /// Creates an empty table with the database columns in canonical order.
    pub fn with_default_columns() -> Self {
        Self::new(GnomadBase::COLUMNS.iter().map(|x| x.to_string()).collect())
    }

    /// Appends a row.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

//-----------------------------------------------------------------------------

/// Positions of the expected columns in a [`VariantTable`].
///
/// Created by [`validate_schema`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnMap {
    // Indexed by the position in `GnomadBase::COLUMNS`.
    indexes: [usize; 12],
}

impl ColumnMap {
    const CHROM: usize = 0;
    const POS: usize = 1;
    const REF: usize = 2;
    const ALT: usize = 3;
    const FIRST_FREQUENCY: usize = 4;
}

/// Checks that the batch has exactly the expected columns and that every row has a cell for each column.
///
/// Column order does not matter.
///
/// # Errors
///
/// Returns [`Error::Schema`] if a column is missing, unknown, or duplicated, or if a row has the wrong number of cells.
pub fn validate_schema(batch: &VariantTable) -> Result<ColumnMap> {
    let mut indexes: [Option<usize>; 12] = [None; 12];
    for (index, name) in batch.columns().iter().enumerate() {
        let offset = GnomadBase::COLUMNS.iter().position(|x| *x == name.as_str()).ok_or_else(|| {
            Error::Schema(format!("Unexpected column {}; expected columns: {}", name, GnomadBase::COLUMNS.join(", ")))
        })?;
        if indexes[offset].is_some() {
            return Err(Error::Schema(format!("Duplicate column {}", name)));
        }
        indexes[offset] = Some(index);
    }

    let missing: Vec<&str> = GnomadBase::COLUMNS.iter().zip(indexes.iter())
        .filter(|(_, index)| index.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(Error::Schema(format!("Missing columns: {}", missing.join(", "))));
    }

    for (row_num, row) in batch.rows().iter().enumerate() {
        if row.len() != batch.columns().len() {
            return Err(Error::Schema(format!(
                "Row {} has {} cells; expected {}", row_num + 1, row.len(), batch.columns().len()
            )));
        }
    }

    let mut result = ColumnMap { indexes: [0; 12] };
    for (offset, index) in indexes.iter().enumerate() {
        result.indexes[offset] = index.unwrap_or_default();
    }
    Ok(result)
}

//-----------------------------------------------------------------------------

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell == MISSING_VALUE
}

fn parse_frequency(cell: &str, row_num: usize, field: FrequencyField) -> Result<Option<f64>> {
    if is_missing(cell) {
        return Ok(None);
    }
    let value = cell.parse::<f64>().map_err(|err| {
        Error::Parse(format!("Invalid {} value '{}' on row {}: {}", field, cell, row_num, err))
    })?;
    // Upstream tables sometimes encode missing values as NaN.
    if value.is_nan() {
        return Ok(None);
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::Parse(format!("{} value '{}' on row {} is not in [0, 1]", field, cell, row_num)));
    }
    Ok(Some(value))
}

/// Converts the rows of a validated batch into records.
///
/// Missing frequencies become [`None`].
/// The records are not sanitized or filtered.
///
/// # Errors
///
/// Returns [`Error::Parse`] if a position is not a non-negative integer or a frequency is not a number in [0, 1].
pub fn to_records(batch: &VariantTable, columns: &ColumnMap) -> Result<Vec<VariantRecord>> {
    let mut result = Vec::with_capacity(batch.len());
    for (row_num, row) in batch.rows().iter().enumerate() {
        let row_num = row_num + 1;
        let pos_cell = &row[columns.indexes[ColumnMap::POS]];
        let pos = pos_cell.parse::<usize>().map_err(|err| {
            Error::Parse(format!("Invalid position '{}' on row {}: {}", pos_cell, row_num, err))
        })?;
        let key = VariantKey {
            chrom: row[columns.indexes[ColumnMap::CHROM]].clone(),
            pos,
            reference: row[columns.indexes[ColumnMap::REF]].clone(),
            alternate: row[columns.indexes[ColumnMap::ALT]].clone(),
        };
        let mut frequencies = Frequencies::missing();
        for field in FrequencyField::ALL {
            let cell = &row[columns.indexes[ColumnMap::FIRST_FREQUENCY + field.index()]];
            frequencies.set(field, parse_frequency(cell, row_num, field)?);
        }
        result.push(VariantRecord::new(key, frequencies));
    }
    Ok(result)
}

/// Removes the `chr` prefix from the chromosome names.
///
/// See [`crate::record::normalize_chrom`].
pub fn sanitize(records: &mut [VariantRecord]) {
    for record in records.iter_mut() {
        record.key.normalize();
    }
}

/// Drops records with an empty allele or an allele containing characters other than `A`, `C`, `G`, and `T`.
///
/// Dropping a record is not an error.
/// Returns the number of dropped records.
pub fn filter_valid_alleles(records: &mut Vec<VariantRecord>) -> usize {
    let before = records.len();
    records.retain(|record| record.key.has_valid_alleles());
    before - records.len()
}

//-----------------------------------------------------------------------------

/// Statistics for ingested rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Number of input rows.
    pub rows: usize,
    /// Number of records written to the database.
    pub inserted: usize,
    /// Number of rows dropped because of invalid alleles.
    pub dropped: usize,
}

impl AddAssign for IngestStats {
    fn add_assign(&mut self, other: Self) {
        self.rows += other.rows;
        self.inserted += other.inserted;
        self.dropped += other.dropped;
    }
}

/// Validates, sanitizes, and filters the batch, and inserts the remaining records into the database.
///
/// Records replace existing records with the same key.
/// Nothing is inserted if the batch fails validation or parsing.
///
/// # Errors
///
/// Returns [`Error::Schema`] or [`Error::Parse`] for invalid input and passes through database errors.
pub fn ingest(db: &GnomadBase, batch: &VariantTable) -> Result<IngestStats> {
    let columns = validate_schema(batch)?;
    let mut records = to_records(batch, &columns)?;
    sanitize(&mut records);
    let dropped = filter_valid_alleles(&mut records);
    if dropped > 0 {
        debug!("Dropped {} of {} rows with unsupported alleles", dropped, batch.len());
    }
    let inserted = if records.is_empty() { 0 } else { db.upsert_batch(&records)? };
    Ok(IngestStats { rows: batch.len(), inserted, dropped })
}

//-----------------------------------------------------------------------------

/// Parameters for [`ingest_file`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestParams {
    /// Number of rows inserted in a single transaction.
    pub batch_size: usize,
}

impl IngestParams {
    /// Default batch size in rows.
    pub const BATCH_SIZE: usize = 100_000;
}

impl Default for IngestParams {
    fn default() -> Self {
        Self {
            batch_size: Self::BATCH_SIZE,
        }
    }
}

/// Reads up to `max_rows` rows from a headerless tab-separated table.
///
/// The columns are expected in the order of [`GnomadBase::COLUMNS`].
/// Empty lines and lines starting with `#` are skipped.
/// Returns [`None`] if there are no more rows.
/// Rows with the wrong number of fields are returned as they are and rejected by [`validate_schema`].
pub fn read_tsv<R: BufRead>(reader: &mut R, max_rows: usize) -> Result<Option<VariantTable>> {
    let mut table = VariantTable::with_default_columns();
    let mut buf = String::new();
    while table.len() < max_rows.max(1) {
        buf.clear();
        let len = reader.read_line(&mut buf)?;
        if len == 0 {
            break;
        }
        let line = buf.trim_end_matches(&['\n', '\r'][..]);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        table.push_row(line.split('\t').map(String::from).collect());
    }

    if table.is_empty() { Ok(None) } else { Ok(Some(table)) }
}

/// Ingests a tab-separated table file into the database.
///
/// The file may be gzip-compressed.
/// The rows are read and inserted in batches of `params.batch_size` rows.
/// If a batch fails, the earlier batches remain in the database.
///
/// # Errors
///
/// Returns [`Error::StorageIo`] if the file cannot be read, and passes through errors from [`ingest`].
pub fn ingest_file<P: AsRef<Path>>(db: &GnomadBase, filename: P, params: &IngestParams) -> Result<IngestStats> {
    let filename = filename.as_ref();
    info!("Ingesting {}", filename.display());
    let mut reader = utils::open_file(filename).map_err(|x| {
        Error::StorageIo(format!("Cannot open {}: {}", filename.display(), x))
    })?;

    let mut statistics = IngestStats::default();
    while let Some(batch) = read_tsv(&mut reader, params.batch_size)? {
        let batch_stats = ingest(db, &batch).map_err(|err| match err {
            Error::Schema(message) => Error::Schema(format!("{} (batch after row {} of {})", message, statistics.rows, filename.display())),
            Error::Parse(message) => Error::Parse(format!("{} (batch after row {} of {})", message, statistics.rows, filename.display())),
            err => err,
        })?;
        statistics += batch_stats;
        debug!("Processed {} rows from {}", statistics.rows, filename.display());
    }

    info!(
        "Inserted {} of {} rows from {} ({} dropped)",
        statistics.inserted, statistics.rows, filename.display(), statistics.dropped
    );
    Ok(statistics)
}

//-----------------------------------------------------------------------------
