//! The variant store: a SQLite database with one row per variant.

use crate::{Error, Result};
use crate::{Frequencies, FrequencyField, Interval, VariantKey, VariantRecord};
use crate::utils;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, Row};

use log::{debug, info};


//-----------------------------------------------------------------------------

/// A handle to a variant store in a directory.
///
/// The store is a single SQLite file with table `gnomad_db`.
/// The handle only stores the location of the database.
/// Each operation opens its own connection and closes it before returning, so the handle can be shared between threads.
/// Readers do not block each other, but ingestion should be serialized by the caller.
///
/// # Examples
///
/// ```
/// use gnomad_db::{GnomadBase, VariantRecord, VariantKey, Frequencies, FrequencyField};
///
/// let dir = tempfile::tempdir().unwrap();
/// let db = GnomadBase::open_or_create(dir.path()).unwrap();
/// assert!(db.is_empty().unwrap());
///
/// let mut frequencies = Frequencies::missing();
/// frequencies.set(FrequencyField::Af, Some(0.42));
/// let record = VariantRecord::new(VariantKey::new("chr21", 9825790, "C", "T"), frequencies);
/// assert_eq!(db.upsert_batch(&[record]).unwrap(), 1);
/// assert_eq!(db.len().unwrap(), 1);
///
/// let keys = vec![VariantKey::new("21", 9825790, "C", "T"), VariantKey::new("21", 1, "A", "G")];
/// let result = db.fetch_by_keys(&keys).unwrap();
/// assert_eq!(result.len(), 2);
/// assert_eq!(result[0].get(FrequencyField::Af), Some(0.42));
/// assert!(result[1].is_missing());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GnomadBase {
    db_file: PathBuf,
}

/// Opening and creating the database.
impl GnomadBase {
    /// Name of the database file in the database directory.
    pub const DB_FILE: &'static str = "gnomad_db.sqlite3";

    /// Name of the variant table.
    pub const TABLE: &'static str = "gnomad_db";

    /// Names of all columns in the variant table in order.
    pub const COLUMNS: [&'static str; 12] = [
        "chrom", "pos", "ref", "alt",
        "AF", "AF_afr", "AF_eas", "AF_fin", "AF_nfe", "AF_asj", "AF_oth", "AF_popmax",
    ];

    /// How long a connection waits for a lock held by another process.
    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

    /// Returns the path to the database file in the given directory.
    pub fn db_file<P: AsRef<Path>>(dir: P) -> PathBuf {
        dir.as_ref().join(Self::DB_FILE)
    }

    /// Returns `true` if the directory contains a database file.
    pub fn exists<P: AsRef<Path>>(dir: P) -> bool {
        utils::file_exists(Self::db_file(dir))
    }

    /// Opens the database in the given directory, creating the directory and an empty database if necessary.
    ///
    /// An existing database is used as-is without checking or migrating the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreInit`] if the directory cannot be created or used, or if the database file cannot be opened.
    pub fn open_or_create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let store_init = |message: String| Error::StoreInit { path: dir.to_path_buf(), message };

        let db_file = Self::db_file(dir);
        if !utils::file_exists(&db_file) {
            fs::create_dir_all(dir).map_err(|x| store_init(x.to_string()))?;
            if !dir.is_dir() {
                return Err(store_init(String::from("Not a directory")));
            }
            Self::create(&db_file).map_err(|x| store_init(x.to_string()))?;
        } else {
            debug!("Opening database {}", db_file.display());
            let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            let connection = Connection::open_with_flags(&db_file, flags).map_err(|x| store_init(x.to_string()))?;
            // Opening is lazy in SQLite; reading the schema fails if the file is not a database.
            connection.query_row("SELECT COUNT(*) FROM sqlite_master", (), |row| row.get::<_, usize>(0))
                .map_err(|x| store_init(x.to_string()))?;
        }

        Ok(GnomadBase { db_file })
    }

    fn create(db_file: &Path) -> rusqlite::Result<()> {
        info!("Creating database {}", db_file.display());
        let mut connection = Connection::open(db_file)?;

        let transaction = connection.transaction()?;
        transaction.execute(
            "CREATE TABLE gnomad_db (
                chrom TEXT,
                pos INTEGER,
                ref TEXT,
                alt TEXT,
                AF REAL,
                AF_afr REAL,
                AF_eas REAL,
                AF_fin REAL,
                AF_nfe REAL,
                AF_asj REAL,
                AF_oth REAL,
                AF_popmax REAL,
                PRIMARY KEY (chrom, pos, ref, alt)
            )",
            (),
        )?;

        // Secondary index for interval queries.
        transaction.execute(
            "CREATE INDEX gnomad_db_chrom_pos_index
                ON gnomad_db(chrom, pos)",
            (),
        )?;
        transaction.commit()?;

        Ok(())
    }

    // Opens a new connection to the database.
    // The staging table for batch lookups requires write access to the temp schema.
    fn connect(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(&self.db_file, flags)?;
        connection.busy_timeout(Self::BUSY_TIMEOUT)?;
        Ok(connection)
    }

    /// Returns the path to the database file.
    pub fn filename(&self) -> &Path {
        &self.db_file
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        utils::file_size(&self.db_file)
    }

    /// Returns the number of variants in the database.
    pub fn len(&self) -> Result<usize> {
        let connection = self.connect()?;
        let count = connection.query_row(
            "SELECT COUNT(*) FROM gnomad_db",
            (),
            |row| row.get::<_, usize>(0)
        )?;
        Ok(count)
    }

    /// Returns `true` if the database contains no variants.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

//-----------------------------------------------------------------------------

/// Reading and writing variants.
impl GnomadBase {
    /// Inserts the records in a single transaction and returns the number of inserted records.
    ///
    /// If a record with the same key already exists, it is replaced.
    /// All frequency fields are overwritten, including the missing ones.
    /// If the batch contains the same key multiple times, the last record wins.
    ///
    /// The records are stored as given; see [`crate::ingest`] for validation and normalization.
    pub fn upsert_batch(&self, records: &[VariantRecord]) -> Result<usize> {
        let mut connection = self.connect()?;
        let mut inserted = 0;
        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT OR REPLACE INTO
                    gnomad_db(chrom, pos, ref, alt, AF, AF_afr, AF_eas, AF_fin, AF_nfe, AF_asj, AF_oth, AF_popmax)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            )?;
            for record in records {
                let key = &record.key;
                let af = record.frequencies.values();
                insert.execute((
                    &key.chrom, key.pos, &key.reference, &key.alternate,
                    af[0], af[1], af[2], af[3], af[4], af[5], af[6], af[7],
                ))?;
                inserted += 1;
            }
        }
        transaction.commit()?;

        debug!("Inserted {} variants into {}", inserted, self.db_file.display());
        Ok(inserted)
    }

    /// Returns the frequencies for each key in the same order as the keys.
    ///
    /// The result has one entry for each key, including duplicates.
    /// If the database does not contain a key, all frequencies for it are missing.
    /// Keys are matched exactly; chromosome names are expected to be normalized.
    ///
    /// The keys are staged in a temporary table, which is then joined with the variant table in a single query.
    pub fn fetch_by_keys(&self, keys: &[VariantKey]) -> Result<Vec<Frequencies>> {
        let mut result = vec![Frequencies::missing(); keys.len()];
        if keys.is_empty() {
            return Ok(result);
        }

        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        transaction.execute(
            "CREATE TEMP TABLE QueryKeys (
                id INTEGER PRIMARY KEY,
                chrom TEXT NOT NULL,
                pos INTEGER NOT NULL,
                ref TEXT NOT NULL,
                alt TEXT NOT NULL
            )",
            (),
        )?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO QueryKeys(id, chrom, pos, ref, alt) VALUES (?1, ?2, ?3, ?4, ?5)"
            )?;
            for (id, key) in keys.iter().enumerate() {
                insert.execute((id, &key.chrom, key.pos, &key.reference, &key.alternate))?;
            }
        }

        let mut matches = 0;
        {
            let mut select = transaction.prepare(
                "SELECT qk.id, gdb.chrom IS NOT NULL, gdb.AF, gdb.AF_afr, gdb.AF_eas, gdb.AF_fin, gdb.AF_nfe, gdb.AF_asj, gdb.AF_oth, gdb.AF_popmax
                FROM QueryKeys AS qk
                LEFT JOIN gnomad_db AS gdb
                ON qk.chrom = gdb.chrom AND qk.pos = gdb.pos AND qk.ref = gdb.ref AND qk.alt = gdb.alt"
            )?;
            let mut rows = select.query(())?;
            while let Some(row) = rows.next()? {
                let id: usize = row.get(0)?;
                let found: bool = row.get(1)?;
                if found {
                    matches += 1;
                }
                result[id] = row_to_frequencies(row, 2)?;
            }
        }
        // The staging table is connection-local; nothing is persisted.
        transaction.rollback()?;

        debug!("Fetched {} keys with {} matches", keys.len(), matches);
        Ok(result)
    }

    /// Returns all variants on the chromosome with positions in the closed interval.
    ///
    /// The variants are in the order of the (chrom, pos) index.
    /// The chromosome name is expected to be normalized.
    pub fn fetch_by_interval(&self, interval: &Interval) -> Result<Vec<VariantRecord>> {
        let mut result = Vec::new();
        if interval.is_empty() {
            return Ok(result);
        }

        let connection = self.connect()?;
        let mut select = connection.prepare(
            "SELECT chrom, pos, ref, alt, AF, AF_afr, AF_eas, AF_fin, AF_nfe, AF_asj, AF_oth, AF_popmax
            FROM gnomad_db
            WHERE chrom = ?1 AND pos >= ?2 AND pos <= ?3"
        )?;
        let mut rows = select.query((interval.chrom(), interval.start(), interval.end()))?;
        while let Some(row) = rows.next()? {
            result.push(row_to_record(row)?);
        }

        debug!("Found {} variants in {}", result.len(), interval);
        Ok(result)
    }
}

//-----------------------------------------------------------------------------

// Reads the frequency columns starting from the given column.
fn row_to_frequencies(row: &Row, first: usize) -> rusqlite::Result<Frequencies> {
    let mut frequencies = Frequencies::missing();
    for field in FrequencyField::ALL {
        frequencies.set(field, row.get(first + field.index())?);
    }
    Ok(frequencies)
}

fn row_to_record(row: &Row) -> rusqlite::Result<VariantRecord> {
    let key = VariantKey {
        chrom: row.get(0)?,
        pos: row.get(1)?,
        reference: row.get(2)?,
        alternate: row.get(3)?,
    };
    let frequencies = row_to_frequencies(row, 4)?;
    Ok(VariantRecord::new(key, frequencies))
}

//-----------------------------------------------------------------------------
