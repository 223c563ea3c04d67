use crate::{Frequencies, FrequencyField, GnomadBase, VariantKey, VariantRecord};

use tempfile::TempDir;

//-----------------------------------------------------------------------------

// Database utilities.

// The directory must outlive the database handle.
pub(crate) fn create_database() -> (TempDir, GnomadBase) {
    let dir = tempfile::tempdir();
    assert!(dir.is_ok(), "Failed to create a temporary directory: {}", dir.unwrap_err());
    let dir = dir.unwrap();
    let db = open_database(dir.path());
    (dir, db)
}

pub(crate) fn open_database(path: &std::path::Path) -> GnomadBase {
    let db = GnomadBase::open_or_create(path);
    assert!(db.is_ok(), "Failed to open database in {}: {}", path.display(), db.unwrap_err());
    db.unwrap()
}

pub(crate) fn insert_records(db: &GnomadBase, records: &[VariantRecord]) {
    let result = db.upsert_batch(records);
    assert!(result.is_ok(), "Failed to insert records: {}", result.unwrap_err());
    assert_eq!(result.unwrap(), records.len(), "Wrong number of inserted records");
}

pub(crate) fn stored_len(db: &GnomadBase) -> usize {
    let len = db.len();
    assert!(len.is_ok(), "Failed to count records: {}", len.unwrap_err());
    len.unwrap()
}

//-----------------------------------------------------------------------------

// Record utilities.

// Frequencies with AF set and the other fields derived from it.
pub(crate) fn frequencies(af: f64) -> Frequencies {
    let mut result = Frequencies::missing();
    for (i, field) in FrequencyField::ALL.iter().enumerate() {
        result.set(*field, Some(af / (i + 1) as f64));
    }
    result
}

pub(crate) fn record(chrom: &str, pos: usize, reference: &str, alternate: &str, af: f64) -> VariantRecord {
    VariantRecord::new(VariantKey::new(chrom, pos, reference, alternate), frequencies(af))
}

// The three chr21 variants used in interval tests.
pub(crate) fn chr21_records() -> Vec<VariantRecord> {
    vec![
        record("21", 9825780, "A", "G", 0.1),
        record("21", 9825790, "C", "T", 0.42),
        record("21", 9825799, "G", "GA", 0.3),
    ]
}

//-----------------------------------------------------------------------------
