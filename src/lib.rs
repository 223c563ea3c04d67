//! # gnomAD-DB: population allele frequencies in a SQLite database.
//!
//! This crate stores allele-frequency statistics for genomic variants (e.g. from gnomAD) in a single SQLite file.
//! It is intended for annotation pipelines that need fast, repeatable lookups for millions of variants
//! without parsing the original VCF distribution on every run.
//!
//! See [`GnomadBase`] for the database interface.
//! See [`VariantRecord`], [`VariantQuery`], and [`Interval`] for the related structures.
//!
//! ### Basic concepts
//!
//! Each variant is identified by a [`VariantKey`]: chromosome, 1-based position, reference allele, and alternate allele.
//! Chromosome names are stored without the `chr` prefix, and queries are normalized the same way.
//! Each variant record corresponds to a row in table `gnomad_db`, with the key as its primary key.
//! The record stores eight nullable frequencies ([`FrequencyField`]): `AF`, `AF_afr`, `AF_eas`, `AF_fin`, `AF_nfe`, `AF_asj`, `AF_oth`, and `AF_popmax`.
//! The table also has an index on (chrom, pos) for interval queries.
//!
//! ### Ingestion
//!
//! Tab-separated tables extracted from gnomAD VCF files are ingested with [`ingest::ingest_file`].
//! Batches of rows ([`VariantTable`]) are validated, normalized, and filtered by [`ingest::ingest`].
//! Records with alleles other than `A`, `C`, `G`, and `T` are dropped silently.
//! A record with an existing key replaces the old record.
//!
//! ### Queries
//!
//! [`GnomadBase::lookup_many`] returns one row for each query in the same order, with missing values for unknown variants.
//! [`GnomadBase::lookup_one`] does the same for a single variant given as `chrom:pos:ref>alt`.
//! [`GnomadBase::lookup_interval`] returns all variants in a closed interval.
//! The output columns are selected with a [`FieldSelector`].

pub mod db;
pub mod error;
pub mod ingest;
pub mod lookup;
pub mod record;
pub mod utils;

pub use db::GnomadBase;
pub use error::{Error, Result};
pub use ingest::{IngestParams, IngestStats, VariantTable};
pub use lookup::{FrequencyRow, FrequencyTable};
pub use record::{FieldSelector, Frequencies, FrequencyField, Interval, VariantKey, VariantQuery, VariantRecord};

#[cfg(test)]
pub(crate) mod internal;
