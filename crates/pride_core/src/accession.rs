//! Accession minting.
//!
//! An accession is a fixed prefix followed by a zero-padded decimal number,
//! e.g. `PXF00000000001`. Numbers come from a per-type sequence and are
//! 1-based: a counter holding `n` means accessions `1..=n` have been handed
//! out.

use crate::error::{CoreError, CoreResult};
use crate::sequence::SequenceAllocator;
use crate::store::SharedStore;
use tracing::{debug, warn};

/// Prefix, digit width and backing sequence of one accession type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessionFormat {
    prefix: &'static str,
    width: usize,
    sequence: &'static str,
}

/// Archive files: `PXF` and 11 digits.
pub const FILE_ACCESSION: AccessionFormat = AccessionFormat::new("PXF", 11, "pride_files");

/// Analyses: `PXDA` and 6 digits.
pub const ANALYSIS_ACCESSION: AccessionFormat = AccessionFormat::new("PXDA", 6, "pride_analyses");

impl AccessionFormat {
    /// Declares an accession type.
    pub const fn new(prefix: &'static str, width: usize, sequence: &'static str) -> Self {
        Self {
            prefix,
            width,
            sequence,
        }
    }

    /// Alphabetic prefix.
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Number of digits after the prefix.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Name of the sequence numbers are drawn from.
    pub const fn sequence(&self) -> &'static str {
        self.sequence
    }

    /// Formats accession number `number`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AccessionOverflow`] if `number` needs more than
    /// `width` digits.
    pub fn format(&self, number: u64) -> CoreResult<String> {
        let digits = number.to_string();
        if digits.len() > self.width {
            return Err(CoreError::AccessionOverflow {
                prefix: self.prefix.to_string(),
                width: self.width,
                value: number,
            });
        }
        Ok(format!("{}{:0>width$}", self.prefix, digits, width = self.width))
    }

    /// Formats the accession for reserved sequence value `reserved`.
    fn format_reserved(&self, reserved: u64) -> CoreResult<String> {
        let number = reserved.checked_add(1).ok_or(CoreError::AccessionOverflow {
            prefix: self.prefix.to_string(),
            width: self.width,
            value: reserved,
        })?;
        self.format(number)
    }

    /// Whether `accession` has this format's shape.
    pub fn matches(&self, accession: &str) -> bool {
        accession
            .strip_prefix(self.prefix)
            .is_some_and(|digits| {
                digits.len() == self.width && digits.bytes().all(|b| b.is_ascii_digit())
            })
    }
}

/// An entity that carries an accession.
pub trait Accessioned {
    /// The accession, if one was assigned.
    fn accession(&self) -> Option<&str>;

    /// Assigns the accession.
    fn set_accession(&mut self, accession: String);

    /// Whether a non-empty accession is present.
    fn has_accession(&self) -> bool {
        self.accession().is_some_and(|accession| !accession.is_empty())
    }
}

/// Outcome of minting one entity of a batch: the entity as given, and the
/// minted copy, or `None` if it already carried an accession.
pub type MintedPair<T> = (T, Option<T>);

/// Assigns fresh accessions to new entities.
///
/// An entity that already carries an accession is never touched and no
/// sequence value is spent on it.
#[derive(Debug, Clone)]
pub struct AccessionFactory {
    allocator: SequenceAllocator,
}

impl AccessionFactory {
    /// Creates a factory drawing from `store`'s counters.
    pub fn new(store: SharedStore) -> Self {
        Self::with_allocator(SequenceAllocator::new(store))
    }

    /// Creates a factory over an existing allocator.
    pub fn with_allocator(allocator: SequenceAllocator) -> Self {
        Self { allocator }
    }

    /// The allocator numbers are reserved from.
    pub fn allocator(&self) -> &SequenceAllocator {
        &self.allocator
    }

    /// Mints one accession and assigns it to `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyAssigned`], leaving `entity` as it was,
    /// if it already has an accession. Reservation and format errors are
    /// passed through.
    pub fn mint_single<T: Accessioned>(
        &self,
        entity: &mut T,
        format: &AccessionFormat,
    ) -> CoreResult<String> {
        if let Some(existing) = entity.accession().filter(|a| !a.is_empty()) {
            warn!(accession = existing, "entity already has an accession");
            return Err(CoreError::already_assigned(existing));
        }

        let reserved = self.allocator.reserve(format.sequence(), 1)?;
        let accession = format.format_reserved(reserved)?;
        entity.set_accession(accession.clone());
        debug!(accession = %accession, "minted accession");
        Ok(accession)
    }

    /// Mints accessions for every entity that needs one, with one reservation.
    ///
    /// Results follow input order. Entities needing an accession receive
    /// ascending numbers from the reserved range in input order; entities
    /// that already have one are returned paired with `None`.
    ///
    /// # Errors
    ///
    /// Reservation and format errors fail the whole batch; no entity is
    /// assigned an accession then.
    pub fn mint_batch<T: Accessioned + Clone>(
        &self,
        entities: Vec<T>,
        format: &AccessionFormat,
    ) -> CoreResult<Vec<MintedPair<T>>> {
        let needed = entities.iter().filter(|e| !e.has_accession()).count() as u64;
        if needed == 0 {
            return Ok(entities.into_iter().map(|e| (e, None)).collect());
        }

        let start = self.allocator.reserve(format.sequence(), needed)?;
        let accessions = (start..start + needed)
            .map(|reserved| format.format_reserved(reserved))
            .collect::<CoreResult<Vec<_>>>()?;
        debug!(
            sequence = format.sequence(),
            start,
            count = needed,
            "reserved accession block"
        );

        let mut accessions = accessions.into_iter();
        let mut out = Vec::with_capacity(entities.len());
        for entity in entities {
            if entity.has_accession() {
                warn!(
                    accession = entity.accession().unwrap_or_default(),
                    "batch entity already has an accession"
                );
                out.push((entity, None));
                continue;
            }
            let minted = accessions.next().map(|accession| {
                let mut minted = entity.clone();
                minted.set_accession(accession);
                minted
            });
            out.push((entity, minted));
        }
        Ok(out)
    }
}
