//! Column encodings for domain types.
//!
//! Addresses and hashes are stored as raw BLOBs; amounts as decimal TEXT.

use rusqlite::types::Type;
use rusqlite::Row;
use votemarket_types::{Address, Amount, Capability, Hash};

fn conversion_error(
    idx: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

#[derive(Debug, thiserror::Error)]
#[error("expected {expected} bytes, got {actual}")]
struct LengthMismatch {
    expected: usize,
    actual: usize,
}

fn fixed_bytes<const N: usize>(row: &Row<'_>, idx: usize) -> rusqlite::Result<[u8; N]> {
    let bytes: Vec<u8> = row.get(idx)?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| {
        conversion_error(
            idx,
            Type::Blob,
            LengthMismatch {
                expected: N,
                actual,
            },
        )
    })
}

pub(crate) fn address_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Address> {
    fixed_bytes::<20>(row, idx).map(Address)
}

pub(crate) fn hash_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Hash> {
    fixed_bytes::<32>(row, idx)
}

pub(crate) fn amount_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Amount> {
    let text: String = row.get(idx)?;
    text.parse::<Amount>()
        .map_err(|e| conversion_error(idx, Type::Text, e))
}

pub(crate) fn capability_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Capability> {
    let text: String = row.get(idx)?;
    text.parse::<Capability>()
        .map_err(|e| conversion_error(idx, Type::Text, e))
}

pub(crate) fn u32_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    let value: i64 = row.get(idx)?;
    u32::try_from(value).map_err(|e| conversion_error(idx, Type::Integer, e))
}

pub(crate) fn u64_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|e| conversion_error(idx, Type::Integer, e))
}

/// Encode a timestamp or index for an INTEGER column.
pub(crate) fn int(value: u64) -> i64 {
    value as i64
}
