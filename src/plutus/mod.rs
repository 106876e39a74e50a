//! Plutus data: the tagged value model every datum and redeemer is built from.
//!
//! A value is a constructor (alternative index + ordered fields), a list, an
//! unsigned integer or a byte string. Constructors and lists remember whether
//! they are written as definite or indefinite CBOR arrays; that choice is part
//! of the wire contract of each field but not of the value's meaning, so
//! equality ignores it.

pub mod cbor;

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::{Error, Result};

/// CBOR tag of constructor alternative 0.
pub const CONSTR_BASE_TAG: u64 = 121;
/// CBOR tag of constructor alternative 7.
pub const CONSTR_EXTENDED_TAG: u64 = 1280;
const COMPACT_ALTERNATIVES: u64 = 7;
/// Largest alternative with a tag of its own (tag `u64::MAX`). Decoding never
/// yields more.
pub const MAX_ALTERNATIVE: u64 = u64::MAX - CONSTR_EXTENDED_TAG + COMPACT_ALTERNATIVES;

/// Wire tag for a constructor alternative.
///
/// Alternatives above [`MAX_ALTERNATIVE`] cannot be written and all map to
/// tag `u64::MAX`, which reads back as `MAX_ALTERNATIVE`.
pub fn constr_tag(alternative: u64) -> u64 {
    if alternative < COMPACT_ALTERNATIVES {
        CONSTR_BASE_TAG + alternative
    } else {
        CONSTR_EXTENDED_TAG.saturating_add(alternative - COMPACT_ALTERNATIVES)
    }
}

/// Constructor alternative for a wire tag, `None` if the tag is not a constructor tag.
pub fn constr_alternative(tag: u64) -> Option<u64> {
    match tag {
        t if (CONSTR_BASE_TAG..CONSTR_BASE_TAG + COMPACT_ALTERNATIVES).contains(&t) => {
            Some(t - CONSTR_BASE_TAG)
        }
        t if t >= CONSTR_EXTENDED_TAG => Some(t - CONSTR_EXTENDED_TAG + COMPACT_ALTERNATIVES),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayEncoding {
    Definite,
    Indefinite,
}

#[derive(Debug, Clone)]
pub enum PlutusData {
    Constr {
        alternative: u64,
        fields: Vec<PlutusData>,
        encoding: ArrayEncoding,
    },
    List {
        items: Vec<PlutusData>,
        encoding: ArrayEncoding,
    },
    Int(BigUint),
    Bytes(Vec<u8>),
}

impl PartialEq for PlutusData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                PlutusData::Constr { alternative: a, fields: fa, .. },
                PlutusData::Constr { alternative: b, fields: fb, .. },
            ) => a == b && fa == fb,
            (PlutusData::List { items: a, .. }, PlutusData::List { items: b, .. }) => a == b,
            (PlutusData::Int(a), PlutusData::Int(b)) => a == b,
            (PlutusData::Bytes(a), PlutusData::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PlutusData {}

impl PlutusData {
    /// Constructor with indefinite fields.
    pub fn constr(alternative: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr {
            alternative,
            fields,
            encoding: ArrayEncoding::Indefinite,
        }
    }

    /// Constructor with definite fields.
    pub fn constr_definite(alternative: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr {
            alternative,
            fields,
            encoding: ArrayEncoding::Definite,
        }
    }

    /// Field-less constructor, written as a definite empty array.
    pub fn unit(alternative: u64) -> Self {
        Self::constr_definite(alternative, Vec::new())
    }

    pub fn list(items: Vec<PlutusData>) -> Self {
        PlutusData::List {
            items,
            encoding: ArrayEncoding::Indefinite,
        }
    }

    pub fn int(value: impl Into<BigUint>) -> Self {
        PlutusData::Int(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        PlutusData::Bytes(value.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PlutusData::Constr { .. } => "constr",
            PlutusData::List { .. } => "list",
            PlutusData::Int(_) => "int",
            PlutusData::Bytes(_) => "bytes",
        }
    }

    /// Wire tag of a constructor.
    pub fn tag(&self) -> Option<u64> {
        match self {
            PlutusData::Constr { alternative, .. } => Some(constr_tag(*alternative)),
            _ => None,
        }
    }

    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            PlutusData::Constr { alternative, fields, .. } => Some((*alternative, fields)),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PlutusData]> {
        match self {
            PlutusData::List { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigUint> {
        match self {
            PlutusData::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PlutusData::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Split a constructor into its alternative and a field cursor named `owner`.
    pub fn fields<'a>(&'a self, owner: &'static str) -> Result<(u64, Fields<'a>)> {
        match self {
            PlutusData::Constr { alternative, fields, .. } => {
                Ok((*alternative, Fields::new(owner, fields)))
            }
            other => Err(Error::shape(owner, "constr", other.kind())),
        }
    }

    /// Fields of a single-constructor type; any alternative but 0 is rejected.
    pub fn record<'a>(&'a self, owner: &'static str) -> Result<Fields<'a>> {
        match self.fields(owner)? {
            (0, fields) => Ok(fields),
            (alternative, _) => Err(Error::UnknownVariant {
                kind: owner,
                field: String::new(),
                alternative,
            }),
        }
    }
}

/// Types that encode into Plutus data.
pub trait ToPlutusData {
    fn to_pd(&self) -> PlutusData;
}

/// Types that decode from Plutus data.
pub trait TryFromPData: Sized {
    fn try_from_pd(data: &PlutusData) -> Result<Self>;
}

impl ToPlutusData for BigUint {
    fn to_pd(&self) -> PlutusData {
        PlutusData::Int(self.clone())
    }
}

impl TryFromPData for BigUint {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        data.as_int()
            .cloned()
            .ok_or_else(|| Error::shape("", "int", data.kind()))
    }
}

/// Positional reader over the fields of a constructor.
///
/// Every accessor reports failures as `Owner[index]` so that errors stay local
/// to the slot that was truncated or mutated.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    owner: &'static str,
    items: &'a [PlutusData],
}

impl<'a> Fields<'a> {
    pub fn new(owner: &'static str, items: &'a [PlutusData]) -> Self {
        Self { owner, items }
    }

    /// Same fields, reported under another owner name.
    pub fn renamed(self, owner: &'static str) -> Self {
        Self { owner, ..self }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn path(&self, index: usize) -> String {
        format!("{}[{}]", self.owner, index)
    }

    /// Fail unless exactly `arity` fields are present.
    pub fn expect_len(&self, arity: usize) -> Result<()> {
        if self.items.len() == arity {
            return Ok(());
        }
        // A missing slot is reported at its own index, a surplus at the first extra one.
        let index = self.items.len().min(arity);
        let found = if self.items.len() < arity {
            "end of fields".to_string()
        } else {
            format!("{} fields", self.items.len())
        };
        Err(Error::shape(self.path(index), format!("{} fields", arity), found))
    }

    pub fn get(&self, index: usize) -> Result<&'a PlutusData> {
        self.items
            .get(index)
            .ok_or_else(|| Error::shape(self.path(index), "field", "end of fields"))
    }

    pub fn int(&self, index: usize) -> Result<BigUint> {
        let value = self.get(index)?;
        value
            .as_int()
            .cloned()
            .ok_or_else(|| Error::shape(self.path(index), "int", value.kind()))
    }

    /// Integer slot that must fit a machine word, e.g. an asset index.
    pub fn u64(&self, index: usize) -> Result<u64> {
        let n = self.int(index)?;
        n.to_u64()
            .ok_or_else(|| Error::shape(self.path(index), "64-bit int", format!("int {}", n)))
    }

    pub fn bytes(&self, index: usize) -> Result<Vec<u8>> {
        let value = self.get(index)?;
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::shape(self.path(index), "bytes", value.kind()))
    }

    pub fn list(&self, index: usize) -> Result<&'a [PlutusData]> {
        let value = self.get(index)?;
        value
            .as_list()
            .ok_or_else(|| Error::shape(self.path(index), "list", value.kind()))
    }

    /// Decode a nested value, prefixing its errors with this slot's path.
    pub fn decode<T: TryFromPData>(&self, index: usize) -> Result<T> {
        let value = self.get(index)?;
        T::try_from_pd(value).map_err(|e| e.nested_in(&self.path(index)))
    }

    /// Decode a nested value with a caller supplied decoder.
    pub fn decode_with<T>(&self, index: usize, f: impl FnOnce(&PlutusData) -> Result<T>) -> Result<T> {
        let value = self.get(index)?;
        f(value).map_err(|e| e.nested_in(&self.path(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compact_and_extended_tags() {
        assert_eq!(constr_tag(0), 121);
        assert_eq!(constr_tag(6), 127);
        assert_eq!(constr_tag(7), 1280);
        assert_eq!(constr_tag(10), 1283);
        assert_eq!(constr_alternative(121), Some(0));
        assert_eq!(constr_alternative(1283), Some(10));
        assert_eq!(constr_alternative(128), None);
        assert_eq!(constr_alternative(2), None);

        assert_eq!(constr_tag(MAX_ALTERNATIVE), u64::MAX);
        assert_eq!(constr_alternative(u64::MAX), Some(MAX_ALTERNATIVE));
        // past the last tag the mapping is capped, not wrapped
        assert_eq!(constr_tag(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_record_requires_alternative_zero() {
        let value = PlutusData::constr(0, vec![PlutusData::int(1u32)]);
        assert_eq!(value.record("Thing").unwrap().len(), 1);
        let err = PlutusData::constr(3, vec![PlutusData::int(1u32)]).record("Thing").unwrap_err();
        assert_eq!(
            err,
            Error::UnknownVariant { kind: "Thing", field: String::new(), alternative: 3 }
        );
        assert!(PlutusData::int(1u32).record("Thing").is_err());
    }

    #[test]
    fn test_equality_ignores_array_encoding() {
        let a = PlutusData::constr(0, vec![PlutusData::int(1u32)]);
        let b = PlutusData::constr_definite(0, vec![PlutusData::int(1u32)]);
        assert_eq!(a, b);
        assert_ne!(a, PlutusData::constr(1, vec![PlutusData::int(1u32)]));
    }

    #[test]
    fn test_fields_report_position() {
        let value = PlutusData::constr(0, vec![PlutusData::int(5u32), PlutusData::bytes(vec![1])]);
        let (_, fields) = value.fields("Thing").unwrap();
        assert_eq!(fields.int(0).unwrap(), BigUint::from(5u32));
        let err = fields.int(1).unwrap_err();
        assert_eq!(err.field(), Some("Thing[1]"));
        let err = fields.bytes(2).unwrap_err();
        assert_eq!(err.field(), Some("Thing[2]"));
        let err = fields.expect_len(3).unwrap_err();
        assert_eq!(err.field(), Some("Thing[2]"));
    }

    #[test]
    fn test_fields_of_non_constr() {
        let err = PlutusData::int(3u32).fields("Thing").unwrap_err();
        assert_eq!(
            err,
            Error::shape("Thing", "constr", "int")
        );
    }

    proptest! {
        #[test]
        fn prop_tag_mapping_inverts(alternative in 0u64..10_000) {
            let tag = constr_tag(alternative);
            if alternative < 7 {
                prop_assert_eq!(tag, 121 + alternative);
            } else {
                prop_assert_eq!(tag, 1280 + alternative - 7);
            }
            prop_assert_eq!(constr_alternative(tag), Some(alternative));
        }
    }
}
