//! CBOR wire codec for Plutus data.
//!
//! Encoding goes through `ciborium-ll` so each constructor and list can be
//! written with the array form it asks for. Decoding reads a ciborium `Value`
//! and maps it back onto the Plutus shapes:
//!   - tags 121..=127 and 1280.. wrap constructor fields
//!   - tag 2 wraps a big-endian bignum
//!   - negative integers, text, floats, maps and other tags are rejected
use ciborium::value::Value;
use ciborium_ll::{Encoder, Header};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use super::{constr_alternative, constr_tag, ArrayEncoding, PlutusData};
use crate::error::{Error, Result};

const BIGNUM_TAG: u64 = 2;
/// Byte strings longer than this are chunked into an indefinite byte string.
const BYTES_CHUNK: usize = 64;

impl PlutusData {
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut encoder = Encoder::from(&mut buf);
        // Writing into a Vec<u8> cannot fail.
        let _ = write_value(&mut encoder, self);
        buf
    }

    pub fn to_cbor_hex(&self) -> String {
        hex::encode(self.to_cbor())
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<PlutusData> {
        let mut reader = bytes;
        let value: Value = ciborium::de::from_reader(&mut reader)
            .map_err(|e| Error::MalformedValue(format!("CBOR decode error: {}", e)))?;
        if !reader.is_empty() {
            return Err(Error::MalformedValue(format!(
                "{} trailing bytes after value",
                reader.len()
            )));
        }
        from_value(value)
    }

    pub fn from_cbor_hex(cbor_hex: &str) -> Result<PlutusData> {
        let bytes = hex::decode(cbor_hex.trim())
            .map_err(|e| Error::MalformedValue(format!("invalid hex: {}", e)))?;
        Self::from_cbor(&bytes)
    }
}

fn write_array(
    enc: &mut Encoder<&mut Vec<u8>>,
    items: &[PlutusData],
    encoding: ArrayEncoding,
) -> std::io::Result<()> {
    match encoding {
        ArrayEncoding::Definite => {
            enc.push(Header::Array(Some(items.len())))?;
            for item in items {
                write_value(enc, item)?;
            }
        }
        ArrayEncoding::Indefinite => {
            enc.push(Header::Array(None))?;
            for item in items {
                write_value(enc, item)?;
            }
            enc.push(Header::Break)?;
        }
    }
    Ok(())
}

fn write_value(enc: &mut Encoder<&mut Vec<u8>>, data: &PlutusData) -> std::io::Result<()> {
    match data {
        PlutusData::Constr { alternative, fields, encoding } => {
            enc.push(Header::Tag(constr_tag(*alternative)))?;
            write_array(enc, fields, *encoding)
        }
        PlutusData::List { items, encoding } => write_array(enc, items, *encoding),
        PlutusData::Int(n) => match n.to_u64() {
            Some(small) => enc.push(Header::Positive(small)),
            None => {
                enc.push(Header::Tag(BIGNUM_TAG))?;
                enc.bytes(&n.to_bytes_be(), Some(BYTES_CHUNK))
            }
        },
        PlutusData::Bytes(b) => enc.bytes(b, Some(BYTES_CHUNK)),
    }
}

/// Decoded arrays take the usual Plutus form: indefinite when non-empty.
fn decoded_encoding(items: &[PlutusData]) -> ArrayEncoding {
    if items.is_empty() {
        ArrayEncoding::Definite
    } else {
        ArrayEncoding::Indefinite
    }
}

fn from_values(values: Vec<Value>) -> Result<Vec<PlutusData>> {
    values.into_iter().map(from_value).collect()
}

fn from_value(value: Value) -> Result<PlutusData> {
    match value {
        Value::Integer(i) => {
            let n: i128 = i.into();
            if n < 0 {
                return Err(Error::MalformedValue(format!("negative integer {}", n)));
            }
            Ok(PlutusData::Int(BigUint::from(n.unsigned_abs())))
        }
        Value::Bytes(b) => Ok(PlutusData::Bytes(b)),
        Value::Array(values) => {
            let items = from_values(values)?;
            let encoding = decoded_encoding(&items);
            Ok(PlutusData::List { items, encoding })
        }
        Value::Tag(BIGNUM_TAG, inner) => match *inner {
            Value::Bytes(b) => Ok(PlutusData::Int(BigUint::from_bytes_be(&b))),
            other => Err(Error::MalformedValue(format!(
                "bignum tag must wrap bytes, found {:?}",
                other
            ))),
        },
        Value::Tag(tag, inner) => {
            let alternative = constr_alternative(tag)
                .ok_or_else(|| Error::MalformedValue(format!("unsupported tag {}", tag)))?;
            match *inner {
                Value::Array(values) => {
                    let fields = from_values(values)?;
                    let encoding = decoded_encoding(&fields);
                    Ok(PlutusData::Constr { alternative, fields, encoding })
                }
                other => Err(Error::MalformedValue(format!(
                    "constructor tag {} must wrap an array, found {:?}",
                    tag, other
                ))),
            }
        }
        other => Err(Error::MalformedValue(format!(
            "unsupported CBOR item {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_indefinite_constr_bytes() {
        assert_eq!(PlutusData::constr(0, vec![]).to_cbor_hex(), "d8799fff");
        assert_eq!(PlutusData::unit(1).to_cbor_hex(), "d87a80");
    }

    #[test]
    fn test_extended_tag_on_wire() {
        // tag 1280 = 0x0500
        let hex = PlutusData::unit(7).to_cbor_hex();
        assert_eq!(hex, "d9050080");
        assert_eq!(PlutusData::from_cbor_hex(&hex).unwrap(), PlutusData::unit(7));
    }

    #[test]
    fn test_small_and_big_integers() {
        assert_eq!(PlutusData::int(10u32).to_cbor_hex(), "0a");
        assert_eq!(PlutusData::int(u64::MAX).to_cbor_hex(), "1bffffffffffffffff");

        let big = BigUint::from(u64::MAX) + 1u32;
        let hex = PlutusData::int(big.clone()).to_cbor_hex();
        assert_eq!(hex, "c249010000000000000000");
        assert_eq!(PlutusData::from_cbor_hex(&hex).unwrap(), PlutusData::Int(big));
    }

    #[test]
    fn test_long_bytes_are_chunked() {
        let data = PlutusData::bytes(vec![0xab; 100]);
        let cbor = data.to_cbor();
        // indefinite byte string: 64 byte chunk + 36 byte chunk
        assert_eq!(cbor[0], 0x5f);
        assert_eq!(&cbor[1..3], &[0x58, 64]);
        assert_eq!(*cbor.last().unwrap(), 0xff);
        assert_eq!(PlutusData::from_cbor(&cbor).unwrap(), data);
    }

    #[test]
    fn test_decode_rejects_non_plutus_items() {
        for hex in ["20", "6161", "f4", "a0", "d866820080", "d87901"] {
            let err = PlutusData::from_cbor_hex(hex).unwrap_err();
            assert!(matches!(err, Error::MalformedValue(_)), "{} gave {:?}", hex, err);
        }
    }

    #[test]
    fn test_decode_rejects_truncated_and_trailing() {
        assert!(matches!(
            PlutusData::from_cbor_hex("d8799f01"),
            Err(Error::MalformedValue(_))
        ));
        assert!(matches!(
            PlutusData::from_cbor_hex("0101"),
            Err(Error::MalformedValue(_))
        ));
        assert!(matches!(
            PlutusData::from_cbor_hex("zz"),
            Err(Error::MalformedValue(_))
        ));
    }

    #[test]
    fn test_decoded_value_keeps_shape() {
        let value = PlutusData::from_cbor_hex("d8799f9f0102ff4201028000ff").unwrap();
        let (alternative, fields) = value.as_constr().unwrap();
        assert_eq!(alternative, 0);
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].as_list().unwrap().len(), 2);
        assert_eq!(fields[1].as_bytes().unwrap(), &[1, 2]);
        assert!(fields[2].as_list().unwrap().is_empty());
        assert_eq!(value.to_cbor_hex(), "d8799f9f0102ff4201028000ff");
    }

    fn arb_plutus() -> impl Strategy<Value = PlutusData> {
        let leaf = prop_oneof![
            any::<u64>().prop_map(PlutusData::int),
            any::<u128>().prop_map(|n| PlutusData::int(BigUint::from(n))),
            proptest::collection::vec(any::<u8>(), 0..130).prop_map(PlutusData::bytes),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                (0u64..20, proptest::collection::vec(inner.clone(), 0..6), any::<bool>()).prop_map(
                    |(alternative, fields, definite)| {
                        if definite {
                            PlutusData::constr_definite(alternative, fields)
                        } else {
                            PlutusData::constr(alternative, fields)
                        }
                    }
                ),
                proptest::collection::vec(inner, 0..6).prop_map(PlutusData::list),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_cbor_roundtrip(value in arb_plutus()) {
            let decoded = PlutusData::from_cbor(&value.to_cbor()).unwrap();
            prop_assert_eq!(decoded, value);
        }
    }
}
