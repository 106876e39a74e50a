//! Serde form of on-chain amounts: written as decimal strings, read from a
//! string or a JSON number. Use with `#[serde(with = "crate::models::quantity")]`.
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Q {
    Str(String),
    Num(u64),
}

impl Q {
    fn into_biguint<E: serde::de::Error>(self) -> Result<BigUint, E> {
        match self {
            Q::Str(s) => s.parse().map_err(E::custom),
            Q::Num(n) => Ok(BigUint::from(n)),
        }
    }
}

pub fn serialize<S: Serializer>(value: &BigUint, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
    Q::deserialize(d)?.into_biguint()
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<BigUint>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(n) => s.serialize_some(&n.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BigUint>, D::Error> {
        Option::<Q>::deserialize(d)?.map(Q::into_biguint).transpose()
    }
}

pub mod vec {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(values: &[BigUint], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(values.len()))?;
        for n in values {
            seq.serialize_element(&n.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<BigUint>, D::Error> {
        Vec::<Q>::deserialize(d)?.into_iter().map(Q::into_biguint).collect()
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Amounts {
        #[serde(with = "crate::models::quantity")]
        single: BigUint,
        #[serde(with = "crate::models::quantity::option")]
        maybe: Option<BigUint>,
        #[serde(with = "crate::models::quantity::vec")]
        many: Vec<BigUint>,
    }

    #[test]
    fn test_amounts_are_decimal_strings() {
        let amounts = Amounts {
            single: BigUint::from(1_000_000_000_000u64),
            maybe: None,
            many: vec![BigUint::from(1u32), BigUint::parse_bytes(b"340282366920938463463374607431768211456", 10).unwrap()],
        };
        let json = serde_json::to_string(&amounts).unwrap();
        assert_eq!(
            json,
            r#"{"single":"1000000000000","maybe":null,"many":["1","340282366920938463463374607431768211456"]}"#
        );
        assert_eq!(serde_json::from_str::<Amounts>(&json).unwrap(), amounts);

        let numbers: Amounts = serde_json::from_str(r#"{"single":5,"maybe":7,"many":[1,"2"]}"#).unwrap();
        assert_eq!(numbers.maybe, Some(BigUint::from(7u32)));
        assert_eq!(numbers.many[1], BigUint::from(2u32));
        assert!(serde_json::from_str::<Amounts>(r#"{"single":"1.5","maybe":null,"many":[]}"#).is_err());
    }
}
