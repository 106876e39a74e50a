use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::models::Asset;

/// One entry of a UTXO value; `unit` is `lovelace` or policy id + asset name in hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit: String,
    #[serde(with = "crate::models::quantity")]
    pub quantity: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub address: String,
    pub tx_hash: String,
    pub output_index: u32,
    pub amount: Vec<Unit>,
    pub block: String,
    pub datum_hash: Option<String>,
    /// `hash` or `inline`, as reported by the indexer.
    pub datum_type: Option<String>,
    pub reference_script_hash: Option<String>,
}

impl Utxo {
    pub fn get_asset(&self, unit: &str) -> Option<&Unit> {
        self.amount.iter().find(|u| u.unit == unit)
    }

    pub fn holds(&self, asset: &Asset) -> bool {
        self.get_asset(&asset.identifier("")).is_some()
    }

    pub fn quantity_of(&self, asset: &Asset) -> BigUint {
        self.get_asset(&asset.identifier(""))
            .map(|u| u.quantity.clone())
            .unwrap_or_default()
    }

    /// `index@tx_hash`, the form the indexer uses for output references.
    pub fn out_ref(&self) -> String {
        format!("{}@{}", self.output_index, self.tx_hash)
    }
}

/// One element of a Kupo `/matches` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KupoUtxoResponse {
    pub address: String,
    #[serde(rename = "transaction_id")]
    pub tx_id: String,
    #[serde(rename = "output_index", deserialize_with = "deserialize_output_index")]
    pub output_idx: u32,
    pub value: KupoValue,
    #[serde(rename = "created_at")]
    pub created_at: KupoCreatedAt,
    #[serde(default)]
    pub datum_hash: Option<String>,
    #[serde(default)]
    pub datum_type: Option<String>,
    #[serde(default)]
    pub script_hash: Option<String>,
}

fn deserialize_output_index<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum O {
        Num(u32),
        Str(String),
    }
    match O::deserialize(deserializer)? {
        O::Num(n) => Ok(n),
        O::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KupoValue {
    #[serde(with = "crate::models::quantity")]
    pub coins: BigUint,
    #[serde(default)]
    pub assets: std::collections::BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KupoCreatedAt {
    #[serde(rename = "header_hash")]
    pub header_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KupoDatumResponse {
    pub datum: Option<String>,
}

impl TryFrom<KupoUtxoResponse> for Utxo {
    type Error = anyhow::Error;

    fn try_from(r: KupoUtxoResponse) -> anyhow::Result<Utxo> {
        let mut amount = vec![Unit {
            unit: crate::models::asset::LOVELACE.to_string(),
            quantity: r.value.coins,
        }];
        for (unit, qty) in r.value.assets {
            let quantity = match &qty {
                serde_json::Value::Number(n) => n.to_string().parse::<BigUint>()?,
                serde_json::Value::String(s) => s.parse::<BigUint>()?,
                other => anyhow::bail!("asset {} has quantity {}", unit, other),
            };
            amount.push(Unit {
                unit: unit.replace('.', ""),
                quantity,
            });
        }
        Ok(Utxo {
            address: r.address,
            tx_hash: r.tx_id,
            output_index: r.output_idx,
            amount,
            block: r.created_at.header_hash,
            datum_hash: r.datum_hash,
            datum_type: r.datum_type,
            reference_script_hash: r.script_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Quantities above u64 only survive as strings through serde_json::Value.
    const MATCH: &str = r#"{
        "transaction_index": 3,
        "transaction_id": "5ac3ae5d5b3d4a1b8d2c2ee0e2c2bd0fae8b8cd93e6a6c96cb6e5bb31d73ab0c",
        "output_index": 1,
        "address": "addr1z84q0denmyep98ph3tmzwsmw0j7zau9ljmsqx6a4rvaau66j2c79gy9l76sdg0xwhd7r0c0kna0tycz4y5s6mlenh8pq777e2a",
        "value": {
            "coins": 31571848301,
            "assets": {
                "f5808c2c990d86da54bfc97d89cee6efa20cd8461616359478d96b4c.4d5350": 1,
                "e16c2dc8ae937e8d3790c7fd7168d7b994621ba14ca11415f39fed72.4d494e": "18446744073709551616"
            }
        },
        "datum_hash": "0bc4f3d4b4dd5e1b1c2c6d4ad0d0c2c3bd5fe7a76d4ff2e7d83a3c1cfa18bd5d",
        "datum_type": "inline",
        "script_hash": null,
        "created_at": { "slot_no": 1, "header_hash": "aa" },
        "spent_at": null
    }"#;

    #[test]
    fn test_kupo_match_into_utxo() {
        let response: KupoUtxoResponse = serde_json::from_str(MATCH).unwrap();
        let utxo = Utxo::try_from(response).unwrap();
        assert_eq!(utxo.output_index, 1);
        assert_eq!(utxo.datum_type.as_deref(), Some("inline"));
        assert_eq!(utxo.quantity_of(&Asset::ada()), BigUint::from(31_571_848_301u64));

        let authen = Asset::from_identifier(
            "f5808c2c990d86da54bfc97d89cee6efa20cd8461616359478d96b4c4d5350",
        )
        .unwrap();
        assert!(utxo.holds(&authen));

        let min = Asset::from_identifier(
            "e16c2dc8ae937e8d3790c7fd7168d7b994621ba14ca11415f39fed724d494e",
        )
        .unwrap();
        assert_eq!(
            utxo.quantity_of(&min).to_string(),
            "18446744073709551616"
        );
        assert_eq!(
            utxo.out_ref(),
            "1@5ac3ae5d5b3d4a1b8d2c2ee0e2c2bd0fae8b8cd93e6a6c96cb6e5bb31d73ab0c"
        );
    }
}
