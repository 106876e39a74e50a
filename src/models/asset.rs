use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::error::{Error, Result};
use crate::plutus::{PlutusData, ToPlutusData, TryFromPData};

pub const POLICY_ID_LEN: usize = 28;
pub const LOVELACE: &str = "lovelace";

/// A native asset, or ADA when both policy and name are empty.
///
/// Ordering is lexicographic on (policy, name), which puts ADA first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Asset {
    #[serde(with = "hex::serde")]
    pub policy_id: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub asset_name: Vec<u8>,
}

impl Asset {
    pub fn new(policy_id: Vec<u8>, asset_name: Vec<u8>) -> Self {
        Self { policy_id, asset_name }
    }

    pub fn ada() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn is_ada(&self) -> bool {
        self.policy_id.is_empty() && self.asset_name.is_empty()
    }

    /// Parse `lovelace`, `<policy><name>` or `<policy>.<name>` in hex.
    pub fn from_identifier(id: &str) -> Result<Asset> {
        let id = id.replace('.', "");
        if id.is_empty() || id == LOVELACE {
            return Ok(Asset::ada());
        }
        let bytes = hex::decode(&id).map_err(|e| Error::InvalidAsset(format!("{}: {}", id, e)))?;
        if bytes.len() < POLICY_ID_LEN {
            return Err(Error::InvalidAsset(format!(
                "{}: policy id must be {} bytes",
                id, POLICY_ID_LEN
            )));
        }
        let (policy, name) = bytes.split_at(POLICY_ID_LEN);
        Ok(Asset::new(policy.to_vec(), name.to_vec()))
    }

    pub fn identifier(&self, delimiter: &str) -> String {
        if self.is_ada() {
            return LOVELACE.to_string();
        }
        format!(
            "{}{}{}",
            hex::encode(&self.policy_id),
            delimiter,
            hex::encode(&self.asset_name)
        )
    }

    /// Human readable name: `ADA`, or the asset name as (lossy) UTF-8.
    pub fn ticker(&self) -> String {
        if self.is_ada() {
            "ADA".to_string()
        } else {
            String::from_utf8_lossy(&self.asset_name).to_string()
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.identifier("."))
    }
}

impl ToPlutusData for Asset {
    fn to_pd(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(self.policy_id.clone()),
                PlutusData::bytes(self.asset_name.clone()),
            ],
        )
    }
}

impl TryFromPData for Asset {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let fields = data.record("Asset")?;
        fields.expect_len(2)?;
        Ok(Asset::new(fields.bytes(0)?, fields.bytes(1)?))
    }
}

/// Order a pair the way pools store it.
pub fn normalize_pair(a: Asset, b: Asset) -> (Asset, Asset) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sha3_256(data: &[u8]) -> [u8; 32] {
    Sha3_256::digest(data).into()
}

/// LP token name of the pool for `a` and `b`, both given in pool order:
/// `sha3_256(sha3_256(a) || sha3_256(b))` over policy id and name bytes.
pub fn compute_lp_asset_name(a: &Asset, b: &Asset) -> Vec<u8> {
    let ka = sha3_256(&[a.policy_id.as_slice(), a.asset_name.as_slice()].concat());
    let kb = sha3_256(&[b.policy_id.as_slice(), b.asset_name.as_slice()].concat());
    sha3_256(&[ka, kb].concat()).to_vec()
}

/// Full LP asset of a pool under the given LP policy.
pub fn compute_lp_asset(lp_policy_id: &[u8], a: &Asset, b: &Asset) -> Asset {
    Asset::new(lp_policy_id.to_vec(), compute_lp_asset_name(a, b))
}
