use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::models::{KupoDatumResponse, KupoUtxoResponse, Utxo};

/// Where pool discovery reads chain state from.
#[async_trait]
pub trait DatumSource: Send + Sync {
    /// Unspent outputs matching a Kupo pattern (`{credential}/*`, `{policy}.{name}`, ...).
    async fn utxos_matching(&self, pattern: &str) -> Result<Vec<Utxo>>;

    async fn utxo_by_ref(&self, tx_hash: &str, output_index: u32) -> Result<Option<Utxo>>;

    /// Raw datum bytes for a datum hash, `None` when the indexer has not seen it.
    async fn datum_by_hash(&self, hash: &str) -> Result<Option<Vec<u8>>>;
}

pub struct KupoApi {
    api_url: String,
    client: reqwest::Client,
}

impl KupoApi {
    pub fn new(api_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 minutes for large queries
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(api_url, client))
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: crate::utils::remove_trailing_slash(api_url),
            client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_matches_url(&self, match_pattern: &str, unspent: bool) -> String {
        let base = format!("{}/matches/{}", self.api_url, match_pattern);
        if unspent {
            format!("{}?unspent", base)
        } else {
            base
        }
    }

    fn build_datum_url(&self, hash: &str) -> String {
        format!("{}/datums/{}", self.api_url, hash)
    }

    async fn fetch_body(&self, url: &str) -> Result<String> {
        debug!(url, "kupo request");
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow::anyhow!("rate_limited"));
        }
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }

    pub async fn get(&self, match_pattern: &str, unspent: bool) -> Result<Vec<Utxo>> {
        let url = self.build_matches_url(match_pattern, unspent);
        crate::utils::retry(10, 1000, || async {
            let body = self.fetch_body(&url).await?;
            parse_matches(&body)
        })
        .await
    }

    pub async fn datum(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        let url = self.build_datum_url(hash);
        crate::utils::retry(10, 1000, || async {
            let body = self.fetch_body(&url).await?;
            parse_datum(&body)
        })
        .await
    }
}

fn parse_matches(body: &str) -> Result<Vec<Utxo>> {
    let parsed: Vec<KupoUtxoResponse> =
        serde_json::from_str(body).context("unexpected /matches response")?;
    parsed.into_iter().map(Utxo::try_from).collect()
}

/// Kupo answers `null` for unknown hashes.
fn parse_datum(body: &str) -> Result<Option<Vec<u8>>> {
    let parsed: Option<KupoDatumResponse> =
        serde_json::from_str(body).context("unexpected /datums response")?;
    parsed
        .and_then(|r| r.datum)
        .map(|datum| hex::decode(&datum).with_context(|| format!("datum is not hex: {}", datum)))
        .transpose()
}

#[async_trait]
impl DatumSource for KupoApi {
    async fn utxos_matching(&self, pattern: &str) -> Result<Vec<Utxo>> {
        self.get(pattern, true).await
    }

    async fn utxo_by_ref(&self, tx_hash: &str, output_index: u32) -> Result<Option<Utxo>> {
        let pattern = format!("{}@{}", output_index, tx_hash);
        Ok(self.get(&pattern, true).await?.into_iter().next())
    }

    async fn datum_by_hash(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        self.datum(hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let kupo = KupoApi::new("http://localhost:1442/").unwrap();
        assert_eq!(kupo.api_url(), "http://localhost:1442");
        assert_eq!(
            kupo.build_matches_url("script1agrmwv7exgffcdu27cn5xmnuhsh0p0ukuqpkhdgm800xksw7e2w/*", true),
            "http://localhost:1442/matches/script1agrmwv7exgffcdu27cn5xmnuhsh0p0ukuqpkhdgm800xksw7e2w/*?unspent"
        );
        assert_eq!(kupo.build_matches_url("0@aa", false), "http://localhost:1442/matches/0@aa");
        assert_eq!(kupo.build_datum_url("bb"), "http://localhost:1442/datums/bb");
    }

    #[test]
    fn test_parse_datum() {
        assert_eq!(parse_datum("null").unwrap(), None);
        assert_eq!(parse_datum(r#"{"datum": "d87980"}"#).unwrap(), Some(vec![0xd8, 0x79, 0x80]));
        assert!(parse_datum(r#"{"datum": "zz"}"#).is_err());
    }

    #[test]
    fn test_parse_matches() {
        let body = r#"[{
            "transaction_id": "aa",
            "output_index": 2,
            "address": "addr_test1wrdf2f2x8pq3wwk3yv936ksmt59rz94mm66yzge8zj9pk7s0kjph3",
            "value": { "coins": "2000000", "assets": {} },
            "datum_hash": null,
            "created_at": { "slot_no": 10, "header_hash": "bb" }
        }]"#;
        let utxos = parse_matches(body).unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].out_ref(), "2@aa");
        assert_eq!(utxos[0].amount[0].quantity, num_bigint::BigUint::from(2_000_000u32));
        assert!(parse_matches(r#"{"hint": "bad pattern"}"#).is_err());
    }
}
