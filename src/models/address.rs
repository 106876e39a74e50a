//! Shelley addresses and their Plutus data form.
//!
//! Byte layout: one header byte (address type in the high nibble, network id
//! in the low nibble), the 28-byte payment credential, then either nothing, a
//! 28-byte stake credential, or a pointer of three variable-length naturals.
//!
//! Plutus form (the network is not part of it and must come from the caller):
//!   Constr 0 [payment credential, Maybe staking credential]
//!     credential          = Constr 0 [key hash] | Constr 1 [script hash]
//!     staking credential  = Constr 0 [credential] | Constr 1 [slot, tx, cert]
//!     Maybe               = Constr 0 [x] (Just) | Constr 1 [] (Nothing)
use serde::{Deserialize, Serialize};

use crate::config::NetworkId;
use crate::error::{Error, Result};
use crate::plutus::{PlutusData, ToPlutusData, TryFromPData};

pub const CREDENTIAL_HASH_LEN: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Credential {
    Key(#[serde(with = "hex::serde")] Vec<u8>),
    Script(#[serde(with = "hex::serde")] Vec<u8>),
}

impl Credential {
    pub fn hash(&self) -> &[u8] {
        match self {
            Credential::Key(h) | Credential::Script(h) => h,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }
}

impl ToPlutusData for Credential {
    fn to_pd(&self) -> PlutusData {
        let alternative = if self.is_script() { 1 } else { 0 };
        PlutusData::constr(alternative, vec![PlutusData::bytes(self.hash().to_vec())])
    }
}

impl TryFromPData for Credential {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("Credential")?;
        fields.expect_len(1)?;
        let hash = fields.bytes(0)?;
        if hash.len() != CREDENTIAL_HASH_LEN {
            return Err(Error::shape(
                "Credential[0]",
                format!("{}-byte hash", CREDENTIAL_HASH_LEN),
                format!("{} bytes", hash.len()),
            ));
        }
        match alternative {
            0 => Ok(Credential::Key(hash)),
            1 => Ok(Credential::Script(hash)),
            other => Err(Error::UnknownVariant {
                kind: "Credential",
                field: String::new(),
                alternative: other,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    pub slot: u64,
    pub tx_index: u64,
    pub cert_index: u64,
}

/// Stake part of an address, also the Plutus `StakingCredential`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakeReference {
    Inline(Credential),
    Pointer(Pointer),
}

impl ToPlutusData for StakeReference {
    fn to_pd(&self) -> PlutusData {
        match self {
            StakeReference::Inline(credential) => PlutusData::constr(0, vec![credential.to_pd()]),
            StakeReference::Pointer(p) => PlutusData::constr(
                1,
                vec![
                    PlutusData::int(p.slot),
                    PlutusData::int(p.tx_index),
                    PlutusData::int(p.cert_index),
                ],
            ),
        }
    }
}

impl TryFromPData for StakeReference {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("StakingCredential")?;
        match alternative {
            0 => {
                fields.expect_len(1)?;
                Ok(StakeReference::Inline(fields.decode(0)?))
            }
            1 => {
                fields.expect_len(3)?;
                Ok(StakeReference::Pointer(Pointer {
                    slot: fields.u64(0)?,
                    tx_index: fields.u64(1)?,
                    cert_index: fields.u64(2)?,
                }))
            }
            other => Err(Error::UnknownVariant {
                kind: "StakingCredential",
                field: String::new(),
                alternative: other,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub network: NetworkId,
    pub payment: Credential,
    pub stake: Option<StakeReference>,
}

impl Address {
    pub fn new(network: NetworkId, payment: Credential, stake: Option<StakeReference>) -> Self {
        Self { network, payment, stake }
    }

    /// Address type in the high nibble of the header.
    pub fn address_type(&self) -> u8 {
        let script = self.payment.is_script() as u8;
        match &self.stake {
            Some(StakeReference::Inline(stake)) => script | ((stake.is_script() as u8) << 1),
            Some(StakeReference::Pointer(_)) => 0b0100 | script,
            None => 0b0110 | script,
        }
    }

    pub fn header(&self) -> u8 {
        self.address_type() << 4 | self.network.network_byte()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(57);
        bytes.push(self.header());
        bytes.extend_from_slice(self.payment.hash());
        match &self.stake {
            Some(StakeReference::Inline(stake)) => bytes.extend_from_slice(stake.hash()),
            Some(StakeReference::Pointer(p)) => {
                write_natural(&mut bytes, p.slot);
                write_natural(&mut bytes, p.tx_index);
                write_natural(&mut bytes, p.cert_index);
            }
            None => {}
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Address> {
        let (&header, rest) = bytes
            .split_first()
            .ok_or_else(|| Error::InvalidAddress("empty address".to_string()))?;
        let address_type = header >> 4;
        let network = NetworkId::from_network_byte(header & 0x0f).ok_or_else(|| {
            Error::InvalidAddress(format!("unknown network id {}", header & 0x0f))
        })?;
        if address_type > 0b0111 {
            return Err(Error::InvalidAddress(format!(
                "address type {} has no payment part",
                address_type
            )));
        }
        if rest.len() < CREDENTIAL_HASH_LEN {
            return Err(Error::InvalidAddress(format!("address too short: {} bytes", bytes.len())));
        }
        let (payment_hash, stake_bytes) = rest.split_at(CREDENTIAL_HASH_LEN);
        let payment = credential(address_type & 0b0001 != 0, payment_hash);

        let stake = match address_type {
            0..=3 => {
                if stake_bytes.len() != CREDENTIAL_HASH_LEN {
                    return Err(Error::InvalidAddress(format!(
                        "base address stake part must be {} bytes, got {}",
                        CREDENTIAL_HASH_LEN,
                        stake_bytes.len()
                    )));
                }
                Some(StakeReference::Inline(credential(address_type & 0b0010 != 0, stake_bytes)))
            }
            4 | 5 => {
                let mut cursor = stake_bytes;
                let pointer = Pointer {
                    slot: read_natural(&mut cursor)?,
                    tx_index: read_natural(&mut cursor)?,
                    cert_index: read_natural(&mut cursor)?,
                };
                if !cursor.is_empty() {
                    return Err(Error::InvalidAddress("trailing bytes after pointer".to_string()));
                }
                Some(StakeReference::Pointer(pointer))
            }
            _ => {
                if !stake_bytes.is_empty() {
                    return Err(Error::InvalidAddress(
                        "enterprise address with a stake part".to_string(),
                    ));
                }
                None
            }
        };

        Ok(Address { network, payment, stake })
    }

    pub fn to_bech32(&self) -> Result<String> {
        let hrp = bech32::Hrp::parse(self.network.address_hrp())
            .map_err(|e| Error::InvalidAddress(format!("bech32 HRP error: {}", e)))?;
        bech32::encode::<bech32::Bech32>(hrp, &self.to_bytes())
            .map_err(|e| Error::InvalidAddress(format!("bech32 encode error: {}", e)))
    }

    pub fn from_bech32(address: &str) -> Result<Address> {
        let (hrp, bytes) = bech32::decode(address)
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", address, e)))?;
        let parsed = Address::from_bytes(&bytes)?;
        if hrp.as_str() != parsed.network.address_hrp() {
            return Err(Error::InvalidAddress(format!(
                "prefix `{}` does not match {} header",
                hrp, parsed.network
            )));
        }
        Ok(parsed)
    }

    /// Decode the Plutus form; the network is supplied, never inferred.
    pub fn from_pd(data: &PlutusData, network: NetworkId) -> Result<Address> {
        let fields = data.record("Address")?;
        fields.expect_len(2)?;
        let payment: Credential = fields.decode(0)?;
        let stake = fields.decode_with(1, |maybe| {
            let (alternative, inner) = maybe.fields("Maybe")?;
            match alternative {
                0 => {
                    inner.expect_len(1)?;
                    Ok(Some(inner.decode::<StakeReference>(0)?))
                }
                1 => {
                    inner.expect_len(0)?;
                    Ok(None)
                }
                other => Err(Error::UnknownVariant {
                    kind: "Maybe",
                    field: String::new(),
                    alternative: other,
                }),
            }
        })?;
        Ok(Address { network, payment, stake })
    }
}

impl ToPlutusData for Address {
    fn to_pd(&self) -> PlutusData {
        let stake = match &self.stake {
            Some(reference) => PlutusData::constr(0, vec![reference.to_pd()]),
            None => PlutusData::unit(1),
        };
        PlutusData::constr(0, vec![self.payment.to_pd(), stake])
    }
}

impl std::str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::from_bech32(s)
    }
}

fn credential(script: bool, hash: &[u8]) -> Credential {
    if script {
        Credential::Script(hash.to_vec())
    } else {
        Credential::Key(hash.to_vec())
    }
}

/// Big-endian base-128, continuation bit set on every byte but the last.
fn write_natural(out: &mut Vec<u8>, mut n: u64) {
    let mut chunks = vec![(n & 0x7f) as u8];
    n >>= 7;
    while n > 0 {
        chunks.push((n & 0x7f) as u8 | 0x80);
        n >>= 7;
    }
    out.extend(chunks.iter().rev());
}

fn read_natural(cursor: &mut &[u8]) -> Result<u64> {
    let mut n: u64 = 0;
    loop {
        let (&byte, rest) = cursor
            .split_first()
            .ok_or_else(|| Error::InvalidAddress("truncated pointer".to_string()))?;
        *cursor = rest;
        if n > (u64::MAX >> 7) {
            return Err(Error::InvalidAddress("pointer component overflows".to_string()));
        }
        n = (n << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TESTNET_BASE: &str = "addr_test1qpssc0r090a9u0pyvdr9y76sm2xzx04n6d4j0y5hukcx6rxz4dtgkhfdynadkea0qezv99wljdl076xkg2krm96nn8jszmh3w7";
    const MAINNET_ORDER: &str = "addr1w8p79rpkcdz8x9d6tft0x0dx5mwuzac2sa4gm8cvkw5hcnqst2ctf";

    #[test]
    fn test_decode_base_address() {
        let address = Address::from_bech32(TESTNET_BASE).unwrap();
        assert_eq!(address.network, NetworkId::Testnet);
        assert_eq!(address.header(), 0x00);
        assert_eq!(
            hex::encode(address.payment.hash()),
            "610c3c6f2bfa5e3c246346527b50da8c233eb3d36b279297e5b06d0c"
        );
        assert_eq!(
            address.stake,
            Some(StakeReference::Inline(Credential::Key(
                hex::decode("c2ab568b5d2d24fadb67af0644c295df937eff68d642ac3d975399e5").unwrap()
            )))
        );
        assert_eq!(address.to_bech32().unwrap(), TESTNET_BASE);
    }

    #[test]
    fn test_decode_enterprise_script_address() {
        let address = Address::from_bech32(MAINNET_ORDER).unwrap();
        assert_eq!(address.header(), 0x71);
        assert_eq!(address.address_type(), 7);
        assert_eq!(
            address.payment,
            Credential::Script(
                hex::decode("c3e28c36c3447315ba5a56f33da6a6ddc1770a876a8d9f0cb3a97c4c").unwrap()
            )
        );
        assert_eq!(address.stake, None);
        assert_eq!(address.to_bech32().unwrap(), MAINNET_ORDER);
    }

    #[test]
    fn test_pointer_address_bytes() {
        let address = Address::new(
            NetworkId::Mainnet,
            Credential::Key(vec![7; 28]),
            Some(StakeReference::Pointer(Pointer { slot: 2498243, tx_index: 27, cert_index: 3 })),
        );
        let bytes = address.to_bytes();
        assert_eq!(bytes[0], 0x41);
        assert_eq!(&bytes[29..], &[0x81, 0x98, 0xbd, 0x43, 0x1b, 0x03]);
        assert_eq!(Address::from_bytes(&bytes).unwrap(), address);
    }

    #[test]
    fn test_rejects_bad_addresses() {
        assert!(Address::from_bech32("addr1qqqq").is_err());
        assert!(Address::from_bytes(&[]).is_err());
        assert!(Address::from_bytes(&[0x71, 1, 2, 3]).is_err());
        // reward address: no payment part
        let mut reward = vec![0xe1];
        reward.extend_from_slice(&[0u8; 28]);
        assert!(Address::from_bytes(&reward).is_err());
    }

    #[test]
    fn test_plutus_form() {
        let address = Address::from_bech32(TESTNET_BASE).unwrap();
        let pd = address.to_pd();
        assert_eq!(Address::from_pd(&pd, NetworkId::Testnet).unwrap(), address);

        let enterprise = Address::from_bech32(MAINNET_ORDER).unwrap();
        let pd = enterprise.to_pd();
        let hex = pd.to_cbor_hex();
        assert!(hex.starts_with("d8799fd87a9f581c"));
        assert!(hex.ends_with("ffd87a80ff"));
        assert_eq!(Address::from_pd(&pd, NetworkId::Mainnet).unwrap(), enterprise);
    }

    #[test]
    fn test_plutus_form_errors_name_the_slot() {
        let pd = PlutusData::constr(
            0,
            vec![
                PlutusData::constr(0, vec![PlutusData::bytes(vec![1, 2, 3])]),
                PlutusData::unit(1),
            ],
        );
        let err = Address::from_pd(&pd, NetworkId::Testnet).unwrap_err();
        assert_eq!(err.field(), Some("Address[0].Credential[0]"));

        let pd = PlutusData::constr(
            0,
            vec![Credential::Key(vec![1; 28]).to_pd(), PlutusData::unit(4)],
        );
        let err = Address::from_pd(&pd, NetworkId::Testnet).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { kind: "Maybe", .. }));
        assert_eq!(err.field(), Some("Address[1]"));
    }
}
