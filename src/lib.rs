//! # minswap-kupo-rs
//!
//! Minswap V2 on Cardano: the Plutus datum codec for orders and pools, the
//! constant-product AMM math, and pool discovery over Kupo (UTXO indexer).
//!
//! | Module | Contents |
//! |--------|----------|
//! | `plutus` | Tagged Plutus data values and their CBOR encoding |
//! | `order` | Order steps, order datum, redeemers, order address |
//! | `models` | Assets, addresses, V2 and stable pool states, UTXOs |
//! | `math` | Swap amounts, zap-in split, LP minting, slippage |
//! | `config` | Per-network protocol constants |
//! | `kupo`, `dex` | Chain access and pool discovery (async) |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use minswap_kupo_rs::config::{NetworkId, V2Config};
//! use minswap_kupo_rs::dex::MinswapV2;
//! use minswap_kupo_rs::models::Asset;
//! use minswap_kupo_rs::KupoApi;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let kupo = KupoApi::new("http://localhost:1442")?;
//!     let dex = MinswapV2::new(kupo, V2Config::for_network(NetworkId::Mainnet));
//!
//!     let min = Asset::from_identifier(
//!         "29d222ce763455e3d7a09a665ce554f00ac89d2e99a1a83d267170c64d494e",
//!     )?;
//!     if let Some(pool) = dex.pool_by_pair(Asset::ada(), min).await? {
//!         println!("{}: {} / {}", pool.pair(), pool.state.reserve_a, pool.state.reserve_b);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Export all V2 pools
//! cargo run --release -- --kupo http://localhost:1442 pools
//!
//! # Quote a swap and build the order datum
//! cargo run --release -- quote lovelace 29d222ce763455e3d7a09a665ce554f00ac89d2e99a1a83d267170c64d494e 100000000 --sender addr1...
//!
//! # Decode a datum
//! cargo run --release -- decode-order d8799f...
//! ```

pub mod cache;
pub mod config;
pub mod dex;
pub mod error;
pub mod kupo;
pub mod math;
pub mod models;
pub mod order;
pub mod plutus;
pub mod utils;

pub use cache::{load_from_file, save_to_file};
pub use dex::BaseDex;
pub use error::{Error, Result};
pub use kupo::{DatumSource, KupoApi};
pub use models::{Address, Asset, StablePool, V2PoolState, Utxo};
pub use order::{OrderDatum, OrderRedeemer, Step};
pub use plutus::{PlutusData, ToPlutusData, TryFromPData};
