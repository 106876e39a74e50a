pub mod address;
pub mod asset;
pub mod pool;
pub mod quantity;
pub mod stable_pool;
pub mod utxo;

pub use address::{Address, Credential, StakeReference};
pub use asset::Asset;
pub use pool::V2PoolState;
pub use stable_pool::{StablePool, StablePoolState};
pub use utxo::{KupoCreatedAt, KupoDatumResponse, KupoUtxoResponse, KupoValue, Unit, Utxo};
