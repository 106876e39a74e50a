use async_trait::async_trait;
use serde::Serialize;

pub mod minswap_stable;
pub mod minswap_v2;

pub use minswap_stable::MinswapStable;
pub use minswap_v2::{MinswapV2, V2Pool};

#[async_trait]
pub trait BaseDex: Send + Sync {
    type Pool: Serialize + Send;

    fn identifier(&self) -> &str;

    /// Every pool of this DEX; outputs that fail to decode are logged and skipped.
    async fn all_pools(&self) -> Result<Vec<Self::Pool>, anyhow::Error>;
}
