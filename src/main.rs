use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use num_bigint::BigUint;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use minswap_kupo_rs::config::{AppConfig, NetworkId, V2Config};
use minswap_kupo_rs::dex::{BaseDex, MinswapStable, MinswapV2, V2Pool};
use minswap_kupo_rs::math::{amount_out, apply_slippage, SlippageDirection, DEFAULT_FEE_DENOMINATOR};
use minswap_kupo_rs::models::{Address, Asset, V2PoolState};
use minswap_kupo_rs::order::{
    build_order_address, AuthorizationMethod, Direction, ExtraDatum, Killable, OrderDatum,
    Step, SwapAmount, SwapExactIn, FIXED_BATCHER_FEE,
};
use minswap_kupo_rs::order::stable::StableOrderDatum;
use minswap_kupo_rs::{load_from_file, save_to_file, KupoApi};

#[derive(Parser)]
#[command(name = "minswap-kupo-rs", about = "Minswap V2 pools and orders over Kupo")]
struct Cli {
    /// JSON file with `kupo_url`, `network` and `concurrency`.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    kupo: Option<String>,
    #[arg(long)]
    network: Option<NetworkId>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export every pool to a JSON file.
    Pools {
        #[arg(long, default_value = "pools_rs.json")]
        output: PathBuf,
        /// Export the stable pools instead of the V2 pools.
        #[arg(long)]
        stable: bool,
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Print the V2 pool of a pair. Use `lovelace` for ADA.
    Pool { asset_a: String, asset_b: String },
    /// Quote a swap-exact-in against the live pool.
    Quote {
        asset_in: String,
        asset_out: String,
        amount_in: BigUint,
        #[arg(long, default_value_t = 0.005)]
        slippage: f64,
        /// Also build the order datum and order address for this sender.
        #[arg(long)]
        sender: Option<String>,
    },
    /// Decode an order datum given as CBOR hex.
    DecodeOrder {
        cbor_hex: String,
        #[arg(long)]
        stable: bool,
    },
    /// Decode a V2 pool datum given as CBOR hex.
    DecodePool { cbor_hex: String },
}

#[derive(Serialize)]
struct QuoteOutput {
    pool: String,
    direction: Direction,
    amount_in: String,
    amount_out: String,
    minimum_received: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_datum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'static str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_from_file::<AppConfig>(&path.to_string_lossy())?,
        None => AppConfig::default(),
    };
    if let Some(kupo) = cli.kupo {
        config.kupo_url = kupo;
    }
    if let Some(network) = cli.network {
        config.network = network;
    }

    match cli.command {
        Command::Pools { output, stable, concurrency } => {
            let kupo = KupoApi::new(&config.kupo_url)?;
            let output = output.to_string_lossy().into_owned();
            if stable {
                export_with(MinswapStable::new(kupo, config.network), &output).await?;
            } else {
                let dex = MinswapV2::new(kupo, V2Config::for_network(config.network));
                export_all(dex, concurrency.unwrap_or(config.concurrency), &output).await?;
            }
        }
        Command::Pool { asset_a, asset_b } => {
            let dex = MinswapV2::new(KupoApi::new(&config.kupo_url)?, V2Config::for_network(config.network));
            let pool = find_pool(&dex, &asset_a, &asset_b).await?;
            println!("{}", serde_json::to_string_pretty(&pool)?);
        }
        Command::Quote { asset_in, asset_out, amount_in, slippage, sender } => {
            let v2 = V2Config::for_network(config.network);
            let dex = MinswapV2::new(KupoApi::new(&config.kupo_url)?, v2);
            let pool = find_pool(&dex, &asset_in, &asset_out).await?;
            let asset_in = Asset::from_identifier(&asset_in)?;
            let quote = quote(&pool, &asset_in, amount_in, slippage, sender.as_deref(), v2)?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Command::DecodeOrder { cbor_hex, stable } => {
            let bytes = hex::decode(cbor_hex.trim()).context("datum is not hex")?;
            let json = if stable {
                serde_json::to_string_pretty(&StableOrderDatum::from_cbor(&bytes, config.network)?)?
            } else {
                serde_json::to_string_pretty(&OrderDatum::from_cbor(&bytes, config.network)?)?
            };
            println!("{}", json);
        }
        Command::DecodePool { cbor_hex } => {
            let bytes = hex::decode(cbor_hex.trim()).context("datum is not hex")?;
            let state = V2PoolState::from_cbor(&bytes)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }
    Ok(())
}

async fn find_pool(dex: &MinswapV2<KupoApi>, a: &str, b: &str) -> Result<V2Pool> {
    let a = Asset::from_identifier(a)?;
    let b = Asset::from_identifier(b)?;
    dex.pool_by_pair(a.clone(), b.clone())
        .await?
        .ok_or_else(|| anyhow!("no pool for {} / {}", a, b))
}

fn quote(
    pool: &V2Pool,
    asset_in: &Asset,
    amount_in: BigUint,
    slippage: f64,
    sender: Option<&str>,
    config: &V2Config,
) -> Result<QuoteOutput> {
    let state = &pool.state;
    let (direction, reserve_in, reserve_out, fee) = if *asset_in == state.asset_a {
        (Direction::AToB, &state.reserve_a, &state.reserve_b, &state.base_fee_a_numerator)
    } else if *asset_in == state.asset_b {
        (Direction::BToA, &state.reserve_b, &state.reserve_a, &state.base_fee_b_numerator)
    } else {
        bail!("{} is not traded by pool {}", asset_in, pool.pair());
    };
    let out = amount_out(
        reserve_in,
        reserve_out,
        &amount_in,
        fee,
        &BigUint::from(DEFAULT_FEE_DENOMINATOR),
    )?;
    let minimum_received = apply_slippage(slippage, &out, SlippageDirection::Down)?;

    let mut output = QuoteOutput {
        pool: pool.pair(),
        direction,
        amount_in: amount_in.to_string(),
        amount_out: out.to_string(),
        minimum_received: minimum_received.to_string(),
        order_address: None,
        order_datum: None,
        metadata: None,
    };
    if let Some(sender) = sender {
        let sender: Address = sender.parse()?;
        let step = Step::SwapExactIn(SwapExactIn {
            direction,
            swap_amount: SwapAmount::specific(amount_in),
            minimum_received,
            killable: Killable::PendingOnFailed,
        });
        output.metadata = Some(step.metadata_message());
        let datum = OrderDatum {
            canceller: AuthorizationMethod::owner_of(&sender),
            refund_receiver: sender.clone(),
            refund_receiver_datum: ExtraDatum::NoDatum,
            success_receiver: sender.clone(),
            success_receiver_datum: ExtraDatum::NoDatum,
            lp_asset: state.lp_asset(&config.lp_policy_bytes()?),
            step,
            max_batcher_fee: BigUint::from(FIXED_BATCHER_FEE),
            expiry: None,
        };
        output.order_datum = Some(hex::encode(datum.to_cbor()));
        output.order_address = Some(build_order_address(&sender, config)?.to_bech32()?);
    }
    Ok(output)
}

async fn export_with<D: BaseDex>(dex: D, output: &str) -> Result<()> {
    let pools = dex.all_pools().await?;
    save_to_file(&pools, output)?;
    info!(dex = dex.identifier(), pools = pools.len(), output, "exported pools");
    Ok(())
}

async fn export_all(dex: MinswapV2<KupoApi>, concurrency: usize, output: &str) -> Result<()> {
    let dex = Arc::new(dex);

    info!("fetching all pool UTXOs");
    let utxos = Arc::new(dex.pool_utxos().await?);
    let total = utxos.len();
    info!(total, "found pool UTXOs");

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let done = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(total);

    for i in 0..total {
        let dex = Arc::clone(&dex);
        let utxos = Arc::clone(&utxos);
        let sem = Arc::clone(&semaphore);
        let done = Arc::clone(&done);

        let handle = tokio::spawn(async move {
            let _permit = sem.acquire().await.ok()?;
            let utxo = &utxos[i];
            let result = match dex.pool_from_utxo(utxo).await {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::warn!(out_ref = %utxo.out_ref(), error = %format!("{:#}", e), "skipping pool output");
                    None
                }
            };
            let d = done.fetch_add(1, Ordering::Relaxed) + 1;
            if d % 50 == 0 || d == total {
                info!("[{}/{}] pool datums fetched", d, total);
            }
            result
        });
        handles.push(handle);
    }

    let mut pools: Vec<V2Pool> = Vec::new();
    for handle in handles {
        if let Ok(Some(pool)) = handle.await {
            pools.push(pool);
        }
    }

    pools.sort_by(|a, b| a.lp_asset.cmp(&b.lp_asset));
    save_to_file(&pools, output)?;
    info!(
        pools = pools.len(),
        skipped = total - pools.len(),
        output,
        "exported minswap v2 pools"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use minswap_kupo_rs::models::{Credential, StakeReference};

    const SENDER: &str = "addr_test1qpssc0r090a9u0pyvdr9y76sm2xzx04n6d4j0y5hukcx6rxz4dtgkhfdynadkea0qezv99wljdl076xkg2krm96nn8jszmh3w7";

    fn v2_pool() -> V2Pool {
        let mut state = V2PoolState {
            pool_batching_credential: StakeReference::Inline(Credential::Script(vec![0x7c; 28])),
            asset_a: Asset::ada(),
            asset_b: Asset::from_identifier(
                "e16c2dc8ae937e8d3790c7fd7168d7b994621ba14ca11415f39fed724d494e",
            )
            .unwrap(),
            total_liquidity: BigUint::from(1_000_000u64),
            reserve_a: BigUint::from(1_000_000_000_000u64),
            reserve_b: BigUint::from(61_636_867_016u64),
            base_fee_a_numerator: BigUint::from(30u32),
            base_fee_b_numerator: BigUint::from(30u32),
            fee_sharing_numerator: None,
            allow_dynamic_fee: false,
            datum: Vec::new(),
        };
        state.datum = state.to_cbor();
        V2Pool {
            out_ref: "0@aa".into(),
            address: String::new(),
            lp_asset: String::new(),
            state,
        }
    }

    #[test]
    fn test_quote_builds_order() {
        let pool = v2_pool();
        let config = V2Config::for_network(NetworkId::Testnet);
        let amount_in = BigUint::from(10_000_000u64);
        let q = quote(&pool, &Asset::ada(), amount_in.clone(), 0.01, Some(SENDER), config).unwrap();
        assert!(matches!(q.direction, Direction::AToB));
        let out: BigUint = q.amount_out.parse().unwrap();
        let min: BigUint = q.minimum_received.parse().unwrap();
        assert!(min < out && out > BigUint::from(0u32));

        let datum = hex::decode(q.order_datum.unwrap()).unwrap();
        let order = OrderDatum::from_cbor(&datum, NetworkId::Testnet).unwrap();
        assert_eq!(order.max_batcher_fee, BigUint::from(FIXED_BATCHER_FEE));
        match order.step {
            Step::SwapExactIn(step) => {
                assert_eq!(step.swap_amount, SwapAmount::specific(amount_in));
                assert_eq!(step.minimum_received, min);
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert!(q.order_address.unwrap().starts_with("addr_test1"));

        let q = quote(&pool, &pool.state.asset_b.clone(), BigUint::from(5u32), 0.0, None, config).unwrap();
        assert!(matches!(q.direction, Direction::BToA));
        assert!(q.order_datum.is_none());
        let stranger = Asset::new(vec![0x02; 28], b"X".to_vec());
        assert!(quote(&pool, &stranger, BigUint::from(5u32), 0.0, None, config).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "minswap-kupo-rs",
            "--network",
            "testnet",
            "quote",
            "lovelace",
            "e16c2dc8ae937e8d3790c7fd7168d7b994621ba14ca11415f39fed724d494e",
            "1000000",
            "--slippage",
            "0.01",
        ])
        .unwrap();
        assert_eq!(cli.network, Some(NetworkId::Testnet));
        assert!(matches!(cli.command, Command::Quote { slippage, .. } if slippage == 0.01));
        assert!(Cli::try_parse_from(["minswap-kupo-rs", "pool", "lovelace"]).is_err());
    }
}
