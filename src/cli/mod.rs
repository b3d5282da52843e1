use crate::client::{ChainProvider, FallbackClient};
use crate::send::{TransferParams, send_transfer};
use crate::tvm::Address;
use crate::wallet::WalletVariant;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

const DEFAULT_RPC_URL: &str = "https://toncenter.com/api/v2";

/// tontransfer-rs CLI
#[derive(Parser, Debug)]
#[command(name = "tontransfer-rs")]
#[command(about = "Build, sign and broadcast value transfers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum VariantArg {
    V4r2,
    V5r1,
}

impl From<VariantArg> for WalletVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::V4r2 => WalletVariant::V4R2,
            VariantArg::V5r1 => WalletVariant::V5R1,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign and broadcast a transfer
    Send {
        /// Destination address, friendly or raw form
        #[arg(short = 't', long)]
        to: String,
        /// Amount in whole coins, e.g. "1.5"
        #[arg(short = 'a', long)]
        amount: String,
        /// Optional short comment
        #[arg(short = 'm', long)]
        memo: Option<String>,
        /// The wallet's own deployed address
        #[arg(short = 's', long)]
        sender: String,
        /// 24-word mnemonic
        #[arg(long, env = "TON_MNEMONIC", hide_env_values = true)]
        mnemonic: String,
        /// API key for the RPC provider
        #[arg(short = 'k', long, env = "TON_API_KEY")]
        api_key: Option<String>,
        /// Wallet contract revision
        #[arg(long, value_enum, default_value = "v4r2")]
        variant: VariantArg,
        /// Expiry window in seconds past network time
        #[arg(long, default_value = "180")]
        expiry_window: u32,
        /// RPC base URLs, tried in order (repeatable)
        #[arg(long = "rpc-url")]
        rpc_urls: Vec<String>,
    },
    /// Read the current sequence number of an account
    Seqno {
        /// Account address
        #[arg(short = 'a', long)]
        address: String,
        #[arg(short = 'k', long, env = "TON_API_KEY")]
        api_key: Option<String>,
        #[arg(long = "rpc-url")]
        rpc_urls: Vec<String>,
    },
    /// Read the current network time
    NetTime {
        #[arg(short = 'k', long, env = "TON_API_KEY")]
        api_key: Option<String>,
        #[arg(long = "rpc-url")]
        rpc_urls: Vec<String>,
    },
    /// Parse an address and print both textual forms
    ParseAddr {
        /// Address in either form
        address: String,
    },
}

fn build_client(rpc_urls: &[String], api_key: Option<String>) -> FallbackClient {
    let urls = if rpc_urls.is_empty() {
        vec![DEFAULT_RPC_URL.to_string()]
    } else {
        rpc_urls.to_vec()
    };
    FallbackClient::from_urls(&urls, api_key, 15)
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Execute the command
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Send {
                to,
                amount,
                memo,
                sender,
                mnemonic,
                api_key,
                variant,
                expiry_window,
                rpc_urls,
            } => {
                let client = build_client(rpc_urls, api_key.clone());
                let params = TransferParams::new(sender.clone())
                    .with_variant((*variant).into())
                    .with_expiry_window(*expiry_window);

                let hash = send_transfer(
                    mnemonic,
                    to,
                    amount,
                    memo.as_deref(),
                    &client,
                    &params,
                )?;
                println!("{hash}");
                Ok(())
            }
            Commands::Seqno {
                address,
                api_key,
                rpc_urls,
            } => {
                let client = build_client(rpc_urls, api_key.clone());
                let address = Address::parse(address)?;
                let seqno = client.get_seqno(&address)?;
                log::info!("seqno of {}: {seqno}", address.to_friendly());
                println!("{seqno}");
                Ok(())
            }
            Commands::NetTime { api_key, rpc_urls } => {
                let client = build_client(rpc_urls, api_key.clone());
                let time = client.get_time()?;
                println!("{time}");
                Ok(())
            }
            Commands::ParseAddr { address } => {
                let parsed = Address::parse(address)?;
                println!("raw:      {}", parsed.to_raw());
                println!("friendly: {}", parsed.to_friendly());
                Ok(())
            }
        }
    }
}
