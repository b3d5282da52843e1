//! Chain access over JSON HTTP
//!
//! Three remote operations back the transfer path: sequence-number lookup,
//! network-time lookup and BOC submission. Providers implement a common
//! trait and are tried in a configured order; which one ultimately served
//! a call is logged.

pub mod toncenter;

use crate::error::{TransferError, TransferResult};
use crate::tvm::Address;
use std::time::{SystemTime, UNIX_EPOCH};

pub use toncenter::ToncenterClient;

/// Connection parameters for one provider
#[derive(Debug, Clone)]
pub struct ClientParams {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request timeout in seconds; a timed-out call is a normal,
    /// retryable failure
    pub timeout: u64,
}

impl Default for ClientParams {
    fn default() -> Self {
        Self {
            base_url: "https://toncenter.com/api/v2".to_string(),
            api_key: None,
            timeout: 15,
        }
    }
}

/// The three remote procedures the transfer path depends on
pub trait ChainProvider {
    /// A short label for logs
    fn name(&self) -> &str;

    /// Current sequence number of an account; an undeployed account is 0,
    /// not an error
    fn get_seqno(&self, address: &Address) -> TransferResult<u32>;

    /// Current network time as unix seconds
    fn get_time(&self) -> TransferResult<u64>;

    /// Submits a serialized BOC, returning the transaction hash
    fn send_boc(&self, boc_b64: &str) -> TransferResult<String>;
}

/// An ordered provider chain tried until one succeeds
///
/// Time and seqno lookups walk the whole chain on any failure. Submission
/// moves on only for transport-level failures; a chain rejection is
/// authoritative and returned immediately, since resubmitting a rejected
/// transfer against a stale sequence number risks a double spend.
pub struct FallbackClient {
    providers: Vec<Box<dyn ChainProvider>>,
}

impl FallbackClient {
    pub fn new(providers: Vec<Box<dyn ChainProvider>>) -> Self {
        Self { providers }
    }

    /// Builds a chain of Toncenter-style providers, one per base URL
    pub fn from_urls(urls: &[String], api_key: Option<String>, timeout: u64) -> Self {
        let providers = urls
            .iter()
            .map(|url| {
                Box::new(ToncenterClient::new(ClientParams {
                    base_url: url.clone(),
                    api_key: api_key.clone(),
                    timeout,
                })) as Box<dyn ChainProvider>
            })
            .collect();
        Self::new(providers)
    }

    fn try_each<T>(
        &self,
        what: &str,
        mut op: impl FnMut(&dyn ChainProvider) -> TransferResult<T>,
        stop_on_rejection: bool,
    ) -> TransferResult<T> {
        let mut last_error = TransferError::Network(format!("no providers configured for {what}"));
        for provider in &self.providers {
            match op(provider.as_ref()) {
                Ok(value) => {
                    log::info!("{what} served by {}", provider.name());
                    return Ok(value);
                }
                Err(e @ TransferError::Rejected(_)) if stop_on_rejection => return Err(e),
                Err(e) => {
                    log::warn!("{what} via {} failed: {e}", provider.name());
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

impl ChainProvider for FallbackClient {
    fn name(&self) -> &str {
        "fallback-chain"
    }

    fn get_seqno(&self, address: &Address) -> TransferResult<u32> {
        self.try_each("seqno", |p| p.get_seqno(address), false)
    }

    fn get_time(&self) -> TransferResult<u64> {
        // Last resort only: the local clock may be skewed against the
        // chain, which is exactly what the expiry window must not inherit
        self.try_each("network time", |p| p.get_time(), false)
            .or_else(|e| {
                let local = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|_| TransferError::Network("local clock before epoch".into()))?
                    .as_secs();
                log::error!("every time source failed ({e}); falling back to local clock {local}");
                Ok(local)
            })
    }

    fn send_boc(&self, boc_b64: &str) -> TransferResult<String> {
        self.try_each("submission", |p| p.send_boc(boc_b64), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedProvider {
        label: String,
        seqno: TransferResult<u32>,
    }

    impl ScriptedProvider {
        fn new(label: &str, seqno: TransferResult<u32>) -> Self {
            Self {
                label: label.to_string(),
                seqno,
            }
        }
    }

    impl ChainProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.label
        }

        fn get_seqno(&self, _address: &Address) -> TransferResult<u32> {
            match &self.seqno {
                Ok(v) => Ok(*v),
                Err(TransferError::Network(m)) => Err(TransferError::Network(m.clone())),
                Err(TransferError::Rejected(m)) => Err(TransferError::Rejected(m.clone())),
                Err(_) => unreachable!(),
            }
        }

        fn get_time(&self) -> TransferResult<u64> {
            Err(TransferError::Network("no time here".into()))
        }

        fn send_boc(&self, _boc_b64: &str) -> TransferResult<String> {
            match &self.seqno {
                Ok(_) => Ok("hash".into()),
                Err(TransferError::Network(m)) => Err(TransferError::Network(m.clone())),
                Err(TransferError::Rejected(m)) => Err(TransferError::Rejected(m.clone())),
                Err(_) => unreachable!(),
            }
        }
    }

    #[test]
    fn test_falls_through_to_second_provider() {
        let chain = FallbackClient::new(vec![
            Box::new(ScriptedProvider::new(
                "down",
                Err(TransferError::Network("timeout".into())),
            )),
            Box::new(ScriptedProvider::new("up", Ok(9))),
        ]);
        let seqno = chain.get_seqno(&Address::new(0, [0u8; 32])).unwrap();
        assert_eq!(seqno, 9);
    }

    #[test]
    fn test_rejection_stops_submission_chain() {
        let chain = FallbackClient::new(vec![
            Box::new(ScriptedProvider::new(
                "judgmental",
                Err(TransferError::Rejected("exitcode=33".into())),
            )),
            Box::new(ScriptedProvider::new("next", Ok(1))),
        ]);
        match chain.send_boc("AAAA") {
            Err(TransferError::Rejected(text)) => assert!(text.contains("33")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_local_clock_is_last_resort_for_time() {
        let chain = FallbackClient::new(vec![Box::new(ScriptedProvider::new(
            "down",
            Err(TransferError::Network("timeout".into())),
        ))]);
        // Never errors: the local clock closes the chain
        assert!(chain.get_time().unwrap() > 1_500_000_000);
    }
}
