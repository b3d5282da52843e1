//! Toncenter-style JSON provider
//!
//! Speaks the v2-shaped API: `runGetMethod` for contract reads,
//! `getMasterchainInfo` for the chain clock and `sendBocReturnHash` for
//! submission. Any endpoint exposing those three routes works through a
//! different base URL.

use crate::client::{ChainProvider, ClientParams};
use crate::error::{TransferError, TransferResult};
use crate::models::toncenter::{
    ApiResponse, MasterchainInfo, RunGetMethodRequest, RunGetMethodResult, SendBocRequest,
    SendBocResult,
};
use crate::tvm::Address;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use ureq::Agent;

/// Error markers meaning the account has no on-chain state yet
const UNINITIALIZED_MARKERS: [&str; 4] = ["uninit", "not found", "exit code", "-13"];

/// Exit code for reading a method on an uninitialized account
const EXIT_UNINITIALIZED: i64 = -13;

pub struct ToncenterClient {
    params: ClientParams,
    agent: Agent,
    label: String,
}

impl ToncenterClient {
    pub fn new(params: ClientParams) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(params.timeout)))
            .http_status_as_error(false)
            .build();
        let label = params
            .base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('/')
            .next()
            .unwrap_or("toncenter")
            .to_string();
        Self {
            params,
            agent: config.into(),
            label,
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.params.base_url.trim_end_matches('/'), method)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> TransferResult<ApiResponse<T>> {
        let mut request = self.agent.post(self.url(method));
        if let Some(key) = &self.params.api_key {
            request = request.header("X-API-Key", key.as_str());
        }
        let mut response = request
            .send_json(body)
            .map_err(|e| TransferError::Network(format!("{method} via {}: {e}", self.label)))?;
        response
            .body_mut()
            .read_json::<ApiResponse<T>>()
            .map_err(|e| {
                TransferError::Network(format!("{method} via {}: malformed response: {e}", self.label))
            })
    }

    fn is_uninitialized_error(text: &str) -> bool {
        let text = text.to_lowercase();
        UNINITIALIZED_MARKERS.iter().any(|m| text.contains(m))
    }

    /// Maps a `runGetMethod` response to a sequence number
    ///
    /// An account without on-chain state reads as 0, whether the provider
    /// reports that as an error or as exit code -13.
    fn seqno_from_response(response: ApiResponse<RunGetMethodResult>) -> TransferResult<u32> {
        if !response.ok {
            let text = response.error_text();
            if Self::is_uninitialized_error(&text) {
                return Ok(0);
            }
            return Err(TransferError::Network(text));
        }

        let result = response
            .result
            .ok_or_else(|| TransferError::Network("runGetMethod returned no result".into()))?;

        match result.exit_code {
            Some(0) | Some(1) | None => Self::parse_seqno_stack(result),
            Some(EXIT_UNINITIALIZED) => Ok(0),
            Some(code) => Err(TransferError::Network(format!(
                "seqno read failed with exit code {code}"
            ))),
        }
    }

    fn parse_seqno_stack(result: RunGetMethodResult) -> TransferResult<u32> {
        let Some(stack) = result.stack else {
            return Ok(0);
        };
        let Some((_, value)) = stack.into_iter().next() else {
            return Ok(0);
        };
        let text = value
            .as_str()
            .ok_or_else(|| TransferError::Network("non-string seqno stack entry".into()))?;
        let digits = text.trim_start_matches("0x");
        u32::from_str_radix(digits, 16)
            .map_err(|_| TransferError::Network(format!("unparseable seqno value {text:?}")))
    }
}

impl ChainProvider for ToncenterClient {
    fn name(&self) -> &str {
        &self.label
    }

    fn get_seqno(&self, address: &Address) -> TransferResult<u32> {
        let request = RunGetMethodRequest {
            address: address.to_raw(),
            method: "seqno".to_string(),
            stack: Vec::new(),
        };
        let response: ApiResponse<RunGetMethodResult> = self.post("runGetMethod", &request)?;
        let seqno = Self::seqno_from_response(response)?;
        if seqno == 0 {
            log::info!("account {} reads as seqno 0", address.to_raw());
        }
        Ok(seqno)
    }

    fn get_time(&self) -> TransferResult<u64> {
        let mut request = self.agent.get(self.url("getMasterchainInfo"));
        if let Some(key) = &self.params.api_key {
            request = request.header("X-API-Key", key.as_str());
        }
        let mut response = request
            .call()
            .map_err(|e| TransferError::Network(format!("getMasterchainInfo via {}: {e}", self.label)))?;

        // Captured before the body is consumed; the transport's own clock
        // is the in-provider fallback when the block header lacks a time
        let header_time = response
            .headers()
            .get("date")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);

        let api: ApiResponse<MasterchainInfo> = response.body_mut().read_json().map_err(|e| {
            TransferError::Network(format!("getMasterchainInfo via {}: malformed response: {e}", self.label))
        })?;

        if api.ok
            && let Some(utime) = api.result.as_ref().and_then(|r| r.last.as_ref()).and_then(|l| l.utime)
            && utime > 1_000_000_000
        {
            return Ok(utime);
        }

        // Replies carry a "@extra": "<seconds>.<frac>:..." marker stamped
        // by the provider
        if let Some(extra) = &api.extra
            && let Some(stamp) = extra.split(':').next()
            && let Ok(seconds) = stamp.parse::<f64>()
            && seconds > 1_000_000_000.0
        {
            return Ok(seconds as u64);
        }

        if let Some(t) = header_time
            && t > 1_000_000_000
        {
            return Ok(t);
        }

        Err(TransferError::Network(format!(
            "no usable time source in response from {}",
            self.label
        )))
    }

    fn send_boc(&self, boc_b64: &str) -> TransferResult<String> {
        let request = SendBocRequest {
            boc: boc_b64.to_string(),
        };
        let response: ApiResponse<SendBocResult> = self.post("sendBocReturnHash", &request)?;

        if !response.ok {
            return Err(TransferError::Rejected(response.error_text()));
        }

        response
            .result
            .and_then(|r| r.hash)
            .ok_or_else(|| TransferError::Network("submission accepted but no hash returned".into()))
    }
}

fn parse_http_date(text: &str) -> Option<u64> {
    chrono::DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.timestamp().max(0) as u64)
}
