use anyhow::{Result, bail};
use pretty_env_logger::formatted_builder;

pub fn init_logger() -> Result<(), log::SetLoggerError> {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else {
        builder.parse_filters("info");
    }

    builder.try_init()
}

/// Nanotons per whole coin
pub const NANOTONS_PER_TON: u128 = 1_000_000_000;

/// Parses a decimal coin amount ("1", "1.5", "0.000000001") into nanotons
///
/// Integer math on the decimal parts; the amount never travels through a
/// float. At most 9 fractional digits are meaningful.
pub fn parse_ton_amount(text: &str) -> Result<u128> {
    let text = text.trim();
    if text.is_empty() {
        bail!("empty amount");
    }

    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };

    if frac.len() > 9 {
        bail!("amount {text:?} has more than 9 fractional digits");
    }
    if whole.is_empty() && frac.is_empty() {
        bail!("amount {text:?} has no digits");
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid amount {text:?}"))?
    };

    let frac: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<9}");
        padded
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid amount {text:?}"))?
    };

    whole
        .checked_mul(NANOTONS_PER_TON)
        .and_then(|n| n.checked_add(frac))
        .ok_or_else(|| anyhow::anyhow!("amount {text:?} overflows"))
}

/// Formats nanotons as a decimal coin amount for logs
pub fn format_ton_amount(nanotons: u128) -> String {
    let whole = nanotons / NANOTONS_PER_TON;
    let frac = nanotons % NANOTONS_PER_TON;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:09}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
