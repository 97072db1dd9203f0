use anyhow::{Context, Result, bail};
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_LEN: u64 = 10_000;

/// A seed requested on the command line, with the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub source: String,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            source: seed.to_string(),
        }
    }

    fn from_token(seed: u64, token: &str) -> Self {
        Self {
            seed,
            source: token.to_string(),
        }
    }
}

/// Resolve a list of CLI seed arguments into canonical seeds.
///
/// Supports decimal integers (negative values use their magnitude), `0x` hex
/// literals, and ranges written `a..b` or `a..=b`. Duplicates keep their
/// first position.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = parse_range(token)? {
            pending.extend((start..end).map(|seed| SeedInfo::from_token(seed, token)));
            continue;
        }

        if let Some(seed) = parse_single(token) {
            pending.push(SeedInfo::from_token(seed, token));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.seed));

    if pending.is_empty() {
        pending.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(pending)
}

fn parse_single(token: &str) -> Option<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok();
    }
    if let Ok(value) = token.parse::<i64>() {
        return Some(value.unsigned_abs());
    }
    token.parse::<u64>().ok()
}

/// Half-open bounds for a range token, or `None` when the token is not a range.
fn parse_range(token: &str) -> Result<Option<(u64, u64)>> {
    let Some((start, rest)) = token.split_once("..") else {
        return Ok(None);
    };
    let (end, inclusive) = match rest.strip_prefix('=') {
        Some(end) => (end, true),
        None => (rest, false),
    };
    let start = parse_single(start).with_context(|| format!("bad range start in {token}"))?;
    let end = parse_single(end).with_context(|| format!("bad range end in {token}"))?;
    let end = if inclusive { end.saturating_add(1) } else { end };
    if end <= start {
        bail!("Empty seed range: {token}");
    }
    if end - start > MAX_RANGE_LEN {
        bail!("Seed range {token} exceeds {MAX_RANGE_LEN} seeds");
    }
    Ok(Some((start, end)))
}
