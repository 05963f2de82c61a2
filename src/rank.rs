use crate::models::RankValue;

/// Sentinel for "no rank": sorts after every real rank.
pub const UNRANKED: u64 = u64::MAX;

/// Normalize a stored rank cell onto a comparable scale.
///
/// Every non-digit character is dropped from the value's text form, so
/// `"Rank-123"` reads as 123. An empty digit string (missing value, blank
/// text, text without digits) is [`UNRANKED`]; `0` stays a real rank.
pub fn parse_rank(value: Option<&RankValue>) -> u64 {
    let text = match value {
        Some(value) => value.to_string(),
        None => return UNRANKED,
    };

    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return UNRANKED;
    }

    digits.parse::<u64>().unwrap_or(UNRANKED)
}

/// Parse a rank typed by the user. Anything that is not a plain non-negative
/// integer means "no constraint".
pub fn parse_rank_input(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.parse::<u64>() {
        Ok(rank) => Some(rank),
        Err(_) => {
            tracing::debug!(input = trimmed, "ignoring non-numeric rank input");
            None
        }
    }
}
