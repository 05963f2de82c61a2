use crate::classifier::{is_women_college, is_women_only_institute};
use crate::models::SeatRecord;
use crate::query::{CollegeType, Query};
use crate::rank::parse_rank;

/// Keep every record that satisfies all active predicates of `query`.
pub fn filter_records(records: &[SeatRecord], query: &Query) -> Vec<SeatRecord> {
    let name = query.name.to_lowercase();

    let filtered: Vec<SeatRecord> = records
        .iter()
        .filter(|record| matches_query(record, query, &name))
        .cloned()
        .collect();

    tracing::debug!(
        total = records.len(),
        kept = filtered.len(),
        category = ?query.category,
        "filtered records"
    );
    filtered
}

fn matches_query(record: &SeatRecord, query: &Query, lowered_name: &str) -> bool {
    if !lowered_name.is_empty() && !record.institute_name.to_lowercase().contains(lowered_name) {
        return false;
    }

    if !query.branches.is_empty() && !query.branches.contains(&record.branch_code) {
        return false;
    }

    if !query.districts.is_empty() && !query.districts.contains(&record.dist_code) {
        return false;
    }

    if query.college_type == CollegeType::Women && !is_women_college(record) {
        return false;
    }

    let Some(category) = query.category else {
        return true;
    };

    // A boys seat cannot exist at a women-only institute
    if category.is_boys() && is_women_only_institute(record) {
        return false;
    }

    let value = match record.rank(category) {
        Some(value) if !value.is_blank() => value,
        _ => return false,
    };

    let rank = parse_rank(Some(value));
    if query.rank.map_or(false, |wanted| rank != wanted) {
        return false;
    }
    if query.min_rank.map_or(false, |min| rank < min) {
        return false;
    }
    if query.max_rank.map_or(false, |max| rank > max) {
        return false;
    }

    true
}
