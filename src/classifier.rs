use crate::models::{Category, SeatRecord};

/// An institute is women-only when none of its "Boys" seats carries a rank.
pub fn is_women_only_institute(record: &SeatRecord) -> bool {
    Category::ALL
        .iter()
        .filter(|category| category.is_boys())
        .all(|category| !record.rank(*category).map_or(false, |v| v.is_truthy()))
}

pub fn name_mentions_women(record: &SeatRecord) -> bool {
    record.institute_name.to_lowercase().contains("women")
}

/// Combined rule used for the women college filter and for export styling.
pub fn is_women_college(record: &SeatRecord) -> bool {
    name_mentions_women(record) || is_women_only_institute(record)
}
