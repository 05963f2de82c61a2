use crate::models::{Category, SeatRecord};
use crate::rank::parse_rank;
use std::collections::HashMap;

struct InstituteGroup {
    institute_name: String,
    best_rank: u64,
    records: Vec<SeatRecord>,
}

/// Order records for display.
///
/// Without a category the view is alphabetical by institute. With one, each
/// institute's seats stay together ordered by rank (then branch name), and
/// institutes are ordered by their best rank (then name).
pub fn sort_view(mut records: Vec<SeatRecord>, category: Option<Category>) -> Vec<SeatRecord> {
    let Some(category) = category else {
        records.sort_by(|a, b| a.institute_name.cmp(&b.institute_name));
        return records;
    };

    let mut by_institute: HashMap<String, Vec<SeatRecord>> = HashMap::new();
    for record in records {
        by_institute
            .entry(record.institute_name.clone())
            .or_default()
            .push(record);
    }

    let mut groups: Vec<InstituteGroup> = by_institute
        .into_iter()
        .map(|(institute_name, mut records)| {
            records.sort_by(|a, b| {
                parse_rank(a.rank(category))
                    .cmp(&parse_rank(b.rank(category)))
                    .then_with(|| a.branch_name.cmp(&b.branch_name))
            });
            let best_rank = records
                .iter()
                .map(|r| parse_rank(r.rank(category)))
                .min()
                .unwrap_or(crate::rank::UNRANKED);
            InstituteGroup {
                institute_name,
                best_rank,
                records,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        a.best_rank
            .cmp(&b.best_rank)
            .then_with(|| a.institute_name.cmp(&b.institute_name))
    });

    groups.into_iter().flat_map(|g| g.records).collect()
}
