use crate::models::{normalize_code, Category, BRANCH_CODES, DISTRICT_CODES};
use crate::rank::parse_rank_input;
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollegeType {
    #[default]
    All,
    Women,
}

impl FromStr for CollegeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(CollegeType::All),
            "women" => Ok(CollegeType::Women),
            other => Err(format!("unknown college type: {}", other)),
        }
    }
}

/// Raw query inputs as the user typed them, edited between searches.
#[derive(Debug, Clone, Default)]
pub struct QueryForm {
    pub name: String,
    pub rank: String,
    pub student_category: String,
    pub filter_category: String,
    pub branches: Vec<String>,
    pub districts: Vec<String>,
    pub college_type: String,
    pub min_rank: String,
    pub max_rank: String,
}

impl QueryForm {
    /// The category the search runs under: the filters panel wins over the
    /// student info panel when both are set.
    pub fn active_category_text(&self) -> &str {
        if !self.filter_category.trim().is_empty() {
            &self.filter_category
        } else {
            &self.student_category
        }
    }
}

/// Immutable filter/sort state for one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub name: String,
    pub category: Option<Category>,
    pub branches: BTreeSet<String>,
    pub districts: BTreeSet<String>,
    pub college_type: CollegeType,
    pub rank: Option<u64>,
    pub min_rank: Option<u64>,
    pub max_rank: Option<u64>,
}

impl Query {
    pub fn from_form(form: &QueryForm) -> Self {
        let category_text = form.active_category_text().trim();
        let category = if category_text.is_empty() {
            None
        } else {
            match category_text.parse::<Category>() {
                Ok(category) => Some(category),
                Err(e) => {
                    tracing::warn!("{}, searching without a category", e);
                    None
                }
            }
        };

        let college_type = form.college_type.parse::<CollegeType>().unwrap_or_else(|e| {
            tracing::warn!("{}, showing all colleges", e);
            CollegeType::All
        });

        Query {
            name: form.name.trim().to_string(),
            category,
            branches: collect_codes(&form.branches, &BRANCH_CODES, "branch"),
            districts: collect_codes(&form.districts, &DISTRICT_CODES, "district"),
            college_type,
            rank: parse_rank_input(&form.rank),
            min_rank: parse_rank_input(&form.min_rank),
            max_rank: parse_rank_input(&form.max_rank),
        }
    }
}

fn collect_codes(raw: &[String], known: &[&str], kind: &str) -> BTreeSet<String> {
    raw.iter()
        .map(|code| normalize_code(code))
        .filter(|code| !code.is_empty())
        .inspect(|code| {
            if !known.contains(&code.as_str()) {
                tracing::warn!(code = %code, "{} code is not in the known list", kind);
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_panel_category_takes_precedence() {
        let form = QueryForm {
            student_category: "OC Girls".to_string(),
            filter_category: "SC Boys".to_string(),
            ..Default::default()
        };
        assert_eq!(Query::from_form(&form).category, Some(Category::ScBoys));
    }

    #[test]
    fn student_category_is_used_when_filters_panel_is_empty() {
        let form = QueryForm {
            student_category: "OC Girls".to_string(),
            filter_category: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(Query::from_form(&form).category, Some(Category::OcGirls));
    }

    #[test]
    fn malformed_inputs_mean_absent_predicates() {
        let form = QueryForm {
            rank: "abc".to_string(),
            min_rank: "10".to_string(),
            max_rank: "ten".to_string(),
            filter_category: "nobody".to_string(),
            college_type: "mixed".to_string(),
            ..Default::default()
        };
        let query = Query::from_form(&form);
        assert_eq!(query.rank, None);
        assert_eq!(query.min_rank, Some(10));
        assert_eq!(query.max_rank, None);
        assert_eq!(query.category, None);
        assert_eq!(query.college_type, CollegeType::All);
    }

    #[test]
    fn codes_are_normalized_and_deduplicated() {
        let form = QueryForm {
            branches: vec!["cse".to_string(), " CSE ".to_string(), "ece".to_string(), "".to_string()],
            districts: vec!["hyd".to_string()],
            college_type: "Women".to_string(),
            ..Default::default()
        };
        let query = Query::from_form(&form);
        assert_eq!(query.branches.iter().collect::<Vec<_>>(), vec!["CSE", "ECE"]);
        assert!(query.districts.contains("HYD"));
        assert_eq!(query.college_type, CollegeType::Women);
    }
}
