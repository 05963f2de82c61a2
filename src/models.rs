use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record source: an http(s) URL returning a JSON array, or a path to a JSON file
    pub source: Option<String>,
    pub output_directory: Option<String>,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: Some("http://localhost:3000/api/students".to_string()),
            output_directory: Some("output".to_string()),
            request_timeout_secs: 30,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}

/// A rank cell as stored upstream: some rows carry numbers, others numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RankValue {
    Number(f64),
    Text(String),
}

impl RankValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            RankValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RankValue::Text(s) => !s.is_empty(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RankValue::Number(_) => false,
            RankValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for RankValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankValue::Number(n) => write!(f, "{}", n),
            RankValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    OcBoys,
    OcGirls,
    BcABoys,
    BcAGirls,
    BcBBoys,
    BcBGirls,
    BcCBoys,
    BcCGirls,
    BcDBoys,
    BcDGirls,
    BcEBoys,
    BcEGirls,
    ScBoys,
    ScGirls,
    StBoys,
    StGirls,
    EwsGenOu,
    EwsGirlsOu,
}

impl Category {
    pub const ALL: [Category; 18] = [
        Category::OcBoys,
        Category::OcGirls,
        Category::BcABoys,
        Category::BcAGirls,
        Category::BcBBoys,
        Category::BcBGirls,
        Category::BcCBoys,
        Category::BcCGirls,
        Category::BcDBoys,
        Category::BcDGirls,
        Category::BcEBoys,
        Category::BcEGirls,
        Category::ScBoys,
        Category::ScGirls,
        Category::StBoys,
        Category::StGirls,
        Category::EwsGenOu,
        Category::EwsGirlsOu,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::OcBoys => "OC Boys",
            Category::OcGirls => "OC Girls",
            Category::BcABoys => "BC-A Boys",
            Category::BcAGirls => "BC-A Girls",
            Category::BcBBoys => "BC-B Boys",
            Category::BcBGirls => "BC-B Girls",
            Category::BcCBoys => "BC-C Boys",
            Category::BcCGirls => "BC-C Girls",
            Category::BcDBoys => "BC-D Boys",
            Category::BcDGirls => "BC-D Girls",
            Category::BcEBoys => "BC-E Boys",
            Category::BcEGirls => "BC-E Girls",
            Category::ScBoys => "SC Boys",
            Category::ScGirls => "SC Girls",
            Category::StBoys => "ST Boys",
            Category::StGirls => "ST Girls",
            Category::EwsGenOu => "EWS GEN OU",
            Category::EwsGirlsOu => "EWS GIRLS OU",
        }
    }

    /// Field name of this category's rank on a stored record
    pub fn field_key(self) -> &'static str {
        match self {
            Category::OcBoys => "ocBoys",
            Category::OcGirls => "ocGirls",
            Category::BcABoys => "bcABoys",
            Category::BcAGirls => "bcAGirls",
            Category::BcBBoys => "bcBBoys",
            Category::BcBGirls => "bcBGirls",
            Category::BcCBoys => "bcCBoys",
            Category::BcCGirls => "bcCGirls",
            Category::BcDBoys => "bcDBoys",
            Category::BcDGirls => "bcDGirls",
            Category::BcEBoys => "bcEBoys",
            Category::BcEGirls => "bcEGirls",
            Category::ScBoys => "scBoys",
            Category::ScGirls => "scGirls",
            Category::StBoys => "stBoys",
            Category::StGirls => "stGirls",
            Category::EwsGenOu => "ewsGenOu",
            Category::EwsGirlsOu => "ewsGirlsOu",
        }
    }

    pub fn is_boys(self) -> bool {
        self.label().contains("Boys")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts either the display label ("BC-A Girls") or the field key ("bcAGirls")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted) || c.field_key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown category: {}", wanted))
    }
}

pub const DISTRICT_CODES: [&str; 22] = [
    "HNK", "HYD", "JTL", "KGM", "KHM", "KMR", "KRM", "MBN", "MDL", "MED", "MHB", "NLG", "NZB",
    "PDL", "RR", "SDP", "SRC", "SRD", "SRP", "WGL", "WNP", "YBG",
];

pub const BRANCH_CODES: [&str; 46] = [
    "AGR", "AI", "AID", "AIM", "ANE", "AUT", "BIO", "BME", "CHE", "CIC", "CIV", "CME", "CS",
    "CSA", "CSB", "CSC", "CSD", "CSE", "CSG", "CSI", "CSM", "CSN", "CSO", "CSW", "DRG", "DTD",
    "ECE", "ECI", "ECM", "EEE", "EIE", "ETM", "FDT", "GEO", "INF", "MCT", "MEC", "MET", "MIN",
    "MMS", "MMT", "MTE", "PHD", "PHE", "PHM", "TEX",
];

/// Text column that tolerates `null` (read as empty) and bare numbers (read as their digits).
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Text(text)) => text,
        Some(Scalar::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeatRecord {
    #[serde(alias = "instituteCode", deserialize_with = "lenient_string")]
    pub inst_code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub institute_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub place: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dist_code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub branch_code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub branch_name: String,
    pub tuition_fee: Option<RankValue>,

    pub oc_boys: Option<RankValue>,
    pub oc_girls: Option<RankValue>,
    #[serde(rename = "bcABoys")]
    pub bc_a_boys: Option<RankValue>,
    #[serde(rename = "bcAGirls")]
    pub bc_a_girls: Option<RankValue>,
    #[serde(rename = "bcBBoys")]
    pub bc_b_boys: Option<RankValue>,
    #[serde(rename = "bcBGirls")]
    pub bc_b_girls: Option<RankValue>,
    #[serde(rename = "bcCBoys")]
    pub bc_c_boys: Option<RankValue>,
    #[serde(rename = "bcCGirls")]
    pub bc_c_girls: Option<RankValue>,
    #[serde(rename = "bcDBoys")]
    pub bc_d_boys: Option<RankValue>,
    #[serde(rename = "bcDGirls")]
    pub bc_d_girls: Option<RankValue>,
    #[serde(rename = "bcEBoys")]
    pub bc_e_boys: Option<RankValue>,
    #[serde(rename = "bcEGirls")]
    pub bc_e_girls: Option<RankValue>,
    pub sc_boys: Option<RankValue>,
    pub sc_girls: Option<RankValue>,
    pub st_boys: Option<RankValue>,
    pub st_girls: Option<RankValue>,
    pub ews_gen_ou: Option<RankValue>,
    pub ews_girls_ou: Option<RankValue>,
}

impl SeatRecord {
    pub fn rank(&self, category: Category) -> Option<&RankValue> {
        let value = match category {
            Category::OcBoys => &self.oc_boys,
            Category::OcGirls => &self.oc_girls,
            Category::BcABoys => &self.bc_a_boys,
            Category::BcAGirls => &self.bc_a_girls,
            Category::BcBBoys => &self.bc_b_boys,
            Category::BcBGirls => &self.bc_b_girls,
            Category::BcCBoys => &self.bc_c_boys,
            Category::BcCGirls => &self.bc_c_girls,
            Category::BcDBoys => &self.bc_d_boys,
            Category::BcDGirls => &self.bc_d_girls,
            Category::BcEBoys => &self.bc_e_boys,
            Category::BcEGirls => &self.bc_e_girls,
            Category::ScBoys => &self.sc_boys,
            Category::ScGirls => &self.sc_girls,
            Category::StBoys => &self.st_boys,
            Category::StGirls => &self.st_girls,
            Category::EwsGenOu => &self.ews_gen_ou,
            Category::EwsGirlsOu => &self.ews_girls_ou,
        };
        value.as_ref()
    }

    #[cfg(test)]
    pub fn rank_mut(&mut self, category: Category) -> &mut Option<RankValue> {
        match category {
            Category::OcBoys => &mut self.oc_boys,
            Category::OcGirls => &mut self.oc_girls,
            Category::BcABoys => &mut self.bc_a_boys,
            Category::BcAGirls => &mut self.bc_a_girls,
            Category::BcBBoys => &mut self.bc_b_boys,
            Category::BcBGirls => &mut self.bc_b_girls,
            Category::BcCBoys => &mut self.bc_c_boys,
            Category::BcCGirls => &mut self.bc_c_girls,
            Category::BcDBoys => &mut self.bc_d_boys,
            Category::BcDGirls => &mut self.bc_d_girls,
            Category::BcEBoys => &mut self.bc_e_boys,
            Category::BcEGirls => &mut self.bc_e_girls,
            Category::ScBoys => &mut self.sc_boys,
            Category::ScGirls => &mut self.sc_girls,
            Category::StBoys => &mut self.st_boys,
            Category::StGirls => &mut self.st_girls,
            Category::EwsGenOu => &mut self.ews_gen_ou,
            Category::EwsGirlsOu => &mut self.ews_girls_ou,
        }
    }

    /// Rank cell as shown in tables; missing values display empty
    pub fn rank_display(&self, category: Category) -> String {
        self.rank(category).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn tuition_fee_display(&self) -> String {
        self.tuition_fee.as_ref().map(|v| v.to_string()).unwrap_or_default()
    }
}

/// Normalize a code by keeping only alphanumeric characters
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_mixed_rank_representations() {
        let json = r#"{
            "_id": "65f0",
            "instCode": "JNTH",
            "instituteName": "JNTU HYDERABAD",
            "place": "KUKATPALLY",
            "distCode": "HYD",
            "branchCode": "CSE",
            "branchName": "COMPUTER SCIENCE",
            "tuitionFee": 35000,
            "ocBoys": 812,
            "ocGirls": "640",
            "bcABoys": "",
            "scGirls": null
        }"#;

        let record: SeatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.inst_code, "JNTH");
        assert_eq!(record.rank(Category::OcBoys), Some(&RankValue::Number(812.0)));
        assert_eq!(record.rank(Category::OcGirls), Some(&RankValue::Text("640".to_string())));
        assert_eq!(record.rank(Category::BcABoys), Some(&RankValue::Text(String::new())));
        assert_eq!(record.rank(Category::ScGirls), None);
        assert_eq!(record.rank(Category::StBoys), None);
        assert_eq!(record.tuition_fee_display(), "35000");
    }

    #[test]
    fn accepts_institute_code_alias() {
        let record: SeatRecord =
            serde_json::from_str(r#"{"instituteCode": "CBIT", "instituteName": "CBIT"}"#).unwrap();
        assert_eq!(record.inst_code, "CBIT");
        assert!(record.place.is_empty());
    }

    #[test]
    fn text_columns_tolerate_null_and_numbers() {
        let record: SeatRecord = serde_json::from_str(
            r#"{"instCode": 1234, "instituteName": "VASAVI", "place": null, "distCode": null}"#,
        )
        .unwrap();
        assert_eq!(record.inst_code, "1234");
        assert_eq!(record.institute_name, "VASAVI");
        assert!(record.place.is_empty());
        assert!(record.dist_code.is_empty());

        assert!(serde_json::from_str::<SeatRecord>(r#"{"instituteName": {}}"#).is_err());
    }

    #[test]
    fn parses_category_labels_and_keys() {
        assert_eq!("oc boys".parse::<Category>(), Ok(Category::OcBoys));
        assert_eq!("bcEGirls".parse::<Category>(), Ok(Category::BcEGirls));
        assert_eq!(" EWS GIRLS OU ".parse::<Category>(), Ok(Category::EwsGirlsOu));
        assert!("OC".parse::<Category>().is_err());
    }

    #[test]
    fn boys_variants_are_detected_from_label() {
        let boys: Vec<_> = Category::ALL.iter().filter(|c| c.is_boys()).collect();
        assert_eq!(boys.len(), 8);
        assert!(!Category::EwsGenOu.is_boys());
    }

    #[test]
    fn rank_value_truthiness_follows_source_semantics() {
        assert!(!RankValue::Number(0.0).is_truthy());
        assert!(RankValue::Text("0".to_string()).is_truthy());
        assert!(!RankValue::Text(String::new()).is_truthy());
        assert!(RankValue::Text("  ".to_string()).is_blank());
        assert!(!RankValue::Number(0.0).is_blank());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.request_timeout_secs, 30);
        assert_eq!(parsed.output_directory.as_deref(), Some("output"));
    }
}
