use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Body of `POST /query`.
///
/// `company`, `query_type` and `auth_key` are mandatory. Every other field
/// is only consulted by the query types that need it.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Company name, ticker or corporate code, depending on the query type
    pub company: String,
    pub query_type: String,
    pub auth_key: String,

    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Single receipt date for `disclosure_by_date`
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub corp_code: Option<String>,
    /// Several corporate codes, as a list or a comma-separated string
    #[serde(default, deserialize_with = "list_or_comma_separated")]
    pub corp_codes: Option<Vec<String>>,
    #[serde(default)]
    pub stock_code: Option<String>,
    #[serde(default)]
    pub bsns_year: Option<String>,
    #[serde(default)]
    pub reprt_code: Option<String>,
    #[serde(default)]
    pub fs_div: Option<String>,
    /// Disclosure type letter (pblntf_ty)
    #[serde(default)]
    pub kind: Option<String>,
    /// Detailed disclosure type (pblntf_detail_ty)
    #[serde(default)]
    pub kind_detail: Option<String>,
    /// Only the final version of amended filings
    #[serde(default, rename = "final")]
    pub final_only: Option<bool>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub rcp_no: Option<String>,
}

// auth_key stays out of logs
impl fmt::Debug for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRequest")
            .field("company", &self.company)
            .field("query_type", &self.query_type)
            .field("corp_code", &self.corp_code)
            .field("bsns_year", &self.bsns_year)
            .field("reprt_code", &self.reprt_code)
            .finish_non_exhaustive()
    }
}

/// Request fields a query type can require
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Company,
    Date,
    CorpCodes,
    BsnsYear,
    Keyword,
    EventType,
    AccountName,
    RcpNo,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Date => "date",
            Self::CorpCodes => "corp_codes",
            Self::BsnsYear => "bsns_year",
            Self::Keyword => "keyword",
            Self::EventType => "event_type",
            Self::AccountName => "account_name",
            Self::RcpNo => "rcp_no",
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl QueryRequest {
    /// Whether `field` is present and non-blank
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Company => !self.company.trim().is_empty(),
            Field::CorpCodes => !self.corp_codes().is_empty(),
            other => self.text(other).is_some(),
        }
    }

    /// Trimmed, non-blank value of a text field
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Company => Some(self.company.trim()).filter(|s| !s.is_empty()),
            Field::Date => non_empty(&self.date),
            Field::BsnsYear => non_empty(&self.bsns_year),
            Field::Keyword => non_empty(&self.keyword),
            Field::EventType => non_empty(&self.event_type),
            Field::AccountName => non_empty(&self.account_name),
            Field::RcpNo => non_empty(&self.rcp_no),
            Field::CorpCodes => None,
        }
    }

    pub fn corp_code(&self) -> Option<&str> {
        non_empty(&self.corp_code)
    }

    pub fn stock_code(&self) -> Option<&str> {
        non_empty(&self.stock_code)
    }

    pub fn start_date(&self) -> Option<&str> {
        non_empty(&self.start_date)
    }

    pub fn end_date(&self) -> Option<&str> {
        non_empty(&self.end_date)
    }

    pub fn reprt_code(&self) -> Option<&str> {
        non_empty(&self.reprt_code)
    }

    pub fn fs_div(&self) -> Option<&str> {
        non_empty(&self.fs_div)
    }

    pub fn kind(&self) -> Option<&str> {
        non_empty(&self.kind)
    }

    pub fn kind_detail(&self) -> Option<&str> {
        non_empty(&self.kind_detail)
    }

    /// Non-blank corporate codes
    pub fn corp_codes(&self) -> Vec<String> {
        self.corp_codes
            .iter()
            .flatten()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Deserialize either a list of strings or one comma-separated string
fn list_or_comma_separated<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ListOrString;

    impl<'de> Visitor<'de> for ListOrString {
        type Value = Option<Vec<String>>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a list of strings or a comma-separated string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.split(',').map(|s| s.trim().to_string()).collect()))
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut codes = Vec::new();
            while let Some(code) = seq.next_element::<String>()? {
                codes.push(code);
            }
            Ok(Some(codes))
        }
    }

    deserializer.deserialize_any(ListOrString)
}
