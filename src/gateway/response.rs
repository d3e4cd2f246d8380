use serde::Serialize;
use serde_json::Value;

use crate::api::types::Table;
use crate::output::table_to_json;

const SUCCESS: &str = "success";

/// Successful response body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Data {
        status: &'static str,
        data: Value,
    },
    CorpCode {
        status: &'static str,
        company_name: String,
        corp_code: String,
    },
    Download {
        status: &'static str,
        download_url: String,
    },
}

impl Envelope {
    pub fn data(data: Value) -> Self {
        Self::Data {
            status: SUCCESS,
            data,
        }
    }

    /// Normalized table as `data`
    pub fn table(table: Table) -> Self {
        Self::data(table_to_json(Some(&table)))
    }

    pub fn corp_code(company_name: impl Into<String>, corp_code: impl Into<String>) -> Self {
        Self::CorpCode {
            status: SUCCESS,
            company_name: company_name.into(),
            corp_code: corp_code.into(),
        }
    }

    pub fn download(download_url: impl Into<String>) -> Self {
        Self::Download {
            status: SUCCESS,
            download_url: download_url.into(),
        }
    }
}
