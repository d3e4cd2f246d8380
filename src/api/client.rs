use async_trait::async_trait;

use super::corp_codes::CorpEntry;
use super::types::*;
use crate::error::Result;

/// Lookup surface of the disclosure registry.
///
/// The gateway depends on this trait only; the OpenDART client, test fakes
/// and fixtures are interchangeable behind an `Arc<dyn DisclosureClient>`.
#[async_trait]
pub trait DisclosureClient: Send + Sync {
    /// Disclosure listing for one company
    async fn list(&self, corp_code: &str, range: &DateRange, filter: &ListFilter) -> Result<Table>;

    /// Every company's disclosures received on `date` (YYYYMMDD)
    async fn list_by_date(&self, date: &str, final_only: bool) -> Result<Table>;

    /// Disclosure listing keyed by stock ticker
    async fn list_by_ticker(
        &self,
        stock_code: &str,
        range: &DateRange,
        filter: &ListFilter,
    ) -> Result<Table>;

    /// Company profiles matching a name or ticker. Rows carry at least
    /// `corp_code` and `stock_code`.
    async fn company_by_name(&self, name: &str) -> Result<Table>;

    /// Company names containing `keyword`
    async fn company_names(&self, keyword: &str) -> Result<Vec<String>>;

    /// Registry entry for a name, ticker or corporate code. Served from the
    /// corporate code registry alone, without fetching profiles.
    async fn lookup_corp(&self, name: &str) -> Result<Option<CorpEntry>>;

    /// Corporate code for a name or ticker, if any
    async fn find_corp_code(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lookup_corp(name).await?.map(|entry| entry.corp_code))
    }

    /// Company profile (기업개황)
    async fn company(&self, corp_code: &str) -> Result<Table>;

    /// Main accounts of a single company
    async fn finstate(&self, corp_code: &str, bsns_year: &str, reprt_code: ReportCode) -> Result<Table>;

    /// Main accounts of several companies
    async fn finstate_multi(
        &self,
        corp_codes: &[String],
        bsns_year: &str,
        reprt_code: ReportCode,
    ) -> Result<Table>;

    /// Full financial statements
    async fn finstate_all(
        &self,
        corp_code: &str,
        bsns_year: &str,
        reprt_code: ReportCode,
        fs_div: FsDiv,
    ) -> Result<Table>;

    /// Full financial statements restricted to accounts matching `account_name`
    async fn finstate_account(
        &self,
        corp_code: &str,
        bsns_year: &str,
        reprt_code: ReportCode,
        fs_div: FsDiv,
        account_name: &str,
    ) -> Result<Table>;

    /// One section of a periodic report
    async fn report(
        &self,
        corp_code: &str,
        section: ReportSection,
        bsns_year: &str,
        reprt_code: ReportCode,
    ) -> Result<Table>;

    /// Large shareholding reports (대량보유 상황보고)
    async fn major_shareholders(&self, corp_code: &str) -> Result<Table>;

    /// Executive and major shareholder ownership reports (임원ㆍ주요주주 소유보고)
    async fn major_shareholders_exec(&self, corp_code: &str) -> Result<Table>;

    /// Major-event reports of one type
    async fn event(&self, corp_code: &str, event: EventType, range: &DateRange) -> Result<Table>;

    /// Attached documents of a filing (`title`, `url`)
    async fn attach_doc_list(&self, rcp_no: &str) -> Result<Table>;

    /// Sub-documents of a filing (`title`, `url`)
    async fn sub_docs(&self, rcp_no: &str) -> Result<Table>;
}

pub const DEFAULT_BASE_URL: &str = "https://opendart.fss.or.kr/api";
pub const DEFAULT_VIEWER_URL: &str = "https://dart.fss.or.kr";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// OpenDART API key (crtfc_key)
    pub api_key: String,
    /// OpenDART API base URL
    pub base_url: String,
    /// Public filing viewer base URL
    pub viewer_url: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// User agent string
    pub user_agent: String,
    /// Upper bound on concurrent profile requests for one lookup
    pub max_concurrent: usize,
    /// Seconds before the corporate code registry is downloaded again
    pub registry_ttl: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            viewer_url: DEFAULT_VIEWER_URL.to_string(),
            timeout: 30,
            user_agent: format!("dart-gateway/{}", env!("CARGO_PKG_VERSION")),
            max_concurrent: 5,
            registry_ttl: 24 * 60 * 60,
        }
    }
}
