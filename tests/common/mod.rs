//! Recording in-memory disclosure client shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;

use dart_gateway::api::corp_codes::CorpEntry;
use dart_gateway::api::types::*;
use dart_gateway::api::DisclosureClient;
use dart_gateway::error::{GatewayError, Result};
use dart_gateway::gateway::{AuthKey, Gateway, QueryRequest};

pub const SECRET: &str = "test-secret";

/// One recorded client call: method name plus its arguments rendered as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub args: Vec<String>,
}

pub struct Company {
    pub name: &'static str,
    pub corp_code: &'static str,
    pub stock_code: Option<&'static str>,
}

pub const SAMSUNG: Company = Company {
    name: "삼성전자",
    corp_code: "00126380",
    stock_code: Some("005930"),
};

pub const UNLISTED: Company = Company {
    name: "비상장회사",
    corp_code: "00999999",
    stock_code: None,
};

/// Registry row whose corporate code is blank
pub const NO_CODE: Company = Company {
    name: "코드없는회사",
    corp_code: " ",
    stock_code: None,
};

#[derive(Default)]
pub struct FakeClient {
    companies: Vec<Company>,
    upstream_error: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            companies: vec![SAMSUNG, UNLISTED, NO_CODE],
            ..Default::default()
        }
    }

    /// Every lookup fails the way an upstream outage does
    pub fn failing() -> Self {
        Self {
            upstream_error: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.method == method).collect()
    }

    fn record(&self, method: &'static str, args: Vec<String>) -> Result<()> {
        self.calls.lock().unwrap().push(Call { method, args });
        if self.upstream_error {
            return Err(GatewayError::api_error("800", "시스템 점검으로 인한 서비스가 중지 중입니다.", None));
        }
        Ok(())
    }

    fn sample(&self, label: &str) -> Table {
        Table::new(["rcept_no", "report_nm", "rcept_dt", "rm"]).with_row(vec![
            Cell::from("20240312000736"),
            Cell::from(label),
            Cell::from(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()),
            Cell::Null,
        ])
    }
}

fn range_args(range: &DateRange) -> [String; 2] {
    [
        range.start().unwrap_or("-").to_string(),
        range.end().unwrap_or("-").to_string(),
    ]
}

fn filter_args(filter: &ListFilter) -> [String; 2] {
    [
        filter.kind.clone().unwrap_or_else(|| "-".to_string()),
        filter.final_only.to_string(),
    ]
}

#[async_trait]
impl DisclosureClient for FakeClient {
    async fn list(&self, corp_code: &str, range: &DateRange, filter: &ListFilter) -> Result<Table> {
        let mut args = vec![corp_code.to_string()];
        args.extend(range_args(range));
        args.extend(filter_args(filter));
        self.record("list", args)?;
        Ok(self.sample("사업보고서 (2023.12)"))
    }

    async fn list_by_date(&self, date: &str, final_only: bool) -> Result<Table> {
        self.record("list_by_date", vec![date.to_string(), final_only.to_string()])?;
        Ok(self.sample("주요사항보고서"))
    }

    async fn list_by_ticker(
        &self,
        stock_code: &str,
        range: &DateRange,
        filter: &ListFilter,
    ) -> Result<Table> {
        let mut args = vec![stock_code.to_string()];
        args.extend(range_args(range));
        args.extend(filter_args(filter));
        self.record("list_by_ticker", args)?;
        Ok(self.sample("분기보고서"))
    }

    async fn company_by_name(&self, name: &str) -> Result<Table> {
        self.record("company_by_name", vec![name.to_string()])?;
        let mut table = Table::new(["corp_code", "corp_name", "stock_code"]);
        for company in self
            .companies
            .iter()
            .filter(|c| c.name == name || c.stock_code == Some(name))
        {
            table.push_row(vec![
                Cell::from(company.corp_code),
                Cell::from(company.name),
                company.stock_code.map(Cell::from).unwrap_or(Cell::Text(" ".to_string())),
            ]);
        }
        Ok(table)
    }

    async fn company_names(&self, keyword: &str) -> Result<Vec<String>> {
        self.record("company_names", vec![keyword.to_string()])?;
        Ok(self
            .companies
            .iter()
            .filter(|c| c.name.contains(keyword))
            .map(|c| c.name.to_string())
            .collect())
    }

    async fn lookup_corp(&self, name: &str) -> Result<Option<CorpEntry>> {
        self.record("lookup_corp", vec![name.to_string()])?;
        Ok(self
            .companies
            .iter()
            .find(|c| c.name == name || c.stock_code == Some(name))
            .map(|c| CorpEntry {
                corp_code: c.corp_code.to_string(),
                corp_name: c.name.to_string(),
                stock_code: c.stock_code.map(str::to_string),
                modify_date: "20240101".to_string(),
            }))
    }

    async fn company(&self, corp_code: &str) -> Result<Table> {
        self.record("company", vec![corp_code.to_string()])?;
        Ok(Table::new(["corp_code", "ceo_nm"]).with_row(vec![Cell::from(corp_code), Cell::from("한종희")]))
    }

    async fn finstate(&self, corp_code: &str, bsns_year: &str, reprt_code: ReportCode) -> Result<Table> {
        self.record(
            "finstate",
            vec![corp_code.to_string(), bsns_year.to_string(), reprt_code.code().to_string()],
        )?;
        Ok(Table::new(["account_nm", "thstrm_amount"])
            .with_row(vec![Cell::from("매출액"), Cell::Float(f64::NAN)]))
    }

    async fn finstate_multi(
        &self,
        corp_codes: &[String],
        bsns_year: &str,
        reprt_code: ReportCode,
    ) -> Result<Table> {
        self.record(
            "finstate_multi",
            vec![corp_codes.join(","), bsns_year.to_string(), reprt_code.code().to_string()],
        )?;
        Ok(Table::new(["corp_code"]))
    }

    async fn finstate_all(
        &self,
        corp_code: &str,
        bsns_year: &str,
        reprt_code: ReportCode,
        fs_div: FsDiv,
    ) -> Result<Table> {
        self.record(
            "finstate_all",
            vec![
                corp_code.to_string(),
                bsns_year.to_string(),
                reprt_code.code().to_string(),
                fs_div.code().to_string(),
            ],
        )?;
        Ok(Table::new(["account_nm"]))
    }

    async fn finstate_account(
        &self,
        corp_code: &str,
        bsns_year: &str,
        reprt_code: ReportCode,
        fs_div: FsDiv,
        account_name: &str,
    ) -> Result<Table> {
        self.record(
            "finstate_account",
            vec![
                corp_code.to_string(),
                bsns_year.to_string(),
                reprt_code.code().to_string(),
                fs_div.code().to_string(),
                account_name.to_string(),
            ],
        )?;
        Ok(Table::new(["account_nm"]))
    }

    async fn report(
        &self,
        corp_code: &str,
        section: ReportSection,
        bsns_year: &str,
        reprt_code: ReportCode,
    ) -> Result<Table> {
        self.record(
            "report",
            vec![
                corp_code.to_string(),
                section.endpoint().to_string(),
                bsns_year.to_string(),
                reprt_code.code().to_string(),
            ],
        )?;
        Ok(Table::new(["se"]))
    }

    async fn major_shareholders(&self, corp_code: &str) -> Result<Table> {
        self.record("major_shareholders", vec![corp_code.to_string()])?;
        Ok(Table::new(["repror"]))
    }

    async fn major_shareholders_exec(&self, corp_code: &str) -> Result<Table> {
        self.record("major_shareholders_exec", vec![corp_code.to_string()])?;
        Ok(Table::new(["repror"]))
    }

    async fn event(&self, corp_code: &str, event: EventType, range: &DateRange) -> Result<Table> {
        let mut args = vec![corp_code.to_string(), event.endpoint().to_string()];
        args.extend(range_args(range));
        self.record("event", args)?;
        Ok(Table::new(["rcept_no"]))
    }

    async fn attach_doc_list(&self, rcp_no: &str) -> Result<Table> {
        self.record("attach_doc_list", vec![rcp_no.to_string()])?;
        Ok(Table::new(["title", "url"]).with_row(vec![
            Cell::from("감사보고서"),
            Cell::from(format!("https://dart.fss.or.kr/dsaf001/main.do?rcpNo={}", rcp_no)),
        ]))
    }

    async fn sub_docs(&self, rcp_no: &str) -> Result<Table> {
        self.record("sub_docs", vec![rcp_no.to_string()])?;
        Ok(Table::new(["title", "url"]))
    }
}

pub fn gateway_with(client: std::sync::Arc<FakeClient>) -> Gateway {
    Gateway::new(client, AuthKey::new(SECRET))
}

/// Authorized request for `query_type` about `company`
pub fn request(query_type: &str, company: &str) -> QueryRequest {
    QueryRequest {
        company: company.to_string(),
        query_type: query_type.to_string(),
        auth_key: SECRET.to_string(),
        ..Default::default()
    }
}
