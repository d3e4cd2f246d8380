//! Query-type dispatch table.
//!
//! Each route names the request fields it requires, whether it needs a
//! corporate code, and the handler that maps the request onto one
//! disclosure-client call. Required fields are checked before the handler
//! runs, so a rejected request never reaches the registry.

use futures::future::BoxFuture;
use log::{debug, info};
use serde_json::Value;

use super::request::{Field, QueryRequest};
use super::response::Envelope;
use crate::api::types::*;
use crate::api::{viewer, DisclosureClient};
use crate::error::{GatewayError, Result};

/// Everything a handler sees
#[derive(Clone, Copy)]
pub struct Ctx<'a> {
    pub client: &'a dyn DisclosureClient,
    pub request: &'a QueryRequest,
    pub query_type: &'static str,
}

pub type Handler = for<'a> fn(Ctx<'a>) -> BoxFuture<'a, Result<Envelope>>;

pub struct Route {
    pub query_type: &'static str,
    /// Fields that must be present and non-blank
    pub required: &'static [Field],
    /// Needs `corp_code` or a resolvable `company`
    pub needs_corp: bool,
    pub run: Handler,
}

impl Route {
    /// Reject requests missing a required field
    pub fn validate(&self, request: &QueryRequest) -> Result<()> {
        if let Some(field) = self.required.iter().find(|f| !request.has(**f)) {
            return Err(GatewayError::missing_field(self.query_type, field.name()));
        }
        if self.needs_corp && request.corp_code().is_none() && !request.has(Field::Company) {
            return Err(GatewayError::missing_field(self.query_type, Field::Company.name()));
        }
        Ok(())
    }
}

macro_rules! route {
    ($query_type:literal, [$($field:ident),*], $needs_corp:expr, $handler:ident) => {
        Route {
            query_type: $query_type,
            required: &[$(Field::$field),*],
            needs_corp: $needs_corp,
            run: {
                fn run<'a>(cx: Ctx<'a>) -> BoxFuture<'a, Result<Envelope>> {
                    Box::pin($handler(cx))
                }
                run
            },
        }
    };
}

pub static ROUTES: &[Route] = &[
    route!("disclosure", [], true, disclosure),
    route!("report", [], true, periodic_report_list),
    route!("company_info", [Company], false, company_info),
    route!("company_code", [Company], false, company_code),
    route!("find_corp_code", [Company], false, find_corp_code),
    route!("company_names", [Company], false, company_names),
    route!("company_profile", [], true, company_profile),
    route!("disclosure_by_date", [Date], false, disclosure_by_date),
    route!("disclosure_by_ticker", [], false, disclosure_by_ticker),
    route!("report_content", [BsnsYear], true, report_content),
    route!("finstate_all", [BsnsYear], true, finstate_all),
    route!("finstate_multi", [CorpCodes, BsnsYear], false, finstate_multi),
    route!("finstate_account", [BsnsYear, AccountName], true, finstate_account),
    route!("report_section", [BsnsYear, Keyword], true, report_section),
    route!("shareholders", [BsnsYear], true, shareholders),
    route!("shareholder_changes", [BsnsYear], true, shareholder_changes),
    route!("executives", [BsnsYear], true, executives),
    route!("employees", [BsnsYear], true, employees),
    route!("dividends", [BsnsYear], true, dividends),
    route!("capital_changes", [BsnsYear], true, capital_changes),
    route!("treasury_stock", [BsnsYear], true, treasury_stock),
    route!("audit_opinion", [BsnsYear], true, audit_opinion),
    route!("major_shareholders", [], true, major_shareholders),
    route!("exec_shareholders", [], true, exec_shareholders),
    route!("event", [EventType], true, event),
    route!("delisting", [], true, delisting),
    route!("attachments", [RcpNo], false, attachments),
    route!("sub_docs", [RcpNo], false, sub_docs),
    route!("file_url", [RcpNo], false, file_url),
];

pub fn find_route(query_type: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| r.query_type == query_type)
}

/// Supported query type tags, in table order
pub fn query_types() -> Vec<&'static str> {
    ROUTES.iter().map(|r| r.query_type).collect()
}

/// Corporate code to query with, plus the ticker when resolution found one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCorp {
    pub corp_code: String,
    pub stock_code: Option<String>,
}

impl<'a> Ctx<'a> {
    fn required(&self, field: Field) -> Result<&'a str> {
        self.request
            .text(field)
            .ok_or_else(|| GatewayError::missing_field(self.query_type, field.name()))
    }

    /// A direct `corp_code` wins; otherwise `company` is looked up by name
    /// or ticker.
    pub async fn resolve_corp(&self) -> Result<ResolvedCorp> {
        if let Some(corp_code) = self.request.corp_code() {
            return Ok(ResolvedCorp {
                corp_code: corp_code.to_string(),
                stock_code: None,
            });
        }

        let company = self.required(Field::Company)?;
        self.lookup(company).await
    }

    /// Registry lookup of a name or ticker. No profile requests are made.
    async fn lookup(&self, company: &str) -> Result<ResolvedCorp> {
        let entry = self
            .client
            .lookup_corp(company)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("Company '{}' not found", company)))?;

        let corp_code = entry.corp_code.trim();
        if corp_code.is_empty() {
            return Err(GatewayError::NotFound(format!(
                "No corporate code found for company '{}'",
                company
            )));
        }
        debug!("Resolved '{}' to corp_code {}", company, corp_code);

        Ok(ResolvedCorp {
            corp_code: corp_code.to_string(),
            stock_code: entry
                .stock_code
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    pub fn date_range(&self) -> Result<DateRange> {
        let start = self
            .request
            .start_date()
            .map(|d| parse_date("start_date", d))
            .transpose()?;
        let end = self
            .request
            .end_date()
            .map(|d| parse_date("end_date", d))
            .transpose()?;
        Ok(DateRange::from_bounds(start, end))
    }

    pub fn list_filter(&self, kind: Option<&str>) -> Result<ListFilter> {
        let kind = match kind.or(self.request.kind()) {
            Some(kind) => Some(parse_kind(kind)?),
            None => None,
        };
        Ok(ListFilter {
            kind,
            kind_detail: self.request.kind_detail().map(str::to_uppercase),
            final_only: self.request.final_only.unwrap_or(true),
        })
    }

    pub fn report_code(&self) -> Result<ReportCode> {
        self.request
            .reprt_code()
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    pub fn fs_div(&self) -> Result<FsDiv> {
        self.request
            .fs_div()
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }

    pub fn bsns_year(&self) -> Result<&'a str> {
        let year = self.required(Field::BsnsYear)?;
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(GatewayError::InvalidInput(format!(
                "bsns_year must be a four-digit year (got '{}')",
                year
            )));
        }
        Ok(year)
    }
}

async fn disclosure(cx: Ctx<'_>) -> Result<Envelope> {
    let range = cx.date_range()?;
    let filter = cx.list_filter(None)?;
    let corp = cx.resolve_corp().await?;
    let table = cx.client.list(&corp.corp_code, &range, &filter).await?;
    Ok(Envelope::table(table))
}

/// Periodic reports only (disclosure type A)
async fn periodic_report_list(cx: Ctx<'_>) -> Result<Envelope> {
    let range = cx.date_range()?;
    let filter = cx.list_filter(Some("A"))?;
    let corp = cx.resolve_corp().await?;
    let table = cx.client.list(&corp.corp_code, &range, &filter).await?;
    Ok(Envelope::table(table))
}

async fn company_info(cx: Ctx<'_>) -> Result<Envelope> {
    let company = cx.required(Field::Company)?;
    let table = cx.client.company_by_name(company).await?;
    Ok(Envelope::table(table))
}

async fn company_code(cx: Ctx<'_>) -> Result<Envelope> {
    let company = cx.required(Field::Company)?;
    let corp = cx.lookup(company).await?;
    Ok(Envelope::corp_code(cx.request.company.clone(), corp.corp_code))
}

async fn find_corp_code(cx: Ctx<'_>) -> Result<Envelope> {
    let company = cx.required(Field::Company)?;
    match cx.client.find_corp_code(company).await? {
        Some(code) => Ok(Envelope::data(Value::String(code))),
        None => Err(GatewayError::NotFound(format!("Company '{}' not found", company))),
    }
}

async fn company_names(cx: Ctx<'_>) -> Result<Envelope> {
    let keyword = cx.required(Field::Company)?;
    let names = cx.client.company_names(keyword).await?;
    Ok(Envelope::data(Value::from(names)))
}

async fn company_profile(cx: Ctx<'_>) -> Result<Envelope> {
    let corp = cx.resolve_corp().await?;
    let table = cx.client.company(&corp.corp_code).await?;
    Ok(Envelope::table(table))
}

async fn disclosure_by_date(cx: Ctx<'_>) -> Result<Envelope> {
    let date = parse_date("date", cx.required(Field::Date)?)?;
    let final_only = cx.request.final_only.unwrap_or(true);
    let table = cx.client.list_by_date(&date, final_only).await?;
    Ok(Envelope::table(table))
}

/// Ticker listing; companies without a ticker fall back to the generic
/// listing by corporate code.
async fn disclosure_by_ticker(cx: Ctx<'_>) -> Result<Envelope> {
    let range = cx.date_range()?;
    let filter = cx.list_filter(None)?;

    if let Some(stock_code) = cx.request.stock_code() {
        let table = cx.client.list_by_ticker(stock_code, &range, &filter).await?;
        return Ok(Envelope::table(table));
    }

    let corp = cx.resolve_corp().await?;
    let table = match &corp.stock_code {
        Some(stock_code) => cx.client.list_by_ticker(stock_code, &range, &filter).await?,
        None => {
            info!(
                "No ticker for corp_code {}, listing by corporate code",
                corp.corp_code
            );
            cx.client.list(&corp.corp_code, &range, &filter).await?
        }
    };
    Ok(Envelope::table(table))
}

async fn report_content(cx: Ctx<'_>) -> Result<Envelope> {
    let year = cx.bsns_year()?;
    let reprt_code = cx.report_code()?;
    let corp = cx.resolve_corp().await?;
    let table = cx.client.finstate(&corp.corp_code, year, reprt_code).await?;
    Ok(Envelope::table(table))
}

async fn finstate_all(cx: Ctx<'_>) -> Result<Envelope> {
    let year = cx.bsns_year()?;
    let reprt_code = cx.report_code()?;
    let fs_div = cx.fs_div()?;
    let corp = cx.resolve_corp().await?;
    let table = cx
        .client
        .finstate_all(&corp.corp_code, year, reprt_code, fs_div)
        .await?;
    Ok(Envelope::table(table))
}

async fn finstate_multi(cx: Ctx<'_>) -> Result<Envelope> {
    let year = cx.bsns_year()?;
    let reprt_code = cx.report_code()?;
    let corp_codes = cx.request.corp_codes();
    let table = cx.client.finstate_multi(&corp_codes, year, reprt_code).await?;
    Ok(Envelope::table(table))
}

async fn finstate_account(cx: Ctx<'_>) -> Result<Envelope> {
    let year = cx.bsns_year()?;
    let account_name = cx.required(Field::AccountName)?;
    let reprt_code = cx.report_code()?;
    let fs_div = cx.fs_div()?;
    let corp = cx.resolve_corp().await?;
    let table = cx
        .client
        .finstate_account(&corp.corp_code, year, reprt_code, fs_div, account_name)
        .await?;
    Ok(Envelope::table(table))
}

async fn report_section(cx: Ctx<'_>) -> Result<Envelope> {
    let section: ReportSection = cx.required(Field::Keyword)?.parse()?;
    report_section_with(cx, section).await
}

async fn report_section_with(cx: Ctx<'_>, section: ReportSection) -> Result<Envelope> {
    let year = cx.bsns_year()?;
    let reprt_code = cx.report_code()?;
    let corp = cx.resolve_corp().await?;
    let table = cx
        .client
        .report(&corp.corp_code, section, year, reprt_code)
        .await?;
    Ok(Envelope::table(table))
}

async fn shareholders(cx: Ctx<'_>) -> Result<Envelope> {
    report_section_with(cx, ReportSection::LargestShareholders).await
}

async fn shareholder_changes(cx: Ctx<'_>) -> Result<Envelope> {
    report_section_with(cx, ReportSection::LargestShareholderChanges).await
}

async fn executives(cx: Ctx<'_>) -> Result<Envelope> {
    report_section_with(cx, ReportSection::Executives).await
}

async fn employees(cx: Ctx<'_>) -> Result<Envelope> {
    report_section_with(cx, ReportSection::Employees).await
}

async fn dividends(cx: Ctx<'_>) -> Result<Envelope> {
    report_section_with(cx, ReportSection::Dividends).await
}

async fn capital_changes(cx: Ctx<'_>) -> Result<Envelope> {
    report_section_with(cx, ReportSection::CapitalChanges).await
}

async fn treasury_stock(cx: Ctx<'_>) -> Result<Envelope> {
    report_section_with(cx, ReportSection::TreasuryStock).await
}

async fn audit_opinion(cx: Ctx<'_>) -> Result<Envelope> {
    report_section_with(cx, ReportSection::AuditOpinion).await
}

async fn major_shareholders(cx: Ctx<'_>) -> Result<Envelope> {
    let corp = cx.resolve_corp().await?;
    let table = cx.client.major_shareholders(&corp.corp_code).await?;
    Ok(Envelope::table(table))
}

async fn exec_shareholders(cx: Ctx<'_>) -> Result<Envelope> {
    let corp = cx.resolve_corp().await?;
    let table = cx.client.major_shareholders_exec(&corp.corp_code).await?;
    Ok(Envelope::table(table))
}

async fn event(cx: Ctx<'_>) -> Result<Envelope> {
    let event_type: EventType = cx.required(Field::EventType)?.parse()?;
    event_with(cx, event_type).await
}

async fn delisting(cx: Ctx<'_>) -> Result<Envelope> {
    event_with(cx, EventType::OverseasDelisting).await
}

async fn event_with(cx: Ctx<'_>, event_type: EventType) -> Result<Envelope> {
    let range = cx.date_range()?;
    let corp = cx.resolve_corp().await?;
    let table = cx.client.event(&corp.corp_code, event_type, &range).await?;
    Ok(Envelope::table(table))
}

async fn attachments(cx: Ctx<'_>) -> Result<Envelope> {
    let rcp_no = cx.required(Field::RcpNo)?;
    let table = cx.client.attach_doc_list(rcp_no).await?;
    Ok(Envelope::table(table))
}

async fn sub_docs(cx: Ctx<'_>) -> Result<Envelope> {
    let rcp_no = cx.required(Field::RcpNo)?;
    let table = cx.client.sub_docs(rcp_no).await?;
    Ok(Envelope::table(table))
}

async fn file_url(cx: Ctx<'_>) -> Result<Envelope> {
    let rcp_no = cx.required(Field::RcpNo)?;
    Ok(Envelope::download(viewer::build_url(rcp_no)))
}
