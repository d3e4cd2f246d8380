use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

/// A single scalar in a tabular result
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Text content, trimmed, when the cell holds a non-blank string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Null, or a float NaN (the upstream's missing-number marker)
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<NaiveDate> for Cell {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// Tabular result returned by the disclosure client.
///
/// Rows are positional: cell `i` of a row belongs to column `i`. A row
/// shorter than the column list is missing its trailing cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Builder form of `push_row`, handy for fixtures
    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Non-blank text value of `column` in row `row`
    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        self.get(row, column).and_then(Cell::as_text)
    }

    /// Keep only rows for which `keep` returns true
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Table, &[Cell]) -> bool,
    {
        let rows = std::mem::take(&mut self.rows);
        let kept: Vec<Vec<Cell>> = rows
            .into_iter()
            .filter(|row| keep(self, row.as_slice()))
            .collect();
        self.rows = kept;
    }
}

/// Periodic report code (보고서 코드)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportCode {
    /// 사업보고서
    #[default]
    Annual,
    /// 반기보고서
    HalfYear,
    /// 1분기보고서
    Q1,
    /// 3분기보고서
    Q3,
}

impl ReportCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Annual => "11011",
            Self::HalfYear => "11012",
            Self::Q1 => "11013",
            Self::Q3 => "11014",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Annual => "사업보고서",
            Self::HalfYear => "반기보고서",
            Self::Q1 => "1분기보고서",
            Self::Q3 => "3분기보고서",
        }
    }
}

impl FromStr for ReportCode {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "11011" | "annual" => Ok(Self::Annual),
            "11012" | "half" | "half_year" => Ok(Self::HalfYear),
            "11013" | "q1" => Ok(Self::Q1),
            "11014" | "q3" => Ok(Self::Q3),
            _ => Err(GatewayError::InvalidInput(format!(
                "reprt_code must be one of 11011, 11012, 11013, 11014 (got '{}')",
                s
            ))),
        }
    }
}

/// Consolidated vs. separate financial statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FsDiv {
    /// 연결재무제표
    #[default]
    Cfs,
    /// 개별(별도)재무제표
    Ofs,
}

impl FsDiv {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cfs => "CFS",
            Self::Ofs => "OFS",
        }
    }
}

impl FromStr for FsDiv {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CFS" | "CONSOLIDATED" => Ok(Self::Cfs),
            "OFS" | "SEPARATE" => Ok(Self::Ofs),
            _ => Err(GatewayError::InvalidInput(format!(
                "fs_div must be CFS or OFS (got '{}')",
                s
            ))),
        }
    }
}

/// Receipt-date bounds forwarded to the registry, as `YYYYMMDD`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    Unbounded,
    Since(String),
    Between(String, String),
}

impl DateRange {
    /// Build from optional bounds. An end date without a start date is
    /// ignored.
    pub fn from_bounds(start: Option<String>, end: Option<String>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => Self::Between(start, end),
            (Some(start), None) => Self::Since(start),
            (None, _) => Self::Unbounded,
        }
    }

    pub fn start(&self) -> Option<&str> {
        match self {
            Self::Unbounded => None,
            Self::Since(start) | Self::Between(start, _) => Some(start),
        }
    }

    pub fn end(&self) -> Option<&str> {
        match self {
            Self::Between(_, end) => Some(end),
            _ => None,
        }
    }
}

/// Normalize a `YYYY-MM-DD` or `YYYYMMDD` date into `YYYYMMDD`
pub fn parse_date(field: &str, value: &str) -> Result<String, GatewayError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .map(|d| d.format("%Y%m%d").to_string())
        .map_err(|_| {
            GatewayError::InvalidInput(format!(
                "{} must be YYYY-MM-DD or YYYYMMDD (got '{}')",
                field, value
            ))
        })
}

/// Disclosure listing filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    /// Disclosure type letter (A = 정기공시 ... J = 공정위공시)
    pub kind: Option<String>,
    /// Detailed disclosure type (e.g. A001)
    pub kind_detail: Option<String>,
    /// Only the final version of amended filings
    pub final_only: bool,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            kind: None,
            kind_detail: None,
            final_only: true,
        }
    }
}

/// Validate a disclosure type letter
pub fn parse_kind(value: &str) -> Result<String, GatewayError> {
    let kind = value.trim().to_uppercase();
    match kind.as_str() {
        "A" | "B" | "C" | "D" | "E" | "F" | "G" | "H" | "I" | "J" => Ok(kind),
        _ => Err(GatewayError::InvalidInput(format!(
            "kind must be a disclosure type letter A-J (got '{}')",
            value
        ))),
    }
}

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => ($keyword:literal, $alias:literal, $endpoint:literal),)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant,)+];

            /// Korean keyword used by the registry's documentation
            pub fn keyword(&self) -> &'static str {
                match self {
                    $(Self::$variant => $keyword,)+
                }
            }

            pub fn alias(&self) -> &'static str {
                match self {
                    $(Self::$variant => $alias,)+
                }
            }

            /// OpenDART endpoint file name
            pub fn endpoint(&self) -> &'static str {
                match self {
                    $(Self::$variant => $endpoint,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = GatewayError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.keyword() == s || v.alias().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        GatewayError::InvalidInput(format!("unknown {} '{}'", $field, s))
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.keyword())
            }
        }
    };
}

keyword_enum! {
    /// Periodic-report sections (사업보고서 주요정보)
    ReportSection, "keyword" {
        CapitalChanges => ("증자", "capital_changes", "irdsSttus.json"),
        Dividends => ("배당", "dividends", "alotMatter.json"),
        TreasuryStock => ("자기주식", "treasury_stock", "tesstkAcqsDspsSttus.json"),
        LargestShareholders => ("최대주주", "shareholders", "hyslrSttus.json"),
        LargestShareholderChanges => ("최대주주변동", "shareholder_changes", "hyslrChgSttus.json"),
        MinorityShareholders => ("소액주주", "minority_shareholders", "mrhlSttus.json"),
        Executives => ("임원", "executives", "exctvSttus.json"),
        Employees => ("직원", "employees", "empSttus.json"),
        ExecutiveIndividualPay => ("임원개인보수", "executive_individual_pay", "hmvAuditIndvdlBySttus.json"),
        ExecutiveTotalPay => ("임원전체보수", "executive_total_pay", "hmvAuditAllSttus.json"),
        IndividualPay => ("개인별보수", "individual_pay", "indvdlByPay.json"),
        OtherCorpInvestments => ("타법인출자", "investments", "otrCprInvstmntSttus.json"),
        TotalShares => ("주식총수", "total_shares", "stockTotqySttus.json"),
        AuditOpinion => ("회계감사", "audit_opinion", "accnutAdtorNmNdAdtOpinion.json"),
        AuditServices => ("감사용역", "audit_services", "adtServcCnclsSttus.json"),
        NonAuditServices => ("회계감사용역계약", "non_audit_services", "accnutAdtorNonAdtServcCnclsSttus.json"),
        OutsideDirectors => ("사외이사", "outside_directors", "outcmpnyDrctrNdChangeSttus.json"),
        UnregisteredExecutivePay => ("미등기임원보수", "unregistered_executive_pay", "unrstExctvMendngSttus.json"),
        DebtSecuritiesIssued => ("채무증권발행", "debt_securities", "detScritsIsuAcmslt.json"),
        CorporateBondsOutstanding => ("회사채미상환", "corporate_bonds", "cprndNrdmpBlce.json"),
        CommercialPaperOutstanding => ("기업어음미상환", "commercial_paper", "entrprsBilScritsNrdmpBlce.json"),
        ShortTermBondsOutstanding => ("단기사채미상환", "short_term_bonds", "srtpdPsndbtNrdmpBlce.json"),
        HybridSecuritiesOutstanding => ("신종자본증권미상환", "hybrid_securities", "newCaplScritsNrdmpBlce.json"),
        ContingentCapitalOutstanding => ("조건부자본증권미상환", "contingent_capital", "cndlCaplScritsNrdmpBlce.json"),
        PublicOfferingFunds => ("공모자금사용", "public_offering_funds", "pssrpCptalUseDtls.json"),
        PrivatePlacementFunds => ("사모자금사용", "private_placement_funds", "prvsrpCptalUseDtls.json"),
    }
}

keyword_enum! {
    /// Major-event report types (주요사항보고서)
    EventType, "event_type" {
        Bankruptcy => ("부도발생", "bankruptcy", "dfOcr.json"),
        BusinessSuspension => ("영업정지", "business_suspension", "bsnSp.json"),
        Rehabilitation => ("회생절차", "rehabilitation", "ctrcvsBgrq.json"),
        Dissolution => ("해산사유", "dissolution", "dsRsOcr.json"),
        PaidInCapitalIncrease => ("유상증자", "paid_in_capital_increase", "piicDecsn.json"),
        BonusIssue => ("무상증자", "bonus_issue", "fricDecsn.json"),
        MixedCapitalIncrease => ("유무상증자", "mixed_capital_increase", "pifricDecsn.json"),
        CapitalReduction => ("감자", "capital_reduction", "crDecsn.json"),
        CreditorManagement => ("관리절차개시", "creditor_management", "bnkMngtPcbg.json"),
        CreditorManagementEnded => ("관리절차중단", "creditor_management_ended", "bnkMngtPcsp.json"),
        Litigation => ("소송", "litigation", "lwstLg.json"),
        OverseasListingDecision => ("해외상장결정", "overseas_listing_decision", "ovLstDecsn.json"),
        OverseasDelistingDecision => ("해외상장폐지결정", "overseas_delisting_decision", "ovDlstDecsn.json"),
        OverseasListing => ("해외상장", "overseas_listing", "ovLst.json"),
        OverseasDelisting => ("해외상장폐지", "overseas_delisting", "ovDlst.json"),
        ConvertibleBonds => ("전환사채발행", "convertible_bonds", "cvbdIsDecsn.json"),
        BondsWithWarrants => ("신주인수권부사채발행", "bonds_with_warrants", "bdwtIsDecsn.json"),
        ExchangeableBonds => ("교환사채발행", "exchangeable_bonds", "exbdIsDecsn.json"),
        ContingentCapitalIssue => ("조건부자본증권발행", "contingent_capital_issue", "wdCocobdIsDecsn.json"),
        AssetTransfer => ("자산양수도", "asset_transfer", "astInhtrfEtcPtbkOpt.json"),
        OtherCorpStockSale => ("타법인증권양도", "other_corp_stock_sale", "otcprStkInvscrTrfDecsn.json"),
        TangibleAssetSale => ("유형자산양도", "tangible_asset_sale", "tgastTrfDecsn.json"),
        TangibleAssetPurchase => ("유형자산양수", "tangible_asset_purchase", "tgastInhDecsn.json"),
        OtherCorpStockPurchase => ("타법인증권양수", "other_corp_stock_purchase", "otcprStkInvscrInhDecsn.json"),
        BusinessSale => ("영업양도", "business_sale", "bsnTrfDecsn.json"),
        BusinessPurchase => ("영업양수", "business_purchase", "bsnInhDecsn.json"),
        TreasuryTrustTermination => ("자기주식취득신탁계약해지", "treasury_trust_termination", "tsstkAqTrctrCcDecsn.json"),
        TreasuryTrustContract => ("자기주식취득신탁계약체결", "treasury_trust_contract", "tsstkAqTrctrCnsDecsn.json"),
        TreasuryStockDisposal => ("자기주식처분", "treasury_stock_disposal", "tsstkDpDecsn.json"),
        TreasuryStockAcquisition => ("자기주식취득", "treasury_stock_acquisition", "tsstkAqDecsn.json"),
        StockExchange => ("주식교환", "stock_exchange", "stkExtrDecsn.json"),
        SplitMerger => ("회사분할합병", "split_merger", "cmpDvmgDecsn.json"),
        Split => ("회사분할", "split", "cmpDvDecsn.json"),
        Merger => ("회사합병", "merger", "cmpMgDecsn.json"),
        BondPurchase => ("사채권양수", "bond_purchase", "stkrtbdInhDecsn.json"),
        BondSale => ("사채권양도", "bond_sale", "stkrtbdTrfDecsn.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_code_defaults_to_annual() {
        assert_eq!(ReportCode::default().code(), "11011");
        assert_eq!("11012".parse::<ReportCode>().unwrap(), ReportCode::HalfYear);
        assert_eq!("q3".parse::<ReportCode>().unwrap(), ReportCode::Q3);
        assert!("99999".parse::<ReportCode>().is_err());
    }

    #[test]
    fn test_fs_div_defaults_to_consolidated() {
        assert_eq!(FsDiv::default(), FsDiv::Cfs);
        assert_eq!("ofs".parse::<FsDiv>().unwrap(), FsDiv::Ofs);
        assert!("XFS".parse::<FsDiv>().is_err());
    }

    #[test]
    fn test_code_errors_echo_input_as_given() {
        let err = "Quarterly".parse::<ReportCode>().unwrap_err();
        assert!(err.to_string().contains("'Quarterly'"), "{}", err);

        let err = "cfx".parse::<FsDiv>().unwrap_err();
        assert!(err.to_string().contains("'cfx'"), "{}", err);
    }

    #[test]
    fn test_date_range_variants() {
        assert_eq!(DateRange::from_bounds(None, None), DateRange::Unbounded);
        assert_eq!(
            DateRange::from_bounds(Some("20240101".into()), None),
            DateRange::Since("20240101".into())
        );
        assert_eq!(
            DateRange::from_bounds(Some("20240101".into()), Some("20240131".into())),
            DateRange::Between("20240101".into(), "20240131".into())
        );
        // end without start is dropped
        assert_eq!(
            DateRange::from_bounds(None, Some("20240131".into())),
            DateRange::Unbounded
        );
    }

    #[test]
    fn test_parse_date_accepts_both_forms() {
        assert_eq!(parse_date("start_date", "2024-03-05").unwrap(), "20240305");
        assert_eq!(parse_date("start_date", "20240305").unwrap(), "20240305");
        let err = parse_date("end_date", "March 5").unwrap_err();
        assert!(err.to_string().contains("end_date"));
    }

    #[test]
    fn test_section_and_event_keywords() {
        assert_eq!("배당".parse::<ReportSection>().unwrap(), ReportSection::Dividends);
        assert_eq!(
            "Shareholders".parse::<ReportSection>().unwrap(),
            ReportSection::LargestShareholders
        );
        assert_eq!(ReportSection::Dividends.endpoint(), "alotMatter.json");
        assert_eq!("감자".parse::<EventType>().unwrap(), EventType::CapitalReduction);
        assert!("주가".parse::<EventType>().is_err());
    }

    #[test]
    fn test_table_text_trims_blank_cells() {
        let table = Table::new(["corp_code", "stock_code"])
            .with_row(vec![Cell::from("00126380"), Cell::from(" ")]);
        assert_eq!(table.text(0, "corp_code"), Some("00126380"));
        assert_eq!(table.text(0, "stock_code"), None);
        assert_eq!(table.text(1, "corp_code"), None);
        assert_eq!(table.text(0, "missing"), None);
    }

    #[test]
    fn test_kind_letters() {
        assert_eq!(parse_kind("a").unwrap(), "A");
        assert!(parse_kind("Z").is_err());
    }
}
