use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use reqwest::{Client, ClientBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::client::{ClientConfig, DisclosureClient};
use super::corp_codes::{CorpEntry, CorpRegistry};
use super::types::*;
use super::viewer;
use crate::error::{GatewayError, Result};

/// Columns the registry returns as `YYYYMMDD` dates
const DATE_COLUMNS: &[&str] = &["rcept_dt"];

/// Maximum page size accepted by `list.json`
const PAGE_COUNT: u32 = 100;

const LIST_START: &str = "19990101";
const EVENT_START: &str = "19000101";

/// Receipt dates are stamped in Korea Standard Time (UTC+9, no DST)
const KST_OFFSET_HOURS: i64 = 9;

/// Raw OpenDART JSON envelope
#[derive(Debug, Deserialize)]
struct OpenDartResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    list: Vec<Map<String, Value>>,
    #[serde(default)]
    total_page: Option<u32>,
    /// Single-record endpoints (company.json) put the record at top level
    #[serde(flatten)]
    rest: Map<String, Value>,
}

struct CachedRegistry {
    registry: Arc<CorpRegistry>,
    loaded_at: Instant,
}

/// OpenDART (전자공시 Open API) client
pub struct OpenDartClient {
    config: ClientConfig,
    http_client: Client,
    registry: Mutex<Option<CachedRegistry>>,
}

impl OpenDartClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(&config.user_agent)
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()?;

        Ok(Self {
            config,
            http_client,
            registry: Mutex::new(None),
        })
    }

    fn api_key(&self) -> Result<&str> {
        if self.config.api_key.is_empty() {
            return Err(GatewayError::NoApiKey);
        }
        Ok(&self.config.api_key)
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<reqwest::Url> {
        let mut query = vec![("crtfc_key", self.api_key()?.to_string())];
        query.extend(params.iter().map(|(k, v)| (*k, v.clone())));
        let base = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        reqwest::Url::parse_with_params(&base, &query).map_err(|e| GatewayError::Parse(e.to_string()))
    }

    async fn send(&self, url: reqwest::Url) -> Result<Response> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GatewayError::RateLimit);
        }
        if !status.is_success() {
            return Err(GatewayError::api_error(
                status.as_u16().to_string(),
                format!("OpenDART request failed with status {}", status),
                None,
            ));
        }
        Ok(response)
    }

    /// Call a JSON endpoint. `Ok(None)` means the registry has no data.
    async fn call(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Option<OpenDartResponse>> {
        let url = self.endpoint_url(endpoint, params)?;
        debug!("OpenDART GET {} {:?}", endpoint, params);

        let response_text = self.send(url).await?.text().await?;
        let raw: OpenDartResponse = serde_json::from_str(&response_text).map_err(|e| {
            GatewayError::Parse(format!(
                "Failed to parse {} response: {}. Response starts with: {}",
                endpoint,
                e,
                response_text.chars().take(100).collect::<String>()
            ))
        })?;

        check_status(raw)
    }

    async fn fetch_table(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Table> {
        match self.call(endpoint, params).await? {
            Some(raw) => Ok(table_from_records(raw.list)),
            None => Ok(Table::default()),
        }
    }

    /// Fetch every page of a `list.json` query
    async fn fetch_list(&self, params: Vec<(&str, String)>) -> Result<Table> {
        let mut records = Vec::new();
        let mut page: u32 = 1;
        loop {
            let mut page_params = params.clone();
            page_params.push(("page_no", page.to_string()));
            page_params.push(("page_count", PAGE_COUNT.to_string()));

            let Some(raw) = self.call("list.json", &page_params).await? else {
                break;
            };
            records.extend(raw.list);

            let total_page = raw.total_page.unwrap_or(1);
            if page >= total_page {
                break;
            }
            page += 1;
        }
        debug!("list.json returned {} records over {} page(s)", records.len(), page);
        Ok(table_from_records(records))
    }

    /// Corporate code registry, downloaded on first use and again once
    /// `registry_ttl` has passed. A failed refresh keeps the previous copy.
    async fn registry(&self) -> Result<Arc<CorpRegistry>> {
        let mut cached = self.registry.lock().await;
        let ttl = Duration::from_secs(self.config.registry_ttl);
        if let Some(entry) = cached.as_ref() {
            if entry.loaded_at.elapsed() < ttl {
                return Ok(entry.registry.clone());
            }
        }

        match self.download_registry().await {
            Ok(registry) => {
                let registry = Arc::new(registry);
                *cached = Some(CachedRegistry {
                    registry: registry.clone(),
                    loaded_at: Instant::now(),
                });
                Ok(registry)
            }
            Err(e) => match cached.as_mut() {
                Some(entry) => {
                    warn!("Corporate code refresh failed, keeping the loaded registry: {}", e);
                    entry.loaded_at = Instant::now();
                    Ok(entry.registry.clone())
                }
                None => Err(e),
            },
        }
    }

    async fn download_registry(&self) -> Result<CorpRegistry> {
        let url = self.endpoint_url("corpCode.xml", &[])?;
        info!("Downloading corporate code registry");
        let bytes = self.send(url).await?.bytes().await?;

        // Errors come back as JSON instead of a zip archive
        if bytes.first() == Some(&b'{') {
            let raw: OpenDartResponse = serde_json::from_slice(&bytes)?;
            check_status(raw)?;
            return Err(GatewayError::Parse(
                "corpCode.xml returned JSON without data".to_string(),
            ));
        }

        let registry = CorpRegistry::from_zip(&bytes)?;
        info!("Loaded {} corporate codes", registry.len());
        Ok(registry)
    }

    async fn fetch_viewer_page(&self, rcp_no: &str) -> Result<String> {
        let base = format!("{}/dsaf001/main.do", self.config.viewer_url.trim_end_matches('/'));
        let url = reqwest::Url::parse_with_params(&base, &[("rcpNo", rcp_no)])
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        Ok(self.send(url).await?.text().await?)
    }

    fn viewer_base(&self) -> &str {
        self.config.viewer_url.trim_end_matches('/')
    }
}

fn check_status(raw: OpenDartResponse) -> Result<Option<OpenDartResponse>> {
    let status = raw.status.clone();
    match status.as_str() {
        "000" => Ok(Some(raw)),
        "013" => Ok(None),
        "020" => Err(GatewayError::RateLimit),
        "010" | "011" | "012" | "901" => Err(GatewayError::api_error(
            raw.status,
            raw.message,
            Some("Check the OpenDART API key (DART_API_KEY).".to_string()),
        )),
        _ => {
            warn!("OpenDART returned status {}: {}", raw.status, raw.message);
            Err(GatewayError::api_error(raw.status, raw.message, None))
        }
    }
}

/// `YYYYMMDD` date in Korea at instant `now`
fn kst_date(now: DateTime<Utc>) -> String {
    (now + chrono::Duration::hours(KST_OFFSET_HOURS))
        .format("%Y%m%d")
        .to_string()
}

fn today() -> String {
    kst_date(Utc::now())
}

fn range_params(range: &DateRange, default_start: &str, today: &str) -> Vec<(&'static str, String)> {
    let start = range.start().unwrap_or(default_start).to_string();
    let end = range.end().unwrap_or(today).to_string();
    vec![("bgn_de", start), ("end_de", end)]
}

fn yes_no(flag: bool) -> String {
    let value = if flag { "Y" } else { "N" };
    value.to_string()
}

fn list_params(
    corp_code: &str,
    range: &DateRange,
    filter: &ListFilter,
    today: &str,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("corp_code", corp_code.to_string())];
    params.extend(range_params(range, LIST_START, today));
    params.push(("last_reprt_at", yes_no(filter.final_only)));
    if let Some(kind) = &filter.kind {
        params.push(("pblntf_ty", kind.clone()));
    }
    if let Some(detail) = &filter.kind_detail {
        params.push(("pblntf_detail_ty", detail.clone()));
    }
    params
}

fn cell_from_value(column: &str, value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
        },
        Value::String(s) if DATE_COLUMNS.contains(&column) => {
            match NaiveDate::parse_from_str(s.trim(), "%Y%m%d") {
                Ok(date) => Cell::Date(date),
                Err(_) if s.trim().is_empty() => Cell::Null,
                Err(_) => Cell::Text(s),
            }
        }
        Value::String(s) => Cell::Text(s),
        other => Cell::Text(other.to_string()),
    }
}

/// Turn JSON records into a table. Columns follow first appearance order;
/// a record lacking a column gets a null cell.
pub(crate) fn table_from_records(records: Vec<Map<String, Value>>) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::new(columns.clone());
    for mut record in records {
        let row = columns
            .iter()
            .map(|column| match record.remove(column) {
                Some(value) => cell_from_value(column, value),
                None => Cell::Null,
            })
            .collect();
        table.push_row(row);
    }
    table
}

#[async_trait]
impl DisclosureClient for OpenDartClient {
    async fn list(&self, corp_code: &str, range: &DateRange, filter: &ListFilter) -> Result<Table> {
        self.fetch_list(list_params(corp_code, range, filter, &today()))
            .await
    }

    async fn list_by_date(&self, date: &str, final_only: bool) -> Result<Table> {
        let params = vec![
            ("bgn_de", date.to_string()),
            ("end_de", date.to_string()),
            ("last_reprt_at", yes_no(final_only)),
        ];
        self.fetch_list(params).await
    }

    async fn list_by_ticker(
        &self,
        stock_code: &str,
        range: &DateRange,
        filter: &ListFilter,
    ) -> Result<Table> {
        let corp_code = self
            .registry()
            .await?
            .by_stock_code(stock_code)
            .map(|e| e.corp_code.clone())
            .ok_or_else(|| GatewayError::NotFound(format!("No company with ticker '{}'", stock_code)))?;
        self.list(&corp_code, range, filter).await
    }

    async fn company_by_name(&self, name: &str) -> Result<Table> {
        let corp_codes: Vec<String> = self
            .registry()
            .await?
            .find(name)
            .into_iter()
            .map(|e| e.corp_code.clone())
            .collect();
        debug!("'{}' matched {} registry entries", name, corp_codes.len());
        if corp_codes.is_empty() {
            return Ok(Table::default());
        }

        let profiles: Vec<Option<Map<String, Value>>> = stream::iter(corp_codes)
            .map(|code| async move {
                let raw = self.call("company.json", &[("corp_code", code)]).await?;
                Ok::<_, GatewayError>(raw.map(|r| r.rest))
            })
            .buffered(self.config.max_concurrent.max(1))
            .try_collect()
            .await?;

        Ok(table_from_records(profiles.into_iter().flatten().collect()))
    }

    async fn company_names(&self, keyword: &str) -> Result<Vec<String>> {
        Ok(self.registry().await?.names(keyword))
    }

    async fn lookup_corp(&self, name: &str) -> Result<Option<CorpEntry>> {
        let registry = self.registry().await?;
        let entry = registry.find(name).first().map(|e| (*e).clone());
        Ok(entry)
    }

    async fn company(&self, corp_code: &str) -> Result<Table> {
        match self.call("company.json", &[("corp_code", corp_code.to_string())]).await? {
            Some(raw) => Ok(table_from_records(vec![raw.rest])),
            None => Ok(Table::default()),
        }
    }

    async fn finstate(&self, corp_code: &str, bsns_year: &str, reprt_code: ReportCode) -> Result<Table> {
        let params = [
            ("corp_code", corp_code.to_string()),
            ("bsns_year", bsns_year.to_string()),
            ("reprt_code", reprt_code.code().to_string()),
        ];
        self.fetch_table("fnlttSinglAcnt.json", &params).await
    }

    async fn finstate_multi(
        &self,
        corp_codes: &[String],
        bsns_year: &str,
        reprt_code: ReportCode,
    ) -> Result<Table> {
        let params = [
            ("corp_code", corp_codes.join(",")),
            ("bsns_year", bsns_year.to_string()),
            ("reprt_code", reprt_code.code().to_string()),
        ];
        self.fetch_table("fnlttMultiAcnt.json", &params).await
    }

    async fn finstate_all(
        &self,
        corp_code: &str,
        bsns_year: &str,
        reprt_code: ReportCode,
        fs_div: FsDiv,
    ) -> Result<Table> {
        let params = [
            ("corp_code", corp_code.to_string()),
            ("bsns_year", bsns_year.to_string()),
            ("reprt_code", reprt_code.code().to_string()),
            ("fs_div", fs_div.code().to_string()),
        ];
        self.fetch_table("fnlttSinglAcntAll.json", &params).await
    }

    async fn finstate_account(
        &self,
        corp_code: &str,
        bsns_year: &str,
        reprt_code: ReportCode,
        fs_div: FsDiv,
        account_name: &str,
    ) -> Result<Table> {
        let mut table = self.finstate_all(corp_code, bsns_year, reprt_code, fs_div).await?;
        let account_name = account_name.trim();
        table.retain_rows(|t, row| {
            t.column_index("account_nm")
                .and_then(|i| row.get(i))
                .and_then(Cell::as_text)
                .is_some_and(|name| name.contains(account_name))
        });
        Ok(table)
    }

    async fn report(
        &self,
        corp_code: &str,
        section: ReportSection,
        bsns_year: &str,
        reprt_code: ReportCode,
    ) -> Result<Table> {
        let params = [
            ("corp_code", corp_code.to_string()),
            ("bsns_year", bsns_year.to_string()),
            ("reprt_code", reprt_code.code().to_string()),
        ];
        self.fetch_table(section.endpoint(), &params).await
    }

    async fn major_shareholders(&self, corp_code: &str) -> Result<Table> {
        self.fetch_table("majorstock.json", &[("corp_code", corp_code.to_string())])
            .await
    }

    async fn major_shareholders_exec(&self, corp_code: &str) -> Result<Table> {
        self.fetch_table("elestock.json", &[("corp_code", corp_code.to_string())])
            .await
    }

    async fn event(&self, corp_code: &str, event: EventType, range: &DateRange) -> Result<Table> {
        let mut params = vec![("corp_code", corp_code.to_string())];
        params.extend(range_params(range, EVENT_START, &today()));
        self.fetch_table(event.endpoint(), &params).await
    }

    async fn attach_doc_list(&self, rcp_no: &str) -> Result<Table> {
        let html = self.fetch_viewer_page(rcp_no).await?;
        Ok(viewer::parse_attachments(&html, self.viewer_base()))
    }

    async fn sub_docs(&self, rcp_no: &str) -> Result<Table> {
        let html = self.fetch_viewer_page(rcp_no).await?;
        Ok(viewer::parse_sub_docs(&html, self.viewer_base()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_table_from_records_parses_dates_and_fills_gaps() {
        let table = table_from_records(vec![
            record(json!({"corp_name": "삼성전자", "rcept_no": "20240312000736", "rcept_dt": "20240312"})),
            record(json!({"corp_name": "삼성전기", "rcept_no": "20240311000100", "rcept_dt": "20240311", "rm": "유"})),
        ]);
        assert_eq!(table.columns(), &["corp_name", "rcept_no", "rcept_dt", "rm"]);
        assert_eq!(
            table.get(0, "rcept_dt"),
            Some(&Cell::Date(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()))
        );
        assert_eq!(table.get(0, "rm"), Some(&Cell::Null));
        assert_eq!(table.text(1, "rm"), Some("유"));
    }

    #[test]
    fn test_check_status() {
        let ok: OpenDartResponse =
            serde_json::from_value(json!({"status": "000", "message": "정상", "list": []})).unwrap();
        assert!(check_status(ok).unwrap().is_some());

        let empty: OpenDartResponse =
            serde_json::from_value(json!({"status": "013", "message": "조회된 데이타가 없습니다."})).unwrap();
        assert!(check_status(empty).unwrap().is_none());

        let limited: OpenDartResponse =
            serde_json::from_value(json!({"status": "020", "message": "요청 제한을 초과하였습니다."})).unwrap();
        assert!(matches!(check_status(limited), Err(GatewayError::RateLimit)));

        let bad_key: OpenDartResponse =
            serde_json::from_value(json!({"status": "010", "message": "등록되지 않은 키입니다."})).unwrap();
        match check_status(bad_key) {
            Err(GatewayError::ApiError { code, hint, .. }) => {
                assert_eq!(code, "010");
                assert!(hint.is_some());
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_list_params_forward_range_and_filter() {
        let filter = ListFilter {
            kind: Some("A".to_string()),
            kind_detail: None,
            final_only: false,
        };
        let params = list_params(
            "00126380",
            &DateRange::Between("20240101".into(), "20240131".into()),
            &filter,
            "20240313",
        );
        assert!(params.contains(&("bgn_de", "20240101".to_string())));
        assert!(params.contains(&("end_de", "20240131".to_string())));
        assert!(params.contains(&("last_reprt_at", "N".to_string())));
        assert!(params.contains(&("pblntf_ty", "A".to_string())));

        let unbounded = list_params("00126380", &DateRange::Unbounded, &ListFilter::default(), "20240313");
        assert!(unbounded.contains(&("bgn_de", LIST_START.to_string())));
        assert!(unbounded.contains(&("end_de", "20240313".to_string())));
        assert!(unbounded.contains(&("last_reprt_at", "Y".to_string())));
    }

    #[test]
    fn test_default_end_date_is_korean_date() {
        // 20:00 UTC on 03-12 is 05:00 on 03-13 in Seoul
        let evening_utc = "2024-03-12T20:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(kst_date(evening_utc), "20240313");

        let morning_utc = "2024-03-12T14:59:59Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(kst_date(morning_utc), "20240312");

        let since = DateRange::Since("20240301".to_string());
        assert_eq!(
            range_params(&since, EVENT_START, &kst_date(evening_utc)),
            vec![("bgn_de", "20240301".to_string()), ("end_de", "20240313".to_string())]
        );
    }

    #[tokio::test]
    async fn test_calls_fail_without_api_key() {
        let client = OpenDartClient::new(ClientConfig::default()).unwrap();
        let result = client.company("00126380").await;
        assert!(matches!(result, Err(GatewayError::NoApiKey)));
    }
}
