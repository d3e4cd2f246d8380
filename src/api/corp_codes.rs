use std::io::{Cursor, Read};

use crate::error::{GatewayError, Result};

/// One entry of the registry's corporate code file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpEntry {
    pub corp_code: String,
    pub corp_name: String,
    /// Six-digit ticker, `None` for unlisted companies
    pub stock_code: Option<String>,
    pub modify_date: String,
}

/// In-memory corporate code registry, parsed from `corpCode.xml`
#[derive(Debug, Clone, Default)]
pub struct CorpRegistry {
    entries: Vec<CorpEntry>,
}

impl CorpRegistry {
    pub fn new(entries: Vec<CorpEntry>) -> Self {
        Self { entries }
    }

    /// Parse the zip archive served by the registry (one XML file inside)
    pub fn from_zip(bytes: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| GatewayError::Parse(format!("corp code archive: {}", e)))?;
        if archive.is_empty() {
            return Err(GatewayError::Parse("corp code archive is empty".to_string()));
        }
        let mut file = archive
            .by_index(0)
            .map_err(|e| GatewayError::Parse(format!("corp code archive: {}", e)))?;
        let mut xml = String::new();
        file.read_to_string(&mut xml)?;
        Self::from_xml(&xml)
    }

    pub fn from_xml(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| GatewayError::Parse(format!("corp code XML: {}", e)))?;

        let entries = doc
            .descendants()
            .filter(|n| n.has_tag_name("list"))
            .filter_map(|node| {
                let field = |name: &str| {
                    node.children()
                        .find(|c| c.has_tag_name(name))
                        .and_then(|c| c.text())
                        .map(|t| t.trim().to_string())
                        .unwrap_or_default()
                };
                let corp_code = field("corp_code");
                if corp_code.is_empty() {
                    return None;
                }
                let stock_code = field("stock_code");
                Some(CorpEntry {
                    corp_code,
                    corp_name: field("corp_name"),
                    stock_code: (!stock_code.is_empty()).then_some(stock_code),
                    modify_date: field("modify_date"),
                })
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries matching a ticker, a corporate code or a company name.
    ///
    /// Six digits match `stock_code`, eight digits match `corp_code`.
    /// Names match exactly when possible, otherwise by substring.
    pub fn find(&self, query: &str) -> Vec<&CorpEntry> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let all_digits = query.chars().all(|c| c.is_ascii_digit());
        if all_digits && query.len() == 6 {
            return self
                .entries
                .iter()
                .filter(|e| e.stock_code.as_deref() == Some(query))
                .collect();
        }
        if all_digits && query.len() == 8 {
            return self.entries.iter().filter(|e| e.corp_code == query).collect();
        }

        let exact: Vec<&CorpEntry> = self.entries.iter().filter(|e| e.corp_name == query).collect();
        if !exact.is_empty() {
            return exact;
        }
        self.entries
            .iter()
            .filter(|e| e.corp_name.contains(query))
            .collect()
    }

    /// Names containing `keyword`, in registry order
    pub fn names(&self, keyword: &str) -> Vec<String> {
        let keyword = keyword.trim();
        self.entries
            .iter()
            .filter(|e| e.corp_name.contains(keyword))
            .map(|e| e.corp_name.clone())
            .collect()
    }

    pub fn by_stock_code(&self, stock_code: &str) -> Option<&CorpEntry> {
        let stock_code = stock_code.trim();
        self.entries
            .iter()
            .find(|e| e.stock_code.as_deref() == Some(stock_code))
    }
}
