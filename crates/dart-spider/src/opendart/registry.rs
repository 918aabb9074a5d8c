use crate::DartError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Reverse;
use tracing::debug;

// de
// ----------------------------------------------------------------------------

/// Every company filing with OpenDart, as shipped in `CORPCODE.xml`:
///
/// ```xml
/// <result>
///     <list>
///         <corp_code>00126380</corp_code>
///         <corp_name>삼성전자</corp_name>
///         <corp_eng_name>SAMSUNG ELECTRONICS CO,.LTD</corp_eng_name>
///         <stock_code>005930</stock_code>
///         <modify_date>20230110</modify_date>
///     </list>
///     ...
/// </result>
/// ```
///
/// The same shape (`{ "list": [...] }`) is used for the JSON export.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Registry {
    #[serde(default)]
    pub list: Vec<Company>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Company {
    /// 8-digit OpenDart identifier.
    pub corp_code: String,
    pub corp_name: String,
    #[serde(default, deserialize_with = "de_blank")]
    pub corp_eng_name: Option<String>,
    /// 6-digit exchange code; unlisted companies carry a blank code.
    #[serde(default, deserialize_with = "de_blank")]
    pub stock_code: Option<String>,
    /// Last modification, `YYYYMMDD`.
    #[serde(default)]
    pub modify_date: String,
}

// blank strings (OpenDart pads missing stock codes with a space) become `None`
fn de_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

impl Company {
    pub fn is_listed(&self) -> bool {
        self.stock_code.is_some()
    }
}

// summary
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub listed: usize,
    pub unlisted: usize,
}

impl Registry {
    pub fn from_xml(bytes: &[u8]) -> Result<Self, DartError> {
        let time = std::time::Instant::now();
        let text = String::from_utf8_lossy(bytes);
        let registry: Registry = quick_xml::de::from_str(&text)?;
        debug!(
            "{} companies parsed. {}",
            registry.list.len(),
            crate::time_elapsed(time)
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn listed(&self) -> impl Iterator<Item = &Company> {
        self.list.iter().filter(|company| company.is_listed())
    }

    pub fn summary(&self) -> Summary {
        let listed = self.listed().count();
        Summary {
            total: self.list.len(),
            listed,
            unlisted: self.list.len() - listed,
        }
    }

    /// Companies whose Korean or English name contains `query` (case-insensitive).
    ///
    /// Exact name matches come first, then listed companies, then the rest by name.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Company> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut found: Vec<&Company> = self
            .list
            .iter()
            .filter(|company| {
                company.corp_name.to_lowercase().contains(&query)
                    || company
                        .corp_eng_name
                        .as_ref()
                        .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .collect();

        found.sort_by_cached_key(|company| {
            (
                Reverse(company.corp_name.to_lowercase() == query),
                Reverse(company.is_listed()),
                company.corp_name.clone(),
            )
        });
        found.truncate(limit);
        found
    }

    pub fn by_corp_code(&self, corp_code: &str) -> Option<&Company> {
        self.list
            .iter()
            .find(|company| company.corp_code == corp_code.trim())
    }

    pub fn by_stock_code(&self, stock_code: &str) -> Option<&Company> {
        self.list
            .iter()
            .find(|company| company.stock_code.as_deref() == Some(stock_code.trim()))
    }

    /// A company code or stock code found verbatim, else the name [`search`](Self::search).
    pub fn lookup(&self, query: &str, limit: usize) -> Vec<&Company> {
        let code = query.trim();
        let exact = match code.len() {
            8 => self.by_corp_code(code),
            6 => self.by_stock_code(code),
            _ => None,
        };
        match exact {
            Some(company) if limit > 0 => vec![company],
            _ => self.search(query, limit),
        }
    }
}

/// Name of the JSON export written at `time`; e.g., `corpcode_20240131_093000.json`.
pub fn registry_filename(time: NaiveDateTime) -> String {
    format!("corpcode_{}.json", time.format("%Y%m%d_%H%M%S"))
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
