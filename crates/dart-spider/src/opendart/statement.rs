use super::DartClient;
use crate::{DartError, Status};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, trace};

const ENDPOINT: &str = "fnlttSinglAcnt.json";

/// Key accounts are published from the 2015 business year onwards.
pub const FIRST_YEAR: i32 = 2015;

const TIMEOUT: Duration = Duration::from_secs(30);

/// Periodic report a statement is taken from (`reprt_code`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReportCode {
    /// `11013`
    Q1,
    /// `11012`
    HalfYear,
    /// `11014`
    Q3,
    /// `11011`
    #[default]
    Annual,
}

impl ReportCode {
    pub const ALL: [ReportCode; 4] = [
        ReportCode::Q1,
        ReportCode::HalfYear,
        ReportCode::Q3,
        ReportCode::Annual,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ReportCode::Q1 => "11013",
            ReportCode::HalfYear => "11012",
            ReportCode::Q3 => "11014",
            ReportCode::Annual => "11011",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportCode::Q1 => "first quarter report",
            ReportCode::HalfYear => "half-year report",
            ReportCode::Q3 => "third quarter report",
            ReportCode::Annual => "annual business report",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|report| report.code() == code.trim())
    }
}

/// Accepts a `reprt_code` (`11013`) or a name: `q1`, `half`, `q3`, `annual`.
impl std::str::FromStr for ReportCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(report) = ReportCode::from_code(value) {
            return Ok(report);
        }
        match value.trim().to_ascii_lowercase().as_str() {
            "q1" => Ok(ReportCode::Q1),
            "half" | "half-year" => Ok(ReportCode::HalfYear),
            "q3" => Ok(ReportCode::Q3),
            "annual" => Ok(ReportCode::Annual),
            _ => Err(format!(
                "unknown report `{value}`; expected q1, half, q3, annual or a code such as 11011"
            )),
        }
    }
}

impl std::fmt::Display for ReportCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}

/// Business years that can be queried, as of `today`.
pub fn available_years(today: NaiveDate) -> Vec<i32> {
    (FIRST_YEAR..=today.year()).collect()
}

// de
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
pub struct StatementResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub list: Vec<RawAccount>,
}

/// One account line as sent by the API; amounts are strings with thousands separators.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RawAccount {
    pub rcept_no: String,
    pub bsns_year: String,
    pub stock_code: String,
    pub reprt_code: String,
    pub account_nm: String,
    /// `CFS` consolidated, `OFS` separate.
    pub fs_div: String,
    pub fs_nm: String,
    /// `BS` balance sheet, `IS` income statement.
    pub sj_div: String,
    pub sj_nm: String,
    pub thstrm_nm: String,
    pub thstrm_dt: String,
    pub thstrm_amount: String,
    pub thstrm_add_amount: String,
    pub frmtrm_nm: String,
    pub frmtrm_dt: String,
    pub frmtrm_amount: String,
    pub frmtrm_add_amount: String,
    pub currency: String,
}

impl DartClient {
    /// Key accounts of one company for one business year and report.
    ///
    /// Any status other than `000` is returned as [`DartError::Api`].
    pub async fn fetch_statement(
        &self,
        corp_code: &str,
        year: i32,
        report: ReportCode,
    ) -> Result<StatementResponse, DartError> {
        let time = std::time::Instant::now();
        let url = self.endpoint(ENDPOINT);
        let year = year.to_string();
        info!("requesting {url} for {corp_code}, {year}, {report}");

        let response: StatementResponse = self
            .http()
            .get(&url)
            .timeout(TIMEOUT)
            .query(&[
                ("crtfc_key", self.key().expose()),
                ("corp_code", corp_code),
                ("bsns_year", year.as_str()),
                ("reprt_code", report.code()),
            ])
            .send()
            .await
            .map_err(|err| {
                error!("failed to request {url}, error({err})");
                err
            })?
            .error_for_status()?
            .json()
            .await
            .map_err(|err| {
                error!("failed to parse JSON, error({err})");
                err
            })?;

        if Status::from_code(&response.status) != Some(Status::Success) {
            error!(
                "OpenDart refused the statement: {} {}",
                response.status, response.message
            );
            return Err(DartError::Api {
                status: response.status.trim().to_string(),
                message: response.message.trim().to_string(),
            });
        }

        debug!(
            "{} accounts fetched for {corp_code}. {}",
            response.list.len(),
            crate::time_elapsed(time)
        );
        Ok(response)
    }
}

// output
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Statements {
    pub company: CompanyInfo,
    pub balance_sheet: Vec<Account>,
    pub income_statement: Vec<Account>,
    /// Everything that is neither `BS` nor `IS`.
    pub cash_flow: Vec<Account>,
    pub summary: Headline,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct CompanyInfo {
    pub stock_code: String,
    pub report_date: String,
    pub report_type: String,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Account {
    pub account_name: String,
    pub fs_type: String,
    pub statement_type: String,
    pub current_amount: f64,
    pub current_accumulated: f64,
    pub previous_amount: f64,
    pub previous_accumulated: f64,
    pub currency: String,
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq)]
pub struct Headline {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    pub revenue: f64,
    pub net_income: f64,
}

/// Amount strings such as `"1,234,567"`; blanks, `-` and anything unparsable are zero.
pub fn parse_amount(amount: &str) -> f64 {
    amount.trim().replace(',', "").parse::<f64>().unwrap_or(0.0)
}

impl From<&RawAccount> for Account {
    fn from(raw: &RawAccount) -> Self {
        Account {
            account_name: raw.account_nm.clone(),
            fs_type: raw.fs_div.clone(),
            statement_type: raw.sj_div.clone(),
            current_amount: parse_amount(&raw.thstrm_amount),
            current_accumulated: parse_amount(&raw.thstrm_add_amount),
            previous_amount: parse_amount(&raw.frmtrm_amount),
            previous_accumulated: parse_amount(&raw.frmtrm_add_amount),
            currency: if raw.currency.trim().is_empty() {
                "KRW".to_string()
            } else {
                raw.currency.clone()
            },
        }
    }
}

impl Statements {
    pub fn from_accounts(accounts: &[RawAccount]) -> Self {
        let mut statements = Statements::default();

        if let Some(first) = accounts.first() {
            statements.company = CompanyInfo {
                stock_code: first.stock_code.clone(),
                report_date: first.thstrm_dt.clone(),
                report_type: first.reprt_code.clone(),
            };
        }

        for raw in accounts {
            let account = Account::from(raw);
            match raw.sj_div.as_str() {
                "BS" => statements.balance_sheet.push(account),
                "IS" => statements.income_statement.push(account),
                _ => statements.cash_flow.push(account),
            }
        }
        trace!(
            "classified accounts: {} BS, {} IS, {} other",
            statements.balance_sheet.len(),
            statements.income_statement.len(),
            statements.cash_flow.len()
        );

        statements.summary = statements.headline();
        statements
    }

    // consolidated figures win over separate ones when the company files both
    fn headline(&self) -> Headline {
        fn pick<'a>(accounts: &'a [Account], names: &[&str]) -> Option<&'a Account> {
            let matches = |account: &&Account| {
                names
                    .iter()
                    .any(|name| account.account_name.contains(name))
            };
            accounts
                .iter()
                .filter(|account| account.fs_type == "CFS")
                .find(matches)
                .or_else(|| accounts.iter().find(matches))
        }

        let amount = |accounts: &[Account], names: &[&str]| {
            pick(accounts, names)
                .map(|account| account.current_amount)
                .unwrap_or(0.0)
        };

        Headline {
            total_assets: amount(&self.balance_sheet, &["자산총계", "Total Assets"]),
            total_liabilities: amount(&self.balance_sheet, &["부채총계", "Total Liabilities"]),
            total_equity: amount(&self.balance_sheet, &["자본총계", "Total Equity"]),
            revenue: amount(&self.income_statement, &["매출액", "Revenue"]),
            net_income: amount(
                &self.income_statement,
                &["당기순이익", "당기순손익", "Net Income"],
            ),
        }
    }
}

impl From<&StatementResponse> for Statements {
    fn from(response: &StatementResponse) -> Self {
        Statements::from_accounts(&response.list)
    }
}

/// Name of the JSON export for a statement; e.g., `statement_00126380_2023_11011.json`.
pub fn statement_filename(corp_code: &str, year: i32, report: ReportCode) -> String {
    format!("statement_{corp_code}_{year}_{}.json", report.code())
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn account(fs_div: &str, sj_div: &str, name: &str, amount: &str) -> RawAccount {
        RawAccount {
            stock_code: "005930".to_string(),
            reprt_code: "11011".to_string(),
            thstrm_dt: "2023.12.31 현재".to_string(),
            account_nm: name.to_string(),
            fs_div: fs_div.to_string(),
            sj_div: sj_div.to_string(),
            thstrm_amount: amount.to_string(),
            currency: "KRW".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn amounts() {
        assert_eq!(parse_amount("1,234,567"), 1_234_567.0);
        assert_eq!(parse_amount("-5,000"), -5_000.0);
        assert_eq!(parse_amount(" 42 "), 42.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("-"), 0.0);
        assert_eq!(parse_amount("n/a"), 0.0);
    }

    #[test]
    fn report_codes() {
        assert_eq!(ReportCode::default(), ReportCode::Annual);
        for report in ReportCode::ALL {
            assert_eq!(ReportCode::from_code(report.code()), Some(report));
        }
        assert_eq!(ReportCode::from_code("11013"), Some(ReportCode::Q1));
        assert_eq!(ReportCode::from_code("99999"), None);
    }

    #[test]
    fn parse_report_names_and_codes() {
        assert_eq!("11014".parse::<ReportCode>(), Ok(ReportCode::Q3));
        assert_eq!("HALF".parse::<ReportCode>(), Ok(ReportCode::HalfYear));
        assert_eq!(" annual ".parse::<ReportCode>(), Ok(ReportCode::Annual));
        assert!("yearly".parse::<ReportCode>().is_err());
    }

    #[test]
    fn years_from_2015() {
        let years = available_years(NaiveDate::from_ymd_opt(2018, 6, 1).unwrap());
        assert_eq!(years, vec![2015, 2016, 2017, 2018]);
    }

    #[test]
    fn classify_and_summarise() {
        let accounts = vec![
            account("OFS", "BS", "자산총계", "100"),
            account("CFS", "BS", "자산총계", "1,000"),
            account("CFS", "BS", "부채총계", "400"),
            account("CFS", "BS", "자본총계", "600"),
            account("CFS", "IS", "매출액", "2,500"),
            account("CFS", "IS", "당기순이익(손실)", "300"),
            account("CFS", "CF", "영업활동현금흐름", "50"),
        ];

        let statements = Statements::from_accounts(&accounts);
        assert_eq!(statements.balance_sheet.len(), 4);
        assert_eq!(statements.income_statement.len(), 2);
        assert_eq!(statements.cash_flow.len(), 1);
        assert_eq!(statements.company.stock_code, "005930");
        assert_eq!(statements.company.report_type, "11011");

        assert_eq!(
            statements.summary,
            Headline {
                total_assets: 1_000.0,
                total_liabilities: 400.0,
                total_equity: 600.0,
                revenue: 2_500.0,
                net_income: 300.0,
            }
        );
    }

    #[test]
    fn separate_statements_only() {
        let accounts = vec![
            account("OFS", "BS", "Total Assets", "10"),
            account("OFS", "IS", "Revenue", "7"),
        ];
        let summary = Statements::from_accounts(&accounts).summary;
        assert_eq!(summary.total_assets, 10.0);
        assert_eq!(summary.revenue, 7.0);
        assert_eq!(summary.net_income, 0.0);
    }

    #[test]
    fn missing_currency_defaults_to_krw() {
        let mut raw = account("OFS", "BS", "자산총계", "1");
        raw.currency.clear();
        assert_eq!(Account::from(&raw).currency, "KRW");
    }

    #[test]
    fn empty_statement() {
        assert_eq!(Statements::from_accounts(&[]), Statements::default());
    }

    #[test]
    fn export_filename() {
        assert_eq!(
            statement_filename("00126380", 2023, ReportCode::Q3),
            "statement_00126380_2023_11014.json"
        );
    }
}
