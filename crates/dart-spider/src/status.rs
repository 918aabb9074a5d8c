/// Status codes returned by every OpenDart endpoint, inside the `status` field of the response
/// envelope (XML for file endpoints, JSON for data endpoints).
///
/// See the [development guide] for the published list.
///
/// [development guide]: https://opendart.fss.or.kr/guide/main.do
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// `000`
    Success,
    /// `010`
    UnregisteredKey,
    /// `011`
    UnusableKey,
    /// `012`
    DisallowedIp,
    /// `013`
    NoData,
    /// `014`
    MissingFile,
    /// `020`
    RequestLimitExceeded,
    /// `021`
    CompanyLimitExceeded,
    /// `100`
    InvalidField,
    /// `101`
    ImproperAccess,
    /// `800`
    Maintenance,
    /// `900`
    Undefined,
    /// `901`
    RetentionExpired,
}

impl Status {
    pub const ALL: [Status; 13] = [
        Status::Success,
        Status::UnregisteredKey,
        Status::UnusableKey,
        Status::DisallowedIp,
        Status::NoData,
        Status::MissingFile,
        Status::RequestLimitExceeded,
        Status::CompanyLimitExceeded,
        Status::InvalidField,
        Status::ImproperAccess,
        Status::Maintenance,
        Status::Undefined,
        Status::RetentionExpired,
    ];

    /// Map a 3-digit status code; leading/trailing whitespace is ignored.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "000" => Some(Status::Success),
            "010" => Some(Status::UnregisteredKey),
            "011" => Some(Status::UnusableKey),
            "012" => Some(Status::DisallowedIp),
            "013" => Some(Status::NoData),
            "014" => Some(Status::MissingFile),
            "020" => Some(Status::RequestLimitExceeded),
            "021" => Some(Status::CompanyLimitExceeded),
            "100" => Some(Status::InvalidField),
            "101" => Some(Status::ImproperAccess),
            "800" => Some(Status::Maintenance),
            "900" => Some(Status::Undefined),
            "901" => Some(Status::RetentionExpired),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Status::Success => "000",
            Status::UnregisteredKey => "010",
            Status::UnusableKey => "011",
            Status::DisallowedIp => "012",
            Status::NoData => "013",
            Status::MissingFile => "014",
            Status::RequestLimitExceeded => "020",
            Status::CompanyLimitExceeded => "021",
            Status::InvalidField => "100",
            Status::ImproperAccess => "101",
            Status::Maintenance => "800",
            Status::Undefined => "900",
            Status::RetentionExpired => "901",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Status::Success => "Success.",
            Status::UnregisteredKey => "Unregistered key.",
            Status::UnusableKey => {
                "Key is not usable: registered with the Open API but temporarily suspended."
            }
            Status::DisallowedIp => "Access from this IP address is not allowed.",
            Status::NoData => "No data was found for the query.",
            Status::MissingFile => "The requested file does not exist.",
            Status::RequestLimitExceeded => {
                "Request limit exceeded (usually more than 20,000 requests)."
            }
            Status::CompanyLimitExceeded => "Too many companies in one query (maximum 100).",
            Status::InvalidField => {
                "Invalid field value: a value not described in the field documentation was used."
            }
            Status::ImproperAccess => "Improper access.",
            Status::Maintenance => "Service suspended for scheduled system maintenance.",
            Status::Undefined => "An undefined error occurred.",
            Status::RetentionExpired => {
                "Key unusable because the account's personal data retention period has expired; \
                contact opendart@fss.or.kr."
            }
        }
    }

    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.description())
    }
}

/// Description for any code the API may send, known or not.
pub fn describe(code: &str) -> String {
    match Status::from_code(code) {
        Some(status) => status.description().to_string(),
        None => format!("unknown status code {}", code.trim()),
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_descriptions() {
        let expected = [
            ("000", "Success."),
            ("010", "Unregistered key."),
            (
                "011",
                "Key is not usable: registered with the Open API but temporarily suspended.",
            ),
            ("012", "Access from this IP address is not allowed."),
            ("013", "No data was found for the query."),
            ("014", "The requested file does not exist."),
            (
                "020",
                "Request limit exceeded (usually more than 20,000 requests).",
            ),
            ("021", "Too many companies in one query (maximum 100)."),
            (
                "100",
                "Invalid field value: a value not described in the field documentation was used.",
            ),
            ("101", "Improper access."),
            ("800", "Service suspended for scheduled system maintenance."),
            ("900", "An undefined error occurred."),
            (
                "901",
                "Key unusable because the account's personal data retention period has expired; \
                contact opendart@fss.or.kr.",
            ),
        ];

        for (code, description) in expected {
            let status = Status::from_code(code).expect("known status code");
            assert_eq!(status.code(), code);
            assert_eq!(status.description(), description);
            assert_eq!(describe(code), description);
        }
        assert_eq!(expected.len(), Status::ALL.len());
    }

    #[test]
    fn codes_are_unique() {
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_code() {
        assert_eq!(Status::from_code("999"), None);
        assert_eq!(describe(" 999 "), "unknown status code 999");
    }

    #[test]
    fn whitespace_around_code() {
        assert_eq!(Status::from_code(" 013\n"), Some(Status::NoData));
        assert!(Status::from_code("000").unwrap().is_success());
    }
}
