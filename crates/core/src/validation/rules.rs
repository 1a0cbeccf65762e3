//! Issue taxonomy and finding types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lookup::CodeList;
use crate::records::FieldValue;
use crate::types::RecordIndex;

/// Whether an issue blocks the import or is informational.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
}

/// The closed set of issue families. Each is bound to one severity for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MissingCurrency,
    MissingActivity,
    UnmappedCode,
    MissingOrg,
    MissingRequired,
    InvalidValue,
}

impl IssueType {
    /// Evaluation and bucket order.
    pub const ALL: [IssueType; 6] = [
        Self::MissingCurrency,
        Self::MissingActivity,
        Self::UnmappedCode,
        Self::MissingOrg,
        Self::MissingRequired,
        Self::InvalidValue,
    ];

    pub const fn severity(self) -> ValidationSeverity {
        match self {
            Self::MissingCurrency
            | Self::MissingActivity
            | Self::MissingRequired
            | Self::InvalidValue => ValidationSeverity::Error,
            Self::UnmappedCode | Self::MissingOrg => ValidationSeverity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCurrency => "missing_currency",
            Self::MissingActivity => "missing_activity",
            Self::UnmappedCode => "unmapped_code",
            Self::MissingOrg => "missing_org",
            Self::MissingRequired => "missing_required",
            Self::InvalidValue => "invalid_value",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule-specific payload attached to a detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DetailValue {
    Numeric(f64),
    Text(String),
    #[serde(rename_all = "camelCase")]
    Code { code_list: CodeList, code: String },
    /// Raw date text as found in the source.
    Date(String),
}

impl From<&FieldValue> for DetailValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Number(n) => Self::Numeric(*n),
            FieldValue::Text(s) => Self::Text(s.clone()),
        }
    }
}

/// One triggered rule condition, before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFinding {
    pub issue_type: IssueType,
    /// Originating record; `None` for batch-level findings.
    pub record_index: Option<RecordIndex>,
    pub activity_id: Option<String>,
    pub transaction_index: Option<u32>,
    pub field: Option<String>,
    pub value: Option<DetailValue>,
    pub message: String,
}

impl RawFinding {
    pub fn new(issue_type: IssueType, record_index: RecordIndex, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            record_index: Some(record_index),
            activity_id: None,
            transaction_index: None,
            field: None,
            value: None,
            message: message.into(),
        }
    }

    /// A finding about the batch as a whole rather than one record.
    pub fn batch_level(issue_type: IssueType, message: impl Into<String>) -> Self {
        Self {
            record_index: None,
            ..Self::new(issue_type, 0, message)
        }
    }

    pub fn with_activity(mut self, activity_id: Option<&str>) -> Self {
        self.activity_id = activity_id.map(str::to_string);
        self
    }

    pub fn at_transaction(mut self, index: Option<u32>) -> Self {
        self.transaction_index = index;
        self
    }

    pub fn on_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_value(mut self, value: DetailValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn severity(&self) -> ValidationSeverity {
        self.issue_type.severity()
    }

    pub fn into_detail(self) -> IssueDetail {
        IssueDetail {
            activity_id: self.activity_id,
            transaction_index: self.transaction_index,
            field: self.field,
            value: self.value,
            message: self.message,
        }
    }
}

/// A single reported instance of an issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<DetailValue>,
    pub message: String,
}

/// All details of one issue type.
///
/// Only built through [`ValidationIssue::from_details`], so `count` always
/// equals the number of details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: IssueType,
    severity: ValidationSeverity,
    count: u32,
    details: Vec<IssueDetail>,
}

impl ValidationIssue {
    pub fn from_details(issue_type: IssueType, details: Vec<IssueDetail>) -> Self {
        Self {
            issue_type,
            severity: issue_type.severity(),
            count: u32::try_from(details.len()).unwrap_or(u32::MAX),
            details,
        }
    }

    pub fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    pub fn severity(&self) -> ValidationSeverity {
        self.severity
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn details(&self) -> &[IssueDetail] {
        &self.details
    }
}
