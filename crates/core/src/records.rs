//! Intermediate record shapes handed to the engine by the upstream parser.
//!
//! Every field the source may omit is optional; every collection defaults to
//! empty. The engine only reads these values, it never repairs them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field names used in issue details and checklists
// ---------------------------------------------------------------------------

pub const FIELD_IATI_IDENTIFIER: &str = "iati-identifier";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_ACTIVITY_ID: &str = "activity-id";
pub const FIELD_SECTOR: &str = "sector";
pub const FIELD_TRANSACTION_TYPE: &str = "transaction-type";
pub const FIELD_TRANSACTION_DATE: &str = "transaction-date";
pub const FIELD_VALUE: &str = "value";
pub const FIELD_VALUE_DATE: &str = "value-date";
pub const FIELD_CURRENCY: &str = "currency";
pub const FIELD_PROVIDER_ORG: &str = "provider-org";
pub const FIELD_RECEIVER_ORG: &str = "receiver-org";
pub const FIELD_RESULT_TYPE: &str = "result-type";
pub const FIELD_MEASURE: &str = "measure";
pub const FIELD_REFERENCE_VOCABULARY: &str = "reference-vocabulary";
pub const FIELD_DOCUMENT_FORMAT: &str = "document-link-format";
pub const FIELD_DOCUMENT_CATEGORY: &str = "document-link-category";
pub const FIELD_DOCUMENT_DATE: &str = "document-date";
pub const FIELD_ISO_DATE: &str = "iso-date";
pub const FIELD_PERIOD_START: &str = "period-start";
pub const FIELD_PERIOD_END: &str = "period-end";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `true` when an optional text field holds something other than whitespace.
pub fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Trimmed, non-blank view of an optional text field.
pub fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A scalar as the parser found it: either already numeric or raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Finite numeric interpretation, if there is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub fn is_populated(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(s) => !s.trim().is_empty(),
        }
    }

    /// The value as the source wrote it, for issue messages.
    pub fn raw(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

fn populated(value: &Option<FieldValue>) -> bool {
    value.as_ref().is_some_and(FieldValue::is_populated)
}

// ---------------------------------------------------------------------------
// Batch and root records
// ---------------------------------------------------------------------------

/// One import run: every record the parser produced from a single upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportBatch {
    pub file_name: Option<String>,
    pub records: Vec<ImportRecord>,
}

/// Root unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportRecord {
    /// A full activity with its transactions and results.
    Activity(ActivityRecord),
    /// A results subtree reported against an existing activity.
    Results(ResultsRecord),
    /// A single transaction row referencing an activity by identifier.
    Transaction(TransactionRecord),
}

impl ImportRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Activity(_) => "activity",
            Self::Results(_) => "results",
            Self::Transaction(_) => "transaction",
        }
    }

    /// Identifier of the activity this record belongs to, if it names one.
    pub fn activity_id(&self) -> Option<&str> {
        match self {
            Self::Activity(a) => text(&a.iati_identifier),
            Self::Results(r) => text(&r.activity_id),
            Self::Transaction(t) => text(&t.activity_id),
        }
    }

    /// Required root-level fields that are absent.
    ///
    /// Standalone transactions carry their own required-field checks (see
    /// [`TransactionRecord::missing_required_fields`]); a transaction root is
    /// never a container for result entities.
    pub fn missing_root_fields(&self) -> Vec<&'static str> {
        match self {
            Self::Activity(a) => a.missing_required_fields(),
            Self::Results(r) => r.missing_required_fields(),
            Self::Transaction(_) => Vec::new(),
        }
    }

    /// Results carried by this record (empty for transactions).
    pub fn results(&self) -> &[ResultRecord] {
        match self {
            Self::Activity(a) => &a.results,
            Self::Results(r) => &r.results,
            Self::Transaction(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityRecord {
    pub iati_identifier: Option<String>,
    pub title: Option<String>,
    pub sectors: Vec<Sector>,
    pub transactions: Vec<TransactionRecord>,
    pub results: Vec<ResultRecord>,
}

impl ActivityRecord {
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !has_text(&self.iati_identifier) {
            missing.push(FIELD_IATI_IDENTIFIER);
        }
        if !has_text(&self.title) {
            missing.push(FIELD_TITLE);
        }
        missing
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsRecord {
    pub activity_id: Option<String>,
    pub results: Vec<ResultRecord>,
}

impl ResultsRecord {
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        if has_text(&self.activity_id) {
            Vec::new()
        } else {
            vec![FIELD_ACTIVITY_ID]
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sector {
    pub vocabulary: Option<String>,
    pub code: Option<String>,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionRecord {
    pub transaction_type: Option<String>,
    pub value: Option<FieldValue>,
    pub currency: Option<String>,
    pub transaction_date: Option<String>,
    pub value_date: Option<String>,
    pub provider_org: Option<OrganisationRef>,
    pub receiver_org: Option<OrganisationRef>,
    /// Explicit activity reference. Nested transactions fall back to the
    /// enclosing activity's identifier.
    pub activity_id: Option<String>,
    pub description: Option<String>,
}

impl TransactionRecord {
    pub fn has_value(&self) -> bool {
        populated(&self.value)
    }

    /// Required transaction fields that are absent. `standalone` adds the
    /// activity reference, which nested transactions inherit instead.
    pub fn missing_required_fields(&self, standalone: bool) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !has_text(&self.transaction_date) {
            missing.push(FIELD_TRANSACTION_DATE);
        }
        if !self.has_value() {
            missing.push(FIELD_VALUE);
        }
        if !has_text(&self.transaction_type) {
            missing.push(FIELD_TRANSACTION_TYPE);
        }
        if standalone && !has_text(&self.activity_id) {
            missing.push(FIELD_ACTIVITY_ID);
        }
        missing
    }

    pub fn has_any_organisation(&self) -> bool {
        let present = |org: &Option<OrganisationRef>| org.as_ref().is_some_and(OrganisationRef::is_present);
        present(&self.provider_org) || present(&self.receiver_org)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganisationRef {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub name: Option<String>,
}

impl OrganisationRef {
    pub fn is_present(&self) -> bool {
        has_text(&self.reference) || has_text(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Results tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub result_type: Option<String>,
    pub aggregation_status: Option<bool>,
    pub references: Vec<Reference>,
    pub document_links: Vec<DocumentLink>,
    pub indicators: Vec<IndicatorRecord>,
}

impl ResultRecord {
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        if has_text(&self.title) {
            Vec::new()
        } else {
            vec![FIELD_TITLE]
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub measure: Option<String>,
    pub ascending: Option<bool>,
    pub aggregation_status: Option<bool>,
    pub references: Vec<Reference>,
    pub document_links: Vec<DocumentLink>,
    pub baseline: Option<BaselineRecord>,
    pub periods: Vec<PeriodRecord>,
}

impl IndicatorRecord {
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        if has_text(&self.title) {
            Vec::new()
        } else {
            vec![FIELD_TITLE]
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineRecord {
    pub value: Option<FieldValue>,
    pub year: Option<FieldValue>,
    pub iso_date: Option<String>,
    pub comment: Option<String>,
    pub locations: Vec<Location>,
    pub dimensions: Vec<Dimension>,
    pub document_links: Vec<DocumentLink>,
    pub references: Vec<Reference>,
}

impl BaselineRecord {
    pub fn has_value(&self) -> bool {
        populated(&self.value)
    }

    pub fn has_year(&self) -> bool {
        populated(&self.year)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodRecord {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub target: Option<PeriodValueRecord>,
    pub actual: Option<PeriodValueRecord>,
}

/// The target or actual half of a period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodValueRecord {
    pub value: Option<FieldValue>,
    pub comment: Option<String>,
    pub locations: Vec<Location>,
    pub dimensions: Vec<Dimension>,
    pub document_links: Vec<DocumentLink>,
    pub references: Vec<Reference>,
}

impl PeriodValueRecord {
    pub fn has_value(&self) -> bool {
        populated(&self.value)
    }
}

// ---------------------------------------------------------------------------
// Sub-elements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub vocabulary: Option<String>,
    pub code: Option<String>,
    pub vocabulary_uri: Option<String>,
    pub indicator_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentLink {
    pub url: Option<String>,
    pub title: Option<String>,
    pub format: Option<String>,
    pub category_code: Option<String>,
    pub document_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub name: Option<String>,
    pub admin_code: Option<String>,
}

/// A disaggregation split such as `sex = female`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    pub name: Option<String>,
    pub value: Option<String>,
}
