//! Rule evaluator: pure logic, no I/O.
//!
//! One rule family per [`IssueType`]. Every family is total: it walks the
//! whole record, reports each triggered condition as its own finding, and
//! never stops at the first malformed field.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDate;

use super::rules::{DetailValue, IssueType, RawFinding};
use crate::lookup::{CodeList, LookupOutcome, LookupState};
use crate::records::{
    has_text, text, BaselineRecord, DocumentLink, ImportBatch, ImportRecord, IndicatorRecord,
    PeriodRecord, PeriodValueRecord, Reference, ResultRecord, TransactionRecord,
    FIELD_ACTIVITY_ID, FIELD_CURRENCY, FIELD_DOCUMENT_CATEGORY, FIELD_DOCUMENT_DATE,
    FIELD_DOCUMENT_FORMAT, FIELD_ISO_DATE, FIELD_MEASURE, FIELD_PERIOD_END, FIELD_PERIOD_START,
    FIELD_REFERENCE_VOCABULARY, FIELD_RESULT_TYPE, FIELD_SECTOR, FIELD_TRANSACTION_DATE,
    FIELD_TRANSACTION_TYPE, FIELD_VALUE, FIELD_VALUE_DATE,
};
use crate::transaction_type::TransactionType;
use crate::types::RecordIndex;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Read-only inputs shared by every rule over one batch.
pub struct RuleContext<'a> {
    lookup: &'a LookupState,
    known_activities: HashSet<&'a str>,
}

impl<'a> RuleContext<'a> {
    /// Activity identifiers resolve against the batch's own activities plus
    /// `external_activity_ids` (activities the caller already stores).
    pub fn new(
        batch: &'a ImportBatch,
        lookup: &'a LookupState,
        external_activity_ids: &'a BTreeSet<String>,
    ) -> Self {
        let mut known_activities: HashSet<&str> = batch
            .records
            .iter()
            .filter_map(|r| match r {
                ImportRecord::Activity(a) => text(&a.iati_identifier),
                _ => None,
            })
            .collect();
        known_activities.extend(
            external_activity_ids
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty()),
        );
        Self {
            lookup,
            known_activities,
        }
    }

    pub fn resolves(&self, activity_id: &str) -> bool {
        self.known_activities.contains(activity_id.trim())
    }

    pub fn lookup(&self) -> &LookupState {
        self.lookup
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run every rule family over one record.
pub fn evaluate_record(
    record_index: RecordIndex,
    record: &ImportRecord,
    ctx: &RuleContext<'_>,
) -> Vec<RawFinding> {
    let mut findings = Vec::new();
    for issue_type in IssueType::ALL {
        evaluate_rule(issue_type, record_index, record, ctx, &mut findings);
    }
    findings
}

/// Run a single rule family over one record, appending its findings.
pub fn evaluate_rule(
    issue_type: IssueType,
    record_index: RecordIndex,
    record: &ImportRecord,
    ctx: &RuleContext<'_>,
    out: &mut Vec<RawFinding>,
) {
    match issue_type {
        IssueType::MissingCurrency => missing_currency(record_index, record, out),
        IssueType::MissingActivity => missing_activity(record_index, record, ctx, out),
        IssueType::UnmappedCode => unmapped_code(record_index, record, ctx, out),
        IssueType::MissingOrg => missing_org(record_index, record, out),
        IssueType::MissingRequired => missing_required(record_index, record, out),
        IssueType::InvalidValue => invalid_value(record_index, record, out),
    }
}

/// Code lists that one record would consult.
pub fn code_lists_used(record_index: RecordIndex, record: &ImportRecord) -> BTreeSet<CodeList> {
    coded_fields(record_index, record)
        .into_iter()
        .map(|f| f.code_list)
        .collect()
}

// ---------------------------------------------------------------------------
// Rule families
// ---------------------------------------------------------------------------

fn missing_currency(record_index: RecordIndex, record: &ImportRecord, out: &mut Vec<RawFinding>) {
    for view in transactions(record_index, record) {
        let Some(value) = view.tx.value.as_ref().filter(|v| v.is_populated()) else {
            continue;
        };
        if has_text(&view.tx.currency) {
            continue;
        }
        out.push(
            view.finding(
                IssueType::MissingCurrency,
                format!("{}: value {} has no currency", view.label(), value.raw()),
            )
            .on_field(FIELD_CURRENCY)
            .with_value(DetailValue::from(value)),
        );
    }
}

fn missing_activity(
    record_index: RecordIndex,
    record: &ImportRecord,
    ctx: &RuleContext<'_>,
    out: &mut Vec<RawFinding>,
) {
    if let ImportRecord::Results(results) = record {
        if let Some(id) = text(&results.activity_id) {
            if !ctx.resolves(id) {
                out.push(
                    RawFinding::new(
                        IssueType::MissingActivity,
                        record_index,
                        format!("{}: activity '{id}' is not in this batch or among known activities", record_label(record_index, record)),
                    )
                    .with_activity(Some(id))
                    .on_field(FIELD_ACTIVITY_ID)
                    .with_value(DetailValue::Text(id.to_string())),
                );
            }
        }
    }

    for view in transactions(record_index, record) {
        let Some(id) = view.activity_id() else {
            continue;
        };
        if ctx.resolves(id) {
            continue;
        }
        out.push(
            view.finding(
                IssueType::MissingActivity,
                format!("{}: activity '{id}' is not in this batch or among known activities", view.label()),
            )
            .on_field(FIELD_ACTIVITY_ID)
            .with_value(DetailValue::Text(id.to_string())),
        );
    }
}

fn unmapped_code(
    record_index: RecordIndex,
    record: &ImportRecord,
    ctx: &RuleContext<'_>,
    out: &mut Vec<RawFinding>,
) {
    for field in coded_fields(record_index, record) {
        // Skipped lists are reported once per batch by the engine.
        if ctx.lookup().check(field.code_list, field.code) != LookupOutcome::Unknown {
            continue;
        }
        out.push(
            RawFinding::new(
                IssueType::UnmappedCode,
                record_index,
                format!(
                    "{}: {} '{}' is not in the {} code list",
                    field.location, field.field, field.raw, field.code_list
                ),
            )
            .with_activity(field.activity_id)
            .at_transaction(field.transaction_index)
            .on_field(field.field)
            .with_value(DetailValue::Code {
                code_list: field.code_list,
                code: field.raw.to_string(),
            }),
        );
    }
}

fn missing_org(record_index: RecordIndex, record: &ImportRecord, out: &mut Vec<RawFinding>) {
    for view in transactions(record_index, record) {
        if view.tx.has_any_organisation() {
            continue;
        }
        out.push(view.finding(
            IssueType::MissingOrg,
            format!("{}: neither provider nor receiver organisation is given", view.label()),
        ));
    }
}

fn missing_required(record_index: RecordIndex, record: &ImportRecord, out: &mut Vec<RawFinding>) {
    let label = record_label(record_index, record);
    let activity_id = record.activity_id();

    for field in record.missing_root_fields() {
        out.push(
            RawFinding::new(
                IssueType::MissingRequired,
                record_index,
                format!("{label}: missing required {field}"),
            )
            .with_activity(activity_id)
            .on_field(field),
        );
    }

    for view in transactions(record_index, record) {
        for field in view.tx.missing_required_fields(view.is_standalone()) {
            out.push(
                view.finding(
                    IssueType::MissingRequired,
                    format!("{}: missing required {field}", view.label()),
                )
                .on_field(field),
            );
        }
    }

    walk_results(record.results(), &mut |path, node| {
        let missing = match node {
            Node::Result(r) => r.missing_required_fields(),
            Node::Indicator(i) => i.missing_required_fields(),
            _ => return,
        };
        for field in missing {
            out.push(
                RawFinding::new(
                    IssueType::MissingRequired,
                    record_index,
                    format!("{label}: {path} is missing required {field}"),
                )
                .with_activity(activity_id)
                .on_field(field),
            );
        }
    });
}

fn invalid_value(record_index: RecordIndex, record: &ImportRecord, out: &mut Vec<RawFinding>) {
    for view in transactions(record_index, record) {
        let tx = view.tx;
        if let Some(value) = tx.value.as_ref().filter(|v| v.is_populated()) {
            match value.as_number() {
                None => out.push(
                    view.finding(
                        IssueType::InvalidValue,
                        format!("{}: value '{}' is not numeric", view.label(), value.raw()),
                    )
                    .on_field(FIELD_VALUE)
                    .with_value(DetailValue::from(value)),
                ),
                Some(amount) if amount <= 0.0 => {
                    let tx_type = text(&tx.transaction_type).and_then(TransactionType::parse);
                    if !tx_type.is_some_and(|t| t.allows_non_positive()) {
                        let type_name = text(&tx.transaction_type).unwrap_or("unspecified");
                        out.push(
                            view.finding(
                                IssueType::InvalidValue,
                                format!(
                                    "{}: value {amount} must be positive for transaction type {type_name}",
                                    view.label()
                                ),
                            )
                            .on_field(FIELD_VALUE)
                            .with_value(DetailValue::Numeric(amount)),
                        );
                    }
                }
                Some(_) => {}
            }
        }

        for (field, date) in [
            (FIELD_TRANSACTION_DATE, &tx.transaction_date),
            (FIELD_VALUE_DATE, &tx.value_date),
        ] {
            if let Some(raw) = invalid_date(date) {
                out.push(
                    view.finding(
                        IssueType::InvalidValue,
                        format!("{}: {field} '{raw}' is not a valid ISO date", view.label()),
                    )
                    .on_field(field)
                    .with_value(DetailValue::Date(raw.to_string())),
                );
            }
        }
    }

    let label = record_label(record_index, record);
    let activity_id = record.activity_id();
    walk_results(record.results(), &mut |path, node| {
        let mut dates: Vec<(&'static str, &Option<String>, String)> = Vec::new();
        match node {
            Node::Baseline(b) => dates.push((FIELD_ISO_DATE, &b.iso_date, path.to_string())),
            Node::Period(p) => {
                dates.push((FIELD_PERIOD_START, &p.period_start, path.to_string()));
                dates.push((FIELD_PERIOD_END, &p.period_end, path.to_string()));
            }
            _ => {}
        }
        for (k, doc) in node.document_links().iter().enumerate() {
            dates.push((FIELD_DOCUMENT_DATE, &doc.document_date, format!("{path}, document {}", k + 1)));
        }

        for (field, date, location) in dates {
            if let Some(raw) = invalid_date(date) {
                out.push(
                    RawFinding::new(
                        IssueType::InvalidValue,
                        record_index,
                        format!("{label}: {location} {field} '{raw}' is not a valid ISO date"),
                    )
                    .with_activity(activity_id)
                    .on_field(field)
                    .with_value(DetailValue::Date(raw.to_string())),
                );
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse `YYYY-MM-DD`, ignoring any `T...` time suffix.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// The raw text of a populated date field that does not parse.
fn invalid_date(value: &Option<String>) -> Option<&str> {
    text(value).filter(|raw| parse_iso_date(raw).is_none())
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

struct TxView<'a> {
    tx: &'a TransactionRecord,
    record_index: RecordIndex,
    /// Position within the parent activity; `None` for standalone rows.
    position: Option<u32>,
    parent_activity: Option<&'a str>,
}

impl<'a> TxView<'a> {
    fn is_standalone(&self) -> bool {
        self.position.is_none()
    }

    fn activity_id(&self) -> Option<&'a str> {
        text(&self.tx.activity_id).or(self.parent_activity)
    }

    fn label(&self) -> String {
        match (self.position, self.parent_activity) {
            (Some(pos), Some(activity)) => format!("activity '{activity}', transaction {}", pos + 1),
            (Some(pos), None) => format!("record {}, transaction {}", self.record_index + 1, pos + 1),
            (None, _) => format!("record {} (transaction)", self.record_index + 1),
        }
    }

    fn finding(&self, issue_type: IssueType, message: String) -> RawFinding {
        RawFinding::new(issue_type, self.record_index, message)
            .with_activity(self.activity_id())
            .at_transaction(self.position)
    }
}

fn transactions(record_index: RecordIndex, record: &ImportRecord) -> Vec<TxView<'_>> {
    match record {
        ImportRecord::Activity(a) => a
            .transactions
            .iter()
            .enumerate()
            .map(|(pos, tx)| TxView {
                tx,
                record_index,
                position: Some(pos as u32),
                parent_activity: text(&a.iati_identifier),
            })
            .collect(),
        ImportRecord::Transaction(tx) => vec![TxView {
            tx,
            record_index,
            position: None,
            parent_activity: None,
        }],
        ImportRecord::Results(_) => Vec::new(),
    }
}

fn record_label(record_index: RecordIndex, record: &ImportRecord) -> String {
    match (record, record.activity_id()) {
        (ImportRecord::Activity(_), Some(id)) => format!("activity '{id}'"),
        (ImportRecord::Results(_), Some(id)) => format!("results for activity '{id}'"),
        _ => format!("record {} ({})", record_index + 1, record.kind()),
    }
}

// ---------------------------------------------------------------------------
// Results tree walk
// ---------------------------------------------------------------------------

/// Position of a node inside a record's results tree (0-based, shown 1-based).
#[derive(Debug, Clone, Copy)]
struct NodePath {
    result: usize,
    indicator: Option<usize>,
    period: Option<usize>,
    part: Option<&'static str>,
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "result {}", self.result + 1)?;
        if let Some(i) = self.indicator {
            write!(f, ", indicator {}", i + 1)?;
        }
        if let Some(p) = self.period {
            write!(f, ", period {}", p + 1)?;
        }
        if let Some(part) = self.part {
            write!(f, " {part}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Node<'a> {
    Result(&'a ResultRecord),
    Indicator(&'a IndicatorRecord),
    Baseline(&'a BaselineRecord),
    Period(&'a PeriodRecord),
    PeriodValue(&'a PeriodValueRecord),
}

impl<'a> Node<'a> {
    fn references(&self) -> &'a [Reference] {
        match self {
            Self::Result(r) => &r.references,
            Self::Indicator(i) => &i.references,
            Self::Baseline(b) => &b.references,
            Self::PeriodValue(v) => &v.references,
            Self::Period(_) => &[],
        }
    }

    fn document_links(&self) -> &'a [DocumentLink] {
        match self {
            Self::Result(r) => &r.document_links,
            Self::Indicator(i) => &i.document_links,
            Self::Baseline(b) => &b.document_links,
            Self::PeriodValue(v) => &v.document_links,
            Self::Period(_) => &[],
        }
    }

    /// Result references use the result vocabulary; all others are indicator-level.
    fn reference_list(&self) -> CodeList {
        match self {
            Self::Result(_) => CodeList::ResultVocabulary,
            _ => CodeList::IndicatorVocabulary,
        }
    }
}

fn walk_results<'a>(results: &'a [ResultRecord], visit: &mut impl FnMut(NodePath, Node<'a>)) {
    for (ri, result) in results.iter().enumerate() {
        let result_path = NodePath {
            result: ri,
            indicator: None,
            period: None,
            part: None,
        };
        visit(result_path, Node::Result(result));

        for (ii, indicator) in result.indicators.iter().enumerate() {
            let indicator_path = NodePath {
                indicator: Some(ii),
                ..result_path
            };
            visit(indicator_path, Node::Indicator(indicator));

            if let Some(baseline) = &indicator.baseline {
                let path = NodePath {
                    part: Some("baseline"),
                    ..indicator_path
                };
                visit(path, Node::Baseline(baseline));
            }

            for (pi, period) in indicator.periods.iter().enumerate() {
                let period_path = NodePath {
                    period: Some(pi),
                    ..indicator_path
                };
                visit(period_path, Node::Period(period));
                for (part, value) in [("target", &period.target), ("actual", &period.actual)] {
                    if let Some(value) = value {
                        let path = NodePath {
                            part: Some(part),
                            ..period_path
                        };
                        visit(path, Node::PeriodValue(value));
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coded fields
// ---------------------------------------------------------------------------

/// A populated field whose value must come from a code list.
struct CodedField<'a> {
    code_list: CodeList,
    /// Value handed to the lookup (legacy transaction type names are mapped
    /// to their IATI code first).
    code: &'a str,
    /// Value as written in the source.
    raw: &'a str,
    field: &'static str,
    activity_id: Option<&'a str>,
    transaction_index: Option<u32>,
    location: String,
}

fn coded_fields(record_index: RecordIndex, record: &ImportRecord) -> Vec<CodedField<'_>> {
    let mut fields = Vec::new();
    let label = record_label(record_index, record);
    let activity_id = record.activity_id();

    if let ImportRecord::Activity(activity) = record {
        for (k, sector) in activity.sectors.iter().enumerate() {
            // Only DAC 5-digit codes (vocabulary 1, the default) are checked.
            let dac = text(&sector.vocabulary).is_none_or(|v| v == "1");
            if let (true, Some(code)) = (dac, text(&sector.code)) {
                fields.push(CodedField {
                    code_list: CodeList::Sector,
                    code,
                    raw: code,
                    field: FIELD_SECTOR,
                    activity_id,
                    transaction_index: None,
                    location: format!("{label}, sector {}", k + 1),
                });
            }
        }
    }

    for view in transactions(record_index, record) {
        if let Some(raw) = text(&view.tx.transaction_type) {
            let code = TransactionType::parse(raw).map_or(raw, |t| t.code());
            fields.push(CodedField {
                code_list: CodeList::TransactionType,
                code,
                raw,
                field: FIELD_TRANSACTION_TYPE,
                activity_id: view.activity_id(),
                transaction_index: view.position,
                location: view.label(),
            });
        }
        if let Some(currency) = text(&view.tx.currency) {
            fields.push(CodedField {
                code_list: CodeList::Currency,
                code: currency,
                raw: currency,
                field: FIELD_CURRENCY,
                activity_id: view.activity_id(),
                transaction_index: view.position,
                location: view.label(),
            });
        }
    }

    walk_results(record.results(), &mut |path, node| {
        let mut push = |code_list, value, field, location| {
            push_coded(&mut fields, code_list, value, field, activity_id, location)
        };

        match node {
            Node::Result(r) => push(CodeList::ResultType, &r.result_type, FIELD_RESULT_TYPE, format!("{label}: {path}")),
            Node::Indicator(i) => push(CodeList::IndicatorMeasure, &i.measure, FIELD_MEASURE, format!("{label}: {path}")),
            _ => {}
        }
        for (k, reference) in node.references().iter().enumerate() {
            push(
                node.reference_list(),
                &reference.vocabulary,
                FIELD_REFERENCE_VOCABULARY,
                format!("{label}: {path}, reference {}", k + 1),
            );
        }
        for (k, doc) in node.document_links().iter().enumerate() {
            let location = format!("{label}: {path}, document {}", k + 1);
            push(CodeList::FileFormat, &doc.format, FIELD_DOCUMENT_FORMAT, location.clone());
            push(CodeList::DocumentCategory, &doc.category_code, FIELD_DOCUMENT_CATEGORY, location);
        }
    });

    fields
}

fn push_coded<'a>(
    fields: &mut Vec<CodedField<'a>>,
    code_list: CodeList,
    value: &'a Option<String>,
    field: &'static str,
    activity_id: Option<&'a str>,
    location: String,
) {
    if let Some(code) = text(value) {
        fields.push(CodedField {
            code_list,
            code,
            raw: code,
            field,
            activity_id,
            transaction_index: None,
            location,
        });
    }
}
