//! IATI transaction types and the value-sign policy attached to them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    IncomingFunds,
    OutgoingCommitment,
    Disbursement,
    Expenditure,
    InterestPayment,
    LoanRepayment,
    Reimbursement,
    PurchaseOfEquity,
    SaleOfEquity,
    CreditGuarantee,
    IncomingCommitment,
    OutgoingPledge,
    IncomingPledge,
}

impl TransactionType {
    /// Parse an IATI numeric code, a version-1 letter code, or a legacy name
    /// such as `incoming_funds`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        let parsed = match normalized.as_str() {
            "1" | "if" | "incoming_funds" => Self::IncomingFunds,
            "2" | "c" | "commitment" | "outgoing_commitment" => Self::OutgoingCommitment,
            "3" | "d" | "disbursement" => Self::Disbursement,
            "4" | "e" | "expenditure" => Self::Expenditure,
            "5" | "ir" | "interest_payment" | "interest_repayment" => Self::InterestPayment,
            "6" | "lr" | "loan_repayment" => Self::LoanRepayment,
            "7" | "r" | "reimbursement" => Self::Reimbursement,
            "8" | "qp" | "purchase_of_equity" => Self::PurchaseOfEquity,
            "9" | "qs" | "sale_of_equity" => Self::SaleOfEquity,
            "10" | "cg" | "credit_guarantee" => Self::CreditGuarantee,
            "11" | "incoming_commitment" => Self::IncomingCommitment,
            "12" | "outgoing_pledge" => Self::OutgoingPledge,
            "13" | "incoming_pledge" => Self::IncomingPledge,
            _ => return None,
        };
        Some(parsed)
    }

    /// IATI `TransactionType` code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::IncomingFunds => "1",
            Self::OutgoingCommitment => "2",
            Self::Disbursement => "3",
            Self::Expenditure => "4",
            Self::InterestPayment => "5",
            Self::LoanRepayment => "6",
            Self::Reimbursement => "7",
            Self::PurchaseOfEquity => "8",
            Self::SaleOfEquity => "9",
            Self::CreditGuarantee => "10",
            Self::IncomingCommitment => "11",
            Self::OutgoingPledge => "12",
            Self::IncomingPledge => "13",
        }
    }

    /// Disbursements and expenditures may be reversed or corrected with zero
    /// or negative values. Every other type needs a positive amount.
    pub fn allows_non_positive(&self) -> bool {
        matches!(self, Self::Disbursement | Self::Expenditure)
    }
}
