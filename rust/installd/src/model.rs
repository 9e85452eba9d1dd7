use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedLoan {
    pub id: String,
    pub loan_no: String,
    pub repayment_total: f64,
    #[serde(default)]
    pub installment_period: u32,
}

impl GrantedLoan {
    /// Per-installment share of the repayment total. A zero period divides by 1.
    pub fn installment_amount(&self) -> f64 {
        let period = if self.installment_period == 0 {
            1
        } else {
            self.installment_period
        };
        self.repayment_total / f64::from(period)
    }
}

/// One recorded repayment. Employee and loan fields are snapshots taken when the
/// record was created and are never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanInstallment {
    pub id: String,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: String,
    pub grant_loan_id: String,
    pub loan_no: String,
    pub installment_amount: f64,
    pub payment: f64,
    #[serde(with = "iso_datetime")]
    pub date: NaiveDate,
    pub receiver: String,
    pub install_no: u32,
    pub notes: String,
}

impl LoanInstallment {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Editable subset of an installment. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanInstallmentPatch {
    pub payment: Option<f64>,
    pub date: Option<NaiveDate>,
    pub receiver: Option<String>,
    pub install_no: Option<u32>,
    pub notes: Option<String>,
}

impl LoanInstallmentPatch {
    pub fn is_empty(&self) -> bool {
        self.payment.is_none()
            && self.date.is_none()
            && self.receiver.is_none()
            && self.install_no.is_none()
            && self.notes.is_none()
    }

    pub fn apply(&self, target: &mut LoanInstallment) {
        if let Some(v) = self.payment {
            target.payment = v;
        }
        if let Some(v) = self.date {
            target.date = v;
        }
        if let Some(v) = &self.receiver {
            target.receiver = v.clone();
        }
        if let Some(v) = self.install_no {
            target.install_no = v;
        }
        if let Some(v) = &self.notes {
            target.notes = v.clone();
        }
    }
}

pub fn format_iso_datetime(date: &NaiveDate) -> String {
    format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

/// Accepts RFC 3339 (keeping the calendar date in its own offset) or a bare
/// `YYYY-MM-DD`.
pub fn parse_date_input(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Display label used by the installments table, e.g. "15th Jan 2024".
pub fn format_date_label(date: &NaiveDate) -> String {
    use chrono::Datelike;
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix} {}", date.format("%b %Y"))
}

mod iso_datetime {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_iso_datetime(date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date_input(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
    }
}
