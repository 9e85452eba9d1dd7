use crate::model::{parse_date_input, LoanInstallmentPatch};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// A text input as it arrives from the form, before coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawText {
    #[default]
    Missing,
    Text(String),
    NotText,
}

impl From<&str> for RawText {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RawText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::String(s) => Self::Text(s),
            _ => Self::NotText,
        })
    }
}

/// The date picker's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawDate {
    #[default]
    Missing,
    Picked(NaiveDate),
    NotDate,
}

impl From<NaiveDate> for RawDate {
    fn from(value: NaiveDate) -> Self {
        Self::Picked(value)
    }
}

impl<'de> Deserialize<'de> for RawDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::String(s) => match parse_date_input(&s) {
                Some(d) => Self::Picked(d),
                None => Self::NotDate,
            },
            _ => Self::NotDate,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstallmentForm {
    pub employee: RawText,
    pub grant_loan: RawText,
    pub payment: RawText,
    pub date: RawDate,
    pub receiver: RawText,
    pub install_no: RawText,
    pub notes: RawText,
}

/// Edit dialog input. Employee and granted loan are fixed after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstallmentUpdateForm {
    pub payment: RawText,
    pub date: RawDate,
    pub receiver: RawText,
    pub install_no: RawText,
    pub notes: RawText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInstallment {
    pub employee_id: String,
    pub grant_loan_id: String,
    pub payment: f64,
    pub date: NaiveDate,
    pub receiver: String,
    pub install_no: u32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(pub BTreeMap<&'static str, String>);

#[cfg(test)]
impl ValidationErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

struct FieldLabels {
    key: &'static str,
    label: &'static str,
}

const EMPLOYEE: FieldLabels = FieldLabels {
    key: "employee",
    label: "Employee",
};
const GRANT_LOAN: FieldLabels = FieldLabels {
    key: "grantLoan",
    label: "Granted loan",
};
const PAYMENT: FieldLabels = FieldLabels {
    key: "payment",
    label: "Payment",
};
const DATE: FieldLabels = FieldLabels {
    key: "date",
    label: "Date",
};
const RECEIVER: FieldLabels = FieldLabels {
    key: "receiver",
    label: "Receiver",
};
const INSTALL_NO: FieldLabels = FieldLabels {
    key: "installNo",
    label: "Installment number",
};
const NOTES: FieldLabels = FieldLabels {
    key: "notes",
    label: "Notes",
};

#[derive(Default)]
struct Collector {
    errors: BTreeMap<&'static str, String>,
}

impl Collector {
    fn check<T>(
        &mut self,
        field: &FieldLabels,
        result: Result<T, String>,
    ) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(message) => {
                self.errors.insert(field.key, message);
                None
            }
        }
    }

    fn required<T>(
        &mut self,
        field: &FieldLabels,
        value: Option<Result<T, String>>,
    ) -> Option<T> {
        let result = value.unwrap_or_else(|| Err(format!("{} is required", field.label)));
        self.check(field, result)
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

fn text_of<'a>(field: &FieldLabels, raw: &'a RawText) -> Option<Result<&'a str, String>> {
    match raw {
        RawText::Missing => None,
        RawText::NotText => Some(Err(format!("{} must be a string", field.label))),
        RawText::Text(s) => Some(Ok(s.as_str())),
    }
}

fn non_blank(field: &FieldLabels, raw: &RawText) -> Option<Result<String, String>> {
    text_of(field, raw).map(|r| {
        r.and_then(|s| {
            if s.is_empty() {
                Err(format!("{} can't be blank", field.label))
            } else {
                Ok(s.to_string())
            }
        })
    })
}

/// Blank input counts as zero, matching how the form coerces an empty box.
fn parse_number(field: &FieldLabels, s: &str) -> Result<f64, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{} must be a number", field.label)),
    }
}

fn positive_amount(field: &FieldLabels, raw: &RawText) -> Option<Result<f64, String>> {
    text_of(field, raw).map(|r| {
        r.and_then(|s| {
            let v = parse_number(field, s)?;
            if v > 0.0 {
                Ok(v)
            } else {
                Err(format!("{} must be greater than 0", field.label))
            }
        })
    })
}

fn positive_integer(field: &FieldLabels, raw: &RawText) -> Option<Result<u32, String>> {
    text_of(field, raw).map(|r| {
        r.and_then(|s| {
            let v = parse_number(field, s)?;
            if v.fract() != 0.0 {
                return Err(format!("{} must be an integer", field.label));
            }
            if v <= 0.0 {
                return Err(format!("{} must be greater than 0", field.label));
            }
            if v > f64::from(u32::MAX) {
                return Err(format!("{} is too large", field.label));
            }
            Ok(v as u32)
        })
    })
}

fn picked_date(field: &FieldLabels, raw: &RawDate) -> Option<Result<NaiveDate, String>> {
    match raw {
        RawDate::Missing => None,
        RawDate::NotDate => Some(Err(format!("{} must be a date", field.label))),
        RawDate::Picked(d) => Some(Ok(*d)),
    }
}

pub fn validate_create(form: &InstallmentForm) -> Result<ValidatedInstallment, ValidationErrors> {
    let mut c = Collector::default();
    let employee_id = c.required(&EMPLOYEE, non_blank(&EMPLOYEE, &form.employee));
    let grant_loan_id = c.required(&GRANT_LOAN, non_blank(&GRANT_LOAN, &form.grant_loan));
    let payment = c.required(&PAYMENT, positive_amount(&PAYMENT, &form.payment));
    let date = c.required(&DATE, picked_date(&DATE, &form.date));
    let receiver = c.required(&RECEIVER, non_blank(&RECEIVER, &form.receiver));
    let install_no = c.required(&INSTALL_NO, positive_integer(&INSTALL_NO, &form.install_no));
    let notes = c.required(&NOTES, non_blank(&NOTES, &form.notes));

    match (
        employee_id,
        grant_loan_id,
        payment,
        date,
        receiver,
        install_no,
        notes,
    ) {
        (
            Some(employee_id),
            Some(grant_loan_id),
            Some(payment),
            Some(date),
            Some(receiver),
            Some(install_no),
            Some(notes),
        ) => Ok(ValidatedInstallment {
            employee_id,
            grant_loan_id,
            payment,
            date,
            receiver,
            install_no,
            notes,
        }),
        _ => Err(ValidationErrors(c.errors)),
    }
}

pub fn validate_update(
    form: &InstallmentUpdateForm,
) -> Result<LoanInstallmentPatch, ValidationErrors> {
    let mut c = Collector::default();
    let mut patch = LoanInstallmentPatch::default();
    if let Some(r) = positive_amount(&PAYMENT, &form.payment) {
        patch.payment = c.check(&PAYMENT, r);
    }
    if let Some(r) = picked_date(&DATE, &form.date) {
        patch.date = c.check(&DATE, r);
    }
    if let Some(r) = non_blank(&RECEIVER, &form.receiver) {
        patch.receiver = c.check(&RECEIVER, r);
    }
    if let Some(r) = positive_integer(&INSTALL_NO, &form.install_no) {
        patch.install_no = c.check(&INSTALL_NO, r);
    }
    if let Some(r) = non_blank(&NOTES, &form.notes) {
        patch.notes = c.check(&NOTES, r);
    }
    c.finish()?;
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_form() -> InstallmentForm {
        InstallmentForm {
            employee: "emp-1".into(),
            grant_loan: "loan-1".into(),
            payment: "100".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("date").into(),
            receiver: "Ann Lee".into(),
            install_no: "1".into(),
            notes: "first".into(),
        }
    }

    fn payment_error(raw: &str) -> Option<String> {
        let form = InstallmentForm {
            payment: raw.into(),
            ..valid_form()
        };
        validate_create(&form)
            .err()
            .and_then(|e| e.get("payment").map(str::to_string))
    }

    fn install_no_error(raw: &str) -> Option<String> {
        let form = InstallmentForm {
            install_no: raw.into(),
            ..valid_form()
        };
        validate_create(&form)
            .err()
            .and_then(|e| e.get("installNo").map(str::to_string))
    }

    #[test]
    fn valid_form_passes_and_coerces() {
        let v = validate_create(&valid_form()).expect("valid");
        assert_eq!(v.employee_id, "emp-1");
        assert_eq!(v.payment, 100.0);
        assert_eq!(v.install_no, 1);
        assert_eq!(v.date, NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"));
    }

    #[test]
    fn payment_must_be_a_positive_number() {
        assert_eq!(payment_error("0").as_deref(), Some("Payment must be greater than 0"));
        assert_eq!(payment_error("-5").as_deref(), Some("Payment must be greater than 0"));
        assert_eq!(payment_error("abc").as_deref(), Some("Payment must be a number"));
        assert_eq!(payment_error("").as_deref(), Some("Payment must be greater than 0"));
        assert_eq!(payment_error("NaN").as_deref(), Some("Payment must be a number"));
        assert_eq!(payment_error("12.50"), None);
        assert_eq!(payment_error(" 7 "), None);
    }

    #[test]
    fn installment_number_must_be_a_positive_integer() {
        assert_eq!(
            install_no_error("2.5").as_deref(),
            Some("Installment number must be an integer")
        );
        assert_eq!(
            install_no_error("0").as_deref(),
            Some("Installment number must be greater than 0")
        );
        assert_eq!(
            install_no_error("x").as_deref(),
            Some("Installment number must be a number")
        );
        assert_eq!(
            install_no_error("99999999999").as_deref(),
            Some("Installment number is too large")
        );
        assert_eq!(install_no_error("3"), None);
        assert_eq!(install_no_error("3.0"), None);
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let errors = validate_create(&InstallmentForm::default()).expect_err("empty");
        assert_eq!(errors.0.len(), 7);
        assert_eq!(errors.get("employee"), Some("Employee is required"));
        assert_eq!(errors.get("grantLoan"), Some("Granted loan is required"));
        assert_eq!(errors.get("date"), Some("Date is required"));
        assert_eq!(errors.get("notes"), Some("Notes is required"));
    }

    #[test]
    fn blank_and_mistyped_fields_fail_from_json() {
        let form: InstallmentForm = serde_json::from_value(json!({
            "employee": "",
            "grantLoan": 7,
            "payment": "10",
            "date": "not a date",
            "receiver": "",
            "installNo": "1",
            "notes": null
        }))
        .expect("deserialize");
        let errors = validate_create(&form).expect_err("invalid");
        assert_eq!(errors.get("employee"), Some("Employee can't be blank"));
        assert_eq!(errors.get("grantLoan"), Some("Granted loan must be a string"));
        assert_eq!(errors.get("date"), Some("Date must be a date"));
        assert_eq!(errors.get("receiver"), Some("Receiver can't be blank"));
        assert_eq!(errors.get("notes"), Some("Notes is required"));
        assert_eq!(errors.get("payment"), None);
    }

    #[test]
    fn update_treats_missing_fields_as_unchanged() {
        let patch = validate_update(&InstallmentUpdateForm::default()).expect("empty update");
        assert!(patch.is_empty());

        let form: InstallmentUpdateForm =
            serde_json::from_value(json!({ "payment": "250.75", "notes": "late" }))
                .expect("deserialize");
        let patch = validate_update(&form).expect("valid update");
        assert_eq!(patch.payment, Some(250.75));
        assert_eq!(patch.notes.as_deref(), Some("late"));
        assert_eq!(patch.receiver, None);
        assert_eq!(patch.install_no, None);
    }

    #[test]
    fn update_applies_the_same_field_rules() {
        let form = InstallmentUpdateForm {
            payment: "0".into(),
            receiver: "".into(),
            install_no: "1.5".into(),
            ..Default::default()
        };
        let errors = validate_update(&form).expect_err("invalid update");
        assert_eq!(errors.get("payment"), Some("Payment must be greater than 0"));
        assert_eq!(errors.get("receiver"), Some("Receiver can't be blank"));
        assert_eq!(
            errors.get("installNo"),
            Some("Installment number must be an integer")
        );
    }
}
