use crate::model::{LoanInstallment, LoanInstallmentPatch};
use crate::reference::{ReferenceData, Seed};
use crate::table::{project, TableStateUpdate, TableView, TableViewState};
use crate::validation::ValidatedInstallment;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

const TIMESTAMP_BITS: u32 = 44;
const TIMESTAMP_MASK: u128 = (1 << TIMESTAMP_BITS) - 1;
const RANDOM_MASK: u128 = (1 << 24) - 1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("employee {0} not found")]
    UnknownEmployee(String),
    #[error("granted loan {0} not found")]
    UnknownGrantedLoan(String),
    #[error("no installment selected for editing")]
    NoEditTarget,
    #[error("no installment selected for deletion")]
    NoDeleteTarget,
    #[error("installment {0} not found")]
    InstallmentNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    Success,
}

/// User-facing toast text produced by a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: &'static str,
}

impl Notice {
    const fn success(message: &'static str) -> Self {
        Self {
            kind: NoticeKind::Success,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Targets {
    pub edit_id: Option<String>,
    pub delete_id: Option<String>,
    pub edit_open: bool,
    pub delete_open: bool,
}

/// Current values for the edit dialog, in the shape its inputs expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFormValues {
    pub id: String,
    pub payment: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub receiver: String,
    pub install_no: String,
    pub notes: String,
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&crate::model::format_iso_datetime(date))
}

/// 24 random bits over a 44-bit millisecond clock, always 17 hex digits.
pub fn generate_installment_id() -> String {
    let random = Uuid::new_v4().as_u128() & RANDOM_MASK;
    let millis = u128::try_from(Utc::now().timestamp_millis()).unwrap_or(0) & TIMESTAMP_MASK;
    format!("{:017x}", (random << TIMESTAMP_BITS) | millis)
}

pub struct InstallmentStore {
    reference: ReferenceData,
    installments: Vec<LoanInstallment>,
    table: TableViewState,
    edit_target: Option<String>,
    delete_target: Option<String>,
}

impl InstallmentStore {
    pub fn new(seed: Seed) -> Self {
        let (reference, installments) = seed.into_parts();
        Self {
            reference,
            installments,
            table: TableViewState::default(),
            edit_target: None,
            delete_target: None,
        }
    }

    pub fn reset(&mut self, seed: Seed) {
        *self = Self::new(seed);
        log::info!(
            "store reset: {} employees, {} granted loans, {} installments",
            self.reference.employees().len(),
            self.reference.granted_loans().len(),
            self.installments.len()
        );
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn installments(&self) -> &[LoanInstallment] {
        &self.installments
    }

    pub fn get(&self, id: &str) -> Option<&LoanInstallment> {
        self.installments.iter().find(|i| i.id == id)
    }

    pub fn table_state(&self) -> &TableViewState {
        &self.table
    }

    pub fn view(&self) -> TableView<'_> {
        project(&self.installments, &self.table)
    }

    /// Resolves the validated form against reference data into a full record.
    pub fn build_installment(
        &self,
        input: ValidatedInstallment,
    ) -> Result<LoanInstallment, StoreError> {
        let employee = self
            .reference
            .employee(&input.employee_id)
            .ok_or_else(|| StoreError::UnknownEmployee(input.employee_id.clone()))?;
        let loan = self
            .reference
            .granted_loan(&input.grant_loan_id)
            .ok_or_else(|| StoreError::UnknownGrantedLoan(input.grant_loan_id.clone()))?;

        Ok(LoanInstallment {
            id: generate_installment_id(),
            employee_id: employee.id.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            employee_code: employee.employee_code.clone(),
            grant_loan_id: loan.id.clone(),
            loan_no: loan.loan_no.clone(),
            installment_amount: loan.installment_amount(),
            payment: input.payment,
            date: input.date,
            receiver: input.receiver,
            install_no: input.install_no,
            notes: input.notes,
        })
    }

    pub fn create(
        &mut self,
        input: ValidatedInstallment,
    ) -> Result<(LoanInstallment, Notice), StoreError> {
        let record = self.build_installment(input)?;
        let notice = self.add(record.clone())?;
        Ok((record, notice))
    }

    pub fn add(&mut self, record: LoanInstallment) -> Result<Notice, StoreError> {
        if self.reference.employee(&record.employee_id).is_none() {
            log::warn!("add rejected: unknown employee {}", record.employee_id);
            return Err(StoreError::UnknownEmployee(record.employee_id));
        }
        if self.reference.granted_loan(&record.grant_loan_id).is_none() {
            log::warn!("add rejected: unknown granted loan {}", record.grant_loan_id);
            return Err(StoreError::UnknownGrantedLoan(record.grant_loan_id));
        }
        log::info!(
            "installment {} added for loan {} (install no {})",
            record.id,
            record.loan_no,
            record.install_no
        );
        self.installments.push(record);
        self.rewind_page();
        Ok(Notice::success("Loan installment added successfully"))
    }

    pub fn set_edit_target(&mut self, id: impl Into<String>) {
        self.edit_target = Some(id.into()).filter(|id: &String| !id.is_empty());
    }

    pub fn clear_edit_target(&mut self) {
        self.edit_target = None;
    }

    pub fn set_delete_target(&mut self, id: impl Into<String>) {
        self.delete_target = Some(id.into()).filter(|id: &String| !id.is_empty());
    }

    pub fn clear_delete_target(&mut self) {
        self.delete_target = None;
    }

    pub fn edit_target(&self) -> Option<&str> {
        self.edit_target.as_deref()
    }

    pub fn delete_target(&self) -> Option<&str> {
        self.delete_target.as_deref()
    }

    pub fn targets(&self) -> Targets {
        Targets {
            edit_id: self.edit_target().map(str::to_string),
            delete_id: self.delete_target().map(str::to_string),
            edit_open: self.edit_target.is_some(),
            delete_open: self.delete_target.is_some(),
        }
    }

    pub fn edit_form(&self) -> Result<EditFormValues, StoreError> {
        let id = self.edit_target.as_deref().ok_or(StoreError::NoEditTarget)?;
        let current = self
            .get(id)
            .ok_or_else(|| StoreError::InstallmentNotFound(id.to_string()))?;
        Ok(EditFormValues {
            id: current.id.clone(),
            payment: current.payment.to_string(),
            date: current.date,
            receiver: current.receiver.clone(),
            install_no: current.install_no.to_string(),
            notes: current.notes.clone(),
        })
    }

    /// Merges `patch` into the edit target. A target that no longer resolves
    /// leaves both the collection and the target untouched.
    pub fn edit(&mut self, patch: &LoanInstallmentPatch) -> Result<Notice, StoreError> {
        let id = self.edit_target.clone().ok_or(StoreError::NoEditTarget)?;
        let Some(record) = self.installments.iter_mut().find(|i| i.id == id) else {
            log::warn!("edit rejected: installment {id} not found");
            return Err(StoreError::InstallmentNotFound(id));
        };
        if patch.is_empty() {
            log::debug!("installment {id} edited with an empty patch");
        }
        patch.apply(record);
        self.edit_target = None;
        self.rewind_page();
        log::info!("installment {id} updated");
        Ok(Notice::success("Loan installment updated successfully"))
    }

    pub fn delete(&mut self) -> Result<(String, Notice), StoreError> {
        let id = self.delete_target.clone().ok_or(StoreError::NoDeleteTarget)?;
        let before = self.installments.len();
        self.installments.retain(|i| i.id != id);
        if self.installments.len() == before {
            log::warn!("delete rejected: installment {id} not found");
            return Err(StoreError::InstallmentNotFound(id));
        }
        self.table.row_selection.remove(&id);
        self.delete_target = None;
        self.rewind_page();
        log::info!("installment {id} deleted");
        Ok((id, Notice::success("Loan installment deleted successfully")))
    }

    /// Any change to the rows sends the table back to its first page.
    fn rewind_page(&mut self) {
        self.table.pagination = self.table.pagination.first_page();
    }

    pub fn update_table_view_state(&mut self, update: TableStateUpdate) {
        log::debug!("table state update: {}", update.slot());
        self.table.apply(update);
    }
}
