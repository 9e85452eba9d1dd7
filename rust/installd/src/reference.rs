use crate::model::{Employee, GrantedLoan, LoanInstallment};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const DEFAULT_SEED: &str = include_str!("../seed/default_seed.json");

/// Read-only lookup lists backing the create form.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    employees: Vec<Employee>,
    granted_loans: Vec<GrantedLoan>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl ReferenceData {
    pub fn new(employees: Vec<Employee>, granted_loans: Vec<GrantedLoan>) -> Self {
        Self {
            employees,
            granted_loans,
        }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn granted_loans(&self) -> &[GrantedLoan] {
        &self.granted_loans
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn granted_loan(&self, id: &str) -> Option<&GrantedLoan> {
        self.granted_loans.iter().find(|l| l.id == id)
    }

    pub fn employee_options(&self) -> Vec<SelectOption> {
        self.employees
            .iter()
            .map(|e| SelectOption {
                value: e.id.clone(),
                label: format!("{} ({})", e.full_name(), e.employee_code),
            })
            .collect()
    }

    pub fn granted_loan_options(&self) -> Vec<SelectOption> {
        self.granted_loans
            .iter()
            .map(|l| SelectOption {
                value: l.id.clone(),
                label: l.loan_no.clone(),
            })
            .collect()
    }
}

/// Startup document: reference lists plus the installments already on record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub granted_loans: Vec<GrantedLoan>,
    #[serde(default)]
    pub installments: Vec<LoanInstallment>,
}

impl Seed {
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(DEFAULT_SEED).context("embedded default seed")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read seed file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parse seed file {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let seed: Seed = serde_json::from_str(text)?;
        seed.check()?;
        Ok(seed)
    }

    fn check(&self) -> anyhow::Result<()> {
        ensure_unique("employee", self.employees.iter().map(|e| e.id.as_str()))?;
        ensure_unique("granted loan", self.granted_loans.iter().map(|l| l.id.as_str()))?;
        ensure_unique("installment", self.installments.iter().map(|i| i.id.as_str()))?;

        let employees: HashSet<&str> = self.employees.iter().map(|e| e.id.as_str()).collect();
        let loans: HashSet<&str> = self.granted_loans.iter().map(|l| l.id.as_str()).collect();
        for inst in &self.installments {
            if !employees.contains(inst.employee_id.as_str()) {
                bail!(
                    "installment {} references unknown employee {}",
                    inst.id,
                    inst.employee_id
                );
            }
            if !loans.contains(inst.grant_loan_id.as_str()) {
                bail!(
                    "installment {} references unknown granted loan {}",
                    inst.id,
                    inst.grant_loan_id
                );
            }
        }
        Ok(())
    }

    pub fn into_parts(self) -> (ReferenceData, Vec<LoanInstallment>) {
        (
            ReferenceData::new(self.employees, self.granted_loans),
            self.installments,
        )
    }
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() {
            bail!("{kind} with empty id");
        }
        if !seen.insert(id) {
            bail!("duplicate {kind} id {id}");
        }
    }
    Ok(())
}
