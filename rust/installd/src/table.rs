use crate::model::{format_date_label, LoanInstallment};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnId {
    /// Synthetic sequence: position in the collection, 1-based.
    Sl,
    Name,
    EmployeeCode,
    LoanNo,
    InstallmentAmount,
    Payment,
    Date,
    Receiver,
    InstallNo,
    Notes,
}

impl ColumnId {
    pub fn is_sortable(self) -> bool {
        !matches!(self, Self::Sl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSort {
    pub column_id: ColumnId,
    pub descending: bool,
}

impl Default for ColumnSort {
    fn default() -> Self {
        Self {
            column_id: ColumnId::Sl,
            descending: false,
        }
    }
}

impl ColumnSort {
    /// Header click cycle: ascending, descending, then back to the default order.
    pub fn toggled(&self, column_id: ColumnId) -> Self {
        if self.column_id != column_id {
            return Self {
                column_id,
                descending: false,
            };
        }
        if self.descending {
            Self::default()
        } else {
            Self {
                column_id,
                descending: true,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    fn effective_size(&self) -> usize {
        self.page_size.max(1)
    }

    pub fn page_count(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.effective_size())
    }

    pub fn first_page(&self) -> Self {
        Self {
            page_index: 0,
            ..*self
        }
    }

    pub fn next(&self, row_count: usize) -> Self {
        let last = self.page_count(row_count).saturating_sub(1);
        Self {
            page_index: self.page_index.saturating_add(1).min(last),
            ..*self
        }
    }

    pub fn previous(&self) -> Self {
        Self {
            page_index: self.page_index.saturating_sub(1),
            ..*self
        }
    }

    /// Keeps the first row of the current page visible after resizing.
    pub fn resized(&self, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let top_row = self.page_index.saturating_mul(self.effective_size());
        Self {
            page_index: top_row / page_size,
            page_size,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableViewState {
    pub filter_text: String,
    pub sort: ColumnSort,
    pub pagination: Pagination,
    pub row_selection: BTreeSet<String>,
}

pub enum Updater<T> {
    Replace(T),
    Transform(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Updater<T> {
    pub fn transform(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Self::Transform(Box::new(f))
    }

    fn apply(self, current: &T) -> T {
        match self {
            Self::Replace(v) => v,
            Self::Transform(f) => f(current),
        }
    }
}

/// One slot of the view-state together with how to change it.
pub enum TableStateUpdate {
    Sorting(Updater<ColumnSort>),
    Filter(Updater<String>),
    Pagination(Updater<Pagination>),
    RowSelection(Updater<BTreeSet<String>>),
}

impl TableStateUpdate {
    /// Builds a replacement for the slot named `key` from its serialized value.
    pub fn replace_from_json(key: &str, value: serde_json::Value) -> Result<Self, String> {
        let update = match key {
            "sorting" => Self::Sorting(Updater::Replace(decode(key, value)?)),
            "filter" => Self::Filter(Updater::Replace(decode(key, value)?)),
            "pagination" => Self::Pagination(Updater::Replace(decode(key, value)?)),
            "rowSelection" => Self::RowSelection(Updater::Replace(decode(key, value)?)),
            other => {
                return Err(format!(
                    "unknown table state key {other}; expected sorting, filter, pagination or rowSelection"
                ))
            }
        };
        Ok(update)
    }

    pub fn slot(&self) -> &'static str {
        match self {
            Self::Sorting(_) => "sorting",
            Self::Filter(_) => "filter",
            Self::Pagination(_) => "pagination",
            Self::RowSelection(_) => "rowSelection",
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, value: serde_json::Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid {key} value: {e}"))
}

impl TableViewState {
    pub fn apply(&mut self, update: TableStateUpdate) {
        match update {
            TableStateUpdate::Sorting(u) => self.sort = u.apply(&self.sort),
            TableStateUpdate::Filter(u) => self.filter_text = u.apply(&self.filter_text),
            TableStateUpdate::Pagination(u) => self.pagination = u.apply(&self.pagination),
            TableStateUpdate::RowSelection(u) => {
                self.row_selection = u.apply(&self.row_selection)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow<'a> {
    pub sl: usize,
    pub selected: bool,
    pub name: String,
    pub date_label: String,
    #[serde(flatten)]
    pub installment: &'a LoanInstallment,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView<'a> {
    pub rows: Vec<TableRow<'a>>,
    pub total_count: usize,
    pub filtered_count: usize,
    pub selected_count: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub all_page_rows_selected: bool,
}

impl TableView<'_> {
    pub fn page_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.installment.id.clone()).collect()
    }
}

fn searchable_cells(inst: &LoanInstallment) -> [String; 10] {
    [
        inst.full_name(),
        inst.employee_code.clone(),
        inst.loan_no.clone(),
        inst.installment_amount.to_string(),
        inst.payment.to_string(),
        format_date_label(&inst.date),
        inst.date.format("%Y-%m-%d").to_string(),
        inst.receiver.clone(),
        inst.install_no.to_string(),
        inst.notes.clone(),
    ]
}

fn matches_filter(inst: &LoanInstallment, needle: &str) -> bool {
    searchable_cells(inst)
        .iter()
        .any(|cell| cell.to_lowercase().contains(needle))
}

/// Case-insensitive, with digit runs compared by value so "GL-2" sorts before "GL-10".
fn compare_text(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ord = compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_rows(
    column: ColumnId,
    (ia, a): (usize, &LoanInstallment),
    (ib, b): (usize, &LoanInstallment),
) -> Ordering {
    match column {
        ColumnId::Sl => ia.cmp(&ib),
        ColumnId::Name => compare_text(&a.full_name(), &b.full_name()),
        ColumnId::EmployeeCode => compare_text(&a.employee_code, &b.employee_code),
        ColumnId::LoanNo => compare_text(&a.loan_no, &b.loan_no),
        ColumnId::InstallmentAmount => a.installment_amount.total_cmp(&b.installment_amount),
        ColumnId::Payment => a.payment.total_cmp(&b.payment),
        ColumnId::Date => a.date.cmp(&b.date),
        ColumnId::Receiver => compare_text(&a.receiver, &b.receiver),
        ColumnId::InstallNo => a.install_no.cmp(&b.install_no),
        ColumnId::Notes => compare_text(&a.notes, &b.notes),
    }
}

/// Filters, sorts and pages the collection without touching it.
pub fn project<'a>(installments: &'a [LoanInstallment], state: &TableViewState) -> TableView<'a> {
    let needle = state.filter_text.trim().to_lowercase();
    let mut visible: Vec<(usize, &LoanInstallment)> = installments
        .iter()
        .enumerate()
        .filter(|(_, inst)| needle.is_empty() || matches_filter(inst, &needle))
        .collect();

    // Vec::sort_by is stable; reversing the comparator keeps ties in insertion order.
    let sort = state.sort;
    visible.sort_by(|a, b| {
        let ord = compare_rows(sort.column_id, *a, *b);
        if sort.descending {
            ord.reverse()
        } else {
            ord
        }
    });

    let pagination = state.pagination;
    let page_size = pagination.effective_size();
    let filtered_count = visible.len();
    let rows: Vec<TableRow<'a>> = visible
        .into_iter()
        .skip(pagination.page_index.saturating_mul(page_size))
        .take(page_size)
        .map(|(idx, inst)| TableRow {
            sl: idx + 1,
            selected: state.row_selection.contains(&inst.id),
            name: inst.full_name(),
            date_label: format_date_label(&inst.date),
            installment: inst,
        })
        .collect();

    let selected_count = installments
        .iter()
        .filter(|i| state.row_selection.contains(&i.id))
        .count();
    let all_page_rows_selected = !rows.is_empty() && rows.iter().all(|r| r.selected);

    TableView {
        rows,
        total_count: installments.len(),
        filtered_count,
        selected_count,
        page_index: pagination.page_index,
        page_size,
        page_count: pagination.page_count(filtered_count),
        all_page_rows_selected,
    }
}
