use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::models::Product;

use super::forms::Suggestions;

/// Statuses always offered by the form, even before any product uses them.
const DEFAULT_STATUSES: &[&str] = &["Active", "Discontinued"];

/// Which slice of the inventory the grid is showing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum GridView {
    All,
    Category(String),
    LowStock(i64),
}

impl GridView {
    pub(crate) fn title(&self) -> String {
        match self {
            GridView::All => "Products".to_string(),
            GridView::Category(category) => format!("Products in category '{category}'"),
            GridView::LowStock(threshold) => format!("Low stock (quantity <= {threshold})"),
        }
    }
}

/// Immutable snapshot of the rows on screen plus the cursor over them. The
/// snapshot is replaced wholesale after every write.
pub(crate) struct ProductGrid {
    pub(crate) products: Vec<Product>,
    pub(crate) view: GridView,
    pub(crate) selected: usize,
    pub(crate) total_value: Option<Decimal>,
    pub(crate) suggestions: Suggestions,
}

impl ProductGrid {
    pub(crate) fn new(products: Vec<Product>, total_value: Option<Decimal>) -> Self {
        let mut grid = Self {
            products: Vec::new(),
            view: GridView::All,
            selected: 0,
            total_value,
            suggestions: Suggestions::default(),
        };
        grid.suggestions = collect_suggestions(&products);
        grid.replace(products, None);
        grid
    }

    /// Swap in a new snapshot, keeping the cursor on `focus_id` when it is
    /// still visible and clamping it otherwise.
    pub(crate) fn replace(&mut self, products: Vec<Product>, focus_id: Option<&str>) {
        self.products = products;
        if let Some(id) = focus_id {
            if let Some(idx) = self.products.iter().position(|p| p.id == id) {
                self.selected = idx;
                return;
            }
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn current_product(&self) -> Option<&Product> {
        self.products.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, delta: isize) {
        if self.products.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.products.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.products.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.products.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.products.len() {
            self.selected = self.products.len() - 1;
        }
    }
}

/// Distinct, case-insensitively sorted category and status values for the
/// form's autocomplete.
pub(crate) fn collect_suggestions(products: &[Product]) -> Suggestions {
    let categories = distinct(products.iter().map(|p| p.category.as_str()));
    let statuses = distinct(
        products
            .iter()
            .map(|p| p.status.as_str())
            .chain(DEFAULT_STATUSES.iter().copied()),
    );

    Suggestions {
        categories,
        statuses,
    }
}

/// First spelling of each value, ignoring case, in case-insensitive order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: BTreeSet<(String, &str)> = values
        .filter(|value| !value.trim().is_empty())
        .map(|value| (value.to_lowercase(), value))
        .collect();

    let mut out: Vec<String> = Vec::with_capacity(set.len());
    let mut last_lower: Option<String> = None;
    for (lower, value) in set {
        if last_lower.as_deref() != Some(lower.as_str()) {
            out.push(value.to_string());
            last_lower = Some(lower);
        }
    }
    out
}
