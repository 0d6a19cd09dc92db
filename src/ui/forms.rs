use std::str::FromStr;

use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use rust_decimal::Decimal;

use crate::models::Product;

/// Fields of the product form in tab order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum ProductField {
    #[default]
    Id,
    Name,
    Category,
    UnitPrice,
    Quantity,
    Supplier,
    Status,
}

impl ProductField {
    pub(crate) const ALL: [ProductField; 7] = [
        ProductField::Id,
        ProductField::Name,
        ProductField::Category,
        ProductField::UnitPrice,
        ProductField::Quantity,
        ProductField::Supplier,
        ProductField::Status,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            ProductField::Id => "Product ID",
            ProductField::Name => "Name",
            ProductField::Category => "Category",
            ProductField::UnitPrice => "Unit Price",
            ProductField::Quantity => "Quantity",
            ProductField::Supplier => "Supplier",
            ProductField::Status => "Status",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            ProductField::Id | ProductField::Name => "<required>",
            ProductField::UnitPrice | ProductField::Quantity => "<0 or more>",
            _ => "<optional>",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|field| *field == self).unwrap_or(0)
    }

    fn offset(self, step: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let next = (self.index() as isize + step).rem_euclid(len);
        Self::ALL[next as usize]
    }

    /// Fields that offer autocomplete from values already in the inventory.
    fn suggests(self) -> bool {
        matches!(self, ProductField::Category | ProductField::Status)
    }
}

/// Known values offered as completions for the free-text label fields.
#[derive(Default, Clone, Debug)]
pub(crate) struct Suggestions {
    pub(crate) categories: Vec<String>,
    pub(crate) statuses: Vec<String>,
}

impl Suggestions {
    fn for_field(&self, field: ProductField) -> &[String] {
        match field {
            ProductField::Category => &self.categories,
            ProductField::Status => &self.statuses,
            _ => &[],
        }
    }
}

/// Editable text state behind the add/edit product dialog.
#[derive(Default, Clone, Debug)]
pub(crate) struct ProductForm {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) unit_price: String,
    pub(crate) quantity: String,
    pub(crate) supplier: String,
    pub(crate) status: String,
    pub(crate) active: ProductField,
    pub(crate) error: Option<String>,
    /// Set while editing: the key of an existing record cannot change.
    pub(crate) id_locked: bool,
    suggestion: Option<String>,
    autocomplete_disabled: bool,
}

impl ProductForm {
    /// Populate the form from the selected grid row for editing.
    pub(crate) fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            unit_price: product.unit_price.to_string(),
            quantity: product.quantity.to_string(),
            supplier: product.supplier.clone(),
            status: product.status.clone(),
            active: ProductField::Name,
            id_locked: true,
            ..Self::default()
        }
    }

    /// Empty every field except a locked id.
    pub(crate) fn clear(&mut self) {
        let id = if self.id_locked {
            std::mem::take(&mut self.id)
        } else {
            String::new()
        };
        *self = Self {
            id,
            id_locked: self.id_locked,
            active: if self.id_locked {
                ProductField::Name
            } else {
                ProductField::Id
            },
            ..Self::default()
        };
    }

    pub(crate) fn next_field(&mut self) {
        self.move_focus(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.move_focus(-1);
    }

    fn move_focus(&mut self, step: isize) {
        let mut next = self.active.offset(step);
        if self.id_locked && next == ProductField::Id {
            next = next.offset(step);
        }
        self.active = next;
        self.suggestion = None;
        self.autocomplete_disabled = false;
    }

    fn value(&self, field: ProductField) -> &String {
        match field {
            ProductField::Id => &self.id,
            ProductField::Name => &self.name,
            ProductField::Category => &self.category,
            ProductField::UnitPrice => &self.unit_price,
            ProductField::Quantity => &self.quantity,
            ProductField::Supplier => &self.supplier,
            ProductField::Status => &self.status,
        }
    }

    fn value_mut(&mut self, field: ProductField) -> &mut String {
        match field {
            ProductField::Id => &mut self.id,
            ProductField::Name => &mut self.name,
            ProductField::Category => &mut self.category,
            ProductField::UnitPrice => &mut self.unit_price,
            ProductField::Quantity => &mut self.quantity,
            ProductField::Supplier => &mut self.supplier,
            ProductField::Status => &mut self.status,
        }
    }

    /// Append a character to the active field. Numeric fields only take
    /// characters that can form a non-negative number.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let accepted = match self.active {
            ProductField::Id if self.id_locked => false,
            ProductField::UnitPrice => {
                ch.is_ascii_digit() || (ch == '.' && !self.unit_price.contains('.'))
            }
            ProductField::Quantity => ch.is_ascii_digit(),
            _ => true,
        };
        if accepted {
            let field = self.active;
            self.value_mut(field).push(ch);
            self.autocomplete_disabled = false;
        }
        accepted
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        if self.active == ProductField::Id && self.id_locked {
            return;
        }
        let field = self.active;
        self.value_mut(field).pop();
        self.autocomplete_disabled = false;
    }

    /// Validate the inputs and build the product to hand to the store.
    pub(crate) fn parse_inputs(&self) -> Result<Product> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(anyhow!("ProductID is required."));
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("ProductName is required."));
        }
        let unit_price = Decimal::from_str(self.unit_price.trim())
            .ok()
            .filter(|price| *price >= Decimal::ZERO)
            .ok_or_else(|| anyhow!("UnitPrice must be a non-negative number."))?;
        let quantity = self
            .quantity
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|quantity| *quantity >= 0)
            .ok_or_else(|| anyhow!("Quantity must be a non-negative integer."))?;

        Ok(Product {
            id: id.to_string(),
            name: name.to_string(),
            category: self.category.trim().to_string(),
            unit_price,
            quantity,
            supplier: self.supplier.trim().to_string(),
            status: self.status.trim().to_string(),
        })
    }

    /// Refresh the completion hint for the active label field.
    pub(crate) fn update_suggestion(&mut self, suggestions: &Suggestions) {
        self.suggestion = None;
        if !self.active.suggests() || self.autocomplete_disabled {
            return;
        }
        let current = self.value(self.active);
        if current.is_empty() {
            return;
        }

        let current_lower = current.to_lowercase();
        self.suggestion = suggestions
            .for_field(self.active)
            .iter()
            .find(|candidate| {
                let lower = candidate.to_lowercase();
                lower.starts_with(&current_lower) && lower != current_lower
            })
            .cloned();
    }

    /// Replace the active field with the suggested value.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        match self.suggestion.take() {
            Some(candidate) if self.active.suggests() => {
                let field = self.active;
                *self.value_mut(field) = candidate;
                self.autocomplete_disabled = true;
                true
            }
            _ => false,
        }
    }

    /// Dismiss the hint for the rest of this edit of the field.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.suggestion.take().is_some() {
            self.autocomplete_disabled = true;
            true
        } else {
            false
        }
    }

    /// The not-yet-typed tail of the suggestion, shown ghosted.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let typed = self.value(self.active).chars().count();
        let suffix: String = candidate.chars().skip(typed).collect();
        (!suffix.is_empty()).then_some(suffix)
    }

    pub(crate) fn label_width() -> usize {
        ProductField::ALL
            .iter()
            .map(|field| field.label().len())
            .max()
            .unwrap_or(0)
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: ProductField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;
        let locked = field == ProductField::Id && self.id_locked;

        let style = if locked {
            Style::default().fg(Color::Gray)
        } else if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let display = if value.is_empty() && !is_active {
            field.placeholder().to_string()
        } else {
            value.clone()
        };

        let mut spans = vec![
            Span::raw(format!("{:<width$}: ", field.label(), width = Self::label_width())),
            Span::styled(display, style),
        ];
        if is_active {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }
        if locked {
            spans.push(Span::styled(" (locked)", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }

    /// Cursor column offset of the active field relative to the form's inner
    /// area, and its row.
    pub(crate) fn cursor_offset(&self) -> (u16, u16) {
        let prefix = Self::label_width() + 2;
        let column = prefix + self.value(self.active).chars().count();
        (column as u16, self.active.index() as u16)
    }
}

/// Pending delete awaiting a Yes/No answer.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmProductDelete {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl From<&Product> for ConfirmProductDelete {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ProductForm {
        ProductForm {
            id: " P1 ".into(),
            name: "Widget ".into(),
            category: "Tools".into(),
            unit_price: "9.99".into(),
            quantity: "3".into(),
            supplier: "".into(),
            status: " Active".into(),
            ..ProductForm::default()
        }
    }

    fn message(form: &ProductForm) -> String {
        form.parse_inputs().unwrap_err().to_string()
    }

    #[test]
    fn parses_and_trims_valid_input() {
        let product = filled().parse_inputs().unwrap();
        assert_eq!(product.id, "P1");
        assert_eq!(product.name, "Widget");
        assert_eq!(product.unit_price, Decimal::new(999, 2));
        assert_eq!(product.quantity, 3);
        assert_eq!(product.supplier, "");
        assert_eq!(product.status, "Active");
    }

    #[test]
    fn reports_the_first_invalid_field() {
        let mut form = filled();
        form.id = "  ".into();
        assert_eq!(message(&form), "ProductID is required.");

        let mut form = filled();
        form.name.clear();
        assert_eq!(message(&form), "ProductName is required.");

        let mut form = filled();
        form.unit_price = "-1".into();
        assert_eq!(message(&form), "UnitPrice must be a non-negative number.");

        let mut form = filled();
        form.unit_price.clear();
        assert_eq!(message(&form), "UnitPrice must be a non-negative number.");

        let mut form = filled();
        form.quantity = "2.5".into();
        assert_eq!(message(&form), "Quantity must be a non-negative integer.");
    }

    #[test]
    fn numeric_fields_filter_keystrokes() {
        let mut form = ProductForm::default();
        form.active = ProductField::UnitPrice;
        assert!(form.push_char('1'));
        assert!(form.push_char('.'));
        assert!(!form.push_char('.'));
        assert!(!form.push_char('-'));
        assert!(form.push_char('5'));
        assert_eq!(form.unit_price, "1.5");

        form.active = ProductField::Quantity;
        assert!(!form.push_char('x'));
        assert!(form.push_char('7'));
        assert_eq!(form.quantity, "7");
    }

    #[test]
    fn editing_locks_the_id() {
        let product = filled().parse_inputs().unwrap();
        let mut form = ProductForm::from_product(&product);
        assert_eq!(form.active, ProductField::Name);

        form.previous_field();
        assert_eq!(form.active, ProductField::Status);
        form.next_field();
        assert_eq!(form.active, ProductField::Name);

        form.active = ProductField::Id;
        assert!(!form.push_char('X'));
        form.backspace();
        assert_eq!(form.id, "P1");
    }

    #[test]
    fn clear_keeps_locked_id_only() {
        let product = filled().parse_inputs().unwrap();
        let mut form = ProductForm::from_product(&product);
        form.clear();
        assert_eq!(form.id, "P1");
        assert!(form.name.is_empty() && form.unit_price.is_empty());

        let mut form = filled();
        form.clear();
        assert!(form.id.is_empty());
        assert_eq!(form.active, ProductField::Id);
    }

    #[test]
    fn suggests_known_categories() {
        let suggestions = Suggestions {
            categories: vec!["Garden".into(), "Tools".into()],
            statuses: vec!["Active".into(), "Discontinued".into()],
        };
        let mut form = ProductForm::default();
        form.active = ProductField::Category;
        form.push_char('t');
        form.update_suggestion(&suggestions);
        assert_eq!(form.suggestion_suffix().as_deref(), Some("ools"));
        assert!(form.accept_suggestion());
        assert_eq!(form.category, "Tools");

        form.active = ProductField::Name;
        form.push_char('t');
        form.update_suggestion(&suggestions);
        assert_eq!(form.suggestion_suffix(), None);
    }

    #[test]
    fn cancelled_autocomplete_stays_quiet_until_typing() {
        let suggestions = Suggestions {
            categories: vec![],
            statuses: vec!["Discontinued".into()],
        };
        let mut form = ProductForm::default();
        form.active = ProductField::Status;
        form.push_char('D');
        form.update_suggestion(&suggestions);
        assert!(form.cancel_autocomplete());
        form.update_suggestion(&suggestions);
        assert_eq!(form.suggestion_suffix(), None);

        form.push_char('i');
        form.update_suggestion(&suggestions);
        assert_eq!(form.suggestion_suffix().as_deref(), Some("scontinued"));
    }

    #[test]
    fn cursor_tracks_active_field() {
        let mut form = ProductForm::default();
        form.active = ProductField::Quantity;
        form.quantity = "12".into();
        let (column, row) = form.cursor_offset();
        assert_eq!(row, 4);
        assert_eq!(column as usize, ProductForm::label_width() + 2 + 2);
    }
}
