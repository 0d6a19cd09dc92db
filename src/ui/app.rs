use std::mem;

use anyhow::{Context, Error, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::{debug, warn};

use crate::db::{inventory_value, ProductStore};
use crate::error::StoreError;
use crate::models::Product;

use super::forms::{ConfirmProductDelete, ProductField, ProductForm};
use super::helpers::{centered_rect, format_money, surface_error};
use super::screens::{collect_suggestions, GridView, ProductGrid};

/// Footer space reserved for the status line, the inventory total, and key
/// hints (plus the separator border).
const FOOTER_HEIGHT: u16 = 4;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 10;

/// Fine-grained modes layered over the product grid.
enum Mode {
    Normal,
    AddingProduct(ProductForm),
    EditingProduct(ProductForm),
    ConfirmDelete(ConfirmProductDelete),
    Prompting(PromptState),
}

/// What an inline prompt is asking for.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PromptTarget {
    Category,
    LowStock,
}

impl PromptTarget {
    fn label(self) -> &'static str {
        match self {
            PromptTarget::Category => "Category",
            PromptTarget::LowStock => "Threshold",
        }
    }
}

/// State for the one-line prompt used by the category and low-stock views.
struct PromptState {
    target: PromptTarget,
    input: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Application state for the inventory screen. The grid only ever holds a
/// snapshot; every change goes through the store and is followed by a fresh
/// read.
pub struct App {
    store: ProductStore,
    grid: ProductGrid,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: ProductStore, products: Vec<Product>) -> Self {
        let total = inventory_value(&products).ok();
        Self {
            store,
            grid: ProductGrid::new(products, total),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Dispatch one key press. Returns `true` when the user asked to quit.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return true,
                KeyCode::Char('l') => {
                    self.handle_ctrl_l();
                    return false;
                }
                _ => {}
            }
        }
        self.handle_key(key.code)
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingProduct(form) | Mode::EditingProduct(form) => {
                self.handle_form(code, form)
            }
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Prompting(state) => self.handle_prompt(code, state),
        };

        exit
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.grid.view == GridView::All {
                    *exit = true;
                } else {
                    self.show_view(GridView::All);
                }
            }
            KeyCode::Up => self.grid.move_selection(-1),
            KeyCode::Down => self.grid.move_selection(1),
            KeyCode::PageUp => self.grid.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.grid.move_selection(PAGE_STEP),
            KeyCode::Home => self.grid.select_first(),
            KeyCode::End => self.grid.select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Mode::AddingProduct(ProductForm::default());
            }
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(product) = self.grid.current_product() {
                    let form = ProductForm::from_product(product);
                    self.clear_status();
                    return Mode::EditingProduct(form);
                }
                self.set_status("Select a product to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(product) = self.grid.current_product() {
                    let confirm = ConfirmProductDelete::from(product);
                    self.clear_status();
                    return Mode::ConfirmDelete(confirm);
                }
                self.set_status("Select a product (ProductID) to delete.", StatusKind::Error);
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.clear_status();
                return Mode::Prompting(PromptState {
                    target: PromptTarget::Category,
                    input: String::new(),
                });
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.clear_status();
                return Mode::Prompting(PromptState {
                    target: PromptTarget::LowStock,
                    input: String::new(),
                });
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.refresh_current() {
                    self.set_status("Refreshed.", StatusKind::Info);
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_form(&mut self, code: KeyCode, mut form: ProductForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                if !form.cancel_autocomplete() {
                    self.set_status("Edit cancelled.", StatusKind::Info);
                    keep_open = false;
                }
            }
            KeyCode::Tab => {
                if !form.accept_suggestion() {
                    form.next_field();
                }
                form.update_suggestion(&self.grid.suggestions);
            }
            KeyCode::Down => {
                form.next_field();
                form.update_suggestion(&self.grid.suggestions);
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                form.update_suggestion(&self.grid.suggestions);
            }
            KeyCode::Backspace => {
                form.backspace();
                form.update_suggestion(&self.grid.suggestions);
            }
            KeyCode::Enter => match self.save_product(&form) {
                Ok(()) => keep_open = false,
                Err(err) => keep_open = self.report_save_error(&err, &mut form),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                    form.update_suggestion(&self.grid.suggestions);
                }
            }
            _ => {}
        }

        if !keep_open {
            Mode::Normal
        } else if form.id_locked {
            Mode::EditingProduct(form)
        } else {
            Mode::AddingProduct(form)
        }
    }

    /// Show a failed save. Returns whether the form should stay open.
    fn report_save_error(&mut self, err: &Error, form: &mut ProductForm) -> bool {
        match err.downcast_ref::<StoreError>() {
            Some(StoreError::DuplicateKey { .. }) => {
                form.error = Some("ProductID already exists.".to_string());
                self.set_status(surface_error(err), StatusKind::Error);
                true
            }
            Some(StoreError::NotFound { id, .. }) => {
                let message = format!("No product found with ProductID '{id}'. List refreshed.");
                if self.refresh_or_report(None) {
                    self.set_status(message, StatusKind::Error);
                }
                false
            }
            _ => {
                let message = surface_error(err);
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                true
            }
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmProductDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.store.delete(&confirm.id) {
                    Ok(()) => {
                        if self.refresh_or_report(None) {
                            self.set_status("Product deleted.", StatusKind::Info);
                        }
                        Mode::Normal
                    }
                    Err(StoreError::NotFound { id, .. }) => {
                        if self.refresh_or_report(None) {
                            self.set_status(
                                format!("No product found with ProductID '{id}'. List refreshed."),
                                StatusKind::Error,
                            );
                        }
                        Mode::Normal
                    }
                    Err(err) => {
                        let err = Error::from(err).context("Delete failed");
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Mode::ConfirmDelete(confirm)
                    }
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_prompt(&mut self, code: KeyCode, mut state: PromptState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Filter cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                state.input.pop();
            }
            KeyCode::Enter => match state.target {
                PromptTarget::Category => {
                    let category = state.input.trim();
                    let view = if category.is_empty() {
                        GridView::All
                    } else {
                        GridView::Category(category.to_string())
                    };
                    self.show_view(view);
                    return Mode::Normal;
                }
                PromptTarget::LowStock => match state.input.trim().parse::<i64>() {
                    Ok(threshold) => {
                        self.show_view(GridView::LowStock(threshold));
                        return Mode::Normal;
                    }
                    Err(_) => {
                        self.set_status("Threshold must be a whole number.", StatusKind::Error);
                    }
                },
            },
            KeyCode::Char(ch) => {
                let accepted = match state.target {
                    PromptTarget::Category => !ch.is_control(),
                    PromptTarget::LowStock => ch.is_ascii_digit(),
                };
                if accepted {
                    state.input.push(ch);
                }
            }
            _ => {}
        }
        Mode::Prompting(state)
    }

    fn handle_ctrl_l(&mut self) {
        let cleared = match &mut self.mode {
            Mode::AddingProduct(form) | Mode::EditingProduct(form) => {
                form.clear();
                true
            }
            _ => false,
        };
        if cleared {
            self.set_status("Form cleared.", StatusKind::Info);
        }
    }

    fn save_product(&mut self, form: &ProductForm) -> Result<()> {
        let product = form.parse_inputs()?;
        let message = if form.id_locked {
            self.store
                .update(&product)
                .with_context(|| format!("Update failed for {}", product.id))?;
            "Product updated."
        } else {
            self.store
                .insert(&product)
                .with_context(|| format!("Save failed for {}", product.id))?;
            "Product saved."
        };

        if self.refresh_or_report(Some(product.id.as_str())) {
            self.set_status(message, StatusKind::Info);
        }
        Ok(())
    }

    fn show_view(&mut self, view: GridView) {
        debug!(view = ?view, "switching view");
        self.grid.view = view;
        self.grid.select_first();
        if self.refresh_or_report(None) {
            let count = self.grid.products.len();
            let message = match &self.grid.view {
                GridView::All => format!("Showing all {count} products."),
                GridView::Category(category) => {
                    format!("{count} products in category '{category}'.")
                }
                GridView::LowStock(threshold) => {
                    format!("{count} products with quantity <= {threshold}.")
                }
            };
            self.set_status(message, StatusKind::Info);
        }
    }

    fn refresh_current(&mut self) -> bool {
        let focus = self.grid.current_product().map(|product| product.id.clone());
        self.refresh_or_report(focus.as_deref())
    }

    fn refresh_or_report(&mut self, focus_id: Option<&str>) -> bool {
        match self.reload(focus_id) {
            Ok(()) => true,
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                false
            }
        }
    }

    /// Re-read everything the screen shows: the rows for the active view, the
    /// autocomplete values, and the inventory total.
    fn reload(&mut self, focus_id: Option<&str>) -> Result<()> {
        let all = self.store.list_all().context("failed to load products")?;
        self.grid.suggestions = collect_suggestions(&all);

        let rows = match &self.grid.view {
            GridView::All => all,
            GridView::Category(category) => self
                .store
                .by_category(category)
                .context("failed to filter by category")?,
            GridView::LowStock(threshold) => self
                .store
                .low_stock(*threshold)
                .context("failed to load low stock products")?,
        };

        self.grid.total_value = match self.store.total_inventory_value() {
            Ok(total) => Some(total),
            Err(StoreError::ValueOverflow { id, .. }) => {
                warn!(product_id = %id, "inventory total overflowed");
                None
            }
            Err(err) => return Err(err).context("failed to compute inventory value"),
        };

        self.grid.replace(rows, focus_id);
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_grid(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingProduct(form) => self.draw_form(frame, area, "Add Product", form),
            Mode::EditingProduct(form) => self.draw_form(frame, area, "Edit Product", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Prompting(state) => self.draw_prompt(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect) {
        let title = format!("{} ({})", self.grid.view.title(), self.grid.products.len());
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.grid.products.is_empty() {
            let text = if self.grid.view == GridView::All {
                "No products yet. Press '+' to add one."
            } else {
                "No products match this view. Press Esc to show all."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(vec![
            Cell::from("ID"),
            Cell::from("Name"),
            Cell::from("Category"),
            Cell::from(Line::from("Unit Price").alignment(Alignment::Right)),
            Cell::from(Line::from("Qty").alignment(Alignment::Right)),
            Cell::from("Supplier"),
            Cell::from("Status"),
        ])
        .style(header_style);

        let rows = self.grid.products.iter().map(|product| {
            let style = if product.quantity == 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(product.id.clone()),
                Cell::from(product.name.clone()),
                Cell::from(product.category.clone()),
                Cell::from(
                    Line::from(format_money(product.unit_price)).alignment(Alignment::Right),
                ),
                Cell::from(Line::from(product.quantity.to_string()).alignment(Alignment::Right)),
                Cell::from(product.supplier.clone()),
                Cell::from(product.status.clone()),
            ])
            .style(style)
        });

        let widths = [
            Constraint::Length(12),
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Length(16),
            Constraint::Length(14),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = TableState::default();
        state.select(Some(self.grid.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let total = match self.grid.total_value {
            Some(total) => format_money(total),
            None => "unavailable".to_string(),
        };
        let total_line = Line::from(vec![
            Span::raw("Total inventory value: "),
            Span::styled(total, Style::default().add_modifier(Modifier::BOLD)),
        ]);

        let paragraph = Paragraph::new(vec![status_line, total_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match &self.mode {
            Mode::Normal => &[
                ("[↑↓]", " Navigate   "),
                ("[+]", " Add   "),
                ("[e]", " Edit   "),
                ("[-]", " Delete   "),
                ("[c]", " Category   "),
                ("[l]", " Low stock   "),
                ("[r]", " Refresh   "),
                ("[Esc]", " All / Quit   "),
                ("[q]", " Quit"),
            ],
            Mode::AddingProduct(_) | Mode::EditingProduct(_) => &[
                ("[Tab]", " Next / Accept   "),
                ("[Shift+Tab]", " Previous   "),
                ("[Enter]", " Save   "),
                ("[Ctrl+L]", " Clear   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[y]", " Delete   "), ("[n]", " Keep")],
            Mode::Prompting(_) => &[("[Enter]", " Apply   "), ("[Esc]", " Cancel")],
        };

        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, action)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(action.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &ProductForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = ProductField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to accept/switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let (dx, dy) = form.cursor_offset();
        frame.set_cursor_position((inner.x + dx, inner.y + dy));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmProductDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete product {}?", confirm.id)),
            Line::from(confirm.name.clone()),
            Line::from("This cannot be undone."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, state: &PromptState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let title = match state.target {
            PromptTarget::Category => "Filter by category (empty shows all)",
            PromptTarget::LowStock => "Show products with quantity at or below",
        };
        let prefix = format!("{}: ", state.target.label());
        let block = Block::default().borders(Borders::ALL).title(title);
        let paragraph = Paragraph::new(Span::raw(format!("{prefix}{}", state.input)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + prefix.len() as u16 + state.input.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
