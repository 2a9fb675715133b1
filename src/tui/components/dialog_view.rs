//! Terminal presentation of the dialog stack
//!
//! The view subscribes to the provider's snapshots and draws at most one
//! content dialog and one alert on top of it. Keyboard and mouse input on
//! the dialogs is turned into controller interactions: dismissals, alert
//! confirm and alert cancel.

use super::{AppDialogProvider, AppDialogs, DialogBody};
use crate::dialogs::{
    AlertDialog, ContentDialog, DialogId, DialogResult, DialogSnapshot, VisibleDialog,
};
use crate::tui::{styles::Theme, utils::layout, Frame};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::watch;
use tracing::{debug, warn};

const ALERT_WIDTH: u16 = 52;
const CONTENT_MIN_WIDTH: u16 = 44;

/// Alert buttons, in the order they are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertButton {
    Cancel,
    Confirm,
}

impl AlertButton {
    fn toggle(self) -> Self {
        match self {
            Self::Cancel => Self::Confirm,
            Self::Confirm => Self::Cancel,
        }
    }
}

/// Draws dialog payloads; the view itself never looks inside them
pub trait BodyRenderer {
    /// Rows needed to draw `body` at `width` columns
    fn body_height(&self, body: &DialogBody, width: u16) -> u16;

    fn render_body(&mut self, frame: &mut Frame, area: Rect, body: &DialogBody, theme: &Theme);
}

/// Renders message bodies and leaves everything else blank
#[derive(Debug, Default)]
pub struct PlainBodies;

impl BodyRenderer for PlainBodies {
    fn body_height(&self, body: &DialogBody, width: u16) -> u16 {
        match body {
            DialogBody::Message(text) => wrapped_height(text, width),
            DialogBody::TransactionForm => 0,
        }
    }

    fn render_body(&mut self, frame: &mut Frame, area: Rect, body: &DialogBody, theme: &Theme) {
        if let DialogBody::Message(text) = body {
            let paragraph = Paragraph::new(text.as_str())
                .style(theme.text_style())
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
    }
}

/// Rows `text` takes when drawn with `Wrap { trim: true }` at `width` columns
pub fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = text.lines().map(|line| wrapped_line_rows(line, width)).sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Greedy word wrap; words wider than a row are split across rows
fn wrapped_line_rows(line: &str, width: usize) -> usize {
    let mut rows = 1;
    let mut used = 0;

    for word in line.split_whitespace() {
        let mut len = word.chars().count();
        if used > 0 {
            if used + 1 + len <= width {
                used += 1 + len;
                continue;
            }
            rows += 1;
        }
        while len > width {
            rows += 1;
            len -= width;
        }
        used = len;
    }
    rows
}

/// The dialog layer of the screen
pub struct DialogView {
    dialogs: AppDialogs,
    updates: watch::Receiver<DialogSnapshot<DialogBody>>,
    snapshot: DialogSnapshot<DialogBody>,
    focus: AlertButton,
    focused_alert: Option<DialogId>,
    content_area: Option<Rect>,
    alert_area: Option<Rect>,
    /// Cancel and confirm button areas from the last render
    buttons: Option<(Rect, Rect)>,
}

impl DialogView {
    pub fn new(provider: &AppDialogProvider) -> Self {
        let updates = provider.subscribe();
        let snapshot = updates.borrow().clone();

        Self {
            dialogs: provider.handle(),
            updates,
            snapshot,
            focus: AlertButton::Cancel,
            focused_alert: None,
            content_area: None,
            alert_area: None,
            buttons: None,
        }
    }

    /// Pull the latest snapshot; returns whether anything changed
    pub fn sync(&mut self) -> bool {
        match self.updates.has_changed() {
            Ok(true) => {}
            Ok(false) => return false,
            Err(_) => {
                warn!("dialog snapshot channel closed");
                return false;
            }
        }

        self.snapshot = self.updates.borrow_and_update().clone();

        let alert_id = self.snapshot.alert.as_ref().map(|alert| alert.id);
        if alert_id != self.focused_alert {
            self.focused_alert = alert_id;
            self.focus = AlertButton::Cancel;
        }
        if self.snapshot.content.is_none() {
            self.content_area = None;
        }
        if self.snapshot.alert.is_none() {
            self.alert_area = None;
            self.buttons = None;
        }

        debug!(
            version = self.snapshot.version,
            depth = self.snapshot.depth,
            "dialog snapshot applied"
        );
        true
    }

    pub fn snapshot(&self) -> &DialogSnapshot<DialogBody> {
        &self.snapshot
    }

    /// Whether any dialog is on screen
    pub fn is_active(&self) -> bool {
        !self.snapshot.is_empty()
    }

    pub fn alert_visible(&self) -> bool {
        self.snapshot.alert.is_some()
    }

    /// Body of the content dialog, if it is the top of the stack
    pub fn top_content(&self) -> Option<&DialogBody> {
        self.snapshot
            .content
            .as_ref()
            .filter(|content| content.on_top)
            .map(|content| &content.dialog.content)
    }

    #[cfg(test)]
    pub fn focus(&self) -> AlertButton {
        self.focus
    }

    /// Esc or click outside: dismiss whatever is on top
    pub fn dismiss_top(&mut self) -> DialogResult<()> {
        self.sync();
        if self.alert_visible() {
            self.dialogs.dismiss_alert()?;
        } else if self.snapshot.content.is_some() {
            if !self.snapshot.content_dismissible() {
                debug!(loading = self.snapshot.loading, "content dialog kept open");
                return Ok(());
            }
            self.dialogs.dismiss_content()?;
        }
        self.sync();
        Ok(())
    }

    pub fn activate(&mut self, button: AlertButton) -> DialogResult<()> {
        match button {
            AlertButton::Confirm => self.dialogs.confirm_alert()?,
            AlertButton::Cancel => self.dialogs.cancel_alert()?,
        }
        self.sync();
        Ok(())
    }

    /// Keys for the visible alert; returns whether the key was used
    pub fn handle_alert_key(&mut self, key: KeyEvent) -> DialogResult<bool> {
        self.sync();
        if !self.alert_visible() {
            return Ok(false);
        }

        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.toggle();
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(self.focus)?,
            KeyCode::Char('y') | KeyCode::Char('Y') => self.activate(AlertButton::Confirm)?,
            KeyCode::Char('n') | KeyCode::Char('N') => self.activate(AlertButton::Cancel)?,
            KeyCode::Esc => self.dismiss_top()?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Left clicks on buttons or outside the top dialog
    pub fn handle_mouse(&mut self, event: MouseEvent) -> DialogResult<()> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(());
        }
        self.sync();
        let (column, row) = (event.column, event.row);

        if self.alert_visible() {
            if let Some((cancel, confirm)) = self.buttons {
                if layout::contains(cancel, column, row) {
                    return self.activate(AlertButton::Cancel);
                }
                if layout::contains(confirm, column, row) {
                    return self.activate(AlertButton::Confirm);
                }
            }
            let inside = self
                .alert_area
                .is_some_and(|area| layout::contains(area, column, row));
            if !inside {
                return self.dismiss_top();
            }
        } else if let Some(area) = self.content_area {
            if !layout::contains(area, column, row) {
                return self.dismiss_top();
            }
        }
        Ok(())
    }

    /// Render the visible dialogs over `area`
    pub fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme, bodies: &mut dyn BodyRenderer) {
        self.sync();

        if let Some(content) = self.snapshot.content.clone() {
            let loading = self.snapshot.loading;
            self.content_area = Some(render_content(frame, area, theme, &content, loading, bodies));
        }

        if let Some(alert) = self.snapshot.alert.clone() {
            let confirm = self.snapshot.confirm_label().unwrap_or_default().to_string();
            let cancel = self.snapshot.cancel_label().unwrap_or_default().to_string();
            let (alert_area, buttons) = render_alert(
                frame,
                area,
                theme,
                &alert,
                (&cancel, &confirm),
                self.focus,
                bodies,
            );
            self.alert_area = Some(alert_area);
            self.buttons = Some(buttons);
        }
    }
}

fn render_content(
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
    content: &VisibleDialog<ContentDialog<DialogBody>>,
    loading: bool,
    bodies: &mut dyn BodyRenderer,
) -> Rect {
    let dialog = &content.dialog;
    let width = (area.width.saturating_mul(3) / 5)
        .max(CONTENT_MIN_WIDTH)
        .min(area.width);
    let inner_width = width.saturating_sub(2);

    let description_rows = dialog
        .description
        .as_deref()
        .map(|text| wrapped_height(text, inner_width).saturating_add(1))
        .unwrap_or(0);
    let body_rows = bodies.body_height(&dialog.content, inner_width);
    let height = description_rows.saturating_add(body_rows).saturating_add(2);

    let dialog_area = layout::centered_rect(width, height, area);
    frame.render_widget(Clear, dialog_area);

    let mut title = dialog.title.clone().unwrap_or_default();
    if loading {
        title.push_str(" (working...)");
    }
    // A backgrounded form keeps its frame but loses the focus highlight
    let border_style = if content.on_top {
        theme.focused_border_style()
    } else {
        theme.border_style()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
        .style(theme.base_style());
    frame.render_widget(block, dialog_area);

    let inner = layout::inner(dialog_area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(description_rows), Constraint::Min(0)])
        .split(inner);

    if let Some(description) = dialog.description.as_deref() {
        let paragraph = Paragraph::new(description)
            .style(theme.dim_style())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, chunks[0]);
    }
    bodies.render_body(frame, chunks[1], &dialog.content, theme);

    dialog_area
}

fn render_alert(
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
    alert: &VisibleDialog<AlertDialog<DialogBody>>,
    labels: (&str, &str),
    focus: AlertButton,
    bodies: &mut dyn BodyRenderer,
) -> (Rect, (Rect, Rect)) {
    let dialog = &alert.dialog;
    let width = ALERT_WIDTH.min(area.width);
    let inner_width = width.saturating_sub(2);

    let description_rows = dialog
        .description
        .as_deref()
        .map(|text| wrapped_height(text, inner_width))
        .unwrap_or(0);
    let body_rows = dialog
        .content
        .as_ref()
        .map(|body| bodies.body_height(body, inner_width))
        .unwrap_or(0);
    // buttons, help line, borders
    let height = description_rows.saturating_add(body_rows).saturating_add(3 + 1 + 2);

    let dialog_area = layout::centered_rect(width, height, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.alert_border_style())
        .title(dialog.title.clone().unwrap_or_default())
        .style(theme.base_style());
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(description_rows),
            Constraint::Length(body_rows),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(layout::inner(dialog_area));

    if let Some(description) = dialog.description.as_deref() {
        let paragraph = Paragraph::new(description)
            .style(theme.dim_style())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, chunks[0]);
    }
    if let Some(body) = dialog.content.as_ref() {
        bodies.render_body(frame, chunks[1], body, theme);
    }

    let button_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    let (cancel_label, confirm_label) = labels;

    let cancel = Paragraph::new(format!(" {} ", cancel_label))
        .style(theme.button_style(focus == AlertButton::Cancel))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(cancel, button_layout[0]);

    let confirm = Paragraph::new(format!(" {} ", confirm_label))
        .style(theme.button_style(focus == AlertButton::Confirm))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(confirm, button_layout[1]);

    let help = Paragraph::new("←/→/Tab: Select • Enter: Choose • Esc: Cancel")
        .style(theme.dim_style().add_modifier(Modifier::DIM))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[3]);

    (dialog_area, (button_layout[0], button_layout[1]))
}
