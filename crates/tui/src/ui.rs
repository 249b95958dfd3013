use std::cmp;

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use routebook_core::{KeyValueStore, Route, RouteSource, TransportType};

use crate::{
    app::{Alert, App, ListCursor, Mode, Screen},
    form::FormKind,
    theme::Theme,
};

impl<S: KeyValueStore, R: RouteSource> App<S, R> {
    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        frame.render_widget(
            Block::default().style(
                Style::default()
                    .bg(self.theme.primary_bg)
                    .fg(self.theme.primary_fg),
            ),
            area,
        );
        if self.restoring {
            self.draw_splash(frame, area);
            return;
        }
        match self.screen {
            Screen::Login | Screen::Register => self.draw_auth(frame, area),
            Screen::Home => self.draw_home(frame, area),
            Screen::Details => self.draw_details(frame, area),
            Screen::Favorites => self.draw_favorites(frame, area),
        }
        if let Some(alert) = &self.alert {
            render_alert(&self.theme, frame, alert);
        }
    }

    fn draw_splash(&self, frame: &mut Frame, area: Rect) {
        let splash = Paragraph::new(vec![
            Line::from(Span::styled(
                "Routebook",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Restoring your session…",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(splash, centered_rect(40, 2, area));
    }

    fn draw_auth(&self, frame: &mut Frame, area: Rect) {
        let (title, subtitle, switch_hint) = match self.form.kind {
            FormKind::Login => ("Welcome Back", "Sign in to continue", "Ctrl+N register"),
            FormKind::Register => ("Create Account", "Sign up to get started", "Ctrl+N sign in"),
        };
        let field_rows = self.form.fields.len() as u16 * 3;
        let height = (field_rows + 6).min(area.height);
        let width = cmp::max(cmp::min(56_u16, area.width.saturating_sub(4)), 24_u16);
        let form_area = centered_rect(width, height, area);
        frame.render_widget(Clear, form_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(self.theme.accent));
        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let mut lines = vec![
            Line::from(Span::styled(subtitle, Style::default().fg(self.theme.muted))),
            Line::from(""),
        ];
        let mut cursor = None;
        for (idx, entry) in self.form.fields.iter().enumerate() {
            let focused = idx == self.form.focus;
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            lines.push(Line::from(Span::styled(entry.label, label_style)));
            let value = entry.display_value();
            if focused {
                let x = inner.x + 2 + entry.input.cursor() as u16;
                let y = inner.y + lines.len() as u16;
                cursor = Some((x.min(inner.x + inner.width.saturating_sub(1)), y));
            }
            lines.push(Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.accent)),
                Span::raw(value),
            ]));
            match &entry.error {
                Some(message) => lines.push(Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(self.theme.danger),
                ))),
                None => lines.push(Line::from("")),
            }
        }
        let action = if self.auth_pending {
            Span::styled("Please wait…", Style::default().fg(self.theme.warning))
        } else {
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD))
        };
        lines.push(Line::from(vec![
            action,
            Span::raw("  Tab next field  "),
            Span::styled(switch_hint, Style::default().fg(self.theme.muted)),
        ]));

        frame.render_widget(Paragraph::new(lines), inner);
        if let (Some((x, y)), None) = (cursor, &self.alert) {
            frame.set_cursor(x, y);
        }
    }

    fn draw_home(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        let signed_in = self
            .session
            .authenticated_at
            .map(|at| format!(" · signed in {}", at.with_timezone(&Local).format("%H:%M")))
            .unwrap_or_default();
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("Hello, {}", self.username()),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(signed_in, Style::default().fg(self.theme.muted)),
            Span::raw("   "),
            self.filter_span(),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Routebook"));
        frame.render_widget(header, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        let title = if self.catalog.loading {
            "Available Routes (loading…)".to_string()
        } else {
            format!("Available Routes ({})", self.visible.len())
        };
        let visible = self.visible.clone();
        let favorites = self.favorite_ids();
        render_route_list(
            &self.theme,
            frame,
            body[0],
            &title,
            &visible,
            &favorites,
            &mut self.home_list,
        );
        let current = visible.get(self.home_list.cursor);
        self.render_route_summary(frame, body[1], current);
        self.render_status(
            frame,
            chunks[2],
            "j/k move  Enter details  f favorite  / filter  v favorites  r refresh  t theme  l logout  q quit",
        );
    }

    fn filter_span(&self) -> Span<'static> {
        match self.mode {
            Mode::Filter => Span::styled(
                format!("/{}_", self.filter),
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            ),
            Mode::Browse if !self.filter.is_empty() => Span::styled(
                format!("filter: {}", self.filter),
                Style::default().fg(self.theme.muted),
            ),
            Mode::Browse => Span::raw(""),
        }
    }

    fn favorite_ids(&self) -> Vec<u64> {
        self.catalog.favorites.iter().map(|route| route.id).collect()
    }

    fn render_route_summary(&self, frame: &mut Frame, area: Rect, route: Option<&Route>) {
        let block = Block::default().borders(Borders::ALL).title("Route");
        let Some(route) = route else {
            let empty = if self.filter.is_empty() {
                "No routes available"
            } else {
                "No routes match the filter"
            };
            frame.render_widget(Paragraph::new(empty).block(block), area);
            return;
        };
        let mut lines = vec![
            Line::from(Span::styled(
                route.route.clone(),
                Style::default()
                    .fg(kind_color(&self.theme, route))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(route.endpoints()),
            Line::from(""),
        ];
        lines.extend(facts(&self.theme, route));
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }

    fn draw_details(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);

        let Some(route) = &self.selected else {
            frame.render_widget(
                Paragraph::new("No route selected")
                    .block(Block::default().borders(Borders::ALL).title("Route Details")),
                chunks[0],
            );
            self.render_status(frame, chunks[1], "Esc back");
            return;
        };

        let favorite = self.is_favorite(route.id);
        let heart = if favorite { "♥ Favorite" } else { "♡ Not a favorite" };
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    route.display_name(),
                    Style::default()
                        .fg(kind_color(&self.theme, route))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    heart,
                    Style::default().fg(if favorite {
                        self.theme.danger
                    } else {
                        self.theme.muted
                    }),
                ),
            ]),
            Line::from(route.endpoints()),
            Line::from(""),
        ];
        lines.extend(facts(&self.theme, route));
        if !route.operator.is_empty() {
            lines.push(Line::from(format!("Operator: {}", route.operator)));
        }
        if !route.description.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(route.description.clone()));
        }
        if !route.schedule.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Schedule",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(route.schedule.join("  ")));
        }
        if !route.image.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                route.image.clone(),
                Style::default().fg(self.theme.muted),
            )));
        }

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Route Details"))
                .wrap(Wrap { trim: true }),
            chunks[0],
        );
        self.render_status(frame, chunks[1], "f favorite  Esc back  q quit");
    }

    fn draw_favorites(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);

        let favorites = self.catalog.favorites.clone();
        let ids = self.favorite_ids();
        if favorites.is_empty() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from("No favorites yet"),
                    Line::from(Span::styled(
                        "Press f on a route to save it here",
                        Style::default().fg(self.theme.muted),
                    )),
                ])
                .block(Block::default().borders(Borders::ALL).title("Favorites")),
                chunks[0],
            );
        } else {
            let title = format!("Favorites ({})", favorites.len());
            render_route_list(
                &self.theme,
                frame,
                chunks[0],
                &title,
                &favorites,
                &ids,
                &mut self.favorites_list,
            );
        }
        self.render_status(frame, chunks[1], "Enter details  f remove  Esc back");
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, hint: &str) {
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                self.status.clone(),
                Style::default().fg(self.theme.primary_fg),
            )),
            Line::from(Span::styled(
                hint.to_string(),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }
}

fn render_route_list(
    theme: &Theme,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    routes: &[Route],
    favorites: &[u64],
    list: &mut ListCursor,
) {
    list.height = area.height.saturating_sub(2) as usize;
    list.clamp(routes.len());

    let end = cmp::min(list.offset + list.height, routes.len());
    let window = &routes[list.offset.min(end)..end];
    let mut list_state = ListState::default();
    if !window.is_empty() {
        list_state.select(Some(
            list.cursor
                .saturating_sub(list.offset)
                .min(window.len() - 1),
        ));
    }

    let items: Vec<ListItem> = window
        .iter()
        .enumerate()
        .map(|(idx, route)| {
            let selected = list.offset + idx == list.cursor;
            let marker = if selected {
                Span::styled(
                    "▶ ",
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw("  ")
            };
            let heart = if favorites.contains(&route.id) {
                Span::styled("♥ ", Style::default().fg(theme.danger))
            } else {
                Span::raw("  ")
            };
            ListItem::new(Line::from(vec![
                marker,
                heart,
                Span::styled(
                    route.route.clone(),
                    Style::default()
                        .fg(theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" · {}", route.kind),
                    Style::default().fg(kind_color(theme, route)),
                ),
                Span::styled(
                    format!("  {}", route.endpoints()),
                    Style::default().fg(theme.muted),
                ),
            ]))
        })
        .collect();

    let widget = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .highlight_style(Style::default().bg(theme.selection_bg));
    frame.render_stateful_widget(widget, area, &mut list_state);
}

fn facts(theme: &Theme, route: &Route) -> Vec<Line<'static>> {
    let status_color = if route.status.eq_ignore_ascii_case("active") {
        theme.success
    } else {
        theme.warning
    };
    [
        ("Duration", route.duration.clone(), theme.primary_fg),
        ("Price", route.price.clone(), theme.primary_fg),
        ("Frequency", route.frequency.clone(), theme.primary_fg),
        ("Status", route.status.clone(), status_color),
    ]
    .into_iter()
    .filter(|(_, value, _)| !value.is_empty())
    .map(|(label, value, color)| {
        Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().fg(theme.muted)),
            Span::styled(value, Style::default().fg(color)),
        ])
    })
    .collect()
}

fn kind_color(theme: &Theme, route: &Route) -> Color {
    match route.transport_type() {
        Some(TransportType::Bus) => theme.warning,
        Some(TransportType::Metro) => theme.accent,
        Some(TransportType::Train) => theme.success,
        Some(TransportType::Ferry) => Color::Blue,
        None => theme.muted,
    }
}

fn render_alert(theme: &Theme, frame: &mut Frame, alert: &Alert) {
    let frame_area = frame.size();
    let width = cmp::max(cmp::min(60_u16, frame_area.width.saturating_sub(4)), 24_u16);
    let height = 7_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
    let area = centered_rect(width, height, frame_area);
    frame.render_widget(Clear, area);

    let paragraph = Paragraph::new(vec![
        Line::from(alert.message.clone()),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" dismiss"),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(alert.title.clone())
            .border_style(Style::default().fg(theme.danger)),
    )
    .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
