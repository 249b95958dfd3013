use std::{future::Future, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use routebook_core::{
    validation, AppContext, CatalogSnapshot, KeyValueStore, Route, RouteOrigin, RouteSource,
    SessionSnapshot, User,
};
use tokio::{spawn, sync::mpsc};
use tracing::{error, info, warn};

use crate::{
    form::{AuthForm, FormKind},
    theme::Theme,
};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Login,
    Register,
    Home,
    Details,
    Favorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Browse,
    Filter,
}

pub(crate) enum AppEvent {
    Input(Event),
    Tick,
    SessionRestored(bool),
    AuthFinished {
        kind: FormKind,
        result: Result<User, String>,
    },
    RoutesFetched(RouteOrigin),
    FavoritesLoaded,
    FavoriteToggled {
        name: String,
        now_favorite: bool,
    },
    LoggedOut,
}

/// Blocking message shown over the current screen until dismissed.
#[derive(Debug, Clone)]
pub(crate) struct Alert {
    pub title: String,
    pub message: String,
}

/// Cursor and scroll offset for a list of `len` items.
#[derive(Debug, Clone, Default)]
pub(crate) struct ListCursor {
    pub cursor: usize,
    pub offset: usize,
    pub height: usize,
}

impl ListCursor {
    fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let idx = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = idx as usize;
        self.ensure_visible(len);
    }

    fn move_to(&mut self, index: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = index.min(len - 1);
        self.ensure_visible(len);
    }

    fn page(&mut self, forward: bool, len: usize) {
        let step = self.height.max(1).min(len.max(1)) as isize;
        self.move_by(if forward { step } else { -step }, len);
    }

    pub(crate) fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
        self.ensure_visible(len);
    }

    pub(crate) fn ensure_visible(&mut self, len: usize) {
        if len == 0 || self.height == 0 {
            self.offset = 0;
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
        self.offset = self.offset.min(len.saturating_sub(self.height));
    }
}

/// Terminal frontend state.
pub struct App<S, R> {
    context: AppContext<S, R>,
    pub(crate) screen: Screen,
    pub(crate) details_return: Screen,
    pub(crate) mode: Mode,
    pub(crate) form: AuthForm,
    pub(crate) session: SessionSnapshot,
    pub(crate) catalog: CatalogSnapshot,
    pub(crate) filter: String,
    pub(crate) visible: Vec<Route>,
    pub(crate) home_list: ListCursor,
    pub(crate) favorites_list: ListCursor,
    pub(crate) selected: Option<Route>,
    pub(crate) alert: Option<Alert>,
    pub(crate) status: String,
    pub(crate) theme: Theme,
    pub(crate) restoring: bool,
    pub(crate) auth_pending: bool,
    pub(crate) should_quit: bool,
    event_tx: Option<mpsc::Sender<AppEvent>>,
}

impl<S: KeyValueStore, R: RouteSource> App<S, R> {
    pub fn new(context: AppContext<S, R>) -> Self {
        let theme = Theme::new(context.config.dark_mode);
        Self {
            context,
            screen: Screen::Login,
            details_return: Screen::Home,
            mode: Mode::Browse,
            form: AuthForm::login(),
            session: SessionSnapshot::default(),
            catalog: CatalogSnapshot::default(),
            filter: String::new(),
            visible: Vec::new(),
            home_list: ListCursor::default(),
            favorites_list: ListCursor::default(),
            selected: None,
            alert: None,
            status: "Ready".to_string(),
            theme,
            restoring: false,
            auth_pending: false,
            should_quit: false,
            event_tx: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);
        self.start_restore();

        let outcome = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err.into());
            }
            if self.should_quit {
                break Ok(());
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_event(maybe_event) || self.should_quit {
                break Ok(());
            }
        };

        self.context.dispose();
        self.event_tx = None;
        restore_terminal(&mut terminal)?;
        outcome
    }

    fn process_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        let Some(event) = maybe_event else {
            return false;
        };
        match event {
            AppEvent::Input(event) => {
                if let Err(err) = self.handle_input(event) {
                    self.status = format!("Error: {err}");
                }
            }
            AppEvent::Tick => {}
            AppEvent::SessionRestored(authenticated) => {
                self.restoring = false;
                if authenticated {
                    self.refresh();
                    let name = self.username();
                    self.enter_home();
                    self.status = format!("Welcome back, {name}");
                } else {
                    self.screen = Screen::Login;
                    self.status = "Sign in to continue".to_string();
                }
            }
            AppEvent::AuthFinished { kind, result } => {
                self.auth_pending = false;
                match result {
                    Ok(user) => {
                        info!(email = %user.email, "Signed in");
                        self.form = AuthForm::login();
                        self.enter_home();
                        self.status = format!("Welcome, {}", user.username);
                    }
                    Err(message) => {
                        let title = match kind {
                            FormKind::Login => "Login Failed",
                            FormKind::Register => "Registration Error",
                        };
                        self.alert = Some(Alert {
                            title: title.to_string(),
                            message,
                        });
                    }
                }
            }
            AppEvent::RoutesFetched(origin) => {
                let count = self.context.catalog.routes().len();
                self.status = match origin {
                    RouteOrigin::Remote => format!("Loaded {count} routes"),
                    RouteOrigin::Fallback => {
                        format!("Offline: showing {count} built-in routes")
                    }
                };
            }
            AppEvent::FavoritesLoaded => {}
            AppEvent::FavoriteToggled { name, now_favorite } => {
                self.status = if now_favorite {
                    format!("Added {name} to favorites")
                } else {
                    format!("Removed {name} from favorites")
                };
            }
            AppEvent::LoggedOut => {
                self.refresh();
                if self.session.is_authenticated() {
                    self.status = "Sign out failed".to_string();
                } else {
                    self.screen = Screen::Login;
                    self.form = AuthForm::login();
                    self.selected = None;
                    self.status = "Signed out".to_string();
                }
            }
        }
        self.refresh();
        true
    }

    /// Pull fresh snapshots from both stores.
    fn refresh(&mut self) {
        self.session = self.context.session.snapshot();
        self.catalog = self.context.catalog.snapshot();
        self.visible = self.context.catalog.routes_matching(&self.filter);
        self.home_list.clamp(self.visible.len());
        self.favorites_list.clamp(self.catalog.favorites.len());
    }

    pub(crate) fn username(&self) -> String {
        self.session
            .user()
            .map(|user| user.username.clone())
            .unwrap_or_else(|| routebook_core::session::DEFAULT_USERNAME.to_string())
    }

    pub(crate) fn is_favorite(&self, id: u64) -> bool {
        self.catalog.favorites.iter().any(|route| route.id == id)
    }

    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            return;
        };
        spawn(async move {
            let event = task.await;
            let _ = sender.send(event).await;
        });
    }

    fn start_restore(&mut self) {
        self.restoring = true;
        self.status = "Restoring session…".to_string();
        let session = self.context.session.clone();
        self.spawn_task(async move { AppEvent::SessionRestored(session.restore_session().await) });
    }

    fn enter_home(&mut self) {
        self.screen = Screen::Home;
        self.mode = Mode::Browse;
        self.filter.clear();
        self.home_list = ListCursor::default();
        self.fetch_routes();
        let catalog = self.context.catalog.clone();
        self.spawn_task(async move {
            catalog.load_favorites().await;
            AppEvent::FavoritesLoaded
        });
    }

    fn fetch_routes(&mut self) {
        self.status = "Loading routes…".to_string();
        let catalog = self.context.catalog.clone();
        self.spawn_task(async move { AppEvent::RoutesFetched(catalog.fetch_routes().await) });
    }

    fn toggle_favorite(&mut self, route: Route) {
        let catalog = self.context.catalog.clone();
        self.spawn_task(async move {
            let now_favorite = catalog.toggle_favorite(&route).await;
            AppEvent::FavoriteToggled {
                name: route.route,
                now_favorite,
            }
        });
    }

    fn logout(&mut self) {
        let session = self.context.session.clone();
        self.spawn_task(async move {
            session.logout().await;
            AppEvent::LoggedOut
        });
    }

    fn submit_form(&mut self) {
        if self.auth_pending {
            return;
        }
        let kind = self.form.kind;
        let checked = match kind {
            FormKind::Login => validation::validate_login(&self.form.credentials()),
            FormKind::Register => validation::validate_registration(&self.form.registration()),
        };
        if let Err(errors) = checked {
            warn!(count = errors.len(), "Form rejected");
            self.form.apply_errors(&errors);
            self.status = "Please fix the highlighted fields".to_string();
            return;
        }
        self.form.clear_errors();

        let session = self.context.session.clone();
        match kind {
            FormKind::Login => {
                let credentials = self.form.credentials();
                self.status = "Signing in…".to_string();
                self.spawn_task(async move {
                    AppEvent::AuthFinished {
                        kind,
                        result: session
                            .login(&credentials)
                            .await
                            .map_err(|err| err.to_string()),
                    }
                });
            }
            FormKind::Register => {
                let registration = self.form.registration();
                self.status = "Creating account…".to_string();
                self.spawn_task(async move {
                    AppEvent::AuthFinished {
                        kind,
                        result: session
                            .register(&registration)
                            .await
                            .map_err(|err| err.to_string()),
                    }
                });
            }
        }
        self.auth_pending = true;
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            return Ok(());
        }
        if self.restoring {
            return Ok(());
        }
        match self.screen {
            Screen::Login | Screen::Register => self.handle_form_key(key),
            Screen::Home => match self.mode {
                Mode::Browse => self.handle_home_key(key),
                Mode::Filter => self.handle_filter_key(key),
            },
            Screen::Details => self.handle_details_key(key),
            Screen::Favorites => self.handle_favorites_key(key),
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('n') {
            self.switch_form();
            return;
        }
        match key.code {
            KeyCode::Esc => match self.form.kind {
                FormKind::Login => self.should_quit = true,
                FormKind::Register => self.switch_form(),
            },
            KeyCode::Tab | KeyCode::Down => self.form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.form.move_focus(-1),
            KeyCode::Enter => self.submit_form(),
            _ => {
                if let Some(field) = self.form.focused_mut() {
                    field.input.handle_key(&key);
                }
            }
        }
    }

    fn switch_form(&mut self) {
        match self.form.kind {
            FormKind::Login => {
                self.form = AuthForm::register();
                self.screen = Screen::Register;
                self.status = "Create an account".to_string();
            }
            FormKind::Register => {
                self.form = AuthForm::login();
                self.screen = Screen::Login;
                self.status = "Sign in to continue".to_string();
            }
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        let len = self.visible.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.home_list.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.home_list.move_by(-1, len),
            KeyCode::PageDown => self.home_list.page(true, len),
            KeyCode::PageUp => self.home_list.page(false, len),
            KeyCode::Char('g') | KeyCode::Home => self.home_list.move_to(0, len),
            KeyCode::Char('G') | KeyCode::End => self.home_list.move_to(len.saturating_sub(1), len),
            KeyCode::Enter => {
                if let Some(route) = self.visible.get(self.home_list.cursor).cloned() {
                    self.open_details(route, Screen::Home);
                }
            }
            KeyCode::Char('f') | KeyCode::Char(' ') => {
                if let Some(route) = self.visible.get(self.home_list.cursor).cloned() {
                    self.toggle_favorite(route);
                }
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Filter;
                self.status = format!("Filter: {}", self.filter);
            }
            KeyCode::Char('v') => {
                self.screen = Screen::Favorites;
                self.favorites_list = ListCursor::default();
            }
            KeyCode::Char('r') => self.fetch_routes(),
            KeyCode::Char('t') => {
                self.theme = self.theme.toggled();
                self.status = if self.theme.dark {
                    "Dark mode".to_string()
                } else {
                    "Light mode".to_string()
                };
            }
            KeyCode::Char('l') => self.logout(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.filter.clear();
                self.mode = Mode::Browse;
                self.status = "Filter cleared".to_string();
            }
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                self.status = format!("{} matching routes", self.visible.len());
            }
            KeyCode::Backspace => {
                self.filter.pop();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filter.push(ch);
            }
            _ => {}
        }
        self.visible = self.context.catalog.routes_matching(&self.filter);
        self.home_list = ListCursor {
            height: self.home_list.height,
            ..ListCursor::default()
        };
        if self.mode == Mode::Filter {
            self.status = format!("Filter: {}", self.filter);
        }
    }

    fn open_details(&mut self, route: Route, from: Screen) {
        info!(id = route.id, name = %route.route, "Opening route details");
        self.selected = Some(route);
        self.details_return = from;
        self.screen = Screen::Details;
    }

    fn handle_details_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => {
                self.screen = self.details_return;
            }
            KeyCode::Char('f') | KeyCode::Char(' ') => {
                if let Some(route) = self.selected.clone() {
                    self.toggle_favorite(route);
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_favorites_key(&mut self, key: KeyEvent) {
        let len = self.catalog.favorites.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('v') | KeyCode::Backspace => {
                self.screen = Screen::Home;
            }
            KeyCode::Char('j') | KeyCode::Down => self.favorites_list.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.favorites_list.move_by(-1, len),
            KeyCode::Enter => {
                if let Some(route) = self.catalog.favorites.get(self.favorites_list.cursor).cloned()
                {
                    self.open_details(route, Screen::Favorites);
                }
            }
            KeyCode::Char('f') | KeyCode::Char(' ') | KeyCode::Delete => {
                if let Some(route) = self.catalog.favorites.get(self.favorites_list.cursor).cloned()
                {
                    self.toggle_favorite(route);
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
