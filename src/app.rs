//! Application state machine and the cooperative main loop: sample lines,
//! decode, drain the queue, dispatch to the active mode, render when dirty,
//! sleep to the next tick. Nothing here blocks; slow work lives on the
//! action executor's worker thread and reports back through the queue.

use std::{
    env, fs,
    io::Write,
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use anyhow::Result;

use crate::action::{submit_action, ActionJob, ActionOutcome, ActionProvider};
use crate::config::AppConfig;
use crate::event::{Button, Event, EventQueue, InputEvent};
use crate::frame::{self, Frame, RenderSurface};
use crate::input::{InputDecoder, InputSource};
use crate::menu::{Confirmed, MenuTree, NavigationState};
use crate::snake::SnakeGame;

/// Spinner advance cadence while an action is in flight.
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);
/// How long the goodbye screen lingers before the display is cleared.
const GOODBYE_LINGER: Duration = Duration::from_millis(500);

/// Path to the temp log file we rotate between runs.
pub fn log_file_path() -> PathBuf {
    env::temp_dir().join("pidial.log")
}

/// Write debug messages to a temp file; the terminal (or the panel) is busy
/// being the UI, so stdout is not an option.
pub fn log_debug(msg: &str) {
    use std::fs::OpenOptions;

    let log_path = log_file_path();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
        let _ = writeln!(file, "[{timestamp}] {msg}");
    }
}

/// Remove the log file if it grows past 5 MB between runs.
pub fn init_debug_log_file() {
    let log_path = log_file_path();
    if let Ok(metadata) = fs::metadata(&log_path) {
        const MAX_BYTES: u64 = 5 * 1024 * 1024;
        if metadata.len() > MAX_BYTES {
            let _ = fs::remove_file(&log_path);
        }
    }
}

/// Exactly one of these is active; the loop dispatches on it.
enum Mode {
    /// Navigating the static tree.
    Menu,
    /// Snake owns the screen and the rotate events.
    Game(SnakeGame),
    /// An action is in flight; navigation input is discarded, the spinner
    /// keeps animating no matter how long the action takes.
    Busy { label: String },
    /// Transient result screen; any button or the deadline returns to Menu.
    Notice { text: String, until: Instant },
}

/// Central application state driven exclusively by the main loop.
pub struct App {
    config: AppConfig,
    tree: MenuTree,
    nav: NavigationState,
    mode: Mode,
    queue: Arc<EventQueue>,
    provider: Arc<dyn ActionProvider>,
    job: Option<ActionJob>,
    spinner_frame: usize,
    spinner_last: Instant,
    game_last_step: Instant,
    dirty: bool,
    quit: bool,
    logged_drops: u64,
}

impl App {
    pub fn new(config: AppConfig, tree: MenuTree, provider: Arc<dyn ActionProvider>) -> Self {
        let queue = Arc::new(EventQueue::new(config.queue_capacity));
        let now = Instant::now();
        Self {
            config,
            tree,
            nav: NavigationState::new(),
            mode: Mode::Menu,
            queue,
            provider,
            job: None,
            spinner_frame: 0,
            spinner_last: now,
            game_last_step: now,
            dirty: true,
            quit: false,
            logged_drops: 0,
        }
    }

    /// The queue producers push into; the decoder output and every action
    /// completion funnel through here.
    pub fn queue(&self) -> Arc<EventQueue> {
        Arc::clone(&self.queue)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Input(InputEvent::QuitRequested) => self.request_quit(),
            Event::Input(input) => match &mut self.mode {
                Mode::Menu => self.handle_menu_input(input),
                Mode::Game(_) => self.handle_game_input(input),
                // Queued navigation input from before or during an action is
                // deliberately discarded; only the result moves us on.
                Mode::Busy { .. } => {}
                Mode::Notice { .. } => {
                    if matches!(input, InputEvent::ButtonDown(_)) {
                        self.mode = Mode::Menu;
                        self.dirty = true;
                    }
                }
            },
            Event::ActionDone(outcome) => self.handle_action_done(outcome),
        }
    }

    fn handle_menu_input(&mut self, input: InputEvent) {
        match input {
            InputEvent::RotateCw => {
                self.nav.rotate(&self.tree, true);
                self.dirty = true;
            }
            InputEvent::RotateCcw => {
                self.nav.rotate(&self.tree, false);
                self.dirty = true;
            }
            InputEvent::ButtonDown(Button::Confirm) => self.confirm_selection(),
            InputEvent::ButtonDown(Button::Back) => {
                if self.nav.back() {
                    self.dirty = true;
                }
            }
            InputEvent::LongPress {
                button: Button::Back,
                ..
            } => {
                self.nav.to_root();
                self.dirty = true;
            }
            _ => {}
        }
    }

    fn handle_game_input(&mut self, input: InputEvent) {
        let Mode::Game(game) = &mut self.mode else {
            return;
        };
        match input {
            InputEvent::RotateCw => game.turn(true),
            InputEvent::RotateCcw => game.turn(false),
            InputEvent::ButtonDown(button) => {
                if button == Button::Confirm && game.is_over() {
                    self.start_game();
                } else {
                    self.mode = Mode::Menu;
                    self.dirty = true;
                }
            }
            _ => {}
        }
    }

    fn confirm_selection(&mut self) {
        match self.nav.confirm(&self.tree) {
            Confirmed::Descended => self.dirty = true,
            Confirmed::Submit(request) => {
                if self.job.is_some() {
                    // One action in flight at a time; the menu cannot reach
                    // this while Busy, but the guard keeps the invariant.
                    log_debug("action already in flight; submission ignored");
                    return;
                }
                log_debug(&format!("submitting {request:?}"));
                let label = request.busy_label();
                self.job = Some(submit_action(
                    Arc::clone(&self.provider),
                    request,
                    Arc::clone(&self.queue),
                ));
                self.spinner_frame = 0;
                self.spinner_last = Instant::now();
                self.mode = Mode::Busy { label };
                self.dirty = true;
            }
            Confirmed::StartGame => self.start_game(),
            Confirmed::Quit => self.request_quit(),
        }
    }

    fn start_game(&mut self) {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos();
        self.mode = Mode::Game(SnakeGame::new(seed));
        self.game_last_step = Instant::now();
        self.dirty = true;
    }

    fn handle_action_done(&mut self, outcome: ActionOutcome) {
        log_debug(&format!("action finished: {:?}", outcome.request));
        self.mode = Mode::Notice {
            text: outcome.display_text().to_string(),
            until: Instant::now() + self.config.notice_duration(),
        };
        self.dirty = true;
    }

    /// Reap the worker thread once it signals completion.
    fn poll_job(&mut self) {
        if let Some(job) = self.job.as_mut() {
            if job.poll_finished() {
                self.job = None;
            }
        }
    }

    /// Time-driven updates: spinner animation, game steps, notice expiry.
    fn tick(&mut self, now: Instant) {
        match &mut self.mode {
            Mode::Busy { .. } => {
                if now.duration_since(self.spinner_last) >= SPINNER_INTERVAL {
                    self.spinner_last = now;
                    self.spinner_frame = (self.spinner_frame + 1) % frame::SPINNER_DOTS;
                    self.dirty = true;
                }
            }
            Mode::Game(game) => {
                // A terminal board never changes; keep the last frame up
                // instead of re-presenting it every interval.
                if !game.is_over() {
                    let interval = self.config.snake_step().mul_f32(game.speed_factor());
                    if now.duration_since(self.game_last_step) >= interval {
                        self.game_last_step = now;
                        game.step();
                        self.dirty = true;
                    }
                }
            }
            Mode::Notice { until, .. } => {
                if now >= *until {
                    self.mode = Mode::Menu;
                    self.dirty = true;
                }
            }
            Mode::Menu => {}
        }

        let dropped = self.queue.dropped();
        if dropped != self.logged_drops {
            log_debug(&format!("event queue shed {dropped} events total"));
            self.logged_drops = dropped;
        }
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn render(&self, frame: &mut Frame) {
        match &self.mode {
            Mode::Menu => {
                let labels = self.nav.labels(&self.tree);
                frame::draw_menu(frame, &labels, self.nav.selected_index());
            }
            Mode::Game(game) => game.render(frame),
            Mode::Busy { label } => frame::draw_spinner(frame, label, self.spinner_frame),
            Mode::Notice { text, .. } => frame::draw_text(frame, text),
        }
    }

    fn request_quit(&mut self) {
        if !self.quit {
            log_debug("quit requested");
        }
        self.quit = true;
        // Best effort: the in-flight action may finish on its own time; its
        // result is discarded either way.
        if let Some(job) = self.job.as_ref() {
            job.cancel();
        }
    }

    /// Run the loop until quit. `input` is sampled once per tick; frames go
    /// to `surface` only when something visible changed.
    pub fn run(
        &mut self,
        input: &mut dyn InputSource,
        surface: &mut dyn RenderSurface,
    ) -> Result<()> {
        let mut splash = Frame::new();
        frame::draw_text(&mut splash, "Pi Control\nSystem v2.0\n\nInitializing...");
        surface.present(&splash)?;

        let first = input.sample();
        let mut decoder = InputDecoder::new(&first, self.config.decoder_config());
        let poll = self.config.poll_interval();
        let mut next_tick = Instant::now() + poll;

        loop {
            let sample = input.sample();
            for event in decoder.poll(&sample) {
                self.queue.push(Event::Input(event));
            }
            for event in self.queue.drain_all() {
                self.handle_event(event);
            }
            self.poll_job();
            self.tick(Instant::now());

            if self.quit {
                break;
            }
            if self.take_dirty() {
                let mut frame = Frame::new();
                self.render(&mut frame);
                surface.present(&frame)?;
            }

            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            }
            // After a stall, restart the cadence from now instead of
            // sprinting through the backlog.
            next_tick = (next_tick + poll).max(now);
        }

        let mut goodbye = Frame::new();
        frame::draw_text(&mut goodbye, "Goodbye!");
        surface.present(&goodbye)?;
        thread::sleep(GOODBYE_LINGER);
        surface.clear()?;
        Ok(())
    }
}
