use std::path::PathBuf;

use crate::{
    config::ConfigManager,
    event::{AppEvent, Event, EventHandler},
    sample::{Sampler, SysinfoProvider},
    ui::{
        dashboard::DashboardWidget,
        state::{Focussable, UiState},
    },
};
use color_eyre::eyre::Result;
use log::*;
use ratatui::{
    DefaultTerminal,
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
};
use tui_logger::TuiWidgetEvent;

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: ConfigManager,
    pub sampler: Sampler,
    pub ui_state: UiState,
}

impl App {
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let events = EventHandler::new();
        let config = ConfigManager::new(config_path, events.clone_sender())?;
        let sampler = Sampler::new(
            Box::new(SysinfoProvider::new()),
            config.current(),
            events.clone_sender(),
        );
        Ok(Self {
            running: true,
            events,
            config,
            sampler,
            ui_state: UiState::default(),
        })
    }

    /// Run the application's main loop.
    pub async fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while self.running {
            terminal.draw(|frame| {
                let area = frame.area();
                frame.render_widget(
                    DashboardWidget {
                        ui: &mut self.ui_state,
                        sampler: &self.sampler,
                    },
                    area,
                );
            })?;
            match self.events.next().await? {
                Event::Tick => self.tick(),
                Event::Crossterm(event) => match event {
                    crossterm::event::Event::Key(key_event)
                        if key_event.kind == crossterm::event::KeyEventKind::Press =>
                    {
                        self.handle_key_events(key_event)?
                    }
                    _ => {}
                },
                Event::App(app_event) => match app_event {
                    AppEvent::Reload => self.reload_config(),
                    AppEvent::Quit => self.quit(),
                    AppEvent::Sample => self.sample(),
                    AppEvent::NextMetric => {
                        let metric = self.sampler.settings().metric.next();
                        self.sampler.set_metric(metric);
                    }
                    AppEvent::AdjustTopN(by) => self.sampler.adjust_top_n(by),
                },
            }
        }
        self.sampler.shutdown();
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) -> Result<()> {
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Char('r') => self.events.send(AppEvent::Reload),
            KeyCode::Char('m') => self.events.send(AppEvent::NextMetric),
            KeyCode::Char('+' | '=') => self.events.send(AppEvent::AdjustTopN(1)),
            KeyCode::Char('-') => self.events.send(AppEvent::AdjustTopN(-1)),
            KeyCode::Char('d') => self.ui_state.toggle_debug(),
            KeyCode::Tab => self.ui_state.focus_next(),
            KeyCode::Down => self.ui_state.select_next(),
            KeyCode::Up => self.ui_state.select_prev(),
            KeyCode::PageUp if self.ui_state.focus == Some(Focussable::Logs) => {
                self.ui_state.logger_state.transition(TuiWidgetEvent::PrevPageKey)
            }
            KeyCode::PageDown if self.ui_state.focus == Some(Focussable::Logs) => {
                self.ui_state.logger_state.transition(TuiWidgetEvent::NextPageKey)
            }
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.ui_state.tick();
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    fn sample(&mut self) {
        self.sampler.tick();
        self.ui_state.update_rows(self.sampler.rows.len());
    }

    /// Invalid files are reported and the running settings stay in force.
    fn reload_config(&mut self) {
        debug!(target: "App", "Reload!");
        match self.config.reload() {
            Ok(settings) => self.sampler.apply(settings),
            Err(e) => error!(target: "Config", "Keeping previous settings: {}", e),
        }
    }
}
