use std::{fmt::Debug, time::Instant};

use crate::{event::TICK_FPS, ui::theme::Theme};
use ratatui::widgets::TableState;
use tui_logger::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focussable {
    Table,
    Logs,
    Debug,
}

pub struct UiState {
    pub tick: f64,
    pub time: Instant,
    pub theme: Theme,
    pub rows: usize,
    pub focus: Option<Focussable>,
    pub debug: bool,
    pub table_state: TableState,
    pub logger_state: TuiWidgetState,
}

impl Debug for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiState")
            .field("tick", &self.tick)
            .field("time", &self.time)
            .field("rows", &self.rows)
            .field("selected", &self.table_state.selected())
            .field("focus", &self.focus)
            .finish()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logger_state: TuiWidgetState::new(),
            tick: Default::default(),
            time: Instant::now(),
            theme: Theme::dark(),
            rows: 0,
            focus: None,
            debug: false,
            table_state: TableState::default(),
        }
    }
}

impl UiState {
    pub fn tick(&mut self) {
        self.tick += 1.0;
        if self.tick > 2.0 * TICK_FPS {
            self.tick = 0.0;
            self.time = Instant::now();
        }
    }

    pub fn step_of_8_in_1_second(&self) -> usize {
        (self.tick * 8.0 / TICK_FPS) as usize % 8
    }

    pub fn step_of_4_in_1_second(&self) -> usize {
        (self.tick * 4.0 / TICK_FPS) as usize % 4
    }

    pub fn step_of_8_in_2_second(&self) -> usize {
        (self.tick * 4.0 / TICK_FPS) as usize % 8
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
        if !self.debug
            && let Some(Focussable::Debug) = &self.focus
        {
            self.focus = Some(Focussable::Table);
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match &self.focus {
            None => Some(Focussable::Table),
            Some(Focussable::Table) => Some(Focussable::Logs),
            Some(Focussable::Logs) => {
                if self.debug {
                    Some(Focussable::Debug)
                } else {
                    Some(Focussable::Table)
                }
            }
            Some(Focussable::Debug) => Some(Focussable::Table),
        }
    }

    /// Move the table selection, only while the table has focus.
    pub fn select_next(&mut self) {
        if self.focus == Some(Focussable::Table) && self.rows > 0 {
            let next = self.table_state.selected().map_or(0, |i| (i + 1) % self.rows);
            self.table_state.select(Some(next));
        }
    }

    pub fn select_prev(&mut self) {
        if self.focus == Some(Focussable::Table) && self.rows > 0 {
            let prev = self
                .table_state
                .selected()
                .map_or(self.rows - 1, |i| (i + self.rows - 1) % self.rows);
            self.table_state.select(Some(prev));
        }
    }

    /// The ranked list changes length when N changes; keep the selection on it.
    pub fn update_rows(&mut self, count: usize) {
        self.rows = count;
        if let Some(idx) = self.table_state.selected()
            && idx >= self.rows
        {
            self.table_state
                .select(if self.rows == 0 { None } else { Some(self.rows - 1) });
        }
    }
}
