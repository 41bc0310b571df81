use crate::{
    sample::Sampler,
    ui::{
        debug::DebugWidget,
        ranking::RankingWidget,
        state::{Focussable, UiState},
    },
};
use ratatui::{buffer::Buffer, layout::Rect, macros::*, prelude::*, widgets::*};
use tui_logger::*;

pub struct DashboardWidget<'a> {
    pub ui: &'a mut UiState,
    pub sampler: &'a Sampler,
}

impl Widget for DashboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let [window_rect, help_rect, log_rect] = vertical![>=5, ==1, ==10].areas(area);

        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.foreground);

        let main_rect = if self.ui.debug {
            let [main_rect, panel_rect] = horizontal![>=5, >=30].areas(window_rect);
            DebugWidget {
                ui: self.ui,
                sampler: self.sampler,
            }
            .render(panel_rect, buf);
            main_rect
        } else {
            window_rect
        };

        let border_color = match self.ui.focus {
            Some(Focussable::Logs) => self.ui.theme.accent,
            _ => self.ui.theme.foreground,
        };
        TuiLoggerSmartWidget::default()
            .style_error(panel_style.fg(self.ui.theme.error))
            .style_debug(panel_style)
            .style_warn(panel_style.fg(self.ui.theme.warning))
            .style_trace(panel_style)
            .style_info(panel_style)
            .style(panel_style)
            .border_style(panel_style.fg(border_color))
            .output_separator(':')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
            .output_target(true)
            .output_file(false)
            .output_line(false)
            .state(&self.ui.logger_state)
            .render(log_rect, buf);

        Line::from("q quit  m metric  +/- count  r reload  Tab focus  d debug")
            .style(Style::default().bg(self.ui.theme.background).fg(self.ui.theme.primary_background))
            .render(help_rect, buf);

        RankingWidget {
            ui: self.ui,
            sampler: self.sampler,
        }
        .render(main_rect, buf);
    }
}
