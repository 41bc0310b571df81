use ratatui::{
    buffer::Buffer, layout::Rect, macros::line as rline, macros::*, prelude::*, widgets::*,
};

use crate::{
    sample::{Sampler, rank::Metric},
    ui::state::{Focussable, UiState},
};

const THROBBER: [&str; 4] = ["◑", "◒", "◐", "◓"];

/// The ranked top-N list with a one line status header.
pub struct RankingWidget<'a> {
    pub ui: &'a mut UiState,
    pub sampler: &'a Sampler,
}

impl RankingWidget<'_> {
    /// Metric of the rows on screen, which trails the settings by up to one
    /// interval after a switch.
    fn shown_metric(&self) -> Metric {
        self.sampler
            .last_output
            .as_ref()
            .map_or(self.sampler.settings().metric, |output| output.ranking.metric)
    }

    fn status(&self) -> Line<'_> {
        let settings = self.sampler.settings();
        let shown = self.shown_metric();
        let theme = &self.ui.theme;
        let activity = if self.sampler.is_pending() {
            Span::from(THROBBER[self.ui.step_of_4_in_1_second()]).fg(theme.warning)
        } else if self.sampler.last_error.is_some() {
            Span::from("●").fg(theme.error)
        } else {
            Span::from("●").fg(theme.success)
        };
        let mut line = rline![
            activity,
            span![" Top {} by {} every {}s", settings.top_n, shown.heading(), settings.interval.as_secs_f64()],
        ];
        if settings.metric != shown {
            line.push_span(Span::from(format!("  next: {}", settings.metric.heading())).fg(theme.accent));
        }
        if let Some(err) = &self.sampler.last_error {
            line.push_span(Span::from(format!("  {err}")).fg(theme.error));
        } else if let Some(when) = self.sampler.last_sample {
            line.push_span(
                Span::from(format!("  {:.1}s ago", when.elapsed().as_secs_f64()))
                    .fg(theme.primary_background),
            );
        }
        line
    }
}

impl Widget for RankingWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.ui.theme;
        let border_color = match self.ui.focus {
            Some(Focussable::Table) => theme.accent,
            _ => theme.foreground,
        };
        let border = Block::bordered()
            .title(Span::from(" proctop ").fg(theme.primary))
            .border_style(Style::default().bg(theme.surface).fg(border_color))
            .bg(theme.surface)
            .border_type(BorderType::Rounded);
        let inner = border.inner(area);
        border.render(area, buf);

        let [status_rect, table_rect] = vertical![==1, >=1].areas(inner);
        self.status().render(status_rect, buf);

        let rows = &self.sampler.rows;
        if rows.is_empty() {
            let text = Text::from("Waiting for the first sample");
            let area = table_rect.centered(
                Constraint::Length(text.width() as u16),
                Constraint::Length(1),
            );
            text.render(area, buf);
            return;
        }

        let pids = self
            .sampler
            .last_output
            .iter()
            .flat_map(|output| output.ranking.entries.iter())
            .map(|entry| entry.sample.id().to_string());
        let table_rows = rows.iter().zip(pids).enumerate().map(|(index, (row, pid))| {
            Row::new(vec![
                Cell::from(format!("{}", index + 1)),
                Cell::from(row.display_name.clone()),
                Cell::from(Text::from(pid).alignment(Alignment::Right)),
                Cell::from(Text::from(row.display_value.clone()).alignment(Alignment::Right)),
            ])
            .style(theme.row_style(index, row.is_hot))
        });
        let header = Row::new(vec![
            Cell::from("#"),
            Cell::from("Process"),
            Cell::from(Text::from("PID").alignment(Alignment::Right)),
            Cell::from(Text::from(self.shown_metric().heading()).alignment(Alignment::Right)),
        ])
        .style(Style::default().fg(theme.primary).add_modifier(Modifier::BOLD));
        let table = Table::new(
            table_rows,
            [
                Constraint::Length(3),
                Constraint::Fill(1),
                Constraint::Length(8),
                Constraint::Length(12),
            ],
        )
        .header(header)
        .column_spacing(1)
        .row_highlight_style(theme.selected_style());
        StatefulWidget::render(table, table_rect, buf, &mut self.ui.table_state);
    }
}
