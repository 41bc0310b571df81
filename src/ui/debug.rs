use ratatui::{prelude::*, widgets::*};

use crate::{
    sample::Sampler,
    ui::state::{Focussable, UiState},
};

/// Raw state dump, toggled with `d`.
pub struct DebugWidget<'a> {
    pub ui: &'a UiState,
    pub sampler: &'a Sampler,
}

impl Widget for DebugWidget<'_> {
    fn render(self, area: ratatui::layout::Rect, buf: &mut ratatui::buffer::Buffer) {
        let border_color = match self.ui.focus {
            Some(Focussable::Debug) => self.ui.theme.accent,
            _ => self.ui.theme.foreground,
        };
        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.foreground);
        let underflows = self
            .sampler
            .last_output
            .as_ref()
            .map(|output| output.ranking.underflows.len())
            .unwrap_or_default();
        let paragraph = Paragraph::new(format!(
            "underflows in last cycle: {}\n{:#?}\n{:#?}",
            underflows, self.ui, self.sampler
        ))
        .block(
            Block::bordered()
                .title("Debug")
                .title_alignment(Alignment::Left)
                .border_style(Style::default().fg(border_color))
                .border_type(BorderType::Rounded),
        )
        .alignment(HorizontalAlignment::Left)
        .wrap(Wrap { trim: false })
        .style(panel_style);
        paragraph.render(area, buf);
    }
}
