//! Plotters-powered rating bar chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color as TuiColor, Style},
    widgets::Widget,
};

use crate::domain::RatingDistribution;

/// A render-only bar chart of star ratings.
pub struct RatingBarsChart {
    pub distribution: RatingDistribution,
}

impl Widget for RatingBarsChart {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(TuiColor::Yellow),
            );
            return;
        }

        let counts = self.distribution.counts();
        let y_max = counts.iter().map(|&(_, n)| n).max().unwrap_or(0) as f64 + 1.0;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 4)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(0.5f64..5.5f64, 0f64..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(5)
                .y_labels(4)
                .x_label_formatter(&|v| format!("{v:.0}*"))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            // Plain rectangles: one bar per star, red (1) through green (5).
            chart.draw_series(counts.iter().filter(|&&(_, n)| n > 0).map(|&(stars, n)| {
                let x = stars as f64;
                Rectangle::new([(x - 0.3, 0.0), (x + 0.3, n as f64)], bar_style(stars))
            }))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn bar_style(stars: i64) -> ShapeStyle {
    bar_color(stars).filled()
}

fn bar_color(stars: i64) -> RGBColor {
    match stars {
        1 => RGBColor(255, 0, 0),
        2 => RGBColor(255, 128, 0),
        3 => RGBColor(255, 255, 0),
        4 => RGBColor(128, 255, 0),
        _ => RGBColor(0, 255, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_are_filled_red_to_green() {
        let low = bar_style(1);
        assert!(low.filled);
        assert_eq!(low.color.rgb(), (255, 0, 0));
        assert_eq!(bar_style(3).color.rgb(), (255, 255, 0));
        assert_eq!(bar_style(5).color.rgb(), (0, 255, 0));
    }

    #[test]
    fn tiny_area_renders_a_hint() {
        let area = Rect::new(0, 0, 12, 4);
        let mut buf = Buffer::empty(area);
        RatingBarsChart {
            distribution: RatingDistribution::from_ratings(&[5, 4]),
        }
        .render(area, &mut buf);

        let first_row: String = (0..area.width).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert_eq!(first_row, "Chart area t");
    }
}
