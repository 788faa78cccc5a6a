use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine},
        Block, Borders, Widget,
    },
};

use crate::presentation::map::{MapColor, Shape, TerminalMap};

/// Shapes at least this heavy are drawn on top of the rest.
const EMPHASIS_WEIGHT: u8 = 5;

pub fn map_color(color: MapColor) -> Color {
    match color {
        MapColor::SkyBlue => Color::Rgb(135, 206, 235),
        MapColor::Blue => Color::Blue,
        MapColor::Red => Color::Red,
    }
}

/// Map panel: streets, markers and the open popup on a braille canvas.
pub struct MapView<'a> {
    pub map: &'a TerminalMap,
    pub title: &'a str,
}

impl Widget for MapView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title(self.title);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let bounds = self.map.viewport.visible_bounds(inner.width, inner.height);
        let map = self.map;

        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([bounds.min.lon, bounds.max.lon])
            .y_bounds([bounds.min.lat, bounds.max.lat])
            .paint(|ctx| {
                let (emphasised, regular): (Vec<&Shape>, Vec<&Shape>) = map
                    .shapes()
                    .iter()
                    .filter(|s| s.style.opacity > 0.0)
                    .partition(|s| s.style.weight >= EMPHASIS_WEIGHT);

                for shape in regular {
                    draw_shape(ctx, shape);
                }
                ctx.layer();
                for shape in emphasised {
                    draw_shape(ctx, shape);
                }
                ctx.layer();

                for marker in map.markers() {
                    ctx.print(
                        marker.position.lon,
                        marker.position.lat,
                        Span::styled(
                            "◆",
                            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                        ),
                    );
                }
                if let Some(popup) = map.popup() {
                    ctx.print(
                        popup.position.lon,
                        popup.position.lat,
                        Line::from(Span::styled(
                            format!(" {} ", popup.text),
                            Style::default().fg(Color::Black).bg(Color::White),
                        )),
                    );
                }
            })
            .render(inner, buf);
    }
}

fn draw_shape(ctx: &mut Context, shape: &Shape) {
    let color = map_color(shape.style.color);
    let Some(geometry) = shape.feature.geometry.as_ref() else {
        return;
    };
    for path in geometry.paths() {
        for seg in path.windows(2) {
            ctx.draw(&CanvasLine {
                x1: seg[0].lon,
                y1: seg[0].lat,
                x2: seg[1].lon,
                y2: seg[1].lat,
                color,
            });
        }
    }
}
