//! SVG chart surface

use maud::{html, Markup, PreEscaped};
use shared::chart::ChartLayout;

use super::chart::{ChartCanvas, TextAnchor, TextStyle};

/// Collects chart drawing calls into an SVG document.
///
/// The document's pixel size is the backing store (`css × dpr`) and every
/// element is drawn in CSS pixels under a `scale(dpr)` group.
#[derive(Debug)]
pub struct SvgCanvas {
    layout: ChartLayout,
    elements: Vec<Markup>,
}

impl Default for SvgCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgCanvas {
    pub fn new() -> Self {
        Self {
            layout: ChartLayout::new(0.0, 0.0, 1.0),
            elements: Vec::new(),
        }
    }

    pub fn finish(self) -> Markup {
        let (width, height) = self.layout.backing_size();
        html! {
            svg xmlns="http://www.w3.org/2000/svg"
                width=(width)
                height=(height)
                viewBox={ "0 0 " (width) " " (height) }
                style={ "width:" (num(self.layout.width)) "px;height:" (num(self.layout.height)) "px" }
                font-family="sans-serif" {
                g transform={ "scale(" (num(self.layout.dpr)) ")" } {
                    @for element in &self.elements {
                        (element)
                    }
                }
            }
        }
    }
}

impl ChartCanvas for SvgCanvas {
    fn begin(&mut self, layout: &ChartLayout) {
        self.layout = *layout;
        self.elements.clear();
        self.elements.push(html! {
            rect x="0" y="0" width=(num(layout.width)) height=(num(layout.height)) fill="#FFFFFF" {}
        });
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: &str, width: f64) {
        self.elements.push(html! {
            line x1=(num(from.0)) y1=(num(from.1)) x2=(num(to.0)) y2=(num(to.1))
                stroke=(color) stroke-width=(num(width)) {}
        });
    }

    fn polyline(&mut self, points: &[(f64, f64)], color: &str, width: f64) {
        let points = points
            .iter()
            .map(|(x, y)| format!("{},{}", num(*x).0, num(*y).0))
            .collect::<Vec<_>>()
            .join(" ");
        self.elements.push(html! {
            polyline points=(points) fill="none" stroke=(color) stroke-width=(num(width))
                stroke-linejoin="round" {}
        });
    }

    fn circle(&mut self, center: (f64, f64), radius: f64, fill: &str) {
        self.elements.push(html! {
            circle cx=(num(center.0)) cy=(num(center.1)) r=(num(radius)) fill=(fill) {}
        });
    }

    fn rect(&mut self, origin: (f64, f64), size: (f64, f64), fill: &str) {
        self.elements.push(html! {
            rect x=(num(origin.0)) y=(num(origin.1)) width=(num(size.0)) height=(num(size.1)) fill=(fill) {}
        });
    }

    fn text(&mut self, at: (f64, f64), text: &str, style: TextStyle) {
        let anchor = match style.anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        };
        let transform = (style.rotate != 0.0).then(|| {
            format!("rotate({} {} {})", num(style.rotate).0, num(at.0).0, num(at.1).0)
        });
        self.elements.push(html! {
            text x=(num(at.0)) y=(num(at.1)) fill=(style.color) font-size=(num(style.size))
                text-anchor=(anchor)
                font-weight=[style.bold.then_some("bold")]
                transform=[transform] {
                (text)
            }
        });
    }
}

/// Compact coordinate formatting
fn num(value: f64) -> PreEscaped<String> {
    let rounded = (value * 100.0).round() / 100.0;
    PreEscaped(format!("{}", rounded))
}
