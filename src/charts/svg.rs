//! Minimal SVG plotting surface shared by the chart builders.

/// Canvas size in pixels.
pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 450.0;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 130.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

pub const PODIUM_GOLD: &str = "#d4af37";

const PALETTE: [&str; 10] = [
    "#e10600", "#1e41ff", "#00d2be", "#ff8700", "#006f62", "#2b4562", "#b6babd", "#900000",
    "#52e252", "#c92d4b",
];

/// Series color for the `i`-th driver, cycling through the palette.
pub fn color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

/// Escapes text for use inside SVG or HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Linear map from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl Scale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }
}

/// Evenly spaced whole-number ticks covering `[min, max]`, at most about
/// `count` of them.
pub fn ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    let start = min.ceil();
    let span = (max - start).max(0.0);
    let step = (span / count.max(1) as f64).ceil().max(1.0);

    let mut out = Vec::new();
    let mut t = start;
    while t <= max {
        out.push(t);
        t += step;
    }
    out
}

fn label(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// A titled plot area with data-space scales. Elements are appended in
/// drawing order and [`Plot::finish`] closes the document.
pub struct Plot {
    svg: String,
    pub x: Scale,
    pub y: Scale,
    legend_rows: usize,
}

impl Plot {
    /// Starts a plot. With `invert_y` the low end of `y_domain` is drawn at
    /// the top, as for positions.
    pub fn new(title: &str, x_domain: (f64, f64), y_domain: (f64, f64), invert_y: bool) -> Self {
        let x = Scale::new(x_domain, (MARGIN_LEFT, WIDTH - MARGIN_RIGHT));
        let y_range = if invert_y {
            (MARGIN_TOP, HEIGHT - MARGIN_BOTTOM)
        } else {
            (HEIGHT - MARGIN_BOTTOM, MARGIN_TOP)
        };
        let y = Scale::new(y_domain, y_range);

        let mut svg = String::new();
        svg.push_str(&format!(
            r##"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" class="chart">"##
        ));
        svg.push_str(&format!(
            r##"<rect width="{WIDTH}" height="{HEIGHT}" fill="#15151e"/>"##
        ));
        svg.push_str(&format!(
            r##"<text x="{:.1}" y="24" fill="#ffffff" font-size="16" text-anchor="middle">{}</text>"##,
            WIDTH / 2.0,
            escape(title)
        ));

        Self {
            svg,
            x,
            y,
            legend_rows: 0,
        }
    }

    /// Axis lines with tick labels at the given data values.
    pub fn axes(&mut self, x_label: &str, y_label: &str, x_ticks: &[f64], y_ticks: &[f64]) {
        let left = MARGIN_LEFT;
        let right = WIDTH - MARGIN_RIGHT;
        let bottom = HEIGHT - MARGIN_BOTTOM;

        self.svg.push_str(&format!(
            r##"<line x1="{left}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="#888"/>"##
        ));
        self.svg.push_str(&format!(
            r##"<line x1="{left}" y1="{MARGIN_TOP}" x2="{left}" y2="{bottom}" stroke="#888"/>"##
        ));

        for &t in x_ticks {
            let px = self.x.map(t);
            self.svg.push_str(&format!(
                r##"<text x="{px:.1}" y="{:.1}" fill="#ccc" font-size="10" text-anchor="middle">{}</text>"##,
                bottom + 14.0,
                label(t)
            ));
        }
        for &t in y_ticks {
            let py = self.y.map(t);
            self.svg.push_str(&format!(
                r##"<line x1="{left}" y1="{py:.1}" x2="{right}" y2="{py:.1}" stroke="#333" stroke-dasharray="2,3"/>"##
            ));
            self.svg.push_str(&format!(
                r##"<text x="{:.1}" y="{:.1}" fill="#ccc" font-size="10" text-anchor="end">{}</text>"##,
                left - 6.0,
                py + 3.0,
                label(t)
            ));
        }

        self.svg.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" fill="#ccc" font-size="12" text-anchor="middle">{}</text>"##,
            (left + right) / 2.0,
            HEIGHT - 12.0,
            escape(x_label)
        ));
        self.svg.push_str(&format!(
            r##"<text x="16" y="{:.1}" fill="#ccc" font-size="12" text-anchor="middle" transform="rotate(-90 16 {:.1})">{}</text>"##,
            (MARGIN_TOP + bottom) / 2.0,
            (MARGIN_TOP + bottom) / 2.0,
            escape(y_label)
        ));
    }

    /// Line through data-space points. Fewer than two points draw nothing.
    pub fn polyline(&mut self, points: &[(f64, f64)], color: &str, width: f64) {
        if points.len() < 2 {
            return;
        }
        let coords: Vec<String> = points
            .iter()
            .map(|&(x, y)| format!("{:.1},{:.1}", self.x.map(x), self.y.map(y)))
            .collect();
        self.svg.push_str(&format!(
            r##"<polyline points="{}" fill="none" stroke="{color}" stroke-width="{width}"/>"##,
            coords.join(" ")
        ));
    }

    pub fn circle(&mut self, x: f64, y: f64, radius: f64, color: &str) {
        self.svg.push_str(&format!(
            r##"<circle cx="{:.1}" cy="{:.1}" r="{radius}" fill="{color}"/>"##,
            self.x.map(x),
            self.y.map(y)
        ));
    }

    pub fn diamond(&mut self, x: f64, y: f64, radius: f64, color: &str) {
        let (cx, cy) = (self.x.map(x), self.y.map(y));
        self.svg.push_str(&format!(
            r##"<polygon points="{:.1},{:.1} {:.1},{:.1} {:.1},{:.1} {:.1},{:.1}" fill="{color}" stroke="#ffffff"/>"##,
            cx,
            cy - radius,
            cx + radius,
            cy,
            cx,
            cy + radius,
            cx - radius,
            cy
        ));
    }

    /// Rectangle spanning two data-space corners.
    pub fn rect(&mut self, from: (f64, f64), to: (f64, f64), fill: &str, outline: Option<&str>) {
        let (x0, x1) = (self.x.map(from.0), self.x.map(to.0));
        let (y0, y1) = (self.y.map(from.1), self.y.map(to.1));
        let stroke = match outline {
            Some(c) => format!(r##" stroke="{c}" stroke-width="3""##),
            None => String::new(),
        };
        self.svg.push_str(&format!(
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{fill}"{stroke}/>"##,
            x0.min(x1),
            y0.min(y1),
            (x1 - x0).abs(),
            (y1 - y0).abs()
        ));
    }

    /// Text anchored at a data-space point.
    pub fn text(&mut self, x: f64, y: f64, anchor: &str, content: &str) {
        self.svg.push_str(&format!(
            r##"<text x="{:.1}" y="{:.1}" fill="#ffffff" font-size="11" text-anchor="{anchor}">{}</text>"##,
            self.x.map(x),
            self.y.map(y) + 4.0,
            escape(content)
        ));
    }

    /// Adds one row to the legend in the right margin.
    pub fn legend_entry(&mut self, name: &str, color: &str) {
        let x = WIDTH - MARGIN_RIGHT + 14.0;
        let y = MARGIN_TOP + 16.0 * self.legend_rows as f64;
        self.svg.push_str(&format!(
            r##"<rect x="{x:.1}" y="{:.1}" width="10" height="10" fill="{color}"/>"##,
            y - 9.0
        ));
        self.svg.push_str(&format!(
            r##"<text x="{:.1}" y="{y:.1}" fill="#ffffff" font-size="11">{}</text>"##,
            x + 16.0,
            escape(name)
        ));
        self.legend_rows += 1;
    }

    pub fn finish(mut self) -> String {
        self.svg.push_str("</svg>");
        self.svg
    }
}
