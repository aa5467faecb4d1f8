/// A4 portrait in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;
pub const PAGE_MARGIN: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    pub const fn a4() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin: PAGE_MARGIN,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }

    /// Lowest y (measured from the top) a block may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }
}

/// Vertical write position, measured from the top of the current page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    geometry: PageGeometry,
    y: f32,
    page: usize,
}

impl PageCursor {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            y: geometry.margin,
            page: 0,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Zero-based index of the current page.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn advance(&mut self, amount: f32) {
        self.y += amount;
    }

    pub fn reset_to_top(&mut self) {
        self.y = self.geometry.margin;
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.bottom_limit()
    }

    /// Greedy page-break rule: moves to a fresh page when a block of the
    /// estimated height would cross the bottom margin. Returns whether a new
    /// page was started.
    pub fn break_if_needed(&mut self, height: f32) -> bool {
        if self.fits(height) {
            return false;
        }
        self.page += 1;
        self.reset_to_top();
        true
    }
}

/// Approximate Helvetica advance width in points.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(glyph_width).sum::<f32>() * font_size
}

fn glyph_width(ch: char) -> f32 {
    match ch {
        ' ' | ',' | '.' | ':' | ';' | '!' | '\'' | '|' | 'i' | 'j' | 'l' => 0.278,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '/' | '-' => 0.333,
        'm' | 'M' | 'W' => 0.833,
        'w' => 0.722,
        '0'..='9' => 0.556,
        'A'..='Z' => 0.667,
        _ => 0.556,
    }
}

/// Greedy word wrap against the estimated width. Words longer than a full
/// line are split by character.
pub fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if text_width(&current, font_size) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    }
                }
            }
        }

        lines.push(current);
    }

    lines
}
