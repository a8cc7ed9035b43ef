/// The result text, rewritten only when a different label arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDisplay {
    text: String,
    last_rendered: String,
    writes: u64,
}

impl LabelDisplay {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How many times the text was actually rewritten.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Returns `true` when the text changed.
    pub fn show(&mut self, label: &str) -> bool {
        if label == self.last_rendered {
            return false;
        }
        self.last_rendered = label.to_string();
        self.text = label.to_string();
        self.writes += 1;
        true
    }

    /// The next `show` writes even if it repeats the text on screen.
    pub fn forget_last(&mut self) {
        self.last_rendered.clear();
    }
}
