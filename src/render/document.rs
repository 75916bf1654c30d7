#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn rule(&mut self) {
        self.blank();
        self.push("---");
        self.blank();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn to_markdown(&self) -> String {
        self.lines.join("\n")
    }

    pub fn char_count(&self) -> usize {
        let newlines = self.lines.len().saturating_sub(1);
        self.lines.iter().map(|l| l.chars().count()).sum::<usize>() + newlines
    }

    pub fn estimated_pages(&self, chars_per_page: usize) -> f64 {
        if chars_per_page == 0 {
            return 0.0;
        }
        self.char_count() as f64 / chars_per_page as f64
    }
}
