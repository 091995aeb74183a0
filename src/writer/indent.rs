use crate::error::WriterError;

/// An indentation amount: either a level count or a run of whitespace to
/// measure (tabs count one unit each, spaces a fraction of a unit).
#[derive(Debug, Clone, PartialEq)]
pub enum IndentSpec {
    Level(f64),
    Whitespace(String),
}

impl IndentSpec {
    /// Classifies untyped input, e.g. a config value or CLI argument:
    /// numeric text is a level, space/tab-only text is whitespace, and
    /// anything else is rejected.
    pub fn parse(raw: &str) -> Result<Self, WriterError> {
        if let Ok(level) = raw.trim().parse::<f64>() {
            return Ok(Self::Level(level));
        }
        if raw.chars().all(|ch| ch == ' ' || ch == '\t') {
            return Ok(Self::Whitespace(raw.to_string()));
        }
        Err(WriterError::InvalidArgument(format!(
            "expected an indentation level or whitespace, got {raw:?}"
        )))
    }
}

impl From<f64> for IndentSpec {
    fn from(level: f64) -> Self {
        Self::Level(level)
    }
}

impl From<usize> for IndentSpec {
    fn from(level: usize) -> Self {
        Self::Level(level as f64)
    }
}

impl From<&str> for IndentSpec {
    fn from(whitespace: &str) -> Self {
        Self::Whitespace(whitespace.to_string())
    }
}

impl From<String> for IndentSpec {
    fn from(whitespace: String) -> Self {
        Self::Whitespace(whitespace)
    }
}

/// Saved indentation state for scoped operations.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndentSnapshot {
    current: f64,
    queued: Option<f64>,
    queued_only_if_not_block: bool,
}

/// Tracks the current indentation level plus a queued level that takes
/// effect at the next committed newline. Levels are `f64` because deriving
/// a level from a partial space run yields fractions of a unit.
#[derive(Debug)]
pub(crate) struct IndentationController {
    unit: String,
    unit_width: usize,
    use_tabs: bool,
    current: f64,
    queued: Option<f64>,
    queued_only_if_not_block: bool,
}

impl IndentationController {
    pub(crate) fn new(unit: String, unit_width: usize, use_tabs: bool) -> Self {
        Self {
            unit,
            unit_width,
            use_tabs,
            current: 0.0,
            queued: None,
            queued_only_if_not_block: false,
        }
    }

    pub(crate) fn level(&self) -> f64 {
        self.current
    }

    pub(crate) fn unit(&self) -> &str {
        &self.unit
    }

    pub(crate) fn resolve(&self, spec: &IndentSpec) -> Result<f64, WriterError> {
        match spec {
            IndentSpec::Level(level) => {
                if !level.is_finite() || *level < 0.0 {
                    return Err(WriterError::negative_level());
                }
                Ok(*level)
            }
            IndentSpec::Whitespace(text) => self.level_of_whitespace(text),
        }
    }

    pub(crate) fn level_of_whitespace(&self, text: &str) -> Result<f64, WriterError> {
        let mut spaces = 0usize;
        let mut tabs = 0usize;
        for ch in text.chars() {
            match ch {
                ' ' => spaces += 1,
                '\t' => tabs += 1,
                _ => return Err(WriterError::non_whitespace(text)),
            }
        }
        Ok(tabs as f64 + spaces as f64 / self.unit_width as f64)
    }

    pub(crate) fn set_spec(&mut self, spec: &IndentSpec) -> Result<(), WriterError> {
        self.current = self.resolve(spec)?;
        Ok(())
    }

    pub(crate) fn set_level_raw(&mut self, level: f64) {
        self.current = level;
    }

    pub(crate) fn queue_spec(&mut self, spec: &IndentSpec) -> Result<(), WriterError> {
        let level = self.resolve(spec)?;
        self.queued = Some(level);
        self.queued_only_if_not_block = false;
        Ok(())
    }

    pub(crate) fn queue_level(&mut self, level: f64) {
        self.queued = Some(level);
        self.queued_only_if_not_block = false;
    }

    pub(crate) fn mark_queued_conditional(&mut self) {
        self.queued_only_if_not_block = true;
    }

    pub(crate) fn has_queued(&self) -> bool {
        self.queued.is_some()
    }

    /// Consumes the queued level at a committed newline. A conditional
    /// queue is discarded when the line that just closed opened a block.
    pub(crate) fn dequeue(&mut self, last_was_block: bool) {
        let Some(queued) = self.queued.take() else {
            return;
        };
        if self.queued_only_if_not_block && last_was_block {
            self.queued_only_if_not_block = false;
        } else {
            self.current = queued;
        }
    }

    pub(crate) fn increment(&mut self) {
        self.current += 1.0;
    }

    pub(crate) fn decrement_clamped(&mut self) {
        self.current = (self.current - 1.0).max(0.0);
    }

    /// Leading whitespace for the current level: whole units, then a
    /// fractional remainder rounded to characters (spaces) or to a whole
    /// extra unit past one half (tabs).
    pub(crate) fn render(&self) -> String {
        let floored = self.current.floor();
        let mut text = self.unit.repeat(floored as usize);
        let overflow = self.current - floored;
        if self.use_tabs {
            if overflow > 0.5 {
                text.push_str(&self.unit);
            }
        } else {
            let portion = (self.unit.len() as f64 * overflow).round() as usize;
            text.push_str(&self.unit[..portion]);
        }
        text
    }

    pub(crate) fn snapshot(&self) -> IndentSnapshot {
        IndentSnapshot {
            current: self.current,
            queued: self.queued,
            queued_only_if_not_block: self.queued_only_if_not_block,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: IndentSnapshot) {
        self.current = snapshot.current;
        self.queued = snapshot.queued;
        self.queued_only_if_not_block = snapshot.queued_only_if_not_block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spaces(width: usize) -> IndentationController {
        IndentationController::new(" ".repeat(width), width, false)
    }

    fn tabs() -> IndentationController {
        IndentationController::new("\t".to_string(), 4, true)
    }

    #[test]
    fn derives_levels_from_whitespace() {
        let controller = spaces(4);
        assert_eq!(controller.level_of_whitespace("").unwrap(), 0.0);
        assert_eq!(controller.level_of_whitespace("        ").unwrap(), 2.0);
        assert_eq!(controller.level_of_whitespace("\t ").unwrap(), 1.25);
    }

    #[test]
    fn rejects_non_whitespace_text() {
        let controller = spaces(4);
        assert!(matches!(
            controller.level_of_whitespace("  \tx"),
            Err(WriterError::InvalidIndentation(_))
        ));
    }

    #[test]
    fn rejects_negative_and_non_finite_levels() {
        let mut controller = spaces(4);
        assert!(controller.set_spec(&IndentSpec::Level(-1.0)).is_err());
        assert!(controller.set_spec(&IndentSpec::Level(f64::NAN)).is_err());
        assert_eq!(controller.level(), 0.0);
    }

    #[test]
    fn renders_fractional_space_levels() {
        let mut controller = spaces(4);
        controller.set_level_raw(1.5);
        assert_eq!(controller.render(), "      ");
        controller.set_level_raw(0.25);
        assert_eq!(controller.render(), " ");
    }

    #[test]
    fn renders_fractional_tab_levels() {
        let mut controller = tabs();
        controller.set_level_raw(1.5);
        assert_eq!(controller.render(), "\t");
        controller.set_level_raw(1.6);
        assert_eq!(controller.render(), "\t\t");
    }

    #[test]
    fn queued_level_applies_on_dequeue() {
        let mut controller = spaces(2);
        controller.queue_level(3.0);
        controller.dequeue(false);
        assert_eq!(controller.level(), 3.0);
        assert!(!controller.has_queued());
    }

    #[test]
    fn conditional_queue_is_discarded_after_a_block_open() {
        let mut controller = spaces(2);
        controller.queue_level(3.0);
        controller.mark_queued_conditional();
        controller.dequeue(true);
        assert_eq!(controller.level(), 0.0);
        assert!(!controller.has_queued());
    }

    #[test]
    fn snapshot_round_trips_queued_state() {
        let mut controller = spaces(2);
        controller.set_level_raw(2.0);
        controller.queue_level(5.0);
        let saved = controller.snapshot();
        controller.dequeue(false);
        controller.set_level_raw(0.0);
        controller.restore(saved);
        assert_eq!(controller.level(), 2.0);
        assert!(controller.has_queued());
    }

    #[test]
    fn parse_classifies_untyped_input() {
        assert_eq!(IndentSpec::parse("2").unwrap(), IndentSpec::Level(2.0));
        assert_eq!(IndentSpec::parse("\t").unwrap(), IndentSpec::Whitespace("\t".into()));
        assert!(matches!(IndentSpec::parse("{}"), Err(WriterError::InvalidArgument(_))));
    }
}
