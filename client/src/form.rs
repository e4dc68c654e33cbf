//! Pending form input and its validation.

use crate::error::ClientError;
use crate::records;
use studylog_core::remote_store::NewRecord;

/// Time text the form starts with
pub const DEFAULT_TIME: &str = "0.5";

/// Text the user has typed but not yet submitted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingInput {
    /// Title text, possibly empty
    pub title: String,
    /// Time text, possibly not a number
    pub time: String,
}

impl PendingInput {
    /// Empty title with the given default time
    #[must_use]
    pub fn new(default_time: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            time: default_time.into(),
        }
    }

    /// The time text as hours; 0 when it is not a finite number
    #[must_use]
    pub fn numeric_time(&self) -> f64 {
        self.time
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|hours| hours.is_finite())
            .unwrap_or(0.0)
    }
}

impl Default for PendingInput {
    fn default() -> Self {
        Self::new(DEFAULT_TIME)
    }
}

/// Owner of [`PendingInput`]
#[derive(Clone, Debug, Default)]
pub struct FormController {
    input: PendingInput,
}

impl FormController {
    /// A form starting from `default_time`
    #[must_use]
    pub fn new(default_time: impl Into<String>) -> Self {
        Self {
            input: PendingInput::new(default_time),
        }
    }

    /// Current input
    #[must_use]
    pub const fn input(&self) -> &PendingInput {
        &self.input
    }

    /// Replace the title text
    pub fn set_title(&mut self, text: impl Into<String>) {
        self.input.title = text.into();
    }

    /// Replace the time text
    pub fn set_time(&mut self, text: impl Into<String>) {
        self.input.time = text.into();
    }

    /// See [`PendingInput::numeric_time`]
    #[must_use]
    pub fn numeric_time(&self) -> f64 {
        self.input.numeric_time()
    }

    /// The insert payload for the current input.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if the trimmed title is empty or the
    /// numeric time is not greater than 0.
    pub fn validate(&self) -> Result<NewRecord, ClientError> {
        records::validate(&self.input.title, self.numeric_time())
    }

    /// Back to an empty title and `default_time`
    pub fn reset(&mut self, default_time: &str) {
        self.input = PendingInput::new(default_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_default_time() {
        let form = FormController::default();
        assert_eq!(form.input().title, "");
        assert_eq!(form.input().time, "0.5");
        assert!((form.numeric_time() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn numeric_time_never_fails() {
        let mut form = FormController::default();
        for (text, expected) in [
            ("2", 2.0),
            (" 1.25 ", 1.25),
            ("abc", 0.0),
            ("", 0.0),
            ("NaN", 0.0),
            ("inf", 0.0),
            ("-3", -3.0),
        ] {
            form.set_time(text);
            assert!(
                (form.numeric_time() - expected).abs() < f64::EPSILON,
                "{text:?} parsed as {}",
                form.numeric_time()
            );
        }
    }

    #[test]
    fn validate_rejects_blank_title_and_non_positive_time() {
        let mut form = FormController::default();
        form.set_time("1");
        assert_eq!(form.validate(), Err(ClientError::Validation));

        form.set_title("Algebra");
        form.set_time("0");
        assert_eq!(form.validate(), Err(ClientError::Validation));

        form.set_time("2");
        assert_eq!(form.validate(), Ok(NewRecord::new("Algebra", 2.0)));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut form = FormController::new("1");
        form.set_title("Algebra");
        form.set_time("2");

        form.reset("0.5");

        assert_eq!(form.input(), &PendingInput::new("0.5"));
    }
}
