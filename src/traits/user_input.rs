use crate::error::SignError;
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Validation hook run inside the prompt widget; an `Err` keeps the widget
/// open and re-prompts instead of failing the run.
pub type ValueValidator = fn(&str) -> Result<(), String>;

/// Response type for mock user input
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockResponse {
    Select(String),
    Password(String),
    /// The user dismissed the prompt without answering.
    Cancel,
}

/// Trait for user input operations to enable testing with mocks.
///
/// Dismissing a prompt (Esc / Ctrl-C) surfaces as
/// `SignError::UserInterrupted`, which aborts the whole run.
pub trait UserInput: Send + Sync {
    /// Display a selection prompt with options
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<String>;

    /// Display a masked input prompt with a validation hook
    fn password(&self, prompt: &str, validator: ValueValidator) -> Result<String>;
}

/// Real user input implementation using inquire crate
pub struct InquireUserInput;

impl UserInput for InquireUserInput {
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<String> {
        use inquire::Select;
        Select::new(prompt, options)
            .prompt()
            .map_err(map_inquire_error)
    }

    fn password(&self, prompt: &str, validator: ValueValidator) -> Result<String> {
        use inquire::Password;
        use inquire::PasswordDisplayMode;
        use inquire::validator::Validation;

        Password::new(prompt)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .with_validator(
                move |value: &str| match validator(value) {
                    Ok(()) => Ok(Validation::Valid),
                    Err(msg) => Ok(Validation::Invalid(msg.into())),
                },
            )
            .prompt()
            .map_err(map_inquire_error)
    }
}

fn map_inquire_error(err: inquire::InquireError) -> anyhow::Error {
    match err {
        inquire::InquireError::OperationCanceled
        | inquire::InquireError::OperationInterrupted => SignError::UserInterrupted.into(),
        other => other.into(),
    }
}

/// Mock user input implementation for testing
#[allow(dead_code)]
pub struct MockUserInput {
    responses: Mutex<VecDeque<MockResponse>>,
    asked: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockUserInput {
    /// Create new mock with no pre-configured responses
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Create mock with pre-configured responses
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Add a response to the queue
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Prompt texts shown so far, in order.
    pub fn prompts_asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    fn next_response(&self, prompt: &str) -> Result<MockResponse> {
        self.asked.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("No more mock responses available for '{}'", prompt))
    }
}

impl Default for MockUserInput {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInput for MockUserInput {
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<String> {
        match self.next_response(prompt)? {
            MockResponse::Select(answer) => {
                // Verify the answer is in the options
                if options.contains(&answer) {
                    Ok(answer)
                } else {
                    anyhow::bail!(
                        "Mock response '{}' is not in the provided options: {:?}",
                        answer,
                        options
                    )
                }
            }
            MockResponse::Cancel => Err(SignError::UserInterrupted.into()),
            _ => anyhow::bail!("Expected Select response but got a different type"),
        }
    }

    fn password(&self, prompt: &str, validator: ValueValidator) -> Result<String> {
        match self.next_response(prompt)? {
            MockResponse::Password(answer) => {
                // The real widget re-prompts on invalid input; a scripted
                // invalid value is a test setup bug, so fail loudly.
                if let Err(msg) = validator(&answer) {
                    anyhow::bail!("Mock password rejected by validator: {}", msg);
                }
                Ok(answer)
            }
            MockResponse::Cancel => Err(SignError::UserInterrupted.into()),
            _ => anyhow::bail!("Expected Password response but got a different type"),
        }
    }
}
