use crate::sas::{SasSigner, ServiceSasSigner};
use crate::secrets::SecretCache;
use crate::traits::{
    FileSystem, InquireUserInput, Output, RealFileSystem, TerminalOutput, UserInput,
};
#[cfg(test)]
use crate::traits::{MockFileSystem, MockOutput, MockUserInput};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection.
///
/// The secret cache lives here so its lifetime is tied to the session, not
/// to a single command run.
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
    pub input: Arc<dyn UserInput>,
    pub output: Arc<dyn Output>,
    pub signer: Arc<dyn SasSigner>,
    pub secrets: Arc<SecretCache>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            input: Arc::new(InquireUserInput),
            output: Arc::new(TerminalOutput),
            signer: Arc::new(ServiceSasSigner),
            secrets: Arc::new(SecretCache::new()),
        }
    }

    /// Create a new context with mock implementations (for testing)
    #[cfg(test)]
    #[allow(dead_code)]
    pub fn test() -> Self {
        Self {
            fs: Arc::new(MockFileSystem::new()),
            input: Arc::new(MockUserInput::new()),
            output: Arc::new(MockOutput::new()),
            signer: Arc::new(crate::sas::MockSasSigner::new()),
            secrets: Arc::new(SecretCache::new()),
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    #[allow(dead_code)]
    pub fn test_with(
        fs: Arc<dyn FileSystem>,
        input: Arc<dyn UserInput>,
        output: Arc<dyn Output>,
        signer: Arc<dyn SasSigner>,
    ) -> Self {
        Self {
            fs,
            input,
            output,
            signer,
            secrets: Arc::new(SecretCache::new()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            input: Arc::clone(&self.input),
            output: Arc::clone(&self.output),
            signer: Arc::clone(&self.signer),
            secrets: Arc::clone(&self.secrets),
        }
    }
}
