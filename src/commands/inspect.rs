use crate::context::Context;
use crate::locator::{self, StorageService};
use anyhow::{Context as _, Result};

/// Handles the 'inspect' command - parses blob URIs without signing them
pub struct InspectCommand;

impl InspectCommand {
    /// Execute the inspect command.
    ///
    /// Mirrors the sign pipeline's tolerance policy: with several URIs a
    /// bad one becomes a warning, with exactly one it fails the command.
    pub fn execute(ctx: &Context, uris: &[String]) -> Result<()> {
        let ignore_errors = uris.len() > 1;

        for uri in uris {
            match locator::parse_blob_url(uri) {
                Ok((url, locator)) => {
                    ctx.output.subsection(uri);
                    ctx.output.key_value("Account", &locator.account);
                    ctx.output.key_value("Service", locator.service.as_str());
                    ctx.output.key_value("Container", &locator.container);
                    ctx.output.key_value("Blob", &locator.blob);
                    if let Some(fragment) = url.fragment() {
                        ctx.output.key_value("Fragment", fragment);
                    }
                    if locator.service != StorageService::Blob {
                        ctx.output.warning(
                            "non-blob service host; signing would still treat this as a blob resource",
                        );
                    }
                }
                Err(err) if ignore_errors => {
                    ctx.output.warning(&format!("{}: {:#}", uri, err));
                }
                Err(err) => {
                    return Err(err.context(format!("failed to inspect '{}'", uri)));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sas::{MockSasSigner, SasSigner};
    use crate::secrets::SecretCache;
    use crate::traits::output::OutputMessage;
    use crate::traits::{MockFileSystem, MockOutput, MockUserInput, Output};
    use std::sync::Arc;

    fn create_test_context() -> (Context, Arc<MockOutput>) {
        let output = Arc::new(MockOutput::new());
        let ctx = Context {
            fs: Arc::new(MockFileSystem::new()),
            input: Arc::new(MockUserInput::new()),
            output: Arc::clone(&output) as Arc<dyn Output>,
            signer: Arc::new(MockSasSigner::new()) as Arc<dyn SasSigner>,
            secrets: Arc::new(SecretCache::new()),
        };
        (ctx, output)
    }

    #[test]
    fn test_inspect_reports_locator_fields() {
        let (ctx, output) = create_test_context();
        InspectCommand::execute(
            &ctx,
            &["https://acct.blob.core.windows.net/pics/cat.png".to_string()],
        )
        .unwrap();

        let messages = output.get_messages();
        assert!(messages.contains(&OutputMessage::KeyValue(
            "Account".to_string(),
            "acct".to_string()
        )));
        assert!(messages.contains(&OutputMessage::KeyValue(
            "Container".to_string(),
            "pics".to_string()
        )));
        assert!(messages.contains(&OutputMessage::KeyValue(
            "Blob".to_string(),
            "cat.png".to_string()
        )));
    }

    #[test]
    fn test_inspect_warns_on_non_blob_service() {
        let (ctx, output) = create_test_context();
        InspectCommand::execute(
            &ctx,
            &["https://acct.queue.core.windows.net/q/item".to_string()],
        )
        .unwrap();

        assert!(
            output
                .get_warnings()
                .iter()
                .any(|w| w.contains("non-blob service host"))
        );
    }

    #[test]
    fn test_single_bad_uri_fails() {
        let (ctx, _) = create_test_context();
        let err = InspectCommand::execute(&ctx, &["https://example.com/x/y".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("failed to inspect"));
    }

    #[test]
    fn test_bad_uri_among_many_is_tolerated() {
        let (ctx, output) = create_test_context();
        InspectCommand::execute(
            &ctx,
            &[
                "https://acct.blob.core.windows.net/c/a.txt".to_string(),
                "https://example.com/x/y".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(output.get_warnings().len(), 1);
    }
}
