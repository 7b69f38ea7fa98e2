use crate::config::Config;
use crate::context::Context;
use crate::error::{self, SignError};
use crate::locator::{self, BlobLocator};
use crate::sas::{PermissionLevel, PolicyChoice, SasRequest};
use crate::secrets;
use crate::selection::{self, Selection};
use anyhow::{Context as _, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use url::Url;

/// One selection resolved against the buffer.
///
/// `secret` is absent when key resolution failed for this entry; such
/// entries survive to the end of the run but are never rewritten.
struct PendingEntry {
    selection: Selection,
    url: Url,
    locator: BlobLocator,
    secret: Option<String>,
}

/// Handles the 'sign' command - rewrites selected blob URIs as SAS URLs
pub struct SignCommand;

impl SignCommand {
    /// Execute the sign command.
    ///
    /// Selections are processed strictly in order: secrets collected for an
    /// earlier selection are reused by later ones, and prompts appear in a
    /// predictable order. The file is written once, after every selection
    /// has been resolved and signed, or not at all.
    pub fn execute(
        ctx: &Context,
        config: &Config,
        file: &Path,
        selections: &[Selection],
        key: Option<&str>,
        validity: Option<&str>,
        permissions: Option<PermissionLevel>,
    ) -> Result<()> {
        if selections.is_empty() || (selections.len() == 1 && selections[0].is_empty()) {
            return Err(SignError::EmptySelection.into());
        }

        let text = ctx.fs.read_to_string(file)?;

        // Batch runs tolerate individual bad selections; a run with exactly
        // one selection fails fast instead.
        let ignore_errors = selections.len() > 1;

        let mut run_secrets: HashMap<String, String> = HashMap::new();
        let mut entries: Vec<PendingEntry> = Vec::new();

        for &sel in selections {
            let (url, locator) = match Self::parse_selection(&text, sel) {
                Ok(parsed) => parsed,
                Err(err) if ignore_errors && !error::is_interrupted(&err) => {
                    ctx.output
                        .warning(&format!("Skipping selection {}: {:#}", sel, err));
                    continue;
                }
                Err(err) => return Err(err.context(format!("selection {}", sel))),
            };

            let secret =
                match Self::resolve_secret(ctx, &locator.account, key, &mut run_secrets) {
                    Ok(secret) => Some(secret),
                    Err(err) if error::is_interrupted(&err) => return Err(err),
                    Err(err) if ignore_errors => {
                        ctx.output
                            .warning(&format!("Skipping selection {}: {:#}", sel, err));
                        None
                    }
                    Err(err) => return Err(err.context(format!("selection {}", sel))),
                };

            entries.push(PendingEntry {
                selection: sel,
                url,
                locator,
                secret,
            });
        }

        if !entries.iter().any(|entry| entry.secret.is_some()) {
            ctx.output
                .warning("No selection could be resolved; file left unchanged");
            return Ok(());
        }

        let policy = Self::resolve_policy(ctx, config, validity, permissions)?;

        // One shared start time for the whole batch; entries never drift.
        let now = Utc::now();
        let expiry = now + policy.validity;

        let mut signed: Vec<(&PendingEntry, String)> = Vec::new();
        for entry in &entries {
            let Some(secret) = &entry.secret else {
                continue;
            };

            let request = SasRequest {
                account: &entry.locator.account,
                key: secret,
                container: &entry.locator.container,
                blob: &entry.locator.blob,
                permissions: policy.permissions.flags(),
                start: now,
                expiry,
            };

            let token = match ctx.signer.sign(&request) {
                Ok(token) => token,
                Err(err) if ignore_errors && !error::is_interrupted(&err) => {
                    ctx.output.warning(&format!(
                        "Skipping selection {}: {:#}",
                        entry.selection, err
                    ));
                    continue;
                }
                Err(err) => {
                    return Err(err.context(format!("selection {}", entry.selection)));
                }
            };

            // Keep scheme, host, path and fragment; only the query changes.
            let mut url = entry.url.clone();
            url.set_query(Some(&token));
            signed.push((entry, url.to_string()));
        }

        if signed.is_empty() {
            ctx.output
                .warning("No selection could be signed; file left unchanged");
            return Ok(());
        }

        let replacements: Vec<(Selection, String)> = signed
            .iter()
            .map(|(entry, url)| (entry.selection, url.clone()))
            .collect();
        let rewritten = selection::apply_replacements(&text, &replacements)?;
        ctx.fs.write(file, &rewritten)?;

        ctx.output.blank();
        ctx.output.success(&format!(
            "Rewrote {} of {} selection(s) in {}",
            signed.len(),
            selections.len(),
            file.display()
        ));
        for (entry, _) in &signed {
            ctx.output.key_value(
                &entry.selection.to_string(),
                &format!(
                    "{}/{}/{}",
                    entry.locator.account, entry.locator.container, entry.locator.blob
                ),
            );
        }
        let untouched = selections.len() - signed.len();
        if untouched > 0 {
            ctx.output
                .dimmed(&format!("  {} selection(s) left unchanged", untouched));
        }

        Ok(())
    }

    /// Slice a selection out of the buffer and parse it as a blob URI.
    fn parse_selection(text: &str, sel: Selection) -> Result<(Url, BlobLocator)> {
        let raw = sel.slice(text)?;
        locator::parse_blob_url(raw)
    }

    /// Resolve the account key for one selection.
    ///
    /// Lookup order: run-local map, session cache, `--key` flag, masked
    /// prompt. A prompted key is remembered in both maps so repeated
    /// selections against the same account never re-prompt.
    fn resolve_secret(
        ctx: &Context,
        account: &str,
        key_flag: Option<&str>,
        run_secrets: &mut HashMap<String, String>,
    ) -> Result<String> {
        if let Some(secret) = run_secrets.get(account) {
            return Ok(secret.clone());
        }
        if let Some(secret) = ctx.secrets.get(account) {
            run_secrets.insert(account.to_string(), secret.clone());
            return Ok(secret);
        }

        let secret = match key_flag {
            Some(value) => {
                secrets::validate_account_key(value).map_err(|msg| {
                    anyhow::anyhow!("invalid account key for '{}': {}", account, msg)
                })?;
                value.trim().to_string()
            }
            None => ctx
                .input
                .password(
                    &format!("Account key for '{}':", account),
                    secrets::validate_account_key,
                )?
                .trim()
                .to_string(),
        };

        ctx.secrets.insert(account, &secret);
        run_secrets.insert(account.to_string(), secret.clone());
        Ok(secret)
    }

    /// Collect the policy choices shared by every entry in this run.
    fn resolve_policy(
        ctx: &Context,
        config: &Config,
        validity_flag: Option<&str>,
        permissions_flag: Option<PermissionLevel>,
    ) -> Result<PolicyChoice> {
        let validity = match validity_flag {
            Some(label) => config
                .preset(label)
                .with_context(|| {
                    format!(
                        "unknown validity preset '{}'; known presets: {}",
                        label,
                        config
                            .validity_presets
                            .iter()
                            .map(|preset| preset.label.as_str())
                            .collect::<Vec<&str>>()
                            .join(", ")
                    )
                })?
                .duration(),
            None => {
                let labels: Vec<String> = config
                    .validity_presets
                    .iter()
                    .map(|preset| preset.label.clone())
                    .collect();
                let chosen = ctx.input.select("Signed URL valid for:", labels)?;
                config
                    .preset(&chosen)
                    .context("validity choice not recognized")?
                    .duration()
            }
        };

        let permissions = match permissions_flag.or(config.default_permissions) {
            Some(level) => level,
            None => {
                let labels: Vec<String> = PermissionLevel::all()
                    .iter()
                    .map(|level| level.label().to_string())
                    .collect();
                let chosen = ctx.input.select("Permissions:", labels)?;
                PermissionLevel::all()
                    .into_iter()
                    .find(|level| level.label() == chosen)
                    .context("permission choice not recognized")?
            }
        };

        Ok(PolicyChoice {
            validity,
            permissions,
        })
    }
}
