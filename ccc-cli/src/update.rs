//! Background check for a newer published release

use crate::commands::Context;
use crate::output;
use ccc_core::version::{needs_refresh, VersionCache};
use ccc_core::Registry;
use chrono::Utc;
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

pub const PACKAGE_NAME: &str = "claude-code-config";
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
const NPM_REGISTRY: &str = "https://registry.npmjs.org";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// The part of the registry's `<package>/latest` document we read
#[derive(Debug, Deserialize)]
struct PublishedRelease {
    version: String,
}

pub struct UpdateCheck {
    pending: Option<Receiver<Option<String>>>,
}

impl UpdateCheck {
    /// Report a cached newer version and refresh the cache in the background if stale
    pub fn start(registry: &Registry) -> Self {
        if let Some(latest) = registry
            .version_cache
            .as_ref()
            .and_then(|cache| cache.update_for(CURRENT_VERSION))
        {
            output::warning(format!(
                "A new version is available: {CURRENT_VERSION} -> {latest} (npm i -g {PACKAGE_NAME})"
            ));
        }

        if !needs_refresh(registry.version_cache.as_ref(), Utc::now()) {
            return Self { pending: None };
        }

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(fetch_latest());
        });
        Self { pending: Some(rx) }
    }

    /// Store the lookup result once it has arrived; never blocks
    pub fn poll(&mut self, ctx: &Context) {
        let Some(rx) = &self.pending else {
            return;
        };
        match rx.try_recv() {
            Ok(Some(latest)) => {
                self.pending = None;
                record(ctx, latest);
            }
            Ok(None) | Err(TryRecvError::Disconnected) => self.pending = None,
            Err(TryRecvError::Empty) => {}
        }
    }
}

fn latest_url() -> String {
    format!("{NPM_REGISTRY}/{PACKAGE_NAME}/latest")
}

fn fetch_latest() -> Option<String> {
    match lookup_latest() {
        Ok(version) if !version.trim().is_empty() => {
            log::debug!("latest published version: {version:?}");
            Some(version.trim().to_string())
        }
        Ok(_) => None,
        Err(e) => {
            log::debug!("version lookup failed: {e}");
            None
        }
    }
}

fn lookup_latest() -> reqwest::Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .user_agent(format!("{PACKAGE_NAME}/{CURRENT_VERSION}"))
        .build()?;
    let release: PublishedRelease = client
        .get(latest_url())
        .send()?
        .error_for_status()?
        .json()?;
    Ok(release.version)
}

fn record(ctx: &Context, latest: String) {
    match ctx.registry() {
        Ok(mut registry) => {
            registry.version_cache = Some(VersionCache::new(latest, Utc::now()));
            ctx.store.save(&registry);
        }
        Err(e) => log::debug!("skipping version cache update: {e}"),
    }
}
