//! Subcommand implementations; each returns the text to print

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use vitrine_theme::{
    AccessibilityReport, EngineConfig, FileStore, KeyValueStore, MemoryStore, RootStyle,
    StyleVariableSet, ThemeClient, ThemeDescriptor, ThemePreset, ThemeStore, VariableInjector,
};

fn client(config: &EngineConfig, offline: bool) -> ThemeClient {
    if offline {
        ThemeClient::offline().with_timeout(config.request_timeout())
    } else {
        ThemeClient::http(&config.service.base_url, config.request_timeout())
    }
}

fn backend(config: &EngineConfig) -> Result<Arc<dyn KeyValueStore>> {
    Ok(match &config.cache.storage_dir {
        Some(dir) => Arc::new(
            FileStore::open(dir)
                .with_context(|| format!("Failed to open storage at {}", dir.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    })
}

fn build_store(config: &EngineConfig, offline: bool) -> Result<ThemeStore> {
    Ok(ThemeStore::builder(client(config, offline))
        .configure(config)
        .backend(backend(config)?)
        .build())
}

/// `vitrine load <slug>`
pub async fn load(config: &EngineConfig, slug: &str, offline: bool) -> Result<String> {
    let store = build_store(config, offline)?;
    let injector = VariableInjector::immediate(RootStyle::new());
    let _sync = injector.attach(&store);

    let state = store.load_theme(slug).await;
    let mut out = String::new();
    if let Some(err) = &state.last_error {
        tracing::warn!("Could not load {:?}: {}", slug, err);
        writeln!(
            out,
            "/* {slug} unavailable ({err}); showing {} */",
            state.current_slug().unwrap_or("nothing")
        )?;
    }

    writeln!(out, ":root {{")?;
    injector.with_target(|root| {
        for (name, value) in root.properties() {
            let _ = writeln!(out, "  {name}: {value};");
        }
    });
    out.push('}');
    Ok(out)
}

fn read_descriptor(path: &Path) -> Result<ThemeDescriptor> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    ThemeDescriptor::from_json(&json)
        .with_context(|| format!("Invalid theme in {}", path.display()))
}

/// `vitrine vars <file>`
pub fn vars(path: &Path) -> Result<String> {
    let theme = read_descriptor(path)?;
    Ok(StyleVariableSet::from_descriptor(&theme).to_css_block())
}

/// `vitrine report <slug|file>`
pub async fn report(
    config: &EngineConfig,
    target: &str,
    offline: bool,
    json: bool,
) -> Result<String> {
    let path = Path::new(target);
    let theme = if path.is_file() {
        read_descriptor(path)?
    } else {
        client(config, offline)
            .fetch_theme(target)
            .await
            .with_context(|| format!("Failed to fetch theme {target:?}"))?
    };

    let report = AccessibilityReport::for_theme(&theme);
    if json {
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:<24} {:<20} {:>8}  {:<4} {:<4} AA large",
        "foreground", "background", "ratio", "AA", "AAA"
    )?;
    for result in &report.results {
        writeln!(
            out,
            "{:<24} {:<20} {:>7.2}:1  {:<4} {:<4} {}",
            result.foreground.label(),
            result.background.label(),
            result.ratio,
            mark(result.aa),
            mark(result.aaa),
            mark(result.aa_large),
        )?;
    }
    out.push_str(&report.summary());
    Ok(out)
}

fn mark(pass: bool) -> &'static str {
    if pass {
        "yes"
    } else {
        "no"
    }
}

/// `vitrine presets`
pub fn presets() -> String {
    ThemePreset::all()
        .iter()
        .map(|preset| format!("{:<16} {}", preset.id(), preset.display_name()))
        .collect::<Vec<_>>()
        .join("\n")
}
