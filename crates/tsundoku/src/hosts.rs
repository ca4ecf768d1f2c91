// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host and source management commands.

use colored::Colorize;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tsundoku_core::{HostId, HostSnapshot, SourceId, SourceSnapshot, SystemError, TsundokuError};
use tsundoku_registry::SourceRegistry;

pub async fn install(
    registry: &SourceRegistry,
    url: &str,
    cancel: &CancellationToken,
) -> Result<(), TsundokuError> {
    let host = registry.install(url, cancel).await?;
    let sources = registry.sources_of(host.id).await?.len();
    println!(
        "{} installed {} by {} as host {} ({} sources)",
        "✓".green(),
        host.name.bold(),
        host.author,
        host.id,
        sources
    );
    Ok(())
}

pub async fn remove(registry: &SourceRegistry, id: HostId) -> Result<(), TsundokuError> {
    registry.remove_host(id).await?;
    println!("{} removed host {id}", "✓".green());
    Ok(())
}

pub async fn list(registry: &SourceRegistry, json: bool) -> Result<(), TsundokuError> {
    let hosts = registry.list_hosts().await?;
    if json {
        let rendered = serde_json::to_string_pretty(&hosts).map_err(|e| SystemError::Invariant {
            message: format!("host list could not be serialized: {e}"),
        })?;
        println!("{rendered}");
    } else {
        print_hosts(&hosts);
    }
    Ok(())
}

pub async fn set_pinned(
    registry: &SourceRegistry,
    id: SourceId,
    pinned: bool,
) -> Result<(), TsundokuError> {
    registry.set_pinned(id, pinned).await?;
    let verb = if pinned { "pinned" } else { "unpinned" };
    println!("{} {verb} source {id}", "✓".green());
    Ok(())
}

pub async fn set_disabled(
    registry: &SourceRegistry,
    id: SourceId,
    disabled: bool,
) -> Result<(), TsundokuError> {
    registry.set_disabled(id, disabled).await?;
    let verb = if disabled { "disabled" } else { "enabled" };
    println!("{} {verb} source {id}", "✓".green());
    Ok(())
}

pub async fn reconcile(registry: &SourceRegistry) -> Result<(), TsundokuError> {
    let report = registry.reconcile().await?;
    if report.is_empty() {
        println!("{} nothing to reconcile", "✓".green());
        return Ok(());
    }
    for id in &report.finalized {
        println!("{} finalized assets of host {id}", "✓".green());
    }
    for key in &report.removed_staging {
        println!("{} removed staging directory {key}", "✓".green());
    }
    Ok(())
}

/// Print the host list on every change until `cancel` fires.
pub async fn watch(registry: &SourceRegistry, cancel: &CancellationToken) -> Result<(), TsundokuError> {
    let mut updates = registry.observer().subscribe(cancel.clone());
    while let Some(update) = updates.next().await {
        match update {
            Ok(hosts) => {
                println!("{}", "── registry ──".dimmed());
                print_hosts(&hosts);
            }
            // One failed snapshot does not end the subscription.
            Err(e) if e.is_recoverable() => {
                eprintln!("{}: {}", "warning".yellow(), e.user_message());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn print_hosts(hosts: &[HostSnapshot]) {
    if hosts.is_empty() {
        println!("no hosts installed");
        return;
    }
    for snapshot in hosts {
        let host = &snapshot.host;
        let official = if host.official {
            format!(" {}", "[official]".cyan())
        } else {
            String::new()
        };
        println!(
            "{} {} by {}{official}",
            format!("#{}", host.id).dimmed(),
            host.name.bold(),
            host.author
        );
        println!("   {}", host.repository.dimmed());
        for source in &snapshot.sources {
            println!("   {}", source_line(source));
        }
    }
}

fn source_line(snapshot: &SourceSnapshot) -> String {
    let source = &snapshot.source;
    let mut line = format!(
        "{:>4}  {} ({})  {}",
        source.id.0,
        source.name,
        source.slug,
        source.languages.join(",")
    );
    if source.pinned {
        line.push_str(&format!("  {}", "pinned".green()));
    }
    if source.disabled {
        line.push_str(&format!("  {}", "disabled".red()));
    }
    if source.nsfw {
        line.push_str(&format!("  {}", "nsfw".magenta()));
    }
    if source.auth.required {
        line.push_str(&format!("  {}", format!("auth:{}", source.auth.kind).yellow()));
    }
    line
}
