//! `persona check-config`: show the configuration the server would run with.

use std::path::Path;

use anyhow::Result;
use console::style;
use serde_json::json;

use persona_types::config::ServiceConfig;

/// Redacted view of the resolved config. The API key is reported only as
/// present or absent.
fn summary(config: &ServiceConfig, data_dir: &Path) -> serde_json::Value {
    json!({
        "data_dir": data_dir.display().to_string(),
        "server": {
            "host": config.server.host,
            "port": config.server.port,
        },
        "llm": {
            "base_url": config.llm.base_url,
            "model": config.llm.model,
            "api_key_set": config.llm.api_key.is_some(),
            "request_timeout_secs": config.llm.request_timeout_secs,
        },
        "chat": {
            "default_context_turns": config.chat.default_context_turns,
            "prompt_cache_ttl_secs": config.chat.prompt_cache_ttl_secs,
            "prompt_cache_capacity": config.chat.prompt_cache_capacity,
        },
        "training": {
            "workers": config.training.workers,
            "simulated_duration_ms": config.training.simulated_duration_ms,
            "stale_after_secs": config.training.stale_after_secs,
            "shutdown_grace_secs": config.training.shutdown_grace_secs,
        },
        "observability": {
            "otel": config.observability.otel,
            "json": config.observability.json,
        },
    })
}

pub fn check_config(config: &ServiceConfig, data_dir: &Path, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary(config, data_dir))?
        );
        return Ok(());
    }

    let mark = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!(
        "  {} Persona v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("  {}", style("── Paths ──").dim());
    println!("  Data dir: {}", style(data_dir.display()).cyan());
    println!();
    println!("  {}", style("── Server ──").dim());
    println!(
        "  Listen:   {}",
        style(format!("{}:{}", config.server.host, config.server.port)).cyan()
    );
    println!();
    println!("  {}", style("── Model ──").dim());
    println!("  Endpoint: {}", config.llm.base_url);
    println!("  Model:    {}", style(&config.llm.model).bold());
    println!("  {} API key configured", mark(config.llm.api_key.is_some()));
    println!();
    println!("  {}", style("── Training ──").dim());
    println!("  Workers:  {}", config.training.workers);
    println!(
        "  Stale after {}s, shutdown grace {}s",
        config.training.stale_after_secs, config.training.shutdown_grace_secs
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_summary_never_contains_key() {
        let mut config = ServiceConfig::default();
        config.llm.api_key = Some(SecretString::from("sk-very-secret"));

        let value = summary(&config, Path::new("/tmp/persona"));
        assert_eq!(value["llm"]["api_key_set"], true);
        assert!(!value.to_string().contains("sk-very-secret"));
        assert_eq!(value["server"]["port"], 8001);
    }
}
