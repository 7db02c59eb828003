//! Offline prompt packing: `confsearch pack`.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use confsearch::config::ServiceConfig;
use confsearch::packer::{self, ApproxTokens, CharCount, PromptLength};

pub struct PackArgs<'a> {
    pub query: &'a str,
    pub limit: Option<i64>,
    pub preamble: Option<&'a str>,
    pub tokens: bool,
    pub json: bool,
    pub file: Option<&'a Path>,
}

pub fn cmd_pack(config: &ServiceConfig, args: PackArgs<'_>) -> Result<()> {
    let input = match args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read passages from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read passages from stdin")?;
            buf
        }
    };
    let passages = parse_passages(&input)?;

    let limit = args.limit.unwrap_or(config.search.prompt_limit);
    let preamble = args.preamble.unwrap_or(&config.completion.preamble);
    let length: &dyn PromptLength = if args.tokens { &ApproxTokens } else { &CharCount };

    let packed = packer::pack_with(preamble, args.query, &passages, limit, length);
    let measured = length.measure(&packed.prompt);
    tracing::debug!(
        candidates = passages.len(),
        used = packed.used,
        length = measured,
        limit,
        "Packed prompt"
    );

    if args.json {
        let out = serde_json::json!({
            "prompt": packed.prompt,
            "used": packed.used,
            "length": measured,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", packed.prompt);
    }

    eprintln!(
        "Packed {} of {} passages ({} / {} {})",
        packed.used,
        passages.len(),
        measured,
        limit,
        if args.tokens { "tokens" } else { "chars" }
    );
    Ok(())
}

/// Passages come either as a JSON array of strings or as plain text with
/// passages separated by blank lines. Input that is not valid JSON is text.
fn parse_passages(input: &str) -> Result<Vec<String>> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(input) {
        return serde_json::from_value(value)
            .context("Failed to parse passages as a JSON array of strings");
    }

    let normalized = input.replace("\r\n", "\n");
    Ok(normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect())
}
