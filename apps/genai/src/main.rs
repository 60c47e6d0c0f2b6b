use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use genai::{Config, Generated, GenerationRequest, GenerativeClient};

const USAGE: &str = "usage: genai [--json] [--model <id>] <prompt>";

struct Args {
    structured: bool,
    model: Option<String>,
    prompt: String,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut structured = false;
    let mut model = None;
    let mut words = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => structured = true,
            "--model" => match args.next() {
                Some(id) => model = Some(id),
                None => bail!("--model needs a value\n{USAGE}"),
            },
            "-h" | "--help" => bail!(USAGE),
            _ => words.push(arg),
        }
    }

    let prompt = words.join(" ");
    if prompt.trim().is_empty() {
        bail!(USAGE);
    }
    Ok(Args {
        structured,
        model,
        prompt,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting genai v{} (credential configured: {})",
        env!("CARGO_PKG_VERSION"),
        config.is_configured()
    );

    let args = parse_args(std::env::args().skip(1))?;
    let client = GenerativeClient::from_config(&config)?;

    let mut request = if args.structured {
        GenerationRequest::structured(args.prompt)
    } else {
        GenerationRequest::text(args.prompt)
    };
    if let Some(model) = args.model {
        request = request.with_model(model);
    }

    match client.generate(&request).await? {
        Generated::Text(text) => println!("{text}"),
        Generated::Structured(value) => println!("{}", serde_json::to_string_pretty(&value)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args_joins_prompt_words() {
        let parsed = parse_args(args(&["--json", "list", "three", "colours"])).unwrap();
        assert!(parsed.structured);
        assert_eq!(parsed.prompt, "list three colours");
        assert!(parsed.model.is_none());
    }

    #[test]
    fn test_parse_args_model_flag() {
        let parsed = parse_args(args(&["--model", "gemini-1.5-pro", "hi"])).unwrap();
        assert_eq!(parsed.model.as_deref(), Some("gemini-1.5-pro"));
        assert!(!parsed.structured);
    }

    #[test]
    fn test_parse_args_requires_prompt() {
        assert!(parse_args(args(&["--json"])).is_err());
        assert!(parse_args(args(&["--model"])).is_err());
    }
}
