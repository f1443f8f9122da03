//! `buddy parse`: run the response extractor over finished text.

use console::style;
use tracing::info_span;

use buddy_core::extract::{ParsedResponse, parse_response};
use buddy_observe::spans;
use buddy_types::record::RecordPayload;

use super::read_input;

pub async fn parse(file: Option<&std::path::Path>, json: bool) -> anyhow::Result<()> {
    let input = read_input(file).await?;
    let text = String::from_utf8_lossy(&input);

    let parsed = info_span!(spans::RESPONSE_PARSE, buddy.input.bytes = input.len())
        .in_scope(|| parse_response(&text));

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print_parsed(&parsed)?;
    }
    Ok(())
}

fn print_parsed(parsed: &ParsedResponse) -> anyhow::Result<()> {
    println!();
    println!("  {}", style("Display text").bold());
    for line in parsed.display_text.lines() {
        println!("    {line}");
    }

    println!();
    if parsed.chips.is_empty() {
        println!("  {} {}", style("Chips").bold(), style("(none)").dim());
    } else {
        println!("  {}", style("Chips").bold());
        for (i, chip) in parsed.chips.iter().enumerate() {
            println!("    {} {chip}", style(format!("[{}]", i + 1)).cyan());
        }
    }

    print_payload("Entry", parsed.entry.as_ref())?;
    print_payload("Intake", parsed.intake.as_ref())?;
    println!();
    Ok(())
}

fn print_payload(label: &str, payload: Option<&RecordPayload>) -> anyhow::Result<()> {
    println!();
    match payload {
        Some(payload) => {
            println!("  {}", style(label).bold());
            for line in serde_json::to_string_pretty(payload)?.lines() {
                println!("    {line}");
            }
        }
        None => println!("  {} {}", style(label).bold(), style("(none)").dim()),
    }
    Ok(())
}
