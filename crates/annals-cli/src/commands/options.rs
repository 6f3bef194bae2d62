use crate::commands::print_json;
use annals_core::FormOptionsDto;
use anyhow::Result;

pub fn print_options(json: bool) -> Result<()> {
    let options = FormOptionsDto::build();
    if json {
        return print_json(&options);
    }

    println!("types:");
    for option in &options.types {
        if option.results.is_empty() {
            println!("  {}", option.kind);
        } else {
            println!("  {}: {}", option.kind, option.results.join(", "));
        }
    }
    let durations: Vec<String> = options
        .durations
        .iter()
        .map(|minutes| minutes.to_string())
        .collect();
    println!(
        "durations: {} (default {})",
        durations.join(", "),
        options.default_duration
    );
    println!("regarding: {}", options.regarding.join(", "));
    Ok(())
}
