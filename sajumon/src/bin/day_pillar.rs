// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// day-pillar: print the Ganji of a birth date.
//
// Usage:
//   day-pillar --date 1997-01-01
//   day-pillar --date 1997-01-01 --time 23:30

use clap::Parser;

use sajumon::calendar::{day_pillar, BirthForm};

#[derive(Parser)]
#[command(name = "day-pillar", about = "Print the sexagenary day pillar for a date.")]
struct Cli {
    /// Gregorian date, YYYY-MM-DD.
    #[arg(long, value_name = "DATE")]
    date: String,

    /// Local birth time, HH:MM (24h). From 23:00 the next day's pillar applies.
    #[arg(long, value_name = "TIME")]
    time: Option<String>,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Split `s` on `sep` into exactly `n` integers; unparsable parts become `None`
/// so the form validation reports them.
fn numbers(s: &str, sep: char, n: usize) -> Vec<Option<i64>> {
    let parts: Vec<&str> = s.trim().split(sep).collect();
    (0..n)
        .map(|i| parts.get(i).and_then(|p| p.trim().parse().ok()))
        .collect()
}

fn main() {
    let cli = Cli::parse();

    let date = numbers(&cli.date, '-', 3);
    let mut form = BirthForm {
        year: date[0],
        month: date[1],
        day: date[2],
        ..BirthForm::default()
    };
    if let Some(time) = &cli.time {
        let hm = numbers(time, ':', 2);
        form.hour = hm[0];
        form.minute = hm[1];
        // A present but garbled time must still trip validation.
        if form.hour.is_none() && form.minute.is_none() {
            form.hour = Some(-1);
        }
    }

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            for (field, message) in &errors.errors {
                eprintln!("{field}: {message}");
            }
            std::process::exit(2);
        }
    };

    let pillar = day_pillar(&input);
    let ganji = pillar.ganji();

    if cli.json {
        let out = serde_json::json!({
            "key": ganji.key,
            "label": ganji.label,
            "stem": ganji.stem,
            "branch": ganji.branch,
            "cycleIndex": pillar.cycle_index(),
        });
        println!("{out}");
        return;
    }

    println!("key:    {}", ganji.key);
    println!("label:  {}", ganji.label);
    println!("stem:   {}", ganji.stem);
    println!("branch: {}", ganji.branch);
    println!("cycle:  {} / 60", pillar.cycle_index() + 1);
}
