use std::env;

use prsadjust::format;
use prsadjust::partition;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let src = env::args().nth(1).expect("missing src");
    let bytes = std::fs::read(&src)?;

    if format::is_gzipped(&src, &bytes) {
        return Err("gzip-compressed files must be decompressed first".into());
    }

    let text = std::str::from_utf8(&bytes)?;
    let detected = format::detect(text);
    let delimiter = detected
        .delimiter()
        .ok_or_else(|| format!("{src} is not a uniform delimited table"))?;

    println!("Detected {src} as {detected}.");

    let chunks = partition::partition(text, delimiter);

    for chunk in &chunks {
        println!("{}\t{}", chunk.chromosome(), chunk.len());
    }

    println!(
        "Partitioned {} variants into {} chromosomes.",
        chunks.iter().map(|chunk| chunk.len()).sum::<usize>(),
        chunks.len()
    );

    Ok(())
}
