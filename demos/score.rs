use std::env;

use prsadjust::Config;
use prsadjust::Pipeline;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let config = args.next().expect("missing config");
    let src = args.next().expect("missing src");

    let pipeline = Pipeline::new(Config::from_path(config)?)?;
    let bytes = std::fs::read(&src)?;
    let report = pipeline.run_with_report(&bytes, &src).await?;

    println!(
        "Scored {} variants across {} chromosomes.",
        report.variants, report.chunks
    );
    println!("raw: {}", report.prs_raw);
    println!("adjusted: {}", report.prs_adjusted);

    Ok(())
}
