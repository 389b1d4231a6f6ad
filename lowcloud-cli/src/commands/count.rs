//! Count command - number of combinations for given tile sizes.

use clap::Args;

use lowcloud::combination::total_combinations;

use crate::error::CliError;

/// Arguments for the count command.
#[derive(Debug, Clone, Args)]
pub struct CountArgs {
    /// Number of images in each tile, e.g. `3 2 4` or `3,2,4`
    #[arg(required = true, value_delimiter = ',', num_args = 1..)]
    pub sizes: Vec<usize>,

    /// Maximum number of combinations per run
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Run the count command.
pub fn run(args: CountArgs) -> Result<(), CliError> {
    let total = total_combinations(&args.sizes);

    println!("Tiles:        {}", args.sizes.len());
    println!("Images:       {}", args.sizes.iter().sum::<usize>());
    println!("Combinations: {}", format_count(total));
    if let Some(limit) = args.limit {
        let bounded = total.min(limit as u64);
        println!("Per run:      {} (limit {})", format_count(bounded), limit);
    }
    Ok(())
}

/// Formats a count, marking the saturated maximum.
fn format_count(count: u64) -> String {
    if count == u64::MAX {
        format!("{} (saturated)", count)
    } else {
        count.to_string()
    }
}
