//! Tiles command - show how the catalog groups into tiles and in which
//! order the search would consider them.

use clap::Args;

use lowcloud::catalog::CatalogSource;
use lowcloud::combination::{by_min_cloud, tile_score, Combination, CombinationEnumerator};
use lowcloud::tile::group_records;

use super::common::{resolve_search_config, EnumerationArgs, QueryArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the tiles command.
#[derive(Debug, Clone, Args)]
pub struct TilesArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    #[command(flatten)]
    pub enumeration: EnumerationArgs,

    /// Also list the first N combinations
    #[arg(long, default_value = "0")]
    pub combinations: usize,

    /// List those combinations clearest first instead of in search order
    #[arg(long)]
    pub by_cloud: bool,
}

/// Run the tiles command.
pub fn run(args: TilesArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("tiles");

    let config = resolve_search_config(&runner, &args.query, &args.enumeration)?;
    let catalog = runner.open_catalog(&args.query.catalog)?;
    let records = catalog.query(&config.catalog_query())?;
    let group = group_records(&records);

    println!(
        "{} image(s) in {} tile(s) for '{}' ({} .. {}, clouds < {}%)",
        group.total_items(),
        group.len(),
        config.roi.name,
        config.start_date,
        config.end_date,
        config.cloud_threshold
    );
    println!();

    let enumerator = CombinationEnumerator::new(group, config.policy);
    for (rank, (tile_id, items)) in enumerator.tiles().iter().enumerate() {
        println!(
            "{:>3}. {}  score {:.1}  ({} image(s))",
            rank + 1,
            tile_id,
            tile_score(items),
            items.len()
        );
        for item in items {
            println!(
                "       {:>5.1}%  {}  {}",
                item.cloud_percentage,
                item.start_date(),
                item.image_id
            );
        }
    }

    println!();
    println!(
        "Order: {}, combinations: {}",
        config.policy.order,
        enumerator.total()
    );

    if args.combinations > 0 {
        let mut combinations: Vec<Combination> =
            enumerator.iter().take(args.combinations).collect();
        if args.by_cloud {
            combinations.sort_by(by_min_cloud);
        }
        println!();
        for combination in &combinations {
            println!(
                "  {:>5.1}%  {}",
                combination.min_cloud(),
                combination.image_ids().join(" + ")
            );
        }
    }

    Ok(())
}
