use anyhow::{anyhow, Result};
use arkdata_sqlite::{
    cli::{Cli, Commands},
    config::resolve_db_path,
    filter::resolve_tables,
    logging::init_logging,
    schema::ALL_TABLES,
    writer::{generate_schema_script, initialize_database, ScriptOptions},
};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let _logger = init_logging(&cli.log_level).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Init {
            output_db,
            force,
            no_seed,
        } => {
            let output_db = resolve_db_path(output_db)?;
            let summary = initialize_database(&output_db, ALL_TABLES, !no_seed, force)?;

            println!(
                "Created {:?} ({} tables, {} tags) in {:.2}s",
                summary.path, summary.tables, summary.seeded_tags, summary.elapsed_secs
            );
        }

        Commands::Ddl {
            include,
            exclude,
            no_drop,
            no_seed,
        } => {
            let tables = resolve_tables(include, exclude)?;
            let options = ScriptOptions {
                drop_existing: !no_drop,
                with_seed: !no_seed,
            };
            print!("{}", generate_schema_script(&tables, options));
        }

        Commands::ListTables { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(ALL_TABLES)?);
            } else {
                println!("Available tables:\n");
                for table in ALL_TABLES {
                    println!("  {:<26} {}", table.name, table.comment);
                }
            }
        }
    }

    Ok(())
}
