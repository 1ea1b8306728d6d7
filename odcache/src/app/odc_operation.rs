use super::{dump_ops, info_ops, ImportSource, OdcCliError};
use crate::config::OdcBuildConfiguration;
use crate::model::builder::OdcBuilder;
use crate::model::format::odc_metadata;
use crate::model::reader::OdCache;
use crate::model::zone::{SparseZoneBuilder, ZoneCache};
use clap::Subcommand;
use itertools::Itertools;
use std::path::Path;

#[derive(Debug, Clone, Subcommand)]
pub enum OdcOperation {
    /// generate a cache file from a build manifest (.toml or .json)
    Build {
        #[arg(long)]
        manifest: String,
        /// directory the manifest's file names are relative to
        #[arg(long, default_value_t = String::from("."))]
        data_directory: String,
        #[arg(long)]
        output: String,
        /// also write the manifest next to the output as <stem>.json
        #[arg(long, default_value_t = false)]
        write_manifest: bool,
    },
    /// generate a cache file from source files given on the command line. sources
    /// are written as path[:type_index[:time_index]]
    Import {
        /// exclusive upper bound on zone ids
        #[arg(long)]
        zone_capacity: usize,
        #[arg(long, default_value_t = 1)]
        types: usize,
        #[arg(long, default_value_t = 1)]
        times: usize,
        #[arg(long, default_value_t = 5)]
        gap: usize,
        #[arg(long)]
        output: String,
        /// csv rows whose values fill consecutive time periods
        #[arg(long)]
        csv_times: Vec<ImportSource>,
        /// csv rows whose values fill consecutive data types
        #[arg(long)]
        csv_types: Vec<ImportSource>,
        /// fixed-width matrix punch files
        #[arg(long)]
        emme2: Vec<ImportSource>,
        /// csv sources start with a header row
        #[arg(long, default_value_t = false)]
        header: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        year: Option<String>,
        #[arg(long, default_value_t = false)]
        write_manifest: bool,
    },
    /// rebuild a cache from the sources listed in its <stem>.json manifest
    Regenerate {
        file: String,
        #[arg(long)]
        data_directory: String,
        #[arg(long)]
        output_directory: String,
    },
    /// print the dimensions, index size and metadata of a cache file
    Info { file: String },
    /// look up a single value
    Get {
        file: String,
        origin: usize,
        destination: usize,
        #[arg(long, default_value_t = 0)]
        time: usize,
        #[arg(long = "type", default_value_t = 0)]
        data_type: usize,
    },
    /// write every stored record to stdout as csv
    Dump { file: String },
    /// generate a zone cache file from `zone,v0,v1,...` rows
    ZoneBuild {
        /// initial room for zone ids, grown as larger zones are read
        #[arg(long, default_value_t = 0)]
        zone_capacity: usize,
        #[arg(long, default_value_t = 1)]
        types: usize,
        #[arg(long)]
        input: String,
        #[arg(long)]
        output: String,
        #[arg(long, default_value_t = false)]
        header: bool,
    },
    /// look up the values of a zone, or describe the file when no zone is given
    ZoneGet { file: String, zone: Option<usize> },
}

impl OdcOperation {
    pub fn run(&self) -> Result<(), OdcCliError> {
        match self {
            OdcOperation::Build {
                manifest,
                data_directory,
                output,
                write_manifest,
            } => {
                log::info!("reading cache manifest from {manifest}");
                let conf = OdcBuildConfiguration::try_from(manifest)?;
                let builder = OdcBuilder::from_manifest(&conf, Path::new(data_directory))?;
                builder.save(Path::new(output), *write_manifest)?;
                eprintln!("finished.");
                Ok(())
            }
            OdcOperation::Import {
                zone_capacity,
                types,
                times,
                gap,
                output,
                csv_times,
                csv_types,
                emme2,
                header,
                description,
                year,
                write_manifest,
            } => {
                if csv_times.is_empty() && csv_types.is_empty() && emme2.is_empty() {
                    return Err(OdcCliError::ConfigurationError(String::from(
                        "at least one of --csv-times, --csv-types or --emme2 is required",
                    )));
                }
                let mut builder = OdcBuilder::new(*zone_capacity, *types, *times, *gap)?;
                if let Some(description) = description {
                    builder.set_metadata(odc_metadata::DESCRIPTION, description);
                }
                if let Some(year) = year {
                    builder.set_metadata(odc_metadata::YEAR, year);
                }
                for source in csv_times {
                    builder.load_csv_times(
                        &source.path,
                        *header,
                        source.time_index,
                        source.type_index,
                    )?;
                }
                for source in csv_types {
                    builder.load_csv_types(
                        &source.path,
                        *header,
                        source.time_index,
                        source.type_index,
                    )?;
                }
                for source in emme2 {
                    builder.load_emme2(&source.path, source.time_index, source.type_index)?;
                }
                builder.save(Path::new(output), *write_manifest)?;
                eprintln!("finished.");
                Ok(())
            }
            OdcOperation::Regenerate {
                file,
                data_directory,
                output_directory,
            } => {
                let cache = OdCache::open(Path::new(file))?;
                cache.regenerate(Path::new(data_directory), Path::new(output_directory))?;
                eprintln!("finished.");
                Ok(())
            }
            OdcOperation::Info { file } => {
                let cache = OdCache::open(Path::new(file))?;
                println!("{}", info_ops::describe(&cache));
                Ok(())
            }
            OdcOperation::Get {
                file,
                origin,
                destination,
                time,
                data_type,
            } => {
                let mut cache = OdCache::open(Path::new(file))?;
                let value = cache.get(*origin, *destination, *time, *data_type)?;
                println!("{value}");
                Ok(())
            }
            OdcOperation::Dump { file } => {
                let mut cache = OdCache::open(Path::new(file))?;
                let matrix = cache.store_all()?;
                cache.close();
                let rows = dump_ops::write_records(&matrix, std::io::stdout().lock())?;
                log::info!("wrote {rows} records from {file}");
                Ok(())
            }
            OdcOperation::ZoneBuild {
                zone_capacity,
                types,
                input,
                output,
                header,
            } => {
                let mut builder = SparseZoneBuilder::new(*zone_capacity, *types)?;
                builder.load_csv(Path::new(input), *header)?;
                builder.save(Path::new(output))?;
                eprintln!("finished.");
                Ok(())
            }
            OdcOperation::ZoneGet { file, zone } => {
                let mut cache = ZoneCache::open_raw(Path::new(file))?;
                match zone {
                    Some(zone) => {
                        let values = cache.get(*zone)?;
                        println!("{}", values.iter().join(","));
                    }
                    None => println!("{}", info_ops::describe_zones(&cache)),
                }
                Ok(())
            }
        }
    }
}
