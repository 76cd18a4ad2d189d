use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::PathBuf;

use shoreline_change::catalog::{parse_catalog, LayerQuery};
use shoreline_change::{
    process_analysis, process_file, AnalysisOptions, AnalysisRequest, ErrorResponse,
    InlandDirection, UnequalCurves,
};

fn cli() -> Command {
    Command::new("Shoreline Change")
        .version("1.0")
        .author("Jesper Fjellin")
        .about("Ingests coastal survey data and measures shoreline change between years")
        .subcommand_required(true)
        .subcommand(
            Command::new("ingest")
                .about("Normalize a CSV, GeoJSON or zipped shapefile into a feature collection")
                .arg(Arg::new("file").required(true).help("Input file"))
                .arg(
                    Arg::new("mime")
                        .long("mime")
                        .default_value("")
                        .help("Declared MIME type of the input"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Write the result here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("analyze")
                .about("Compare a baseline shoreline with the last comparison year")
                .arg(Arg::new("site").short('s').long("site").required(true))
                .arg(
                    Arg::new("baseline")
                        .short('b')
                        .long("baseline")
                        .required(true)
                        .value_parser(clap::value_parser!(i32)),
                )
                .arg(
                    Arg::new("compare")
                        .short('c')
                        .long("compare")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(i32))
                        .help("Comparison years; the last one is analyzed"),
                )
                .arg(
                    Arg::new("curves")
                        .long("curves")
                        .required(true)
                        .help("Directory holding Site<site>_<year>_Shoreline.geojson files"),
                )
                .arg(
                    Arg::new("inland")
                        .long("inland")
                        .default_value("south")
                        .value_parser(InlandDirection::NAMES)
                        .help("Side on which each curve is closed into a polygon"),
                )
                .arg(
                    Arg::new("closure-offset")
                        .long("closure-offset")
                        .value_parser(clap::value_parser!(f64))
                        .help("Closure distance in degrees (default 0.01)"),
                )
                .arg(
                    Arg::new("full-scale")
                        .long("full-scale")
                        .value_parser(clap::value_parser!(f64))
                        .help("Shift in meters mapped to full heatmap intensity (default 50)"),
                )
                .arg(
                    Arg::new("unequal")
                        .long("unequal")
                        .default_value("nearest")
                        .value_parser(UnequalCurves::NAMES)
                        .help("Pairing of vertices when curves differ in length"),
                ),
        )
        .subcommand(
            Command::new("catalog")
                .about("Filter a layer catalog")
                .arg(Arg::new("file").required(true))
                .arg(Arg::new("site").long("site"))
                .arg(
                    Arg::new("year")
                        .long("year")
                        .value_parser(clap::value_parser!(i32)),
                )
                .arg(Arg::new("parameter").long("parameter"))
                .arg(Arg::new("query").short('q').long("query"))
                .arg(Arg::new("pretty").long("pretty").action(ArgAction::SetTrue)),
        )
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn fail(response: ErrorResponse) -> ! {
    eprintln!("{}", to_json(&response));
    std::process::exit(1);
}

fn run_ingest(matches: &ArgMatches) {
    let file = PathBuf::from(matches.get_one::<String>("file").expect("required"));
    let mime = matches.get_one::<String>("mime").expect("defaulted");

    let (output, warning) = match process_file(&file, mime) {
        Ok(result) => result,
        Err(e) => fail(ErrorResponse::from(&e)),
    };
    if let Some(warning) = warning {
        eprintln!("Warning: {}", warning);
    }

    let json = to_json(&output);
    match matches.get_one::<String>("output") {
        Some(path) => {
            if let Err(e) = std::fs::write(path, json) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            log::info!("Wrote {}", path);
        }
        None => println!("{}", json),
    }
}

fn run_analyze(matches: &ArgMatches) {
    let request = AnalysisRequest {
        site: matches.get_one::<String>("site").cloned(),
        baseline_year: matches.get_one::<i32>("baseline").copied(),
        comparison_years: matches
            .get_many::<i32>("compare")
            .map(|years| years.copied().collect()),
    };

    let mut options = AnalysisOptions::default();
    if let Some(inland) = matches.get_one::<String>("inland") {
        options.inland = inland.parse().expect("validated by clap");
    }
    if let Some(offset) = matches.get_one::<f64>("closure-offset") {
        options.closure_offset_deg = *offset;
    }
    if let Some(scale) = matches.get_one::<f64>("full-scale") {
        options.intensity_full_scale_m = *scale;
    }
    if let Some(mode) = matches.get_one::<String>("unequal") {
        options.unequal_curves = mode.parse().expect("validated by clap");
    }

    let curves = PathBuf::from(matches.get_one::<String>("curves").expect("required"));
    match process_analysis(&curves, &request, &options) {
        Ok(report) => println!("{}", to_json(&report)),
        Err(e) => fail(ErrorResponse::from(&e)),
    }
}

fn run_catalog(matches: &ArgMatches) {
    let file = matches.get_one::<String>("file").expect("required");
    let layers = match std::fs::read_to_string(file)
        .map_err(|e| e.to_string())
        .and_then(|json| parse_catalog(&json).map_err(|e| e.to_string()))
    {
        Ok(layers) => layers,
        Err(e) => {
            eprintln!("Error reading catalog {}: {}", file, e);
            std::process::exit(1);
        }
    };

    let query = LayerQuery {
        site: matches.get_one::<String>("site").cloned(),
        year: matches.get_one::<i32>("year").copied(),
        parameter: matches.get_one::<String>("parameter").cloned(),
        text: matches.get_one::<String>("query").cloned(),
    };
    let found = query.apply(&layers);
    log::info!("{} of {} layers match", found.len(), layers.len());

    if matches.get_flag("pretty") {
        println!("{}", to_json(&found));
    } else {
        println!("{}", serde_json::to_string(&found).unwrap_or_default());
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("ingest", sub)) => run_ingest(sub),
        Some(("analyze", sub)) => run_analyze(sub),
        Some(("catalog", sub)) => run_catalog(sub),
        _ => unreachable!("subcommand is required"),
    }
}
