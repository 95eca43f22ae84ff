// Entry point and interactive CLI flow.
//
// - Option [1] loads the CSV named on the command line.
// - Option [2] changes the analysis year range.
// - Option [3] runs the decomposition, previews the tables and exports
//   CSV/JSON files next to the working directory.
//
// Usage: lmdi_report [data.csv] [config.json]
use lmdi_report::config::AnalysisConfig;
use lmdi_report::loader;
use lmdi_report::output;
use lmdi_report::types::RawRow;
use lmdi_report::util::{format_int, format_number};
use lmdi_report::{analyze, LmdiError};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_INPUT: &str = "manufacturing_data.csv";

// Rows are loaded once and reused across runs with different year ranges.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        input_path: DEFAULT_INPUT.to_string(),
        config: AnalysisConfig::default(),
        rows: None,
    })
});

struct AppState {
    input_path: String,
    config: AnalysisConfig,
    rows: Option<Vec<RawRow>>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,lmdi_report=info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

/// Returns `true` for `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load() {
    let path = match APP_STATE.lock() {
        Ok(state) => state.input_path.clone(),
        Err(_) => return,
    };
    match loader::load_rows(&path) {
        Ok((rows, load_report)) => {
            println!(
                "Loaded {} rows from {}.",
                format_int(load_report.total_rows as i64),
                path
            );
            if load_report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped due to parse errors.",
                    format_int(load_report.parse_errors as i64)
                );
            }
            println!();
            if let Ok(mut state) = APP_STATE.lock() {
                state.rows = Some(rows);
            }
        }
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

fn handle_set_range() {
    let start = prompt("Start year: ").parse::<i32>();
    let end = prompt("End year: ").parse::<i32>();
    let (Ok(start), Ok(end)) = (start, end) else {
        println!("Years must be whole numbers.\n");
        return;
    };
    let Ok(mut state) = APP_STATE.lock() else {
        return;
    };
    let candidate = state.config.clone().with_years(start, end);
    match candidate.validate() {
        Ok(()) => {
            state.config = candidate;
            println!("Year range set to {}-{}.\n", start, end);
        }
        Err(e) => println!("Error: {}\n", e),
    }
}

fn handle_run() -> Result<(), LmdiError> {
    let (rows, config) = {
        let state = APP_STATE.lock().map_err(|_| {
            LmdiError::InvalidConfig("application state is unavailable".to_string())
        })?;
        (state.rows.clone(), state.config.clone())
    };
    let Some(rows) = rows else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return Ok(());
    };

    let report = analyze(&rows, &config)?;

    println!("LMDI Decomposition Results (Yearly Periods + Overall)\n");
    output::preview_table_rows(&report.period_rows(), report.sequential.len() + 1);

    let overall = report.summary();
    let chained = report.sequential_total();
    println!("Overall {}: total change {} tCO2", overall.period_label, format_number(overall.total_change, 2));
    println!("Sum of yearly effects: {} tCO2\n", format_number(chained.sum(), 2));

    println!("Energy Mix ({} vs {})\n", report.start_year, report.end_year);
    output::preview_table_rows(&report.fuel_mix_rows(), report.fuel_mix.len());
    println!("CO2 Emissions by Fuel ({} vs {})\n", report.start_year, report.end_year);
    output::preview_table_rows(&report.emissions_rows(), report.emissions_by_fuel.len());

    if !report.missing_years.is_empty() {
        println!("Warning: no data for years {:?}\n", report.missing_years);
    }

    let files = output::export_report(".", &report, &config)?;
    for f in files {
        println!("Saved {}", f.display());
    }
    println!();
    Ok(())
}

fn main() {
    init_logging();

    let mut args = std::env::args().skip(1);
    let input = args.next();
    let config = match args.next() {
        Some(path) => match AnalysisConfig::from_json_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to read config {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => AnalysisConfig::default(),
    };
    if let Ok(mut state) = APP_STATE.lock() {
        if let Some(input) = input {
            state.input_path = input;
        }
        state.config = config;
    }

    loop {
        println!("LMDI Emissions Decomposition:");
        println!("[1] Load the file");
        println!("[2] Set year range");
        println!("[3] Run decomposition\n");
        match read_choice().as_str() {
            "1" => handle_load(),
            "2" => handle_set_range(),
            "3" => {
                println!();
                if let Err(e) = handle_run() {
                    eprintln!("Analysis failed: {}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
