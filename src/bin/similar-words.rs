use anyhow::{Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use word_similarity::{
    Catalog, CatalogProvider, Config, ModelCache, Notice, SearchRequest, Severity, run_search,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find the words closest to a word in a pre-trained embedding model", long_about = None)]
struct Args {
    /// Model to search (see --list-models); defaults to the first catalog entry
    #[arg(short, long)]
    model: Option<String>,

    /// Number of similar words to ask the model for
    #[arg(short = 'n', long, value_parser = parse_count)]
    top_n: Option<usize>,

    /// Configuration file (default: .wordsimrc.toml, then the user config dir)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Search this word once and exit instead of starting the prompt
    #[arg(short, long)]
    word: Option<String>,

    /// Print the available models and exit
    #[arg(long)]
    list_models: bool,
}

fn parse_count(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// `None` on end of input.
fn get_input() -> io::Result<Option<String>> {
    let mut s = String::new();
    if io::stdin().read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

fn print_notice(notice: &Notice) {
    let prefix = match notice.severity() {
        Severity::Success => "",
        Severity::Warning => "warning: ",
        Severity::Error => "error: ",
    };
    let mut lines = notice.lines().into_iter();
    if let Some(first) = lines.next() {
        println!("{prefix}{first}");
    }
    for line in lines {
        println!("{line}");
    }
}

fn print_models(catalog: &Catalog, current: &str) {
    for id in catalog.ids() {
        let marker = if id == current { "*" } else { " " };
        println!("{marker} {id}");
    }
}

/// Shows a spinner while a model is loaded for the first time.
fn search(cache: &ModelCache<CatalogProvider>, request: &SearchRequest) -> Notice {
    let catalog = cache.provider().catalog();
    if request.word.is_empty() || cache.is_loaded(&request.model) {
        return run_search(cache, catalog, request);
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Loading model and finding similar words...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    let notice = run_search(cache, catalog, request);
    spinner.finish_and_clear();
    notice
}

fn interactive(cache: &ModelCache<CatalogProvider>, mut model: String, mut top_n: usize) -> Result<()> {
    println!("Similar Words - Type 'EXIT' to quit");
    println!("Commands: ':model <id>' switch model, ':models' list models, ':n <count>' set count\n");

    loop {
        print!("[{model}, n={top_n}] Enter a word: ");
        io::stdout().flush()?;
        let Some(s) = get_input()? else {
            println!();
            break;
        };
        if s == "EXIT" {
            println!("Goodbye!");
            break;
        }

        if let Some(rest) = s.strip_prefix(':') {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("models"), None) => print_models(cache.provider().catalog(), &model),
                (Some("model"), Some(id)) => {
                    if cache.provider().catalog().get(id).is_some() {
                        model = id.to_string();
                    } else {
                        println!("error: unknown model '{id}'");
                    }
                }
                (Some("n"), Some(count)) => match parse_count(count) {
                    Ok(n) => top_n = n,
                    Err(e) => println!("error: invalid count '{count}': {e}"),
                },
                _ => println!("error: unknown command '{s}'"),
            }
            continue;
        }

        let request = SearchRequest {
            model: model.clone(),
            word: s,
            top_n,
        };
        print_notice(&search(cache, &request));
        println!();
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WORDSIM_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let catalog = config.catalog()?;

    let model = match args.model {
        Some(id) => id,
        None => match config.default_model(&catalog) {
            Some(spec) => spec.id.clone(),
            None => bail!("no models configured"),
        },
    };

    if args.list_models {
        print_models(&catalog, &model);
        return Ok(());
    }

    if catalog.get(&model).is_none() {
        let known: Vec<&str> = catalog.ids().collect();
        bail!("unknown model '{model}' (available: {})", known.join(", "));
    }

    let top_n = args.top_n.unwrap_or_else(|| config.top_n());
    let cache = ModelCache::new(CatalogProvider::new(catalog, config.cache_dir()));

    match args.word {
        Some(word) => {
            let request = SearchRequest { model, word, top_n };
            print_notice(&search(&cache, &request));
            Ok(())
        }
        None => interactive(&cache, model, top_n),
    }
}
