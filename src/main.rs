use clap::Parser;
use quire::build::{BuildOptions, build};
use quire::imaging::RustBackend;
use quire::{config, output, plugins, serve};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Plugin-driven static site generator for markdown content")]
#[command(long_about = "\
Plugin-driven static site generator for markdown content

Markdown files with YAML front matter become articles. Each article is
typed by its path, enriched by a fixed derivation pipeline and plugins,
indexed into collections and taxonomies, then rendered through a
handlebars layout.

Site structure:

  site/
  ├── config.toml                  # Site config (optional, stock defaults otherwise)
  ├── content/
  │   ├── about.md                 # Page → /about/
  │   ├── posts/
  │   │   └── 2024-01-05-hello.md  # Post → /2024/01/hello/
  │   ├── img/hero-1600.jpg        # Resizeable image (width suffix) → variants
  │   ├── refs/widget.yaml         # Reference file, listed under `references`
  │   └── robots.txt               # Anything else is copied as-is
  └── layouts/
      ├── post.hbs                 # Layout per type, or named in front matter
      └── partials/head.hbs

Run 'quire --gen-config' to print a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root containing config.toml, content/ and layouts/
    #[arg(long, short, default_value = ".")]
    input: PathBuf,

    /// Development build: local base URL, unpublished articles kept
    #[arg(long)]
    dev: bool,

    /// Serve the output directory after building (implies --dev)
    #[arg(long)]
    serve: bool,

    /// Delete the image cache before building
    #[arg(long, alias = "clearCache")]
    clear_cache: bool,

    /// Trust existing image outputs without hashing them
    #[arg(long, alias = "noImageCacheCheck")]
    no_image_cache_check: bool,

    /// Debug logging and every failure in the report
    #[arg(long, short)]
    verbose: bool,

    /// Print a stock config.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "quire=debug" } else { "quire=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let dev = cli.dev || cli.serve;
    let options = BuildOptions {
        root: cli.input.clone(),
        dev,
        clear_cache: cli.clear_cache,
        trust_image_cache: cli.no_image_cache_check,
    };
    let report = build(&options, &RustBackend::new(), &plugins::builtin())?;
    output::print_build_report(&report, cli.verbose);
    let clean = !report.has_failures();
    let report = report.into_result()?;

    if cli.serve {
        let site_config = config::load_config(&cli.input)?;
        serve::serve(&report.output_dir, &site_config.dev.host, site_config.dev.port)?;
    }
    Ok(clean)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(clean) => {
            if !clean {
                tracing::warn!("build finished with failures");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "build failed");
            ExitCode::FAILURE
        }
    }
}
