use card_expandable::config::{self, ControllerConfig};
use card_expandable::dom::parse_document;
use card_expandable::scenario::{Scenario, run_scenario};
use card_expandable::{Controller, InitOptions, output};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "card-expandable")]
#[command(about = "Drive expandable cards on an XHTML page without a browser")]
#[command(long_about = "\
Drive expandable cards on an XHTML page without a browser

Cards are found by their markup:

  <section data-accordion-group=\"\">           # optional accordion group
    <article class=\"card--expandable\" data-expandable=\"\" data-expanded=\"\">
      <button class=\"card__toggle\"
              data-label-open=\"Show less\" data-label-closed=\"Show more\">
        <span class=\"card__toggle-dyn\">Show more</span>
      </button>
      <div class=\"card__content\" data-height=\"120\">...</div>
    </article>
  </section>

`data-expanded` (or class `is-open`) marks a card initially open.
`data-height` is the panel's content height in pixels.
Motion tokens are read from the root element's style attribute:
  --motion-duration-collapse, --motion-duration-collapse-reduced

Run 'card-expandable gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Controller config file (stock defaults when absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scripted scenario against a page and report events and states
    Run {
        /// XHTML page
        #[arg(long)]
        page: PathBuf,
        /// TOML scenario
        #[arg(long)]
        scenario: PathBuf,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Initialize a page and list the cards it registers
    Check {
        /// XHTML page
        #[arg(long)]
        page: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            page,
            scenario,
            json,
        } => {
            let config = setup(cli.config.as_deref())?;
            let markup = std::fs::read_to_string(&page)?;
            let scenario = Scenario::load(&scenario)?;
            let report = run_scenario(&markup, &scenario, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_scenario_report(&report);
            }
            if !report.passed() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Check { page } => {
            let config = setup(cli.config.as_deref())?;
            let markup = std::fs::read_to_string(&page)?;
            let mut ctl = Controller::new(parse_document(&markup)?, &config);
            println!("==> Checking {}", page.display());
            let report = ctl.initialize(None, InitOptions::from(&config));
            output::print_init_report(&ctl, &report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the config, then start logging with its `[debug]` settings.
fn setup(path: Option<&Path>) -> Result<ControllerConfig, config::ConfigError> {
    let config = config::load_config(path)?;
    init_tracing(&config);
    Ok(config)
}

/// Log to stderr. `CARD_EXPANDABLE_LOG` overrides the `[debug]` settings.
fn init_tracing(config: &ControllerConfig) {
    let filter = EnvFilter::try_from_env("CARD_EXPANDABLE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.debug.filter_directives()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
