use clap::Parser;
use mdsite::build::{self, BuildError, BuildOptions};
use mdsite::output::{self, Output};
use mdsite::scan::Site;
use mdsite::serve;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdsite")]
#[command(version, about = "Static site generator for Markdown and Sass")]
#[command(long_about = "\
Static site generator for Markdown and Sass

Every file under PATH is mirrored into PATH/out:

  PATH/
  ├── mdsite.toml          # Optional config (never copied)
  ├── index.md             # → out/index.html
  ├── style.scss           # → out/style.css
  ├── css/_vars.scss       # Partial: importable, not emitted
  ├── img/logo.png         # → out/img/logo.png
  └── out/                 # Output, never read as input

A document may start with an options block:

  %%
  title = My Page
  style = style.scss
  math = yes
  code = yes
  highlight = github
  %%
  # My Page

With --serve the output is served over HTTP and every saved source file is
rebuilt on its own.")]
struct Cli {
    /// Source directory
    path: PathBuf,

    /// Serve the output directory and rebuild files as they change
    #[arg(short, long)]
    serve: bool,

    /// Port for --serve (default: server.port from mdsite.toml, else 3000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Record failing files and keep building instead of stopping at the first
    #[arg(short = 'k', long)]
    keep_going: bool,

    /// Log every build step
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let out = Output::new();

    init_tracing(cli.verbose);

    match run(cli, &out) {
        Ok(code) => code,
        Err(err) => {
            out.error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise info, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "mdsite=debug" } else { "mdsite=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, out: &Output) -> Result<ExitCode, Box<dyn std::error::Error>> {
    out.lines(&output::format_banner(
        env!("CARGO_PKG_VERSION"),
        &cli.path,
    ));

    let mut site = match Site::open(&cli.path) {
        Ok(site) => site,
        Err(err) => {
            out.line(&output::format_build_error(&BuildError::from(err)));
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Some(port) = cli.port {
        site.config_mut().server.port = port;
    }
    let options = BuildOptions {
        keep_going: cli.keep_going || site.config().build.keep_going,
    };

    let summary = match build::build_site(&site, options) {
        Ok(summary) => summary,
        Err(err) => {
            out.line(&output::format_build_error(&err));
            return Ok(ExitCode::FAILURE);
        }
    };
    out.lines(&output::format_build_summary(&summary));
    if !summary.is_success() {
        return Ok(ExitCode::FAILURE);
    }

    if cli.serve {
        let server = &site.config().server;
        out.lines(&output::format_server_started(&server.host, server.port));
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(serve::run(Arc::new(site)))?;
    }

    Ok(ExitCode::SUCCESS)
}
