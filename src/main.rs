use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use bump_release::ci::CiEnvironment;
use bump_release::config;
use bump_release::pipeline::{PipelineContext, ReleasePipeline};
use bump_release::tools::SystemRunner;
use bump_release::ui;
use bump_release::version::Component;
use bump_release::workspace;

#[derive(clap::Parser)]
#[command(
    name = "bump-release",
    version,
    about = "Bump the project version, regenerate the changelog and publish a release"
)]
struct Args {
    #[arg(value_enum, help = "Version component to bump")]
    component: Component,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Repository root (defaults to the enclosing git repository)")]
    root: Option<PathBuf>,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(short, long, help = "Skip the confirmation prompt")]
    yes: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let root = match args.root {
        Some(root) => root,
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            workspace::discover_root(&cwd).context("not inside a git working tree")?
        }
    };
    let config = config::load_config(args.config.as_deref(), &root)?;
    let env = CiEnvironment::from_process();
    let runner = SystemRunner;

    let pipeline = ReleasePipeline::new(&root, &config, &runner, env.clone()).dry_run(args.dry_run);

    if !args.yes && !args.dry_run && !env.is_ci() {
        let (current, next) = match pipeline.preview(args.component) {
            Ok(versions) => versions,
            Err(e) => {
                ui::display_error(&e.to_string());
                return Ok(ExitCode::from(e.exit_code()));
            }
        };
        let prompt = format!(
            "Release {} (currently {}) from {}?",
            next.tag(&config.release.tag_prefix),
            current,
            root.display()
        );
        if !ui::confirm_action(&prompt)? {
            println!("Release cancelled by user.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let mut ctx = PipelineContext::new(args.component);
    let result = pipeline.run(&mut ctx);
    ui::display_release_summary(&ctx.outcomes);

    match result {
        Ok(()) => {
            if let Some(next) = ctx.next {
                let tag = next.tag(&config.release.tag_prefix);
                if args.dry_run {
                    ui::display_success(&format!("Dry run finished for {}", tag));
                } else {
                    ui::display_success(&format!("Released {}", tag));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            ui::display_error(&e.to_string());
            let mutated = ctx.mutated_stages();
            if !mutated.is_empty() {
                let names: Vec<&str> = mutated.iter().map(|s| s.name()).collect();
                ui::display_warning(&format!(
                    "these stages already changed repository state and were not rolled back: {}",
                    names.join(", ")
                ));
            }
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}
