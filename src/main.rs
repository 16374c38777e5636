use clap::{Parser, Subcommand, ValueEnum};
use mockup_studio::canvas::{Lighting, PreviewMode, PreviewSettings, ViewSide};
use mockup_studio::export::{ExportFormat, RustEncoder, export_project};
use mockup_studio::project::DesignEdit;
use mockup_studio::session::{SessionError, Studio};
use mockup_studio::types::AssetKind;
use mockup_studio::upload::collect_uploads;
use mockup_studio::{config, output};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "mockup-studio")]
#[command(about = "Compose designs onto product blanks and export HD mockups")]
#[command(long_about = "\
Compose designs onto product blanks and export HD mockups

A workspace is a directory holding the registry and the uploaded images:

  workspace/
  ├── config.toml          # Optional settings (see 'gen-config')
  ├── registry.json        # Every asset and project
  └── assets/
      ├── blanks/          # Product templates
      └── designs/         # Artwork placed on blanks

Typical session:

  mockup-studio import blank tee-white.png
  mockup-studio import design artwork/
  mockup-studio new <blank-id> --name \"Summer Tee\"
  mockup-studio add <project-id> <design-id>
  mockup-studio edit <project-id> <element-id> rotation 15
  mockup-studio export <project-id> --format png --studio

Exports render at four times the canvas size and are kept under 15 MB.")]
#[command(version)]
struct Cli {
    /// Workspace directory
    #[arg(long, short = 'w', default_value = ".", global = true)]
    workspace: PathBuf,

    /// Log debug detail to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Blank,
    Design,
}

impl From<Kind> for AssetKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Blank => AssetKind::Blank,
            Kind::Design => AssetKind::Design,
        }
    }
}

/// Preview flags shared by commands that render.
#[derive(clap::Args, Clone, Copy)]
struct PreviewArgs {
    /// Radial studio backdrop
    #[arg(long, conflicts_with = "angled")]
    studio: bool,

    /// Oblique product view
    #[arg(long)]
    angled: bool,

    /// Dim lighting
    #[arg(long)]
    dim: bool,

    /// Mirror to show the back
    #[arg(long)]
    back: bool,
}

impl From<PreviewArgs> for PreviewSettings {
    fn from(args: PreviewArgs) -> Self {
        let mode = if args.studio {
            PreviewMode::Studio
        } else if args.angled {
            PreviewMode::Angled
        } else {
            PreviewMode::Normal
        };
        PreviewSettings {
            mode,
            lighting: if args.dim { Lighting::Dim } else { Lighting::Bright },
            side: if args.back { ViewSide::Back } else { ViewSide::Front },
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Upload images (or directories of images) into the library
    Import {
        kind: Kind,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Start a project over a blank
    New {
        blank: String,
        #[arg(long, default_value = "Untitled Mockup")]
        name: String,
    },
    /// Place a design on a project
    Add { project: String, design: String },
    /// Set one property of a placed design (x, y, width, height, rotation, opacity)
    Edit {
        project: String,
        element: String,
        field: String,
        value: String,
    },
    /// Show a project's design stack
    Show { project: String },
    /// List the library and projects
    List,
    /// Render a project at export resolution and save it
    Export {
        project: String,
        /// png, jpg or webp (defaults to the configured format)
        #[arg(long)]
        format: Option<ExportFormat>,
        #[command(flatten)]
        preview: PreviewArgs,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Remove an image from the library, storage and every project
    RemoveImage { image: String },
    /// Delete a project
    RemoveProject { project: String },
    /// Look for dangling references and missing files
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.workspace)?;
    init_thread_pool(&config.processing);
    let mut studio = Studio::open(&cli.workspace, &config);

    let result = run(cli.command, &config, &mut studio);
    output::print_notices(&studio.take_notices());
    result
}

fn run(
    command: Command,
    config: &config::StudioConfig,
    studio: &mut Studio<mockup_studio::registry::FileRegistry>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Import { kind, paths } => {
            let files = collect_uploads(&paths);
            let results = studio.upload_batch(&files, kind.into());
            output::print_import(&files, &results);
        }
        Command::New { blank, name } => {
            let project = studio.create_project(&name, &blank)?;
            println!("{} \u{2192} project {}", project.name, project.id);
        }
        Command::Add { project, design } => {
            let element = studio.add_design_to_project(&project, &design)?;
            println!("Placed {} \u{2192} element {}", design, element);
        }
        Command::Edit {
            project,
            element,
            field,
            value,
        } => {
            let edit = DesignEdit::parse(&field, &value)?;
            let mut stored = studio
                .project(&project)
                .cloned()
                .ok_or_else(|| SessionError::UnknownProject(project.clone()))?;
            stored.apply_edit(&element, edit, config.editor.aspect_locked)?;
            output::print_project(&stored, studio.assets().images());
            studio.update_project(stored);
        }
        Command::Show { project } => {
            let stored = studio
                .project(&project)
                .ok_or_else(|| SessionError::UnknownProject(project.clone()))?;
            output::print_project(stored, studio.assets().images());
        }
        Command::List => {
            output::print_list(studio.assets().images(), studio.projects());
        }
        Command::Export {
            project,
            format,
            preview,
            out,
        } => {
            let stored = studio
                .project(&project)
                .cloned()
                .ok_or_else(|| SessionError::UnknownProject(project.clone()))?;
            studio.assets_mut().load_project(&stored);
            let artifact = export_project(
                &stored,
                studio.assets(),
                preview.into(),
                config.canvas_size(),
                format.unwrap_or(config.export.format),
                &RustEncoder,
            )?;
            let saved = artifact.save_to(&out)?;
            output::print_export(&artifact, &saved);
        }
        Command::RemoveImage { image } => {
            studio.delete_image(&image)?;
            println!("Removed image {}", image);
        }
        Command::RemoveProject { project } => {
            if !studio.delete_project(&project) {
                return Err(SessionError::UnknownProject(project).into());
            }
            println!("Removed project {}", project);
        }
        Command::Check => {
            let report = studio.check();
            output::print_check(&report);
            if !report.is_clean() {
                return Err(format!("{} problems found", report.problems.len()).into());
            }
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }
    Ok(())
}

/// Log to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
