use std::path::{Path, PathBuf};
use std::str::FromStr as _;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use thumbkit::{
    CanvasSize, Editor, EditorAction, FileStorage, FixedDate, FontBook, RenderSettings, Renderer,
    Scene, TemplateStore, TextEngine,
};

#[derive(Parser, Debug)]
#[command(name = "thumbkit", version, about = "Compose thumbnails from a scene description")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `THUMBKIT_LOG` sets the level otherwise.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter scene JSON.
    New(NewArgs),
    /// Render a scene to PNG.
    Render(RenderArgs),
    /// Replay editor actions against a scene.
    Edit(EditArgs),
    /// Manage saved templates.
    #[command(subcommand)]
    Template(TemplateCommand),
}

#[derive(Args, Debug)]
struct NewArgs {
    /// Output scene JSON.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Start with no layers instead of the starter text.
    #[arg(long)]
    empty: bool,
}

#[derive(Args, Debug, Clone)]
struct FontArgs {
    /// Extra directory of .ttf/.otf/.ttc fonts (repeatable). Also read from `THUMBKIT_FONT_DIR`.
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Output PNG path.
    #[arg(long, default_value = thumbkit::EXPORT_FILE_NAME)]
    out: PathBuf,

    /// Draw the selection outline around this layer index.
    #[arg(long)]
    select: Option<usize>,

    /// Date for the stamp as YYYY-MM-DD (defaults to today).
    #[arg(long)]
    date: Option<String>,

    #[command(flatten)]
    fonts: FontArgs,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// JSON array of editor actions. Relative image paths resolve against its directory.
    #[arg(long)]
    actions: PathBuf,

    /// Output scene JSON.
    #[arg(long)]
    out: PathBuf,

    /// Also export the edited scene as PNG.
    #[arg(long)]
    png: Option<PathBuf>,

    #[command(flatten)]
    fonts: FontArgs,
}

#[derive(Args, Debug, Clone)]
struct StoreArgs {
    /// Template store directory. Defaults to `THUMBKIT_STORE_DIR`, then the platform data dir.
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// Save a scene under a name.
    Save {
        #[arg(long)]
        name: String,
        #[arg(long)]
        scene: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List saved template names, oldest first.
    List {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Delete every template with this name.
    Delete {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Write the newest template with this name as scene JSON.
    Apply {
        #[arg(long)]
        name: String,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Render the newest template with this name to PNG.
    Export {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = thumbkit::EXPORT_FILE_NAME)]
        out: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        fonts: FontArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::New(args) => cmd_new(args),
        Command::Render(args) => cmd_render(args),
        Command::Edit(args) => cmd_edit(args),
        Command::Template(cmd) => cmd_template(cmd),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => std::env::var("THUMBKIT_LOG")
            .ok()
            .and_then(|s| tracing::Level::from_str(s.trim()).ok())
            .unwrap_or(tracing::Level::WARN),
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_scene(path: &Path) -> anyhow::Result<Scene> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("open scene '{}'", path.display()))?;
    Scene::from_json(&json).with_context(|| format!("parse scene '{}'", path.display()))
}

fn write_scene(path: &Path, scene: &Scene) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, scene.to_json_pretty()?)
        .with_context(|| format!("write scene '{}'", path.display()))?;
    Ok(())
}

fn font_book(args: &FontArgs) -> FontBook {
    let mut dirs = args.font_dirs.clone();
    if let Some(env) = std::env::var_os("THUMBKIT_FONT_DIR") {
        dirs.extend(std::env::split_paths(&env));
    }
    FontBook::with_dirs(&dirs)
}

fn make_renderer(fonts: FontBook, date: Option<&str>) -> anyhow::Result<Renderer> {
    let renderer = Renderer::new(RenderSettings::default(), TextEngine::new(fonts));
    Ok(match date {
        Some(s) => {
            let d = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("parse --date '{s}' (expected YYYY-MM-DD)"))?;
            renderer.with_date_source(FixedDate(d))
        }
        None => renderer,
    })
}

fn store(args: &StoreArgs) -> anyhow::Result<TemplateStore<FileStorage>> {
    let dir = match args
        .store_dir
        .clone()
        .or_else(|| std::env::var_os("THUMBKIT_STORE_DIR").map(PathBuf::from))
    {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    tracing::debug!(dir = %dir.display(), "template store");
    Ok(TemplateStore::new(FileStorage::new(dir)))
}

fn cmd_new(args: NewArgs) -> anyhow::Result<()> {
    let canvas = CanvasSize::new(args.width, args.height)?;
    let scene = if args.empty {
        Scene::empty(canvas)
    } else {
        let mut scene = Scene::default();
        scene.canvas = canvas;
        for layer in &mut scene.layers {
            layer.set_position(canvas.center());
        }
        scene
    };
    write_scene(&args.out, &scene)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.scene)?;
    let fonts = font_book(&args.fonts);
    let mut renderer = make_renderer(fonts.clone(), args.date.as_deref())?;

    let mut editor = Editor::with_fonts(scene, fonts);
    editor.wait_for_decodes();

    let frame = renderer.render(editor.scene(), editor.images(), args.select)?;
    frame.write_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_edit(args: EditArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.scene)?;
    let json = std::fs::read_to_string(&args.actions)
        .with_context(|| format!("open actions '{}'", args.actions.display()))?;
    let actions: Vec<EditorAction> =
        serde_json::from_str(&json).with_context(|| "parse actions JSON")?;
    let base_dir = args.actions.parent().unwrap_or_else(|| Path::new("."));

    let fonts = font_book(&args.fonts);
    let mut editor = Editor::with_fonts(scene, fonts.clone());
    thumbkit::replay(&mut editor, &actions, base_dir)?;
    editor.wait_for_decodes();

    write_scene(&args.out, editor.scene())?;
    eprintln!("wrote {}", args.out.display());

    if let Some(png) = &args.png {
        let mut renderer = make_renderer(fonts, None)?;
        editor.export_png(&mut renderer, png)?;
        eprintln!("wrote {}", png.display());
    }
    Ok(())
}

fn cmd_template(cmd: TemplateCommand) -> anyhow::Result<()> {
    match cmd {
        TemplateCommand::Save { name, scene, store: s } => {
            let scene = read_scene(&scene)?;
            if store(&s)?.save(&name, &scene)? {
                eprintln!("saved template '{name}'");
            } else {
                eprintln!("blank template name, nothing saved");
            }
        }
        TemplateCommand::List { store: s } => {
            for name in store(&s)?.names() {
                println!("{name}");
            }
        }
        TemplateCommand::Delete { name, store: s } => {
            let removed = store(&s)?.delete(&name)?;
            eprintln!("removed {removed} template(s) named '{name}'");
        }
        TemplateCommand::Apply {
            name,
            out,
            store: s,
        } => {
            let template = store(&s)?
                .find(&name)
                .with_context(|| format!("no template named '{name}'"))?;
            let mut editor = Editor::default();
            editor.apply_template(&template);
            write_scene(&out, editor.scene())?;
            eprintln!("wrote {}", out.display());
        }
        TemplateCommand::Export {
            name,
            out,
            store: s,
            fonts,
        } => {
            let template = store(&s)?
                .find(&name)
                .with_context(|| format!("no template named '{name}'"))?;
            let fonts = font_book(&fonts);
            let mut editor = Editor::with_fonts(template.scene, fonts.clone());
            editor.wait_for_decodes();
            let mut renderer = make_renderer(fonts, None)?;
            editor.export_png(&mut renderer, &out)?;
            eprintln!("wrote {}", out.display());
        }
    }
    Ok(())
}
