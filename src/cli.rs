//! Command-line front end.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::config::RenderOptions;
use crate::loader::{self, GridLoader};
use crate::models::ScreenStore;
use crate::render::{heatmap, ColorScale, DeckRenderer, HeatmapOptions};

pub const USAGE: &str = "\
Usage: geomet-screen <command> [flags]

Commands:
  render  --layout FILE (--panels FILE | --panel-dir DIR) --out FILE
  load    --grid FILE --screen NAME --deck NAME [--db FILE]
  show    --screen NAME --deck NAME [--db FILE]
  list    [--db FILE]
  heatmap --screen NAME --deck NAME --out FILE [--cell-size N] [--colorscale NAME] [--db FILE]
";

/// Where render takes its panels from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelSource {
    Catalogue(PathBuf),
    Directory(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Render {
        layout: PathBuf,
        panels: PanelSource,
        out: PathBuf,
    },
    Load {
        grid: PathBuf,
        screen: String,
        deck: String,
        db: Option<PathBuf>,
    },
    Show {
        screen: String,
        deck: String,
        db: Option<PathBuf>,
    },
    List {
        db: Option<PathBuf>,
    },
    Heatmap {
        screen: String,
        deck: String,
        out: PathBuf,
        cell_size: u32,
        colorscale: ColorScale,
        db: Option<PathBuf>,
    },
    Help,
}

/// Flag values collected before the command decides which it needs.
#[derive(Debug, Default)]
struct Flags {
    layout: Option<PathBuf>,
    panels: Option<PathBuf>,
    panel_dir: Option<PathBuf>,
    out: Option<PathBuf>,
    grid: Option<PathBuf>,
    screen: Option<String>,
    deck: Option<String>,
    db: Option<PathBuf>,
    cell_size: Option<u32>,
    colorscale: Option<ColorScale>,
}

/// Parses arguments (without the program name).
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    let mut flags = Flags::default();
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .with_context(|| format!("Missing value for {}", name))
        };
        match arg.as_str() {
            "--layout" => flags.layout = Some(PathBuf::from(value("--layout")?)),
            "--panels" => flags.panels = Some(PathBuf::from(value("--panels")?)),
            "--panel-dir" => flags.panel_dir = Some(PathBuf::from(value("--panel-dir")?)),
            "--out" => flags.out = Some(PathBuf::from(value("--out")?)),
            "--grid" => flags.grid = Some(PathBuf::from(value("--grid")?)),
            "--screen" => flags.screen = Some(value("--screen")?),
            "--deck" => flags.deck = Some(value("--deck")?),
            "--db" => flags.db = Some(PathBuf::from(value("--db")?)),
            "--cell-size" => {
                let size = value("--cell-size")?
                    .parse::<u32>()
                    .context("Failed to parse --cell-size as a positive integer")?;
                if size == 0 {
                    bail!("--cell-size must be greater than 0");
                }
                flags.cell_size = Some(size);
            }
            "--colorscale" => {
                let scale = value("--colorscale")?
                    .parse::<ColorScale>()
                    .map_err(anyhow::Error::msg)?;
                flags.colorscale = Some(scale);
            }
            "-h" | "--help" => return Ok(Command::Help),
            other => bail!("Unknown argument '{}'\n\n{}", other, USAGE),
        }
    }

    let cmd = match command.as_str() {
        "render" => {
            let panels = match (flags.panels, flags.panel_dir) {
                (Some(file), None) => PanelSource::Catalogue(file),
                (None, Some(dir)) => PanelSource::Directory(dir),
                (Some(_), Some(_)) => bail!("render takes --panels or --panel-dir, not both"),
                (None, None) => bail!("render requires --panels FILE or --panel-dir DIR"),
            };
            Command::Render {
                layout: flags.layout.context("render requires --layout FILE")?,
                panels,
                out: flags.out.context("render requires --out FILE")?,
            }
        }
        "load" => Command::Load {
            grid: flags.grid.context("load requires --grid FILE")?,
            screen: flags.screen.context("load requires --screen NAME")?,
            deck: flags.deck.context("load requires --deck NAME")?,
            db: flags.db,
        },
        "show" => Command::Show {
            screen: flags.screen.context("show requires --screen NAME")?,
            deck: flags.deck.context("show requires --deck NAME")?,
            db: flags.db,
        },
        "list" => Command::List { db: flags.db },
        "heatmap" => Command::Heatmap {
            screen: flags.screen.context("heatmap requires --screen NAME")?,
            deck: flags.deck.context("heatmap requires --deck NAME")?,
            out: flags.out.context("heatmap requires --out FILE")?,
            cell_size: flags.cell_size.unwrap_or(heatmap::DEFAULT_CELL_SIZE),
            colorscale: flags.colorscale.unwrap_or_default(),
            db: flags.db,
        },
        "help" | "-h" | "--help" => Command::Help,
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    };

    Ok(cmd)
}

fn open_store(db: Option<&PathBuf>) -> Result<ScreenStore> {
    match db {
        Some(path) => ScreenStore::open_or_recover(path),
        None => ScreenStore::open_default(),
    }
}

/// Executes a command, printing results to stdout.
pub fn run(cmd: Command) -> Result<()> {
    match cmd {
        Command::Help => print!("{}", USAGE),
        Command::Render {
            layout,
            panels,
            out,
        } => {
            let deck = loader::read_layout(&layout)?;
            let panels = match panels {
                PanelSource::Catalogue(file) => loader::read_catalogue(&file)?,
                PanelSource::Directory(dir) => loader::scan_panel_dir(&dir)?,
            };
            let written = DeckRenderer::new(RenderOptions::default())
                .compose(&deck, &panels, &out)
                .context("Failed to render deck mosaic")?;
            println!("{}", written.display());
        }
        Command::Load {
            grid,
            screen,
            deck,
            db,
        } => {
            let mut store = open_store(db.as_ref())?;
            let loaded = GridLoader::new(&mut store).load_deck_from_file(&grid, &screen, &deck)?;
            println!("Loaded {}", loaded);
        }
        Command::Show { screen, deck, db } => {
            let store = open_store(db.as_ref())?;
            let found = store
                .find_deck(&screen, &deck)?
                .with_context(|| format!("No deck '{}' on screen '{}'", deck, screen))?;
            for row in found.data() {
                let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                println!("{}", line.join("\t"));
            }
        }
        Command::List { db } => {
            let store = open_store(db.as_ref())?;
            for d in store.list_decks()? {
                println!(
                    "{}\t{}\t{}\t{}x{}",
                    d.id, d.screen_name, d.deck_name, d.rows, d.cols
                );
            }
        }
        Command::Heatmap {
            screen,
            deck,
            out,
            cell_size,
            colorscale,
            db,
        } => {
            let store = open_store(db.as_ref())?;
            let found = store
                .find_deck(&screen, &deck)?
                .with_context(|| format!("No deck '{}' on screen '{}'", deck, screen))?;
            let options = HeatmapOptions {
                cell_size,
                colorscale,
                ..HeatmapOptions::default()
            };
            let written = heatmap::save_heatmap(found.grid(), &out, &options)
                .context("Failed to write heatmap")?;
            println!("{}", written.display());
        }
    }
    Ok(())
}
