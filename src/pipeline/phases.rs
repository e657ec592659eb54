//! Run phases as distinct types.
//!
//! Each phase consumes the previous one, so the registry is only mutable
//! while indexing and merging and is borrowed read-only while composing.

use std::fs;

use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::cancel::CancelToken;
use crate::diagnostics::{Arg, Event, EventKind, MessageKind, Reporter};
use crate::discovery::{load_sheet_json, register_filenames, scan_sheet, Project};
use crate::error::{Halt, TileError};
use crate::registry::{Category, SheetKind, SpriteRegistry};
use crate::resolve::Resolver;
use crate::types::Sheet;

use super::compose::{compose_sheet, ImageSettings};
use super::document::{ConfigDocument, SheetBlock, TileInfoBlock};
use super::ComposeFlags;

type PhaseResult<T> = std::result::Result<T, Halt>;

/// Configuration loaded, sheets created, nothing scanned yet.
#[derive(Debug)]
pub struct Initialized {
    pub project: Project,
    pub sheets: Vec<Sheet>,
}

/// Every sheet scanned, registered and assigned its index range.
#[derive(Debug)]
pub struct Indexed {
    pub project: Project,
    pub sheets: Vec<Sheet>,
    pub registry: SpriteRegistry,
}

/// Tile entries resolved and the configuration document written.
#[derive(Debug)]
pub struct Merged {
    pub project: Project,
    pub sheets: Vec<Sheet>,
    pub registry: SpriteRegistry,
    pub document: ConfigDocument,
}

impl Initialized {
    pub fn new(project: Project) -> Self {
        let sheets = project
            .info
            .sheets
            .iter()
            .map(|(name, spec)| {
                Sheet::new(
                    name,
                    spec,
                    &project.info.tile_info,
                    &project.source_dir,
                    &project.output_dir,
                )
            })
            .collect();
        Self { project, sheets }
    }

    /// Scan and register every sheet in configured order.
    pub fn index(
        self,
        flags: &ComposeFlags,
        reporter: &Reporter,
        cancel: &CancelToken,
    ) -> PhaseResult<Indexed> {
        let Initialized { project, mut sheets } = self;
        let mut registry = SpriteRegistry::new();
        let mut placeholder_taken = false;

        for sheet in &mut sheets {
            cancel.check()?;
            sheet.first_index = registry.next_index() + 1;

            reporter.status(
                Event::new(EventKind::Status, "Parsing JSON for: [{}] tilesheet {}.")
                    .arg(sheet.kind)
                    .arg(Arg::Sheet(sheet.name.clone())),
            );
            if !sheet.is_fallback() {
                let scan = scan_sheet(&sheet.source_dir, &sheet.exclude);
                for (path, reason) in scan.errors {
                    reporter.warning(
                        MessageKind::ScanFailed,
                        "Cannot read {} while scanning {}: {}.",
                        vec![Arg::Path(path), Arg::Sheet(sheet.name.clone()), Arg::Text(reason)],
                    );
                }
                sheet.json_files = scan.json_files;
                sheet.png_files = scan.png_files;
                load_sheet_json(sheet, cancel)?;
            }

            reporter.status(
                Event::new(EventKind::Status, "Processing sprite file names for: [{}] tilesheet {}.")
                    .arg(sheet.kind)
                    .arg(Arg::Sheet(sheet.name.clone())),
            );
            register_filenames(sheet, &mut registry, reporter, flags.obsolete_fillers, cancel)?;

            if !placeholder_taken && !sheet.is_fallback() && !sheet.sprites.is_empty() {
                sheet.has_placeholder = true;
                placeholder_taken = true;
            }

            let across = sheet.sprites_across as usize;
            let pad = (across - sheet.cell_count() % across) % across;
            registry.skip(pad as u32);
            sheet.max_index = registry.next_index();

            tracing::debug!(
                sheet = %sheet.name,
                first = sheet.first_index,
                max = sheet.max_index,
                sprites = sheet.sprites.len(),
                "indexed"
            );
        }

        Ok(Indexed {
            project,
            sheets,
            registry,
        })
    }
}

impl Indexed {
    /// Resolve all tile entries, auto-fill or report unreferenced sprites
    /// and write the configuration document.
    pub fn merge(
        self,
        flags: &ComposeFlags,
        reporter: &Reporter,
        cancel: &CancelToken,
    ) -> PhaseResult<Merged> {
        let Indexed {
            project,
            sheets,
            mut registry,
        } = self;
        let defaults = &project.info.tile_info;
        let config_file = project.config_file.as_str();

        let settle = Settle {
            flags,
            config_file,
            reporter,
            cancel,
        };
        let last_main = sheets.iter().rposition(|s| s.kind == SheetKind::Main);
        let mut blocks: Vec<(usize, SheetBlock)> = Vec::new();
        let mut fallback: Option<&Sheet> = None;
        let mut main_settled = false;

        for (position, sheet) in sheets.iter().enumerate() {
            cancel.check()?;

            if sheet.is_fallback() {
                fallback = Some(sheet);
                continue;
            }

            let mut block = SheetBlock::for_sheet(sheet, defaults);
            let mut resolver = Resolver::new(&mut registry, reporter, sheet.kind, config_file)
                .warn_filler_skips(flags.obsolete_fillers);
            for entry in &sheet.tile_entries {
                cancel.check()?;
                if let Some(converted) = resolver.convert(entry) {
                    block.tiles.push(converted);
                }
            }
            blocks.push((position, block));

            if Some(position) == last_main {
                settle.run(Category::Main, &mut registry, &sheets, &mut blocks)?;
                main_settled = true;
            }
        }

        if !main_settled {
            settle.run(Category::Main, &mut registry, &sheets, &mut blocks)?;
        }
        settle.run(Category::Filler, &mut registry, &sheets, &mut blocks)?;
        cancel.check()?;

        // Main blocks first, then fillers, each in configured order.
        let (main, filler): (Vec<_>, Vec<_>) = blocks
            .into_iter()
            .partition(|(position, _)| !sheets[*position].is_filler());
        let mut tiles_new: Vec<SheetBlock> = main
            .into_iter()
            .chain(filler)
            .map(|(_, block)| block)
            .collect();
        tiles_new.push(SheetBlock::fallback(fallback, defaults));

        let document = ConfigDocument {
            tile_info: vec![TileInfoBlock::from(defaults)],
            tiles_new,
        };

        fs::create_dir_all(&project.output_dir).map_err(|e| TileError::Io {
            path: project.output_dir.clone(),
            message: format!("Failed to create output directory: {}", e),
        })?;
        document.write(&project.config_path(), flags.format_json, reporter)?;

        Ok(Merged {
            project,
            sheets,
            registry,
            document,
        })
    }
}

/// Handling of sprites that no tile entry referenced.
struct Settle<'a> {
    flags: &'a ComposeFlags,
    config_file: &'a str,
    reporter: &'a Reporter,
    cancel: &'a CancelToken,
}

impl Settle<'_> {
    /// Auto-fill or report the unreferenced sprites of one category.
    fn run(
        &self,
        category: Category,
        registry: &mut SpriteRegistry,
        sheets: &[Sheet],
        blocks: &mut [(usize, SheetBlock)],
    ) -> PhaseResult<()> {
        let Settle {
            flags,
            config_file,
            reporter,
            cancel,
        } = *self;
        let unreferenced: Vec<(u32, String)> = registry
            .unreferenced(category)
            .map(|(index, name)| (index, name.to_string()))
            .collect();

        for (index, name) in unreferenced {
            cancel.check()?;
            let file = format!("{}.png", name);
            let has_entry = registry.processed_ids().contains(&name);

            if !flags.use_all {
                if has_entry {
                    reporter.error(
                        MessageKind::NotUsed,
                        "{} was not used, but ID {} is mentioned in a tile entry.",
                        vec![Arg::Sprite(file), Arg::Id(name)],
                    );
                } else {
                    reporter.warning(
                        MessageKind::SpriteUnreferenced,
                        "Sprite filename {} was not used in any {} {} entries.",
                        vec![
                            Arg::Sprite(file),
                            Arg::Text(category.name().to_string()),
                            Arg::Text(config_file.to_string()),
                        ],
                    );
                }
                continue;
            }

            if has_entry {
                match category {
                    Category::Main => reporter.warning(
                        MessageKind::NotMentioned,
                        "Sprite {} was not mentioned in any tile entry but there is a tile entry for the ID {}.",
                        vec![Arg::Sprite(file), Arg::Id(name)],
                    ),
                    Category::Filler if flags.obsolete_fillers => reporter.warning(
                        MessageKind::FillerUnused,
                        "There is a tile entry for {} in a non-filler sheet",
                        vec![Arg::Id(name)],
                    ),
                    Category::Filler => {}
                }
                continue;
            }

            let owner = blocks
                .iter_mut()
                .find(|(position, _)| sheets[*position].owns(index));
            if let Some((_, block)) = owner {
                let mut entry = Map::new();
                entry.insert("id".to_string(), Value::String(name.clone()));
                entry.insert("fg".to_string(), Value::from(index));
                block.tiles.push(entry);
                registry.processed_ids_mut().insert(&name);
            }
        }

        Ok(())
    }
}

impl Merged {
    /// Sprite counts per sheet selected for composing.
    pub fn sprite_counts(&self, subset: &[String]) -> Vec<(String, usize)> {
        self.sheets
            .iter()
            .filter(|s| is_selected(s, subset))
            .map(|s| (s.name.clone(), s.sprites.len()))
            .collect()
    }

    /// Compose the selected sheets on a bounded worker pool.
    pub fn compose(
        &self,
        subset: &[String],
        jobs: usize,
        settings: ImageSettings,
        reporter: &Reporter,
        cancel: &CancelToken,
    ) -> PhaseResult<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .map_err(|e| TileError::Setup {
                message: format!("Cannot start composing workers: {}", e),
                help: None,
            })?;

        pool.install(|| {
            self.sheets.par_iter().try_for_each(|sheet| {
                if is_selected(sheet, subset) {
                    compose_sheet(sheet, settings, reporter, cancel).map(|_| ())
                } else {
                    cancel.check()?;
                    reporter.status(
                        Event::new(EventKind::Status, "Skipping composing for: [{}] tilesheet {}.")
                            .arg(sheet.kind)
                            .arg(Arg::Sheet(sheet.name.clone())),
                    );
                    Ok(())
                }
            })
        })
    }
}

fn is_selected(sheet: &Sheet, subset: &[String]) -> bool {
    subset.is_empty() || subset.iter().any(|name| *name == sheet.name)
}
