#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use eframe::{egui, App, NativeOptions};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use soundshift_gui::batch::{self, OutputFormat, RenderArgs, SoundsArgs, WordsArgs};
use soundshift_gui::config::{self, Config, DEFAULT_CONFIG_FILE};
use soundshift_gui::engine::reference::ReferenceEngine;
use soundshift_gui::orchestrator::{parse_word_count, RequestForm, ResultView};
use soundshift_gui::types::{DisplayCell, DisplayTable, RepartitionPolicy};

#[derive(Parser)]
#[command(
    name = "soundshift",
    about = "Generate words and follow them through sound transformations"
)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
    /// Without a command the window opens
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate words and apply sound transformations
    Words {
        /// Rule file
        rules: PathBuf,
        /// Number of words to generate
        #[arg(short, long, default_value = "10", value_parser = parse_word_count)]
        numbers: NonZeroUsize,
        /// Repartition of monosyllabic words
        #[arg(short, long, default_value = "less_frequent", value_parser = parse_repartition)]
        repartition: RepartitionPolicy,
        /// Do not apply sound transformations
        #[arg(long = "no-sound-transformations")]
        skip_transformation: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Apply sound transformations to words, one per line
    Sounds {
        /// Rule file
        rules: PathBuf,
        /// Word list, stdin when omitted
        input: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Rebuild the table of a JSON transcript
    Render {
        /// Rule file, used for IPA
        rules: PathBuf,
        /// Transcript written with `--format json`
        transcript: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// File where the table is written, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_repartition(value: &str) -> Result<RepartitionPolicy, String> {
    value.parse().map_err(|e: soundshift_gui::UserInputError| e.to_string())
}

fn setup_log(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

struct SoundShiftApp {
    engine: ReferenceEngine,
    config_error: Option<String>,
    rules_path: String,
    rules_source: String,
    rules_error: Option<String>,
    word_count: String,
    repartition: Option<RepartitionPolicy>,
    view: ResultView,
}

impl SoundShiftApp {
    fn new(_cc: &eframe::CreationContext<'_>, config: Config, config_error: Option<String>) -> Self {
        let mut app = Self {
            engine: ReferenceEngine::new(),
            config_error,
            rules_path: String::new(),
            rules_source: String::new(),
            rules_error: None,
            word_count: config.defaults.word_count.to_string(),
            repartition: config.default_policy(),
            view: ResultView::default(),
        };
        if let Some(path) = &config.defaults.rules_file {
            app.rules_path = path.display().to_string();
            app.load_rules_file();
        }
        app
    }

    fn load_rules_file(&mut self) {
        self.rules_error = None;
        match fs::read_to_string(self.rules_path.trim()) {
            Ok(contents) => {
                info!(path = %self.rules_path, "rules loaded");
                self.rules_source = contents;
            }
            Err(e) => self.rules_error = Some(format!("Failed to read {}: {}", self.rules_path, e)),
        }
    }

    fn generate(&mut self) {
        let form = RequestForm {
            rules_source: self.rules_source.clone(),
            word_count: self.word_count.clone(),
            repartition: self.repartition.map(|policy| policy.label().to_string()),
        };
        if let Err(e) = self.view.submit(&self.engine, &form) {
            error!(%e, "generation failed");
        }
    }
}

fn cell_text(cell: &DisplayCell) -> egui::RichText {
    let text = egui::RichText::new(cell.plain());
    match cell {
        DisplayCell::Word(_) | DisplayCell::Unchanged => text,
        DisplayCell::Changed(_) => text.strong().color(egui::Color32::RED),
        DisplayCell::Final(_) => text.strong(),
        DisplayCell::Ipa(_) => text.italics(),
    }
}

fn show_table(ui: &mut egui::Ui, table: &DisplayTable) {
    egui::Grid::new("history_table")
        .striped(true)
        .spacing([16.0, 4.0])
        .show(ui, |ui| {
            for heading in &table.headings {
                ui.label(egui::RichText::new(heading).strong());
            }
            ui.end_row();
            for row in &table.rows {
                for cell in row {
                    ui.label(cell_text(cell));
                }
                ui.end_row();
            }
        });
}

impl App for SoundShiftApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Clear Results").clicked() {
                        self.view.clear();
                    }
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        egui::SidePanel::left("side_panel_left").min_width(300.0).default_width(420.0).show(ctx, |ui| {
            ui.heading("Sound System");
            ui.separator();
            if let Some(err) = &self.config_error {
                ui.colored_label(egui::Color32::RED, format!("Config: {}", err));
                ui.separator();
            }

            ui.horizontal(|ui| {
                ui.label("Rule file:");
                ui.text_edit_singleline(&mut self.rules_path);
                if ui.button("Load").clicked() {
                    self.load_rules_file();
                }
            });
            if let Some(err) = &self.rules_error {
                ui.colored_label(egui::Color32::RED, err);
            }
            egui::ScrollArea::vertical().id_source("rules_scroll").max_height(380.0).show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut self.rules_source)
                        .font(egui::TextStyle::Monospace)
                        .desired_rows(18)
                        .desired_width(f32::INFINITY),
                );
            });
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Number of words:");
                ui.text_edit_singleline(&mut self.word_count);
            });
            ui.label("Monosyllables:");
            for policy in RepartitionPolicy::ALL {
                ui.radio_value(&mut self.repartition, Some(policy), policy.label());
            }
            ui.separator();

            if ui.button("Generate").clicked() {
                self.generate();
            }
            for line in self.view.error_lines() {
                ui.colored_label(egui::Color32::RED, line);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Transformation History");
            ui.separator();
            match self.view.table() {
                Some(table) => {
                    egui::ScrollArea::both()
                        .id_source("history_scroll")
                        .auto_shrink([false, false])
                        .show(ui, |ui| show_table(ui, table));
                }
                None if self.view.error().is_some() => {
                    ui.label("Generation failed (see side panel).");
                }
                None => {
                    ui.label("Write or load a rule file, then click 'Generate'.");
                }
            }
        });
    }
}

fn run_gui(config: Config, config_error: Option<String>) -> Result<(), eframe::Error> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "SoundShift",
        options,
        Box::new(move |cc| Box::new(SoundShiftApp::new(cc, config, config_error))),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_log(cli.verbose.tracing_level_filter());

    let (config, config_error) = match config::load_config_from_file(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => {
            error!("{}", e);
            (Config::default(), Some(e.to_string()))
        }
    };

    let engine = ReferenceEngine::new();
    let result = match cli.command {
        None => {
            return match run_gui(config, config_error) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            };
        }
        Some(_) if config_error.is_some() => {
            eprintln!("{}", config_error.unwrap_or_default());
            return ExitCode::FAILURE;
        }
        Some(Command::Words {
            rules,
            numbers,
            repartition,
            skip_transformation,
            output,
        }) => batch::run_words(
            &engine,
            &WordsArgs {
                rules,
                numbers,
                repartition,
                skip_transformation,
                format: output.format,
                output: output.output,
            },
        ),
        Some(Command::Sounds { rules, input, output }) => batch::run_sounds(
            &engine,
            &SoundsArgs {
                rules,
                input,
                format: output.format,
                output: output.output,
            },
        ),
        Some(Command::Render {
            rules,
            transcript,
            output,
        }) => batch::run_render(
            &engine,
            &RenderArgs {
                rules,
                transcript,
                format: output.format,
                output: output.output,
            },
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
