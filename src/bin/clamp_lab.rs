//! Live clamp bench - terminal front end
//!
//! Connects the simulation core to a terminal renderer and keyboard input.
//! Controls:
//!   Left/Right: Move placement cursor
//!   c: Place a clamp at the cursor
//!   t: Tap the toggle control (toggle all clamps)
//!   d: Long-hold the toggle control (destroy all clamps)
//!   +/-: Adjust clamp power
//!   h: Toggle highlight
//!   Space: Pause/resume simulation
//!   q / Escape: Quit

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Sparkline};
use ratatui::Terminal;

use clamp_lab::core::error::Result;
use clamp_lab::core::types::{FieldState, VertexIndex};
use clamp_lab::core::SimConfig;
use clamp_lab::geometry::{CellGeometry, DataLoader, JsonCellLoader, SyntheticCell};
use clamp_lab::interaction::{InputSample, InputSampler, RaycastHit};
use clamp_lab::simulation::{LifecycleState, Simulation};
use clamp_lab::solver::CableSolver;
use clamp_lab::ui::{LabUi, LogCategory};
use clamp_lab::viz::{NullSink, VisualizationSink};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Parser, Debug)]
#[command(name = "clamp_lab", about = "Interactive neuron simulation bench")]
struct Args {
    /// Path to a JSON cell file; a synthetic cell is generated if omitted
    #[arg(long)]
    cell: Option<PathBuf>,

    /// Vertex count for the synthetic cell
    #[arg(long, default_value_t = 64)]
    vertices: usize,

    /// Seed for the synthetic cell
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run solver only, without visualization or interaction
    #[arg(long)]
    dry_run: bool,

    /// Solver ticks to run under --dry-run before exiting
    #[arg(long, default_value_t = 5000)]
    ticks: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load_from_file(path).map_err(clamp_lab::core::SimError::Config)?,
        None => SimConfig::default(),
    };
    config.dry_run = config.dry_run || args.dry_run;
    if config.step_interval_us.is_none() && !config.dry_run {
        // The terminal only redraws at frame rate; don't burn a core
        config.step_interval_us = Some(1_000);
    }

    let loader: Box<dyn DataLoader> = match &args.cell {
        Some(path) => Box::new(JsonCellLoader::new(path.clone())),
        None => Box::new(SyntheticCell::new(args.vertices, args.seed)),
    };

    if config.dry_run {
        return run_headless(config, loader, args.ticks);
    }
    run_tui(config, loader)
}

/// Solver-only run: no visualization, no interaction
fn run_headless(config: SimConfig, loader: Box<dyn DataLoader>, ticks: u64) -> Result<()> {
    let mut sim = Simulation::new(
        config,
        loader,
        Box::new(NullSink),
        Box::new(|geometry| Box::new(CableSolver::new(geometry))),
    )?;
    sim.initialize()?;
    if !sim.config().start_on_awake {
        sim.start_simulation()?;
    }

    let buffer = sim.buffer();
    while buffer.sequence() < ticks {
        if sim.poll_fault().is_some() {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    sim.stop();

    let published = buffer.sequence();
    match buffer.latest() {
        Some(state) => {
            let (min, max) = state.range();
            println!(
                "dry run complete: {} snapshots, field [{:.2}, {:.2}] mV, mean {:.2} mV",
                published,
                min,
                max,
                state.mean()
            );
        }
        None => println!("dry run complete: nothing published"),
    }
    if let Some(fault) = sim.last_fault() {
        println!("solver fault: {}", fault);
    }
    Ok(())
}

/// Snapshot data shared between the visualization sink and the renderer
#[derive(Debug, Default)]
struct VizModel {
    tick: u64,
    values: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
struct TerminalSink {
    model: Arc<Mutex<VizModel>>,
}

impl TerminalSink {
    fn snapshot(&self) -> (u64, Vec<f64>) {
        let model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        (model.tick, model.values.clone())
    }
}

impl VisualizationSink for TerminalSink {
    fn build(&mut self, _geometry: &CellGeometry, initial: &FieldState) {
        self.update(initial);
    }

    fn update(&mut self, state: &FieldState) {
        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        model.tick = state.tick;
        model.values.clone_from(&state.values);
    }
}

/// Keyboard state folded into per-frame input samples
///
/// Terminals deliver key taps, not hold state, so hold gestures are
/// synthesized: 't' produces a one-tick hold, 'd' a threshold-length hold.
#[derive(Debug, Default)]
struct KeySampler {
    pending_hold: u32,
    power_delta: f64,
    highlight: bool,
}

impl InputSampler for KeySampler {
    fn sample(&mut self) -> InputSample {
        let toggle_pressed = self.pending_hold > 0;
        if toggle_pressed {
            self.pending_hold -= 1;
        }
        InputSample {
            toggle_pressed,
            highlight_pressed: self.highlight,
            power_delta: std::mem::take(&mut self.power_delta),
        }
    }
}

fn run_tui(config: SimConfig, loader: Box<dyn DataLoader>) -> Result<()> {
    let destroy_threshold = config.destroy_threshold;
    let sink = TerminalSink::default();
    let mut sim = Simulation::new(
        config,
        loader,
        Box::new(sink.clone()),
        Box::new(|geometry| Box::new(CableSolver::new(geometry))),
    )?;
    sim.initialize()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut sim, &sink, destroy_threshold);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    sim: &mut Simulation,
    sink: &TerminalSink,
    destroy_threshold: u32,
) -> Result<()> {
    let mut ui = LabUi::new();
    let mut sampler = KeySampler::default();
    let mut fault_logged = false;
    let vertex_count = sim
        .geometry()
        .map(|g| g.vertex_count())
        .unwrap_or_default();
    let sim_id = sim.id();

    loop {
        let frame_start = Instant::now();

        // Drain pending key events
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    sim.on_application_quit();
                    return Ok(());
                }
                KeyCode::Char(' ') => match sim.state() {
                    LifecycleState::Running => {
                        sim.pause()?;
                        ui.log(sink.snapshot().0, "paused".into(), LogCategory::Lifecycle);
                    }
                    LifecycleState::Paused => {
                        sim.resume()?;
                        ui.log(sink.snapshot().0, "resumed".into(), LogCategory::Lifecycle);
                    }
                    _ => {}
                },
                KeyCode::Left => ui.move_cursor(-1, vertex_count),
                KeyCode::Right => ui.move_cursor(1, vertex_count),
                KeyCode::Char('c') => {
                    let hit = RaycastHit {
                        sim: sim_id,
                        vertex: VertexIndex::attached(ui.cursor_vertex),
                    };
                    if let Some(controller) = sim.controller_mut() {
                        if let Some(id) = controller.instantiate_probe(hit) {
                            controller.hit_released();
                            ui.select(id);
                            ui.log(
                                sink.snapshot().0,
                                format!("clamp placed at vertex {}", ui.cursor_vertex),
                                LogCategory::Interaction,
                            );
                        } else {
                            controller.hit_released();
                        }
                    }
                }
                KeyCode::Char('t') => sampler.pending_hold = 1,
                KeyCode::Char('d') => sampler.pending_hold = destroy_threshold,
                KeyCode::Char('+') | KeyCode::Char('=') => sampler.power_delta += 1.0,
                KeyCode::Char('-') => sampler.power_delta -= 1.0,
                KeyCode::Char('h') => sampler.highlight = !sampler.highlight,
                _ => {}
            }
        }

        let events = sim.frame_tick(sampler.sample());
        let (tick, values) = sink.snapshot();
        ui.record_events(tick, &events);
        if let Some(fault) = sim.last_fault() {
            if !fault_logged {
                ui.log(tick, format!("solver fault: {}", fault), LogCategory::Solver);
                fault_logged = true;
            }
        }

        draw(terminal, sim, &ui, tick, &values)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_INTERVAL {
            std::thread::sleep(FRAME_INTERVAL - elapsed);
        }
    }
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    sim: &Simulation,
    ui: &LabUi,
    tick: u64,
    values: &[f64],
) -> io::Result<()> {
    let config = sim.config();
    let span = (config.power_max - config.power_min).max(f64::EPSILON);
    let normalized: Vec<u64> = values
        .iter()
        .map(|&v| {
            let scaled = (v - config.power_min) / span * 100.0;
            scaled.clamp(0.0, 100.0) as u64
        })
        .collect();

    let probes = sim.probes();
    let probe_lines: Vec<ListItem> = probes
        .lock()
        .iter()
        .map(|probe| {
            let vertex = probe.vertex().index().unwrap_or_default();
            let state = if probe.is_active() { "on " } else { "off" };
            let power = if probe.holds_at_reference() {
                "hold".to_string()
            } else {
                format!("{:+.1} mV", probe.power())
            };
            let style = if probe.is_highlighted() {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::styled(
                format!("v{:<4} [{}] {}", vertex, state, power),
                style,
            ))
        })
        .collect();

    let log_lines: Vec<ListItem> = ui
        .event_log
        .iter()
        .rev()
        .take(8)
        .map(|entry| ListItem::new(format!("[{}] {}", entry.tick, entry.message)))
        .collect();

    let status = format!(
        " {:?} | tick {} | cursor v{} | {} clamp(s) ",
        sim.state(),
        tick,
        ui.cursor_vertex,
        probes.lock().len(),
    );

    terminal.draw(|frame| {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(10),
            ])
            .split(frame.size());

        frame.render_widget(Paragraph::new(status), rows[0]);

        frame.render_widget(
            Sparkline::default()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("membrane potential"),
                )
                .data(&normalized)
                .max(100),
            rows[1],
        );

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[2]);

        frame.render_widget(
            List::new(probe_lines)
                .block(Block::default().borders(Borders::ALL).title("clamps")),
            panels[0],
        );
        frame.render_widget(
            List::new(log_lines)
                .block(Block::default().borders(Borders::ALL).title("events")),
            panels[1],
        );
    })?;

    Ok(())
}
