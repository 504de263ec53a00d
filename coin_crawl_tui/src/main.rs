use anyhow::{Context, Result};
use clap::Parser;
use coin_crawl_core::{
    Command, Direction, Position,
    arena::{Arena, ArenaConfig, ContactPolicy, GameState, Snapshot, TerminationCause, WallLayout},
};
use ratatui::{
    crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::io::{self, Stdout};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Arena width in cells
    #[arg(long, default_value_t = 40)]
    width: i32,
    /// Arena height in cells
    #[arg(long, default_value_t = 20)]
    height: i32,
    /// Glyph magnification for rendering; never affects the simulation
    #[arg(long, default_value_t = 1)]
    scale: u16,
    /// RNG seed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,
    /// Open field with a cosmetic border instead of structural border walls
    #[arg(long)]
    open: bool,
    /// End the game on any monster contact instead of draining health
    #[arg(long)]
    sudden_death: bool,
    /// Health lost per monster contact
    #[arg(long, default_value_t = 40)]
    damage: i32,
}

struct App {
    /// The core simulation engine.
    arena: Arena,
    /// Render-only cell magnification.
    scale: u16,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let config = ArenaConfig {
            width: args.width,
            height: args.height,
            layout: if args.open {
                WallLayout::Open
            } else {
                WallLayout::Bordered
            },
            contact: if args.sudden_death {
                ContactPolicy::InstantLoss
            } else {
                ContactPolicy::Damage {
                    amount: args.damage,
                }
            },
            seed: args.seed,
            ..ArenaConfig::default()
        };
        let arena = Arena::new(config).context("setting up the arena")?;
        Ok(App {
            arena,
            scale: args.scale.max(1),
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut app = App::new(&args)?;

    let mut terminal = setup_terminal()?;
    let session = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    session?;

    let score = app.arena.hero().score;
    match app.arena.state() {
        GameState::Terminated(TerminationCause::Caught) => {
            println!("Caught by a monster! Final score: {score}");
        }
        _ => {
            println!("Thanks for playing. Final score: {score}");
        }
    }
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?; // Put terminal in raw mode
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into) // Map io::Error to anyhow::Error
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop: draw, block on one key, feed the engine, repeat until
/// the state machine terminates.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        let snapshot = app.arena.snapshot();
        terminal.draw(|f| ui(f, &snapshot, app.scale))?;

        if let GameState::Terminated(_) = snapshot.state {
            break;
        }

        let command = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => translate_key(key),
            _ => Command::Other,
        };
        app.arena.apply(command)?;
    }
    Ok(())
}

/// Maps one key event onto the engine's command enumeration. Unrecognized
/// keys become `Other`, which the engine ignores.
fn translate_key(key: KeyEvent) -> Command {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
    {
        return Command::EndOfInput;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('w') => Command::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => Command::Move(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => Command::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => Command::Move(Direction::Right),
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        _ => Command::Other,
    }
}

/// Renders the user interface.
fn ui(frame: &mut Frame, snapshot: &Snapshot, scale: u16) {
    let main_layout = Layout::vertical([
        Constraint::Min(1),    // Area for the arena
        Constraint::Length(3), // Area for hero status
        Constraint::Length(1), // Area for help text
    ])
    .split(frame.area());

    render_arena(frame, main_layout[0], snapshot, scale);
    render_status(frame, main_layout[1], snapshot);

    let help_text = Paragraph::new("Arrows/WASD to move, 'q' or Esc to quit.")
        .alignment(Alignment::Center);
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the hero's health, score, and the monster headcount.
fn render_status(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let hero = &snapshot.hero;
    let health_style = if hero.health <= 40 {
        Style::default().fg(Color::Red).bold()
    } else {
        Style::default().fg(Color::Green)
    };
    let line = Line::from(vec![
        Span::raw("Health: "),
        Span::styled(hero.health.to_string(), health_style),
        Span::raw("   Score: "),
        Span::styled(hero.score.to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(format!("   Monsters: {}", snapshot.monsters.len())),
    ]);
    let status_widget =
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status_widget, area);
}

/// Renders the arena snapshot onto the frame, magnified by `scale`.
fn render_arena(frame: &mut Frame, area: Rect, snapshot: &Snapshot, scale: u16) {
    let width = snapshot.width as usize;
    let height = snapshot.height as usize;
    let mut cells: Vec<Vec<Span<'static>>> = vec![vec![Span::raw(" "); width]; height];

    fn put(cells: &mut [Vec<Span<'static>>], position: Position, glyph: &'static str, style: Style) {
        cells[position.y as usize][position.x as usize] = Span::styled(glyph, style);
    }

    for &wall in &snapshot.walls {
        put(&mut cells, wall, "#", Style::default().fg(Color::DarkGray));
    }
    for &border in &snapshot.cosmetic_walls {
        put(&mut cells, border, "o", Style::default().fg(Color::DarkGray));
    }
    for &coin in &snapshot.coins {
        put(&mut cells, coin, "$", Style::default().fg(Color::Yellow));
    }
    for &monster in &snapshot.monsters {
        put(&mut cells, monster, "M", Style::default().fg(Color::Red).bold());
    }
    // Drawn last so the hero stays visible through any overlap.
    put(
        &mut cells,
        snapshot.hero.position,
        "X",
        Style::default().fg(Color::White).bold(),
    );

    let scale = scale.max(1) as usize;
    let mut lines: Vec<Line> = Vec::with_capacity(height * scale);
    for row in cells {
        let spans: Vec<Span> = row
            .into_iter()
            .map(|span| Span::styled(span.content.repeat(scale), span.style))
            .collect();
        let line = Line::from(spans);
        for _ in 0..scale {
            lines.push(line.clone());
        }
    }

    let arena_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Coin Crawl").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(arena_paragraph, area);
}
