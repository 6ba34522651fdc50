use chrono::Utc;
use clap::{Parser, Subcommand};
use lift_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Strength session tracker with training-load analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one workout session set by set
    Session {
        /// Exercise being performed
        #[arg(long, default_value = "bench-press")]
        exercise: String,

        /// Planned set as WEIGHTxREPS, repeatable (e.g. --set 135x10)
        #[arg(long = "set", value_name = "WEIGHTxREPS")]
        sets: Vec<String>,

        /// Rest duration in seconds between sets
        #[arg(long)]
        rest: Option<u32>,

        /// Auto-complete (for testing) - complete every set, skip rests, finish
        #[arg(long)]
        auto_complete: bool,
    },

    /// Print the training-load series (default)
    Analytics {
        /// Number of trailing days to display
        #[arg(long, default_value_t = 14)]
        days: usize,
    },

    /// Roll up WAL workout logs to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Ask the coach for a substitute exercise
    Substitute {
        /// Exercise to substitute
        #[arg(long)]
        exercise: String,

        /// Muscle the exercise targets
        #[arg(long, default_value = "Full body")]
        target: String,

        /// Equipment the original exercise requires, repeatable
        #[arg(long = "needs", value_name = "EQUIPMENT")]
        needs: Vec<String>,

        /// Equipment actually available, repeatable
        #[arg(long = "have", value_name = "EQUIPMENT")]
        have: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    lift_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Session {
            exercise,
            sets,
            rest,
            auto_complete,
        }) => cmd_session(data_dir, exercise, sets, rest, auto_complete, &config),
        Some(Commands::Analytics { days }) => cmd_analytics(data_dir, days, &config),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(data_dir, cleanup),
        Some(Commands::Substitute {
            exercise,
            target,
            needs,
            have,
        }) => cmd_substitute(exercise, target, needs, have),
        None => {
            // Default to the analytics view
            cmd_analytics(data_dir, 14, &config)
        }
    }
}

/// Cue player that rings the terminal bell. Best-effort: a broken pipe or
/// odd terminal must never stall the session.
struct TerminalCue;

impl CuePlayer for TerminalCue {
    fn play(&mut self, _cue: Cue) -> Result<()> {
        let mut out = io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

enum SessionAction {
    Toggle(String),
    Finish,
    Quit,
    Noop,
}

fn cmd_session(
    data_dir: PathBuf,
    exercise: String,
    set_specs: Vec<String>,
    rest: Option<u32>,
    auto_complete: bool,
    config: &Config,
) -> Result<()> {
    // Ensure directories exist
    let wal_dir = data_dir.join("wal");
    std::fs::create_dir_all(&wal_dir)?;

    // Set up paths
    let snapshot_path = wal_dir.join("active_session.json");
    let wal_path = wal_dir.join("workout_logs.wal");

    let initial_sets = parse_set_specs(&set_specs)?;

    let mut session_config = config.session.clone();
    if let Some(rest_seconds) = rest {
        session_config.rest_seconds = rest_seconds;
    }

    let store = FileSnapshotStore::new(&snapshot_path);
    let (mut driver, resumed) = SessionDriver::resume_or_new(
        initial_sets,
        &session_config,
        store,
        TerminalCue,
        NoopWakeLock,
    );

    if resumed {
        println!(
            "Resumed an unfinished session ({} sets).",
            driver.session().sets().len()
        );
    }

    if driver.session().sets().is_empty() {
        return Err(Error::Config(
            "no sets planned: pass at least one --set WEIGHTxREPS".into(),
        ));
    }

    if driver.session().state() == SessionState::Warmup {
        if !auto_complete {
            println!(
                "\n{}: {} sets planned.",
                exercise,
                driver.session().sets().len()
            );
            println!("Warm up, then press Enter to begin.");
            wait_for_enter()?;
        }
        driver.dispatch(SessionEvent::Start);
    }

    // A session restored into Resting has no countdown left; one tick
    // normalizes it back to Working.
    if driver.tick_armed() {
        driver.dispatch(SessionEvent::Tick);
    }

    while driver.session().state() != SessionState::Finished {
        display_sets(driver.session());

        let action = if auto_complete {
            next_auto_action(driver.session())
        } else {
            prompt_session_action(driver.session())?
        };

        match action {
            SessionAction::Toggle(set_id) => {
                driver.dispatch(SessionEvent::ToggleSet(set_id));
                if driver.session().state() == SessionState::Resting {
                    if auto_complete {
                        driver.dispatch(SessionEvent::SkipRest);
                    } else {
                        handle_rest(&mut driver)?;
                    }
                }
            }
            SessionAction::Finish => {
                driver.dispatch(SessionEvent::Finish);
            }
            SessionAction::Quit => {
                println!("Session saved. Run `liftlog session` again to resume.");
                return Ok(());
            }
            SessionAction::Noop => {}
        }
    }

    if let Some(sets) = driver.take_finished() {
        let completed = sets.iter().filter(|s| s.completed).count();
        let total = sets.len();
        let log = WorkoutLog::from_sets(exercise, sets, Utc::now());

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&log)?;

        println!("\n✓ Workout logged!");
        println!("  Sets completed: {}/{}", completed, total);
        println!("  Volume load:    {:.0}", log.total_volume_load);
        println!("  Estimated 1RM:  {:.1}", log.estimated_1rm);
    }

    Ok(())
}

/// Run the rest countdown, one tick per second, unless the user skips it.
fn handle_rest<S, C, W>(driver: &mut SessionDriver<S, C, W>) -> Result<()>
where
    S: SnapshotStore,
    C: CuePlayer,
    W: WakeLock,
{
    println!(
        "\nRest: {}s. Press Enter to start the countdown, 's' + Enter to skip.",
        driver.session().rest_remaining()
    );
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().eq_ignore_ascii_case("s") {
        driver.dispatch(SessionEvent::SkipRest);
        return Ok(());
    }

    while driver.tick_armed() {
        std::thread::sleep(Duration::from_secs(1));
        driver.dispatch(SessionEvent::Tick);

        if driver.session().state() == SessionState::Resting {
            print!("\r  {}s remaining ", driver.session().rest_remaining());
            io::stdout().flush()?;
        }
    }

    println!("\nRest over - back to work!");
    Ok(())
}

fn cmd_analytics(data_dir: PathBuf, days: usize, config: &Config) -> Result<()> {
    let wal_path = data_dir.join("wal").join("workout_logs.wal");
    let csv_path = data_dir.join("workouts.csv");

    let logs = load_history(&wal_path, &csv_path)?;
    let points = compute_training_load(&logs, Utc::now(), &config.analytics);

    if points.is_empty() {
        println!("No workout history yet.");
        return Ok(());
    }

    println!(
        "{:<12} {:>8} {:>9} {:>9} {:>8}",
        "Date", "Stress", "Fitness", "Fatigue", "Form"
    );

    let start = points.len().saturating_sub(days);
    for p in &points[start..] {
        println!(
            "{:<12} {:>8.1} {:>9.2} {:>9.2} {:>8.2}",
            p.date, p.stress, p.fitness, p.fatigue, p.form
        );
    }

    if let Some(latest) = points.last() {
        println!();
        println!("  {}", FormInterpretation::from_form(latest.form).description());
    }

    Ok(())
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let wal_dir = data_dir.join("wal");
    let wal_path = wal_dir.join("workout_logs.wal");
    let csv_path = data_dir.join("workouts.csv");

    if !wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = lift_core::rollup::wal_to_csv_and_archive(&wal_path, &csv_path)?;

    println!("✓ Rolled up {} workout logs to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = lift_core::rollup::cleanup_processed_wals(&wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn cmd_substitute(
    exercise: String,
    target: String,
    needs: Vec<String>,
    have: Vec<String>,
) -> Result<()> {
    let exercise = Exercise {
        id: exercise.to_lowercase().replace(' ', "-"),
        name: exercise,
        description: String::new(),
        target_muscle: target,
        required_equipment: needs,
    };

    let available: Vec<Equipment> = have
        .into_iter()
        .enumerate()
        .map(|(i, name)| Equipment {
            id: (i + 1).to_string(),
            name,
        })
        .collect();

    let coach = AiCoach::from_env(OfflineTransport);
    println!("{}", coach.generate_substitute(&exercise, &available));

    Ok(())
}

/// Parse "WEIGHTxREPS" arguments into planned sets.
fn parse_set_specs(specs: &[String]) -> Result<Vec<WorkoutSet>> {
    specs
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let (weight, reps) = raw.split_once(['x', 'X']).ok_or_else(|| {
                Error::Config(format!("invalid --set value {:?}, expected WEIGHTxREPS", raw))
            })?;

            let weight: f64 = weight
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid weight in --set {:?}", raw)))?;
            let reps: u32 = reps
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid reps in --set {:?}", raw)))?;

            if reps == 0 {
                return Err(Error::Config(format!("reps must be positive in {:?}", raw)));
            }
            if weight < 0.0 {
                return Err(Error::Config(format!(
                    "weight must be non-negative in {:?}",
                    raw
                )));
            }

            Ok(WorkoutSet::new(format!("set-{}", i + 1), weight, reps))
        })
        .collect()
}

fn display_sets(session: &WorkoutSession) {
    println!("\n─────────────────────────────────────────");
    for (i, set) in session.sets().iter().enumerate() {
        let marker = if set.completed {
            "✓"
        } else if i == session.active_set_index() {
            "→"
        } else {
            " "
        };
        println!("  {} [{}] {:.0} x {}", marker, i + 1, set.weight, set.reps);
    }
}

/// The set Enter should complete: the active set if still open, otherwise
/// the first open set.
fn current_set(session: &WorkoutSession) -> Option<String> {
    let sets = session.sets();
    let active = sets.get(session.active_set_index());

    if let Some(set) = active {
        if !set.completed {
            return Some(set.id.clone());
        }
    }

    sets.iter().find(|s| !s.completed).map(|s| s.id.clone())
}

fn next_auto_action(session: &WorkoutSession) -> SessionAction {
    match current_set(session) {
        Some(id) => SessionAction::Toggle(id),
        None => SessionAction::Finish,
    }
}

fn prompt_session_action(session: &WorkoutSession) -> Result<SessionAction> {
    println!("─────────────────────────────────────────");
    println!("Press Enter when the current set is done");
    println!("  a set number + Enter to toggle that set");
    println!("  'f' + Enter to finish the workout");
    println!("  'q' + Enter to quit (resume later)");
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    let action = match trimmed {
        "" => match current_set(session) {
            Some(id) => SessionAction::Toggle(id),
            None => SessionAction::Finish,
        },
        "f" | "F" => SessionAction::Finish,
        "q" | "Q" => SessionAction::Quit,
        other => {
            if let Ok(n) = other.parse::<usize>() {
                if n >= 1 && n <= session.sets().len() {
                    SessionAction::Toggle(session.sets()[n - 1].id.clone())
                } else {
                    println!("No set number {}.", n);
                    SessionAction::Noop
                }
            } else {
                println!("Unrecognized input {:?}.", other);
                SessionAction::Noop
            }
        }
    };

    Ok(action)
}

fn wait_for_enter() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(())
}
