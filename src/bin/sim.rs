use std::io::Write;
use std::time::Instant;

use catan_sim::cli::{
    AgentInstance, GameStats, GameSummary, agent_name, create_agent, print_agent_help,
};
use catan_sim::game::state::{MAX_PLAYERS, MIN_PLAYERS};
use catan_sim::game::{Game, GameConfig, GameError, Player, RosterBuilder};
use clap::Parser;
use log::{error, info};
use rayon::prelude::*;

#[derive(Debug, Parser, Clone)]
#[command(name = "catan-sim")]
#[command(about = "Catan simulator - play games between search agents")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 5)]
    num: u32,

    /// Comma-separated agent codes, 3 or 4 seats (e.g. R,R,O or M:4:1,R,R,P)
    /// Use ':' to pass agent params (e.g. M:ITERATIONS:DEPTH)
    #[arg(long, default_value = "R,R,R,R")]
    players: String,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Victory points needed to win
    #[arg(long, default_value_t = 10)]
    vps_to_win: u8,

    /// Main-game turns before a game is abandoned
    #[arg(long, default_value_t = 1000)]
    turn_limit: u32,

    /// Show agent codes and exit
    #[arg(long)]
    help_players: bool,

    /// Silence console output
    #[arg(long)]
    quiet: bool,

    /// Print one JSON summary per game
    #[arg(long)]
    json: bool,

    /// Number of worker threads for parallel games
    #[arg(long, default_value_t = 1)]
    workers: usize,
}

struct Seat {
    code: String,
    params: Vec<String>,
}

fn parse_seats(codes: &str) -> Result<Vec<Seat>, String> {
    let seats: Vec<Seat> = codes
        .split(',')
        .map(|key| {
            let mut parts = key.trim().split(':').map(str::to_owned);
            Seat {
                code: parts.next().unwrap_or_default(),
                params: parts.collect(),
            }
        })
        .collect();
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&seats.len()) {
        return Err(format!(
            "must specify {MIN_PLAYERS}-{MAX_PLAYERS} players, got {}",
            seats.len()
        ));
    }
    for seat in &seats {
        let params: Vec<&str> = seat.params.iter().map(String::as_str).collect();
        if create_agent(&seat.code, &params, 0).is_none() {
            return Err(format!("unknown agent code or params '{}'", seat.code));
        }
    }
    Ok(seats)
}

fn build_seats(seats: &[Seat], seed: u64) -> Result<Vec<(Player, AgentInstance)>, GameError> {
    let mut roster = RosterBuilder::new();
    let mut agents = Vec::new();
    for (idx, seat) in seats.iter().enumerate() {
        roster.add(Some(&format!("{}{}", agent_name(&seat.code), idx + 1)))?;
        let params: Vec<&str> = seat.params.iter().map(String::as_str).collect();
        // Codes were validated up front.
        if let Some(agent) = create_agent(&seat.code, &params, seed.wrapping_add(idx as u64)) {
            agents.push(agent);
        }
    }
    Ok(roster.build().into_iter().zip(agents).collect())
}

fn run_game(args: &Args, seats: &[Seat], game_idx: u32) -> GameSummary {
    let seed = args.seed.wrapping_add(game_idx as u64);
    let config = GameConfig {
        vps_to_win: args.vps_to_win,
        seed,
        turn_limit: args.turn_limit,
    };
    let start = Instant::now();
    let seated = build_seats(seats, seed.wrapping_mul(31));
    let mut game = match seated.and_then(|seated| Game::new(seated, config)) {
        Ok(game) => game,
        Err(err) => {
            error!("game {game_idx} could not start: {err}");
            return GameSummary {
                index: game_idx,
                id: String::new(),
                seed,
                winner: None,
                turns: 0,
                moves: 0,
                victory_points: Vec::new(),
                duration_ms: 0,
                error: Some(err.to_string()),
            };
        }
    };
    let result = game.play();
    if let Err(err) = &result {
        error!("game {} aborted: {err}", game.id);
    }
    GameSummary::new(game_idx, &game, &result, start.elapsed())
}

fn report(args: &Args, summary: &GameSummary) {
    if args.json {
        match serde_json::to_string(summary) {
            Ok(line) => println!("{line}"),
            Err(err) => error!("could not serialize game {}: {err}", summary.index),
        }
        return;
    }
    if args.quiet {
        return;
    }
    let last_n = 10;
    if summary.index < last_n || summary.index >= args.num.saturating_sub(last_n) {
        let winner = summary
            .winner
            .map(|w| format!("#{w}"))
            .unwrap_or_else(|| "None".to_string());
        println!(
            "Game {:>4}: Winner={:>5}, Turns={:>4}, Moves={:>5}, Duration={}ms",
            summary.index + 1,
            winner,
            summary.turns,
            summary.moves,
            summary.duration_ms
        );
    } else if (summary.index + 1) % 100 == 0 {
        print!(".");
        let _ = std::io::stdout().flush();
    }
}

fn print_summary(stats: &GameStats, seats: &[Seat]) {
    println!("\n{}", "=".repeat(80));
    println!("SIMULATION SUMMARY");
    println!("{}", "=".repeat(80));

    println!("\nPlayer Summary:");
    println!(
        "{:<28} {:<10} {:<12} {:<12}",
        "Player", "Wins", "Win Rate", "Avg VP"
    );
    println!("{}", "-".repeat(62));
    for (idx, seat) in seats.iter().enumerate() {
        let id = idx as u8 + 1;
        let wins = stats.wins_of(id);
        let win_rate = if stats.games > 0 {
            wins as f64 / stats.games as f64 * 100.0
        } else {
            0.0
        };
        println!(
            "{:<28} {:<10} {:<11.1}% {:<12.2}",
            format!("{} (#{id})", agent_name(&seat.code)),
            wins,
            win_rate,
            stats.avg_vps_of(id)
        );
    }

    println!("\nGame Summary:");
    println!("  Total Games: {}", stats.games);
    println!("  Unfinished: {}", stats.unfinished);
    println!("  Avg Turns: {:.2}", stats.avg_turns());
    println!("  Avg Moves: {:.2}", stats.avg_moves());
    println!("  Avg Duration: {:.2?}", stats.avg_duration());
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.help_players {
        print_agent_help();
        return;
    }

    let seats = match parse_seats(&args.players) {
        Ok(seats) => seats,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!("Use --help-players to see available codes");
            std::process::exit(1);
        }
    };
    info!("simulating {} games of {}", args.num, args.players);

    let summaries: Vec<GameSummary> = if args.workers > 1 {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                eprintln!("Error: could not start {} workers: {err}", args.workers);
                std::process::exit(1);
            }
        };
        pool.install(|| {
            (0..args.num)
                .into_par_iter()
                .map(|idx| run_game(&args, &seats, idx))
                .collect()
        })
    } else {
        (0..args.num)
            .map(|idx| {
                let summary = run_game(&args, &seats, idx);
                report(&args, &summary);
                summary
            })
            .collect()
    };

    let mut stats = GameStats::new();
    for summary in &summaries {
        if args.workers > 1 {
            report(&args, summary);
        }
        stats.record(summary);
    }

    if !args.quiet && !args.json {
        print_summary(&stats, &seats);
    }
}
