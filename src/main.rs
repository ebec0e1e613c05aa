use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use hybrid_2048::config::AppConfig;
use hybrid_2048::game::Game;
use hybrid_2048::logging;
use hybrid_2048::search::{CachePolicy, HybridSearch};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CacheArg {
    Disabled,
    Approximate,
    ExactOnly,
}

impl From<CacheArg> for CachePolicy {
    fn from(arg: CacheArg) -> Self {
        match arg {
            CacheArg::Disabled => CachePolicy::Disabled,
            CacheArg::Approximate => CachePolicy::Approximate,
            CacheArg::ExactOnly => CachePolicy::ExactOnly,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "hybrid-2048", about = "Play a game of 2048 with expectimax + alpha-beta search")]
struct Args {
    /// TOML settings file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search depth in plies (1-8)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Empty cells expanded per chance ply
    #[arg(long)]
    sample_cells: Option<usize>,

    /// Transposition table policy
    #[arg(long, value_enum)]
    cache: Option<CacheArg>,

    /// Disable alpha-beta cutoffs
    #[arg(long)]
    no_pruning: bool,

    /// Seed for tile spawns and search sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many moves
    #[arg(long)]
    max_moves: Option<u64>,

    /// Don't print the board after every move
    #[arg(short, long)]
    quiet: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn settings(&self) -> anyhow::Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => AppConfig::default(),
        };
        if let Some(depth) = self.depth {
            cfg.search.depth = depth;
        }
        if let Some(sample_cells) = self.sample_cells {
            cfg.search.sample_cells = sample_cells;
        }
        if let Some(cache) = self.cache {
            cfg.search.cache = cache.into();
        }
        if self.no_pruning {
            cfg.search.pruning = false;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if self.max_moves.is_some() {
            cfg.max_moves = self.max_moves;
        }
        cfg.search.validate().context("invalid search settings")?;
        Ok(cfg)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose).context("failed to install log subscriber")?;
    let cfg = args.settings()?;

    let seed = cfg.seed.unwrap_or_else(rand::random);
    info!(
        seed,
        depth = cfg.search.depth,
        sample_cells = cfg.search.sample_cells,
        pruning = cfg.search.pruning,
        cache = ?cfg.search.cache,
        "starting game"
    );
    let mut rng = StdRng::seed_from_u64(seed);
    let mut search = HybridSearch::seeded(cfg.search.clone(), seed.wrapping_add(1));
    let mut game = Game::new(&mut rng);

    let spinner = if args.quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} {elapsed_precise} | {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        println!("{}", game.board());
        None
    };

    let start = Instant::now();
    let mut total_nodes: u64 = 0;
    let mut peak_nodes: u64 = 0;
    while !game.is_over() {
        if cfg.max_moves.is_some_and(|limit| game.moves() >= limit) {
            info!(moves = game.moves(), "move limit reached");
            break;
        }
        let think = Instant::now();
        let decision = search.best_move(game.board());
        let stats = search.last_stats();
        total_nodes += stats.nodes;
        peak_nodes = peak_nodes.max(stats.nodes);
        let Some(dir) = decision.mv else {
            break;
        };
        debug!(
            think_s = think.elapsed().as_secs_f64(),
            nodes = stats.nodes,
            cache_hits = stats.cache_hits,
            value = decision.score,
            %dir,
            "AI think"
        );
        if !game.step(dir, &mut rng) {
            warn!(%dir, board = ?game.board(), "search returned a move that does not change the board");
            break;
        }
        match &spinner {
            Some(pb) => pb.set_message(format!("moves: {} | score: {}", game.moves(), game.score())),
            None => println!("{dir}\n{}", game.board()),
        }
    }
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    info!(
        moves = game.moves(),
        score = game.score(),
        highest_tile = game.board().highest_tile(),
        game_over = game.is_over(),
        "finished"
    );
    println!(
        "Moves: {} | score: {} | highest tile: {} | moves/sec: {:.1} | states considered: {} | max states for a move: {}",
        game.moves(),
        game.score(),
        game.board().highest_tile(),
        game.moves() as f64 / elapsed,
        total_nodes,
        peak_nodes
    );
    Ok(())
}
