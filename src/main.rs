//! Lane Rhythm headless demo
//!
//! Plays a chart against a simulated track with the autoplay bot and logs
//! the result. Frames arrive at `--fps`; the session runs at a fixed tick.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;

use lane_rhythm::consts::*;
use lane_rhythm::sim::{BeatTimeline, EventLog, GameSession, SessionEvent, SessionState, TrackClock};
use lane_rhythm::{AutoPlayer, Settings};

/// Built-in chart used when no `--chart` is given
const DEMO_CHART: &str = "time,lane
0.50,0
1.00,1
1.50,2
2.00,3
2.25,0
2.50,1
2.75,2
3.00,3
3.50,0
3.50,3
4.00,1
4.00,2
";

#[derive(Debug, Parser)]
#[command(name = "lane-rhythm", about = "Headless autoplay run of a rhythm chart")]
struct Args {
    /// Chart CSV (`time,lane` per line)
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Settings JSON
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Autoplay RNG seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Max press error either side of the note (seconds)
    #[arg(long, default_value_t = 0.08)]
    jitter: f64,

    /// Probability the bot ignores a note
    #[arg(long, default_value_t = 0.05)]
    skip_chance: f64,

    /// Simulated display frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Seconds of track left after the last note reaches the hit zone
    #[arg(long, default_value_t = 2.0)]
    tail: f64,
}

/// Demo driver holding the session and loop state
struct Game {
    session: GameSession,
    events: Rc<RefCell<EventLog>>,
    bot: AutoPlayer,
    accumulator: f32,
}

impl Game {
    fn new(session: GameSession, events: Rc<RefCell<EventLog>>, bot: AutoPlayer) -> Self {
        Self {
            session,
            events,
            bot,
            accumulator: 0.0,
        }
    }

    /// Run fixed ticks for one display frame
    fn update(&mut self, frame_dt: f32) {
        let frame_dt = frame_dt.min(0.1);
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let dt = SIM_DT as f64;
            let input = self.bot.input(&self.session, self.session.song_time() + dt);
            self.session.tick(&input, dt);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };

    let report = match &args.chart {
        Some(path) => BeatTimeline::load(path, settings.chart_order)
            .with_context(|| format!("loading chart {}", path.display()))?,
        None => BeatTimeline::parse_report(DEMO_CHART, settings.chart_order),
    };
    if !report.warnings.is_empty() {
        log::warn!("{} chart lines skipped", report.warnings.len());
    }
    let timeline = report.timeline;

    let travel = settings.lane_layout().travel_time();
    let duration = timeline.last_time().unwrap_or(0.0) + travel + args.tail.max(0.0);
    let clock = TrackClock::new(duration, settings.start_delay);
    let lanes = settings.lane_count();

    let events = EventLog::shared();
    let mut session = GameSession::new(timeline, settings)
        .with_clock(clock)
        .with_listener(events.clone());
    session.start().context("session could not start")?;

    let bot = AutoPlayer::new(args.seed, lanes, args.jitter, args.skip_chance);
    let mut game = Game::new(session, events, bot);

    let frame_dt = (1.0 / args.fps.max(1.0)) as f32;
    let mut frames: u64 = 0;
    while game.session.state() == SessionState::Playing {
        game.update(frame_dt);
        frames += 1;
    }

    let score = game.session.score();
    let final_score = game
        .events
        .borrow()
        .events
        .iter()
        .find_map(|e| match e {
            SessionEvent::Ended { final_score } => Some(*final_score),
            _ => None,
        })
        .unwrap_or(score.total);

    log::info!(
        "Played {} frames ({} ticks), {} notes spawned",
        frames,
        game.session.ticks(),
        game.events.borrow().spawn_count()
    );
    println!(
        "Final score: {} | Perfect {} | Good {} | Miss {}",
        final_score, score.perfect, score.good, score.miss
    );

    Ok(())
}
