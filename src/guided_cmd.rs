//! Interactive menu for presenting the demos to a live audience.

use std::io::{BufRead, Write};

use tracing::{info, warn};

use crate::bench::{BenchConfig, DemoOptions, MeasurementSource, Runner};
use crate::core::dataset::SizeLabel;
use crate::core::schema::EngineKind;
use crate::{BenchResult, analyze_cmd, compare_cmd, probe_cmd};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    FullLoadDemo,
    StreamingDemo,
    Compare,
    Single,
    Tour,
    Quit,
}

pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" => Some(MenuChoice::FullLoadDemo),
        "2" => Some(MenuChoice::StreamingDemo),
        "3" => Some(MenuChoice::Compare),
        "4" => Some(MenuChoice::Single),
        "5" => Some(MenuChoice::Tour),
        "6" | "q" | "quit" | "exit" => Some(MenuChoice::Quit),
        _ => None,
    }
}

fn parse_engine(input: &str) -> Option<EngineKind> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "full" | "full-load" | "fullload" => Some(EngineKind::FullLoad),
        "2" | "streaming" | "stream" => Some(EngineKind::Streaming),
        _ => None,
    }
}

fn parse_size(input: &str) -> Option<SizeLabel> {
    match input.trim() {
        "1" => Some(SizeLabel::Small),
        "2" => Some(SizeLabel::Medium),
        "3" => Some(SizeLabel::Large),
        other => other.parse().ok(),
    }
}

/// What the menu can trigger.
pub trait DemoActions {
    fn full_load_demo(&mut self) -> BenchResult<()>;
    fn streaming_demo(&mut self) -> BenchResult<()>;
    fn compare(&mut self) -> BenchResult<()>;
    fn single(&mut self, label: SizeLabel, engine: EngineKind) -> BenchResult<()>;
}

const MENU: &str = "\
\nChoose a demo:
  1) Full-load demo (one engine, all sizes)
  2) Streaming demo (one engine, all sizes)
  3) Side-by-side comparison
  4) Single run (pick size and engine)
  5) Full tour
  6) Quit
";

const TAKEAWAYS: &str = "\
🎓 KEY TAKEAWAYS:

1. 📊 SCALABILITY MATTERS
   • Full-load processing fails as data grows
   • Streaming engines keep memory flat as data grows

2. 💰 COST IMPLICATIONS
   • Memory requirements drive infrastructure costs
   • Efficient tools reduce hardware needs

3. 🚀 PERFORMANCE IMPACT
   • Processing time affects business agility
   • Faster analytics enable quicker decisions

4. 🔒 RELIABILITY CONCERNS
   • Out-of-memory crashes disrupt operations
   • Predictable performance enables planning

💡 QUESTIONS TO CONSIDER:
   • How much data do we expect in 2-3 years?
   • What's the cost of system downtime?
   • How quickly do we need insights?
";

/// Menu loop over any input and output; EOF always ends the session.
pub struct Guide<R, W, A> {
    input: R,
    out: W,
    actions: A,
}

impl<R: BufRead, W: Write, A: DemoActions> Guide<R, W, A> {
    pub fn new(input: R, out: W, actions: A) -> Self {
        Guide { input, out, actions }
    }

    pub fn into_actions(self) -> A {
        self.actions
    }

    /// Read one line; `None` on EOF.
    fn read_line(&mut self) -> BenchResult<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn prompt<T>(&mut self, question: &str, parse: impl Fn(&str) -> Option<T>) -> BenchResult<Option<T>> {
        loop {
            write!(self.out, "{question}")?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match parse(&line) {
                Some(v) => return Ok(Some(v)),
                None => writeln!(self.out, "Invalid choice '{}', try again.", line.trim())?,
            }
        }
    }

    /// Returns false when input ended.
    fn wait_for_enter(&mut self) -> BenchResult<bool> {
        write!(self.out, "\n⏸️  Press Enter to continue...")?;
        self.out.flush()?;
        Ok(self.read_line()?.is_some())
    }

    fn report(&mut self, what: &str, result: BenchResult<()>) -> BenchResult<()> {
        match result {
            Ok(()) => writeln!(self.out, "✅ {what} completed")?,
            Err(e) => {
                warn!(error = %e, "{what} failed");
                writeln!(self.out, "❌ {what} failed: {e:#}")?;
            }
        }
        Ok(())
    }

    pub fn run(&mut self) -> BenchResult<()> {
        writeln!(self.out, "{}", "=".repeat(60))?;
        writeln!(self.out, "{:^60}", "BIG DATA DEMONSTRATION")?;
        writeln!(self.out, "{}", "=".repeat(60))?;
        writeln!(self.out, "Full-load (everything in memory) versus streaming (SQL scan) processing")?;
        writeln!(self.out, "of 100K, 10M and 100M temperature measurements.")?;

        loop {
            write!(self.out, "{MENU}")?;
            let Some(choice) = self.prompt("> ", parse_choice)? else {
                break;
            };
            info!(?choice, "menu");
            match choice {
                MenuChoice::FullLoadDemo => {
                    let r = self.actions.full_load_demo();
                    self.report("Full-load demo", r)?;
                }
                MenuChoice::StreamingDemo => {
                    let r = self.actions.streaming_demo();
                    self.report("Streaming demo", r)?;
                }
                MenuChoice::Compare => {
                    let r = self.actions.compare();
                    self.report("Comparison", r)?;
                }
                MenuChoice::Single => {
                    let Some(label) = self.prompt("Dataset size [1=small, 2=medium, 3=large]: ", parse_size)? else {
                        break;
                    };
                    let Some(engine) = self.prompt("Engine [1=full-load, 2=streaming]: ", parse_engine)? else {
                        break;
                    };
                    let r = self.actions.single(label, engine);
                    self.report("Single run", r)?;
                }
                MenuChoice::Tour => {
                    if !self.tour()? {
                        break;
                    }
                }
                MenuChoice::Quit => break,
            }
        }
        writeln!(self.out, "\nThank you for attending the big data demonstration!")?;
        Ok(())
    }

    /// Steps 1-4 with pauses, then the takeaways. Returns false on EOF.
    pub fn tour(&mut self) -> BenchResult<bool> {
        writeln!(self.out, "\n📚 STEP 1: Understanding the Problem")?;
        writeln!(self.out, "We'll analyze temperature data from weather stations worldwide.")?;
        writeln!(self.out, "Task: calculate min, mean and max temperature for each station.")?;
        writeln!(self.out, "Challenge: how do different approaches handle increasing data volumes?")?;
        if !self.wait_for_enter()? {
            return Ok(false);
        }

        writeln!(self.out, "\n🧱 STEP 2: Full-load Demo")?;
        writeln!(self.out, "Traditional approach: load all data into memory, then process.")?;
        writeln!(self.out, "Watch memory usage; expect the large dataset to run out of memory.")?;
        if !self.wait_for_enter()? {
            return Ok(false);
        }
        let r = self.actions.full_load_demo();
        self.report("Full-load demo", r)?;

        writeln!(self.out, "\n🦆 STEP 3: Streaming Demo")?;
        writeln!(self.out, "Modern approach: stream the data through a SQL engine.")?;
        writeln!(self.out, "Notice how memory usage stays low regardless of dataset size.")?;
        if !self.wait_for_enter()? {
            return Ok(false);
        }
        let r = self.actions.streaming_demo();
        self.report("Streaming demo", r)?;

        writeln!(self.out, "\n⚡ STEP 4: Direct Comparison")?;
        writeln!(self.out, "Side-by-side performance comparison with detailed metrics.")?;
        if !self.wait_for_enter()? {
            return Ok(false);
        }
        let r = self.actions.compare();
        self.report("Comparison", r)?;

        writeln!(self.out, "\n{}", "=".repeat(60))?;
        writeln!(self.out, "{:^60}", "DEMONSTRATION COMPLETE")?;
        writeln!(self.out, "{}", "=".repeat(60))?;
        write!(self.out, "{TAKEAWAYS}")?;
        Ok(true)
    }
}

/// Menu actions backed by the real demos.
pub struct LiveDemo {
    config: BenchConfig,
    opts: DemoOptions,
}

impl LiveDemo {
    /// Connectivity was already checked at session start.
    pub fn new(config: BenchConfig, opts: &DemoOptions) -> Self {
        LiveDemo { config, opts: DemoOptions { skip_probe: true, ..opts.clone() } }
    }
}

impl DemoActions for LiveDemo {
    fn full_load_demo(&mut self) -> BenchResult<()> {
        analyze_cmd::run(EngineKind::FullLoad, self.config.clone(), &self.opts)
    }

    fn streaming_demo(&mut self) -> BenchResult<()> {
        analyze_cmd::run(EngineKind::Streaming, self.config.clone(), &self.opts)
    }

    fn compare(&mut self) -> BenchResult<()> {
        compare_cmd::run(self.config.clone(), &self.opts)
    }

    fn single(&mut self, label: SizeLabel, engine: EngineKind) -> BenchResult<()> {
        let dataset = self.config.registry.get(label)?.clone();
        let runner = Runner::new(self.config.clone(), self.opts.isolation()?);
        println!("\n⏳ Processing {} with {}...", dataset.description(), engine);
        let m = runner.measure(engine, &dataset);
        print!("{}", analyze_cmd::render_run(&dataset, &m));
        Ok(())
    }
}

pub fn run(config: BenchConfig, opts: &DemoOptions) -> BenchResult<()> {
    if !opts.skip_probe {
        let datasets = config.datasets(&opts.datasets)?;
        println!("🔎 Checking dataset locations...");
        probe_cmd::preflight(&datasets, config.run.probe_timeout())?;
        println!("✅ All datasets reachable");
    }
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut guide = Guide::new(stdin.lock(), stdout.lock(), LiveDemo::new(config, opts));
    guide.run()
}
