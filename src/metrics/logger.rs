//! Training progress loggers.
//!
//! Loggers consume the [`CycleStats`] snapshots the trainer hands to its
//! run callback. [`ConsoleLogger`] prints a fixed-width table at a
//! configurable cycle interval; [`CsvLogger`] records every cycle for
//! offline analysis.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::trainer::CycleStats;

/// Logger over per-cycle training snapshots.
pub trait MetricsLogger: Send {
    /// Record one cycle snapshot.
    fn log(&mut self, stats: &CycleStats);

    /// Flush any buffered output.
    fn flush(&mut self);
}

// ============================================================================
// Console logger
// ============================================================================

/// Console logger with fixed-width columns.
///
/// Prints a header before the first row, then one row every
/// `log_interval` cycles and one for the final cycle.
pub struct ConsoleLogger {
    log_interval: usize,
    last_logged: usize,
    start_time: Instant,
    show_header: bool,
}

impl ConsoleLogger {
    /// # Arguments
    ///
    /// * `log_interval` - Cycles between rows
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
            last_logged: 0,
            start_time: Instant::now(),
            show_header: true,
        }
    }

    fn print_header(&self) {
        println!(
            "{:>8} {:>10} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "Cycle", "EnvSteps", "Episodes", "Reward", "Policy", "Value", "Entropy", "KL", "SPS"
        );
        println!("{}", "-".repeat(92));
    }
}

impl MetricsLogger for ConsoleLogger {
    fn log(&mut self, stats: &CycleStats) {
        let due = stats.cycle >= self.last_logged + self.log_interval;
        let last_cycle = stats.cycle == stats.total_cycles;
        if !due && !last_cycle {
            return;
        }

        if self.show_header {
            self.print_header();
            self.show_header = false;
        }

        let elapsed = self.start_time.elapsed().as_secs_f32();
        let sps = if elapsed > 0.0 {
            stats.env_steps as f32 / elapsed
        } else {
            0.0
        };

        println!(
            "{:>8} {:>10} {:>8} {:>10.2} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>8.0}",
            stats.cycle,
            stats.env_steps,
            stats.episodes,
            stats.avg_episode_reward,
            stats.policy_loss,
            stats.value_loss,
            stats.entropy,
            stats.approx_kl,
            sps
        );

        self.last_logged = stats.cycle;
    }

    fn flush(&mut self) {
        // stdout is line-buffered, nothing to do
    }
}

// ============================================================================
// CSV logger
// ============================================================================

/// CSV file logger, one row per cycle.
pub struct CsvLogger {
    writer: BufWriter<File>,
    start_time: Instant,
}

impl CsvLogger {
    /// Create the file and write the column header.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "cycle,env_steps,episodes,avg_reward,policy_loss,value_loss,entropy,approx_kl,learning_rate,skipped_updates,elapsed_secs"
        )?;

        Ok(Self {
            writer,
            start_time: Instant::now(),
        })
    }
}

impl MetricsLogger for CsvLogger {
    fn log(&mut self, stats: &CycleStats) {
        let elapsed = self.start_time.elapsed().as_secs_f32();

        let _ = writeln!(
            self.writer,
            "{},{},{},{:.4},{:.6},{:.6},{:.6},{:.6},{:.8},{},{:.2}",
            stats.cycle,
            stats.env_steps,
            stats.episodes,
            stats.avg_episode_reward,
            stats.policy_loss,
            stats.value_loss,
            stats.entropy,
            stats.approx_kl,
            stats.learning_rate,
            stats.skipped_updates,
            elapsed
        );
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats(cycle: usize) -> CycleStats {
        CycleStats {
            cycle,
            total_cycles: 100,
            env_steps: cycle * 512,
            episodes: cycle * 3,
            mean_rollout_reward: 0.5,
            avg_episode_reward: 12.25,
            policy_loss: -0.02,
            value_loss: 1.5,
            entropy: 1.38,
            approx_kl: 0.008,
            learning_rate: 2.5e-4,
            skipped_updates: 0,
        }
    }

    #[test]
    fn test_console_logger_interval() {
        let mut logger = ConsoleLogger::new(10);

        // Below the interval: no row, header stays pending.
        logger.log(&sample_stats(5));
        assert!(logger.show_header);

        // At the interval: header plus row.
        logger.log(&sample_stats(10));
        assert!(!logger.show_header);
        assert_eq!(logger.last_logged, 10);

        logger.log(&sample_stats(15));
        assert_eq!(logger.last_logged, 10);
    }

    #[test]
    fn test_console_logger_final_cycle() {
        let mut logger = ConsoleLogger::new(1000);
        let mut stats = sample_stats(100);
        stats.total_cycles = 100;

        logger.log(&stats);
        assert_eq!(logger.last_logged, 100);
    }

    #[test]
    fn test_csv_logger_writes_rows() {
        let path =
            std::env::temp_dir().join(format!("cycle_log_test_{}.csv", std::process::id()));

        let mut logger = CsvLogger::new(&path).unwrap();
        logger.log(&sample_stats(1));
        logger.log(&sample_stats(2));
        logger.flush();
        drop(logger);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("cycle,env_steps,"));
        assert!(lines[1].starts_with("1,512,3,"));
        assert!(lines[2].starts_with("2,1024,6,"));

        let _ = std::fs::remove_file(&path);
    }
}
