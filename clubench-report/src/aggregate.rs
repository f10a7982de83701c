//! Resource-log aggregation.
//!
//! Expected format of the aggregated files, one line per completed run:
//!
//! ```text
//! # ExecTime(sec)  CPU_time(sec)  CPU_usr(sec)  CPU_kern(sec)  RSS_RAM_peak(Mb)  TaskName
//! 0.550262  0.526599  0.513438  0.013161  2.086  syntmix/1K10!k7.1#1
//! ```
//!
//! Lines are whitespace-separated with exactly six fields; blank lines and
//! `#` comments are skipped. A missing log excludes that algorithm from all
//! reports (recoverable), a malformed line aborts the aggregation pass
//! (corrupt accumulated data is worse than stopping).

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use clubench_core::{strip_suffixes, EXT_AGGRES, EXT_AGGRESEXT, EXT_EXECTIME};
use clubench_stats::StatAccumulator;

/// The aggregated measures, in output order. Memory must stay last: summed
/// memory across repeated runs is not a meaningful quantity, so it is the
/// one measure reported as an average instead of a sum.
pub const MEASURES: [&str; 3] = ["exectime", "cputime", "rssmem"];

/// Fatal aggregation failures. Anything here indicates corrupt input and
/// aborts the whole pass; recoverable conditions (missing logs, report
/// write failures) are warnings instead.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A resource record does not have exactly six fields.
    #[error("invalid resource record in '{}': {line}", file.display())]
    BadRecord {
        /// The resource log being read.
        file: PathBuf,
        /// The offending line.
        line: String,
    },

    /// A measure field is not a number.
    #[error("invalid measure value '{value}' in '{}': {line}", file.display())]
    BadValue {
        /// The resource log being read.
        file: PathBuf,
        /// The unparsable field.
        value: String,
        /// The offending line.
        line: String,
    },

    /// The task identifier strips down to an empty network name.
    #[error("empty network name in '{}': {line}", file.display())]
    EmptyNetwork {
        /// The resource log being read.
        file: PathBuf,
        /// The offending line.
        line: String,
    },

    /// An opened resource log failed mid-read.
    #[error("failed reading resource log '{}': {source}", file.display())]
    Io {
        /// The resource log being read.
        file: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
}

/// One per-network accumulator slot, remembering which of the opened
/// algorithms produced it so report columns stay labeled correctly even
/// when an algorithm has results for only a subset of the networks.
#[derive(Debug, Clone)]
struct AlgSlot {
    alg: usize, // index into the opened-algorithms list
    stat: StatAccumulator,
}

/// network name -> per-algorithm slots, in first-result order. Algorithms
/// with zero results for a network own no slot there, never a placeholder.
type MeasureTable = BTreeMap<String, Vec<AlgSlot>>;

/// Aggregates execution statistics of all networks per each algorithm and
/// appends per-measure consolidated reports under the results directory.
pub struct Aggregator {
    res_dir: PathBuf,
}

impl Aggregator {
    /// Aggregator over the given results root.
    pub fn new(res_dir: impl Into<PathBuf>) -> Self {
        Aggregator {
            res_dir: res_dir.into(),
        }
    }

    /// Per-algorithm resource log location: `<res>/<alg>/<alg>.rcp`.
    pub fn resource_log(&self, alg: &str) -> PathBuf {
        self.res_dir.join(alg).join(format!("{alg}{EXT_EXECTIME}"))
    }

    /// Consolidate the resource logs of `algs` into the per-measure report
    /// files. Writes reports as a side effect; with no openable logs the
    /// only observable effect is a single warning.
    pub fn aggregate(&self, algs: &[&str]) -> Result<(), AggregateError> {
        let mut tables: [MeasureTable; 3] = Default::default();
        let mut opened: Vec<&str> = Vec::new();

        for &alg in algs {
            let log = self.resource_log(alg);
            let file = match File::open(&log) {
                Ok(file) => file,
                Err(err) => {
                    warn!(
                        alg,
                        log = %log.display(),
                        error = %err,
                        "execution results do not exist, algorithm skipped"
                    );
                    continue;
                }
            };
            let ialg = opened.len();
            self.consume_log(&log, file, alg, ialg, &mut tables)?;
            opened.push(alg);
        }

        if opened.is_empty() {
            warn!("no algorithm execution results to be aggregated");
            return Ok(());
        }

        // One shared timestamp for all measures of this aggregation run.
        let timestamp = Utc::now();
        for (imsr, measure) in MEASURES.iter().enumerate() {
            // Sum for the time measures, average for memory.
            let use_avg = imsr == MEASURES.len() - 1;
            if let Err(err) =
                self.write_measure(measure, use_avg, &mut tables[imsr], &opened, timestamp)
            {
                // Independent failure domains: the remaining measures still run.
                warn!(measure, error = %err, "report output failed");
            }
        }
        Ok(())
    }

    fn consume_log(
        &self,
        log: &Path,
        file: File,
        alg: &str,
        ialg: usize,
        tables: &mut [MeasureTable; 3],
    ) -> Result<(), AggregateError> {
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| AggregateError::Io {
                file: log.to_path_buf(),
                source,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields.len() != 6 {
                return Err(AggregateError::BadRecord {
                    file: log.to_path_buf(),
                    line: trimmed.to_owned(),
                });
            }

            // Task identifier -> network name, all suffixes stripped.
            let net = strip_suffixes(fields[5], true);
            if net.is_empty() {
                return Err(AggregateError::EmptyNetwork {
                    file: log.to_path_buf(),
                    line: trimmed.to_owned(),
                });
            }

            let parse = |value: &str| -> Result<f64, AggregateError> {
                value.parse().map_err(|_| AggregateError::BadValue {
                    file: log.to_path_buf(),
                    value: value.to_owned(),
                    line: trimmed.to_owned(),
                })
            };
            let exectime = parse(fields[0])?;
            let cputime = parse(fields[1])?;
            let rssmem = parse(fields[4])?;

            for (table, value) in tables.iter_mut().zip([exectime, cputime, rssmem]) {
                let slots = table.entry(net.to_owned()).or_default();
                match slots.last_mut() {
                    Some(slot) if slot.alg == ialg => slot.stat.add(value),
                    _ => slots.push(AlgSlot {
                        alg: ialg,
                        stat: StatAccumulator::new(format!("{alg}_{net}"), value),
                    }),
                }
            }
        }
        Ok(())
    }

    fn write_measure(
        &self,
        measure: &str,
        use_avg: bool,
        table: &mut MeasureTable,
        opened: &[&str],
        timestamp: DateTime<Utc>,
    ) -> io::Result<()> {
        let res_path = self.res_dir.join(format!("{measure}{EXT_AGGRES}"));
        let resx_path = self.res_dir.join(format!("{measure}{EXT_AGGRESEXT}"));
        // Append mode: repeated aggregation runs accumulate history blocks.
        let resx_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&resx_path)?;
        let resx_empty = resx_file.metadata()?.len() == 0;
        let mut outres = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&res_path)?,
        );
        let mut outresx = BufWriter::new(resx_file);

        // The format legend is written only once, to the fresh extended file.
        if resx_empty {
            writeln!(outresx, "# <network>\n#\t<alg1_outp>\n#\t<alg2_outp>\n#\t...")?;
        }
        let ts = timestamp.format("%Y-%m-%d %H:%M:%S%.6f");
        writeln!(outres, "# --- {ts} ---")?;
        writeln!(outresx, "# --- {ts} ---")?;

        // Column headers differ between runs by the number of opened algs.
        write!(outres, "# <network>")?;
        for alg in opened {
            write!(outres, "\t{alg}")?;
        }
        writeln!(outres)?;

        for (net, slots) in table.iter_mut() {
            write!(outres, "{net}")?;
            write!(outresx, "{net}")?;
            for slot in slots.iter_mut() {
                if !slot.stat.fixed() {
                    slot.stat.fix();
                }
                let value = if use_avg {
                    slot.stat.avg()
                } else {
                    slot.stat.sum()
                };
                write!(outres, "\t{value:.3}")?;
                write!(
                    outresx,
                    "\n\t{}>\ttotal: {:.3}, per_item: {:.6} ({:.6} .. {:.6})",
                    opened[slot.alg],
                    value,
                    slot.stat.avg(),
                    slot.stat.min(),
                    slot.stat.max(),
                )?;
            }
            writeln!(outres)?;
            writeln!(outresx)?;
        }
        outres.flush()?;
        outresx.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_log(res_dir: &Path, alg: &str, content: &str) {
        let dir = res_dir.join(alg);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{alg}{EXT_EXECTIME}")), content).unwrap();
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn no_openable_logs_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let agg = Aggregator::new(tmp.path());
        agg.aggregate(&["ghost", "phantom"]).unwrap();
        for measure in MEASURES {
            assert!(!tmp.path().join(format!("{measure}{EXT_AGGRES}")).exists());
            assert!(!tmp
                .path()
                .join(format!("{measure}{EXT_AGGRESEXT}"))
                .exists());
        }
    }

    #[test]
    fn sums_time_and_averages_memory() {
        let tmp = tempfile::tempdir().unwrap();
        write_log(
            tmp.path(),
            "algx",
            "# ExecTime(sec)\tCPU_time(sec)\tCPU_usr(sec)\tCPU_kern(sec)\tRSS_RAM_peak(Mb)\tTaskName\n\
             0.5\t0.45\t0.40\t0.05\t2.0\tgraph1\n\
             0.7\t0.65\t0.60\t0.05\t4.0\tgraph1\n\
             \n\
             1.2\t1.10\t1.00\t0.10\t3.0\tgraph2#1\n",
        );
        let agg = Aggregator::new(tmp.path());
        agg.aggregate(&["algx"]).unwrap();

        let compact = read(tmp.path().join("exectime.res"));
        assert!(compact.contains("# <network>\talgx"));
        assert!(compact.contains("graph1\t1.200"));
        assert!(compact.contains("graph2\t1.200"), "path-id suffix stripped");

        let extended = read(tmp.path().join("exectime.resx"));
        assert!(extended
            .contains("algx>\ttotal: 1.200, per_item: 0.600000 (0.500000 .. 0.700000)"));

        // Memory is averaged, not summed.
        let mem = read(tmp.path().join("rssmem.res"));
        assert!(mem.contains("graph1\t3.000"));
    }

    #[test]
    fn unopenable_algorithm_is_excluded_from_all_reports() {
        let tmp = tempfile::tempdir().unwrap();
        write_log(tmp.path(), "real", "0.5\t0.4\t0.3\t0.1\t2.0\tnet\n");
        let agg = Aggregator::new(tmp.path());
        agg.aggregate(&["ghost", "real"]).unwrap();

        let compact = read(tmp.path().join("exectime.res"));
        assert!(compact.contains("# <network>\treal\n"));
        assert!(!compact.contains("ghost"));
    }

    #[test]
    fn partial_coverage_never_yields_placeholder_slots() {
        let tmp = tempfile::tempdir().unwrap();
        write_log(
            tmp.path(),
            "one",
            "0.5\t0.4\t0.3\t0.1\t2.0\tnetA\n0.6\t0.5\t0.4\t0.1\t2.5\tnetB\n",
        );
        write_log(tmp.path(), "two", "0.9\t0.8\t0.7\t0.1\t3.0\tnetA\n");
        let agg = Aggregator::new(tmp.path());
        agg.aggregate(&["one", "two"]).unwrap();

        let compact = read(tmp.path().join("exectime.res"));
        assert!(compact.contains("netA\t0.500\t0.900"));
        assert!(compact.contains("netB\t0.600\n"), "no empty slot for 'two'");
    }

    #[test]
    fn later_algorithm_slots_keep_their_own_label() {
        let tmp = tempfile::tempdir().unwrap();
        write_log(tmp.path(), "one", "0.5\t0.4\t0.3\t0.1\t2.0\tnetA\n");
        write_log(
            tmp.path(),
            "two",
            "0.9\t0.8\t0.7\t0.1\t3.0\tnetA\n0.4\t0.3\t0.2\t0.1\t1.0\tnetB\n",
        );
        let agg = Aggregator::new(tmp.path());
        agg.aggregate(&["one", "two"]).unwrap();

        let extended = read(tmp.path().join("exectime.resx"));
        let netb_block: String = extended
            .lines()
            .skip_while(|l| *l != "netB")
            .take(2)
            .collect();
        assert!(netb_block.contains("two>"), "netB labeled with 'two': {extended}");
        assert!(!netb_block.contains("one>"));
    }

    #[test]
    fn malformed_record_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_log(tmp.path(), "bad", "0.5\t0.4\t0.3\t0.1\tnet\n"); // five fields
        let agg = Aggregator::new(tmp.path());
        let err = agg.aggregate(&["bad"]).unwrap_err();
        assert!(matches!(err, AggregateError::BadRecord { .. }));
    }

    #[test]
    fn non_numeric_measure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_log(tmp.path(), "bad", "fast\t0.4\t0.3\t0.1\t2.0\tnet\n");
        let agg = Aggregator::new(tmp.path());
        let err = agg.aggregate(&["bad"]).unwrap_err();
        assert!(matches!(err, AggregateError::BadValue { .. }));
    }

    #[test]
    fn empty_network_name_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_log(tmp.path(), "bad", "0.5\t0.4\t0.3\t0.1\t2.0\t#1\n");
        let agg = Aggregator::new(tmp.path());
        let err = agg.aggregate(&["bad"]).unwrap_err();
        assert!(matches!(err, AggregateError::EmptyNetwork { .. }));
    }

    #[test]
    fn repeated_runs_append_history_blocks() {
        let tmp = tempfile::tempdir().unwrap();
        write_log(tmp.path(), "algx", "0.5\t0.4\t0.3\t0.1\t2.0\tnet\n");
        let agg = Aggregator::new(tmp.path());
        agg.aggregate(&["algx"]).unwrap();
        agg.aggregate(&["algx"]).unwrap();

        let compact = read(tmp.path().join("exectime.res"));
        assert_eq!(compact.matches("# --- ").count(), 2);

        let extended = read(tmp.path().join("exectime.resx"));
        // The legend appears once, timestamp blocks per run.
        assert_eq!(extended.matches("# <network>").count(), 1);
        assert_eq!(extended.matches("# --- ").count(), 2);
    }
}
