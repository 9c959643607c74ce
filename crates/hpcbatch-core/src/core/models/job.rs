use std::fmt;
use std::io::{self, BufRead};
use std::str::FromStr;
use thiserror::Error;

const DIRECTIVE_PREFIX: &str = "#SBATCH";

#[derive(Debug, Error)]
pub enum JobSpecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Directive '{key}' requires a value")]
    MissingValue { key: String },
    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{0}")]
pub struct ValueError(String);

/// Scheduler walltime limit, held in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Walltime {
    seconds: u64,
}

impl Walltime {
    pub fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> u64 {
        self.seconds
    }
}

impl FromStr for Walltime {
    type Err = ValueError;

    /// Accepts the SLURM forms `M`, `M:S`, `H:M:S`, `D-H`, `D-H:M`, `D-H:M:S`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ValueError(format!("unrecognised time format '{s}'"));
        let num = |part: &str| part.parse::<u64>().map_err(|_| err());

        let (days, rest) = match s.split_once('-') {
            Some((d, rest)) => (Some(num(d)?), rest),
            None => (None, s),
        };
        let fields: Vec<&str> = rest.split(':').collect();
        // (days, hours, minutes, seconds)
        let parts = match (days, fields.as_slice()) {
            (None, [m]) => (0, 0, num(m)?, 0),
            (None, [m, sec]) => (0, 0, num(m)?, num(sec)?),
            (None, [h, m, sec]) => (0, num(h)?, num(m)?, num(sec)?),
            (Some(d), [h]) => (d, num(h)?, 0, 0),
            (Some(d), [h, m]) => (d, num(h)?, num(m)?, 0),
            (Some(d), [h, m, sec]) => (d, num(h)?, num(m)?, num(sec)?),
            _ => return Err(err()),
        };
        let (d, h, m, sec) = parts;
        let seconds = d
            .checked_mul(86400)
            .and_then(|t| h.checked_mul(3600).and_then(|x| t.checked_add(x)))
            .and_then(|t| m.checked_mul(60).and_then(|x| t.checked_add(x)))
            .and_then(|t| t.checked_add(sec))
            .ok_or_else(|| ValueError(format!("time '{s}' is too large")))?;
        Ok(Self { seconds })
    }
}

impl fmt::Display for Walltime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.seconds / 86400;
        let hours = (self.seconds % 86400) / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let seconds = self.seconds % 60;
        if days > 0 {
            write!(f, "{days}-{hours:02}:{minutes:02}:{seconds:02}")
        } else {
            write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
        }
    }
}

/// Memory request in megabytes. Unsuffixed numbers are megabytes, as in SLURM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemorySize {
    megabytes: u64,
}

impl MemorySize {
    pub fn from_megabytes(megabytes: u64) -> Self {
        Self { megabytes }
    }

    pub fn as_megabytes(&self) -> u64 {
        self.megabytes
    }
}

impl FromStr for MemorySize {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ValueError(format!("unrecognised memory size '{s}'"));
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let value: u64 = digits.parse().map_err(|_| err())?;
        let megabytes = match unit.to_ascii_uppercase().as_str() {
            "" | "M" | "MB" => Some(value),
            "K" | "KB" => Some(value.div_ceil(1024)),
            "G" | "GB" => value.checked_mul(1024),
            "T" | "TB" => value.checked_mul(1024 * 1024),
            _ => return Err(err()),
        }
        .ok_or_else(|| ValueError(format!("memory size '{s}' is too large")))?;
        Ok(Self { megabytes })
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const GB: u64 = 1024;
        const TB: u64 = 1024 * 1024;
        match self.megabytes {
            0 => write!(f, "0"),
            mb if mb % TB == 0 => write!(f, "{}T", mb / TB),
            mb if mb % GB == 0 => write!(f, "{}G", mb / GB),
            mb => write!(f, "{mb}M"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArraySegment {
    start: u32,
    end: u32,
    step: u32,
}

impl ArraySegment {
    fn contains(&self, index: u32) -> bool {
        index >= self.start && index <= self.end && (index - self.start) % self.step == 0
    }

    fn len(&self) -> usize {
        ((self.end - self.start) / self.step) as usize + 1
    }
}

/// Array index set such as `0-99`, `1-9:2`, `1,3,5-7` with an optional `%N` throttle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayRange {
    segments: Vec<ArraySegment>,
    pub max_concurrent: Option<u32>,
}

impl ArrayRange {
    pub fn span(start: u32, end: u32) -> Self {
        Self {
            segments: vec![ArraySegment {
                start: start.min(end),
                end: start.max(end),
                step: 1,
            }],
            max_concurrent: None,
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        self.segments.iter().any(|seg| seg.contains(index))
    }

    /// Number of tasks the range launches; overlapping segments count once.
    pub fn task_count(&self) -> usize {
        if self.segments.len() == 1 {
            return self.segments[0].len();
        }
        let mut indices: Vec<u32> = self
            .segments
            .iter()
            .flat_map(|seg| (seg.start..=seg.end).step_by(seg.step as usize))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices.len()
    }
}

impl FromStr for ArrayRange {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = |why: &str| ValueError(format!("invalid array range '{s}': {why}"));
        let num = |part: &str| part.trim().parse::<u32>().map_err(|_| err("not a number"));

        let (body, max_concurrent) = match s.split_once('%') {
            Some((body, limit)) => (body, Some(num(limit)?)),
            None => (s, None),
        };
        if body.is_empty() {
            return Err(err("empty"));
        }

        let mut segments = Vec::new();
        for part in body.split(',') {
            let (range, step) = match part.split_once(':') {
                Some((range, step)) => (range, num(step)?),
                None => (part, 1),
            };
            if step == 0 {
                return Err(err("step must be positive"));
            }
            let (start, end) = match range.split_once('-') {
                Some((a, b)) => (num(a)?, num(b)?),
                None => {
                    let single = num(range)?;
                    (single, single)
                }
            };
            if start > end {
                return Err(err("start exceeds end"));
            }
            segments.push(ArraySegment { start, end, step });
        }
        Ok(Self {
            segments,
            max_concurrent,
        })
    }
}

impl fmt::Display for ArrayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|seg| match (seg.start == seg.end, seg.step) {
                (true, _) => seg.start.to_string(),
                (false, 1) => format!("{}-{}", seg.start, seg.end),
                (false, step) => format!("{}-{}:{}", seg.start, seg.end, step),
            })
            .collect();
        write!(f, "{}", parts.join(","))?;
        if let Some(limit) = self.max_concurrent {
            write!(f, "%{limit}")?;
        }
        Ok(())
    }
}

/// Resource requirements of one batch job, as expressed by `#SBATCH` directives.
///
/// Directives without a dedicated field are preserved verbatim in `extra` so a
/// parsed header renders back without loss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSpec {
    pub job_name: Option<String>,
    pub partition: Option<String>,
    pub nodes: Option<u32>,
    pub ntasks: Option<u32>,
    pub cpus_per_task: Option<u32>,
    pub memory: Option<MemorySize>,
    pub walltime: Option<Walltime>,
    pub gpus: Option<u32>,
    pub array: Option<ArrayRange>,
    pub output_log: Option<String>,
    pub error_log: Option<String>,
    pub extra: Vec<String>,
}

impl JobSpec {
    /// Reads the `#SBATCH` directives at the top of a batch script.
    ///
    /// Parsing stops at the first line that is neither blank, a comment, nor
    /// a directive, matching where the scheduler stops reading them.
    pub fn parse_directives(reader: &mut impl BufRead) -> Result<Self, JobSpecError> {
        let mut spec = JobSpec::default();
        for line_res in reader.lines() {
            let line = line_res?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Some(directive) = trimmed.strip_prefix(DIRECTIVE_PREFIX) else {
                if trimmed.starts_with('#') {
                    continue;
                }
                break;
            };
            spec.apply_directive(directive.trim())?;
        }
        Ok(spec)
    }

    fn apply_directive(&mut self, directive: &str) -> Result<(), JobSpecError> {
        let (key, value) = split_directive(directive);
        let require = |value: Option<&str>| {
            value.map(str::to_string).ok_or_else(|| JobSpecError::MissingValue {
                key: key.to_string(),
            })
        };

        match key {
            "--job-name" | "-J" => self.job_name = Some(require(value)?),
            "--partition" | "-p" => self.partition = Some(require(value)?),
            "--nodes" | "-N" => self.nodes = Some(parse_value(key, &require(value)?)?),
            "--ntasks" | "-n" => self.ntasks = Some(parse_value(key, &require(value)?)?),
            "--cpus-per-task" | "-c" => {
                self.cpus_per_task = Some(parse_value(key, &require(value)?)?)
            }
            "--mem" => self.memory = Some(parse_value(key, &require(value)?)?),
            "--time" | "-t" => self.walltime = Some(parse_value(key, &require(value)?)?),
            "--gpus" | "-G" | "--gpus-per-node" => {
                let raw = require(value)?;
                self.gpus = Some(parse_gpu_count(key, &raw)?);
            }
            "--gres" => {
                let raw = require(value)?;
                if raw.starts_with("gpu") {
                    self.gpus = Some(parse_gpu_count(key, &raw)?);
                } else {
                    self.extra.push(directive.to_string());
                }
            }
            "--array" | "-a" => self.array = Some(parse_value(key, &require(value)?)?),
            "--output" | "-o" => self.output_log = Some(require(value)?),
            "--error" | "-e" => self.error_log = Some(require(value)?),
            _ => self.extra.push(directive.to_string()),
        }
        Ok(())
    }

    /// Renders the specification as `#SBATCH` lines, one directive per line.
    pub fn render_directives(&self) -> String {
        let mut lines = Vec::new();
        let mut push = |key: &str, value: String| {
            lines.push(format!("{DIRECTIVE_PREFIX} --{key}={value}"));
        };
        if let Some(v) = &self.job_name {
            push("job-name", v.clone());
        }
        if let Some(v) = &self.partition {
            push("partition", v.clone());
        }
        if let Some(v) = self.nodes {
            push("nodes", v.to_string());
        }
        if let Some(v) = self.ntasks {
            push("ntasks", v.to_string());
        }
        if let Some(v) = self.cpus_per_task {
            push("cpus-per-task", v.to_string());
        }
        if let Some(v) = self.memory {
            push("mem", v.to_string());
        }
        if let Some(v) = self.walltime {
            push("time", v.to_string());
        }
        if let Some(v) = self.gpus {
            push("gres", format!("gpu:{v}"));
        }
        if let Some(v) = &self.array {
            push("array", v.to_string());
        }
        if let Some(v) = &self.output_log {
            push("output", v.clone());
        }
        if let Some(v) = &self.error_log {
            push("error", v.clone());
        }
        for directive in &self.extra {
            lines.push(format!("{DIRECTIVE_PREFIX} {directive}"));
        }
        let mut rendered = lines.join("\n");
        if !rendered.is_empty() {
            rendered.push('\n');
        }
        rendered
    }
}

fn split_directive(directive: &str) -> (&str, Option<&str>) {
    if let Some((key, value)) = directive.split_once('=') {
        if key.starts_with("--") && !key.contains(char::is_whitespace) {
            return (key, Some(value.trim()));
        }
    }
    match directive.split_once(char::is_whitespace) {
        Some((key, value)) => {
            let value = value.trim();
            (key, if value.is_empty() { None } else { Some(value) })
        }
        None => (directive, None),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, JobSpecError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| JobSpecError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Accepts `N`, `gpu:N` and `gpu:TYPE:N`.
fn parse_gpu_count(key: &str, value: &str) -> Result<u32, JobSpecError> {
    let count = value.rsplit(':').next().unwrap_or(value);
    let count = if count == "gpu" { "1" } else { count };
    parse_value(key, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn walltime_accepts_all_slurm_forms() {
        let cases = [
            ("30", 30 * 60),
            ("30:15", 30 * 60 + 15),
            ("24:00:00", 24 * 3600),
            ("2-12", 2 * 86400 + 12 * 3600),
            ("1-02:30", 86400 + 2 * 3600 + 30 * 60),
            ("1-00:00:05", 86400 + 5),
        ];
        for (input, expected) in cases {
            let walltime: Walltime = input.parse().unwrap();
            assert_eq!(walltime.as_seconds(), expected, "input {input}");
        }
        assert!("1:2:3:4".parse::<Walltime>().is_err());
        assert!("abc".parse::<Walltime>().is_err());
    }

    #[test]
    fn walltime_display_includes_days_only_when_needed() {
        assert_eq!(Walltime::from_seconds(3661).to_string(), "01:01:01");
        assert_eq!(Walltime::from_seconds(90061).to_string(), "1-01:01:01");
    }

    #[test]
    fn memory_units_convert_to_megabytes() {
        assert_eq!("500".parse::<MemorySize>().unwrap().as_megabytes(), 500);
        assert_eq!("32G".parse::<MemorySize>().unwrap().as_megabytes(), 32768);
        assert_eq!("1t".parse::<MemorySize>().unwrap().as_megabytes(), 1048576);
        assert_eq!("1500K".parse::<MemorySize>().unwrap().as_megabytes(), 2);
        assert!("12Q".parse::<MemorySize>().is_err());
        assert_eq!(MemorySize::from_megabytes(65536).to_string(), "64G");
        assert_eq!(MemorySize::from_megabytes(1500).to_string(), "1500M");
    }

    #[test]
    fn oversized_values_are_rejected_instead_of_wrapping() {
        let err = "20000000000000T".parse::<MemorySize>().unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!("18446744073709551615G".parse::<MemorySize>().is_err());
        assert!("999999999999999999-00:00:00".parse::<Walltime>().is_err());
        assert!("307445734561825861:00".parse::<Walltime>().is_err());
        assert_eq!(
            "18446744073709551615".parse::<MemorySize>().unwrap().as_megabytes(),
            u64::MAX
        );
    }

    #[test]
    fn array_ranges_parse_and_answer_membership() {
        let range: ArrayRange = "0-99%10".parse().unwrap();
        assert!(range.contains(0) && range.contains(99));
        assert!(!range.contains(100));
        assert_eq!(range.task_count(), 100);
        assert_eq!(range.max_concurrent, Some(10));

        let stepped: ArrayRange = "1-9:2".parse().unwrap();
        assert!(stepped.contains(5));
        assert!(!stepped.contains(4));
        assert_eq!(stepped.task_count(), 5);

        let list: ArrayRange = "1,3,5-7,6".parse().unwrap();
        assert_eq!(list.task_count(), 5);
        assert_eq!(list.to_string(), "1,3,5-7,6");

        assert!("5-1".parse::<ArrayRange>().is_err());
        assert!("1-5:0".parse::<ArrayRange>().is_err());
        assert!("".parse::<ArrayRange>().is_err());
    }

    #[test]
    fn parses_long_short_and_gres_directives() {
        let script = "#!/bin/bash\n\
#SBATCH --job-name=esmfold\n\
#SBATCH -p gpu\n\
#SBATCH --nodes 1\n\
#SBATCH -c 8\n\
#SBATCH --mem=64G\n\
#SBATCH --time=1-00:00:00\n\
#SBATCH --gres=gpu:a100:2\n\
#SBATCH --array=0-41%8\n\
#SBATCH --mail-type=END\n\
# a plain comment\n\
module load cuda\n\
#SBATCH --ignored=after-body\n";
        let spec = JobSpec::parse_directives(&mut Cursor::new(script)).unwrap();
        assert_eq!(spec.job_name.as_deref(), Some("esmfold"));
        assert_eq!(spec.partition.as_deref(), Some("gpu"));
        assert_eq!(spec.nodes, Some(1));
        assert_eq!(spec.cpus_per_task, Some(8));
        assert_eq!(spec.memory, Some(MemorySize::from_megabytes(65536)));
        assert_eq!(spec.walltime, Some(Walltime::from_seconds(86400)));
        assert_eq!(spec.gpus, Some(2));
        assert_eq!(spec.array.as_ref().map(ArrayRange::task_count), Some(42));
        assert_eq!(spec.extra, vec!["--mail-type=END".to_string()]);
    }

    #[test]
    fn rendered_directives_parse_back_identically() {
        let spec = JobSpec {
            job_name: Some("iupred".into()),
            partition: Some("cpu".into()),
            cpus_per_task: Some(4),
            memory: Some("16G".parse().unwrap()),
            walltime: Some("04:00:00".parse().unwrap()),
            gpus: Some(1),
            array: Some("1-10".parse().unwrap()),
            output_log: Some("logs/%A_%a.out".into()),
            extra: vec!["--exclusive".into()],
            ..Default::default()
        };
        let rendered = spec.render_directives();
        assert!(rendered.contains("#SBATCH --mem=16G\n"));
        assert!(rendered.contains("#SBATCH --gres=gpu:1\n"));
        let parsed = JobSpec::parse_directives(&mut Cursor::new(rendered)).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn missing_and_invalid_values_are_reported() {
        let err = JobSpec::parse_directives(&mut Cursor::new("#SBATCH -p\n")).unwrap_err();
        assert!(matches!(err, JobSpecError::MissingValue { .. }));

        let err =
            JobSpec::parse_directives(&mut Cursor::new("#SBATCH --nodes=many\n")).unwrap_err();
        assert!(matches!(err, JobSpecError::InvalidValue { .. }));
    }
}
