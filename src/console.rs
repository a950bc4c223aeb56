//! @ai:module:intent Interactive console prompts for run configuration
//! @ai:module:layer presentation
//! @ai:module:public_api Console, parse_timeout, parse_iterations, parse_extension
//! @ai:module:stateless false

use crate::config::{default_timeout_secs, BenchmarkConfig};
use crate::endpoint::short_name;
use std::io::{self, BufRead, Write};

/// @ai:intent Parse a timeout answer; empty keeps the current value
/// @ai:post returned value >= 1
/// @ai:effects pure
pub fn parse_timeout(input: &str, current: u64) -> (u64, Option<&'static str>) {
    let input = input.trim();

    if input.is_empty() {
        return (current.max(1), None);
    }

    match input.parse::<i64>() {
        Ok(secs) if secs < 1 => (1, Some("Using minimum timeout of 1 second")),
        Ok(secs) => (secs as u64, None),
        Err(_) => (
            default_timeout_secs(),
            Some("Invalid input. Using default timeout of 30 seconds."),
        ),
    }
}

/// @ai:intent Parse an iteration count answer; malformed or negative becomes 1
/// @ai:effects pure
pub fn parse_iterations(input: &str, current: u32) -> (u32, Option<&'static str>) {
    let input = input.trim();

    if input.is_empty() {
        return (current, None);
    }

    match input.parse::<i64>() {
        Ok(n) if n < 0 => (1, Some("Invalid value. Using default of 1 iteration.")),
        Ok(n) => (u32::try_from(n).unwrap_or(u32::MAX), None),
        Err(_) => (1, Some("Invalid input. Using default of 1 iteration.")),
    }
}

/// @ai:intent Parse an extension count; anything unusable adds nothing
/// @ai:effects pure
pub fn parse_extension(input: &str) -> (u32, Option<&'static str>) {
    match input.trim().parse::<u32>() {
        Ok(n) => (n, None),
        Err(_) if input.trim().is_empty() => (0, None),
        Err(_) => (0, Some("Invalid input. No iterations added.")),
    }
}

/// @ai:intent Line-oriented prompt session over any reader/writer pair
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    /// @ai:intent Console bound to the process stdin/stdout
    /// @ai:effects io
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// @ai:intent Print a question and read one answer line
    /// @ai:effects io
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }

    fn notice(&mut self, message: Option<&str>) -> io::Result<()> {
        if let Some(message) = message {
            writeln!(self.output, "{}", message)?;
        }
        Ok(())
    }

    /// @ai:intent Ask for the per-call timeout ceiling
    /// @ai:effects io
    pub fn prompt_timeout(&mut self, current: u64) -> io::Result<u64> {
        let answer = self.ask(&format!(
            "Maximum timeout in seconds (default: {}): ",
            current
        ))?;
        let (secs, notice) = parse_timeout(&answer, current);
        self.notice(notice)?;
        writeln!(self.output, "Using timeout: {} seconds", secs)?;
        Ok(secs)
    }

    /// @ai:intent Ask how many times to run each question against one endpoint
    /// @ai:effects io
    pub fn prompt_iterations(&mut self, id: &str, current: u32) -> io::Result<u32> {
        let answer = self.ask(&format!(
            "Number of iterations for {} [{}] (default: {}): ",
            short_name(id),
            id,
            current
        ))?;
        let (count, notice) = parse_iterations(&answer, current);
        self.notice(notice)?;

        if count == 0 {
            writeln!(self.output, "Skipping model: {}", id)?;
        }
        Ok(count)
    }

    /// @ai:intent Ask for extra iterations of the current endpoint/question pair
    /// @ai:effects io
    pub fn prompt_extension(&mut self, id: &str, question: usize) -> io::Result<u32> {
        writeln!(self.output)?;
        let answer = self.ask(&format!(
            "Additional iterations for {} question {}: ",
            id, question
        ))?;
        let (count, notice) = parse_extension(&answer);
        self.notice(notice)?;
        Ok(count)
    }

    /// @ai:intent Gather timeout and per-endpoint iteration counts into the config
    /// @ai:effects io, state:write
    pub fn configure(&mut self, config: &mut BenchmarkConfig) -> io::Result<()> {
        writeln!(self.output, "\n=== Benchmark Configuration ===")?;
        config.api.timeout_secs = self.prompt_timeout(config.api.timeout_secs)?;

        writeln!(
            self.output,
            "\nFor each model, specify how many times to run each question."
        )?;
        writeln!(self.output, "Enter 0 to skip a model completely.")?;

        for endpoint in config.endpoints.iter_mut() {
            endpoint.iterations = self.prompt_iterations(&endpoint.id, endpoint.iterations)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("", 45), (45, None));
        assert_eq!(parse_timeout(" 12 \n", 30).0, 12);
        assert_eq!(parse_timeout("0", 30).0, 1);
        assert_eq!(parse_timeout("-5", 30).0, 1);
        assert_eq!(parse_timeout("soon", 45).0, 30);
        assert!(parse_timeout("soon", 45).1.is_some());
    }

    #[test]
    fn test_parse_iterations() {
        assert_eq!(parse_iterations("\n", 2), (2, None));
        assert_eq!(parse_iterations("0", 1), (0, None));
        assert_eq!(parse_iterations("7", 1), (7, None));
        assert_eq!(parse_iterations("-1", 3).0, 1);
        assert_eq!(parse_iterations("many", 3).0, 1);
    }

    #[test]
    fn test_parse_extension() {
        assert_eq!(parse_extension("3\n"), (3, None));
        assert_eq!(parse_extension(""), (0, None));
        assert_eq!(parse_extension("-2").0, 0);
        assert!(parse_extension("x").1.is_some());
    }

    #[test]
    fn test_configure_reads_answers_in_order() {
        let answers = "10\n2\n0\nabc\n\n";
        let mut output = Vec::new();
        let mut config = BenchmarkConfig::default();

        Console::new(answers.as_bytes(), &mut output)
            .configure(&mut config)
            .unwrap();

        assert_eq!(config.api.timeout_secs, 10);
        let counts: Vec<u32> = config.endpoints.iter().map(|e| e.iterations).collect();
        assert_eq!(counts, vec![2, 0, 1, 1]);

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Skipping model: eu.amazon.nova-lite-v1:0"));
        assert!(transcript.contains("Number of iterations for anthropic"));
    }

    #[test]
    fn test_configure_at_end_of_input_keeps_defaults() {
        let mut output = Vec::new();
        let mut config = BenchmarkConfig::default();

        Console::new("".as_bytes(), &mut output)
            .configure(&mut config)
            .unwrap();

        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.endpoints.iter().all(|e| e.iterations == 1));
    }
}
