//! @ai:module:intent Sequential endpoint x prompt x iteration run loop
//! @ai:module:layer application
//! @ai:module:public_api RunController
//! @ai:module:stateless false

use crate::corpus::Prompt;
use crate::endpoint::{Endpoint, EndpointPlan};
use crate::runner::client::InferenceTransport;
use crate::runner::extension::{CallPosition, ExtensionSource};
use crate::runner::invoker::EndpointInvoker;
use crate::sink::{ResultRecord, ResultSink};
use anyhow::Result;
use std::time::Duration;

/// @ai:intent Drives every call of a run and streams each outcome to the sink
///
/// Exactly one call is in flight at a time. Each record is durably appended
/// before the cooldown and before the next call starts.
pub struct RunController<T: InferenceTransport, X: ExtensionSource> {
    invoker: EndpointInvoker<T>,
    plans: Vec<EndpointPlan>,
    cooldown: Duration,
    extension: X,
    sink: ResultSink,
    records: Vec<ResultRecord>,
}

impl<T: InferenceTransport, X: ExtensionSource> RunController<T, X> {
    /// @ai:intent Create a controller owning the invoker, sink and extension source
    /// @ai:effects pure
    pub fn new(
        invoker: EndpointInvoker<T>,
        plans: Vec<EndpointPlan>,
        cooldown: Duration,
        extension: X,
        sink: ResultSink,
    ) -> Self {
        Self {
            invoker,
            plans,
            cooldown,
            extension,
            sink,
            records: Vec::new(),
        }
    }

    /// @ai:intent Number of regular calls a run over `prompts` questions will make
    /// @ai:effects pure
    pub fn planned_calls(&self, prompts: usize) -> u64 {
        self.plans
            .iter()
            .map(|p| p.iterations as u64 * prompts as u64)
            .sum()
    }

    /// Records emitted so far, in completion order.
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn sink(&self) -> &ResultSink {
        &self.sink
    }

    /// @ai:intent Run every enabled endpoint over every prompt
    /// @ai:pre the sink header has been written
    /// @ai:post records().len() == sink().appended()
    /// @ai:effects network, fs:write, time
    pub async fn run(&mut self, prompts: &[Prompt]) -> Result<usize> {
        let before = self.records.len();
        let plans = self.plans.clone();
        let total_questions = prompts.len();

        for plan in &plans {
            if !plan.is_enabled() {
                tracing::info!("Skipping model: {}", plan.endpoint.id);
                continue;
            }

            tracing::info!(
                "Testing model: {} with {} iterations per question",
                plan.endpoint.id,
                plan.iterations
            );

            for prompt in prompts {
                tracing::info!("  Question {}/{}", prompt.index, total_questions);
                let mut next_extra = plan.iterations + 1;

                for iteration in 1..=plan.iterations {
                    println!(
                        "\nRunning {} - Question {}/{} - Iteration {}/{}",
                        plan.endpoint.id, prompt.index, total_questions, iteration, plan.iterations
                    );
                    self.execute(&plan.endpoint, prompt, iteration).await?;

                    let extra = self.extension.poll_extension(&CallPosition {
                        endpoint: &plan.endpoint,
                        question: prompt.index,
                        iteration,
                    })?;

                    if extra > 0 {
                        tracing::info!(
                            "Adding {} iterations for {} question {}",
                            extra,
                            plan.endpoint.id,
                            prompt.index
                        );

                        for n in 1..=extra {
                            println!(
                                "\nRunning {} - Question {}/{} - Extra iteration {}/{}",
                                plan.endpoint.id, prompt.index, total_questions, n, extra
                            );
                            self.execute(&plan.endpoint, prompt, next_extra).await?;
                            next_extra += 1;
                        }

                        println!("\nResuming regular iterations");
                    }
                }
            }
        }

        Ok(self.records.len() - before)
    }

    /// @ai:intent Invoke once, persist the record, then cool down
    /// @ai:effects network, fs:write, time
    async fn execute(&mut self, endpoint: &Endpoint, prompt: &Prompt, iteration: u32) -> Result<()> {
        println!("Sending request to {}...", endpoint.id);
        println!(
            "Prompt length: {} characters (~{} tokens)",
            prompt.char_len(),
            prompt.estimated_tokens()
        );

        let result = self.invoker.invoke(endpoint, prompt).await;

        if let Some(e) = result.error() {
            println!("ERROR: Failed to invoke {}: {}", endpoint.id, e);
        }

        if result.reached_timeout {
            println!(
                "WARNING: Request reached timeout limit of {}s",
                self.invoker.timeout().as_secs()
            );
        }

        let record = ResultRecord::from_invocation(&endpoint.id, prompt.index, iteration, &result);

        tracing::info!(
            "    Iteration {}: Duration: {:.2}s, Tokens/min: {:.2}, Success: {}",
            iteration,
            record.duration,
            record.tokens_per_minute,
            record.success
        );
        println!(
            "  Duration: {:.2}s, Tokens/min: {:.2}, Success: {}",
            record.duration, record.tokens_per_minute, record.success
        );
        println!(
            "  Tokens sent: {}, Tokens received: {}",
            record.input_tokens, record.output_tokens
        );

        self.sink.append(&record)?;
        self.records.push(record);

        if !self.cooldown.is_zero() {
            tokio::time::sleep(self.cooldown).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusLoader, ReferenceText};
    use crate::error::{Interrupted, InvocationError};
    use crate::runner::client::MockTransport;
    use crate::runner::extension::{NoExtension, ScriptedExtension};
    use crate::runner::invoker::DocumentSource;
    use crate::sink::{read_records, RESULT_COLUMNS};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    const CLAUDE: &str = "eu.anthropic.claude-3-7-sonnet-20250219-v1:0";
    const NOVA: &str = "eu.amazon.nova-lite-v1:0";
    const RERANK: &str = "cohere.rerank-v3-5:0";

    fn plan(id: &str, iterations: u32) -> EndpointPlan {
        EndpointPlan {
            endpoint: Endpoint::classify(id, None).unwrap(),
            iterations,
        }
    }

    fn prompts(count: usize) -> Vec<Prompt> {
        let questions: Vec<String> = (1..=count).map(|i| format!("Question {}?", i)).collect();
        let reference = ReferenceText::new("context ".repeat(400));
        CorpusLoader::build_prompts(&questions.join("\n"), &reference)
    }

    fn controller<X: ExtensionSource>(
        mock: Arc<MockTransport>,
        plans: Vec<EndpointPlan>,
        extension: X,
        dir: &TempDir,
    ) -> RunController<MockTransport, X> {
        let invoker = EndpointInvoker::new(
            mock,
            Duration::from_secs(30),
            DocumentSource::Fixed(vec!["a".to_string(), "b".to_string()]),
        );
        let mut sink = ResultSink::open(&dir.path().join("benchmark.csv")).unwrap();
        sink.write_header(&RESULT_COLUMNS).unwrap();

        RunController::new(invoker, plans, Duration::ZERO, extension, sink)
    }

    #[tokio::test]
    async fn test_record_count_matches_plan() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let plans = vec![plan(CLAUDE, 2), plan(NOVA, 0), plan(RERANK, 3)];
        let mut controller = controller(mock.clone(), plans, NoExtension, &temp);

        let emitted = controller.run(&prompts(2)).await.unwrap();

        assert_eq!(controller.planned_calls(2), 10);
        assert_eq!(emitted, 10);
        assert_eq!(mock.call_count(), 10);
        assert!(controller.records().iter().all(|r| r.model_id != NOVA));
        assert!(mock.calls().iter().all(|(id, _)| id != NOVA));
    }

    #[tokio::test]
    async fn test_loop_order_is_endpoint_question_iteration() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let mut controller =
            controller(mock, vec![plan(CLAUDE, 2), plan(RERANK, 1)], NoExtension, &temp);

        controller.run(&prompts(2)).await.unwrap();

        let order: Vec<(&str, usize, u32)> = controller
            .records()
            .iter()
            .map(|r| (r.model_id.as_str(), r.question_id, r.iteration))
            .collect();

        assert_eq!(
            order,
            vec![
                (CLAUDE, 1, 1),
                (CLAUDE, 1, 2),
                (CLAUDE, 2, 1),
                (CLAUDE, 2, 2),
                (RERANK, 1, 1),
                (RERANK, 2, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_yields_one_failed_record_and_run_continues() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::scripted(vec![
            Err(InvocationError::Timeout("read timed out".to_string())),
            Ok(serde_json::json!({ "unexpected": true })),
        ]));
        let mut controller = controller(mock, vec![plan(CLAUDE, 3)], NoExtension, &temp);

        controller.run(&prompts(1)).await.unwrap();

        let records = controller.records();
        assert_eq!(records.len(), 3);

        for failed in &records[..2] {
            assert!(!failed.success);
            assert_eq!(failed.output_tokens, 0);
            assert!(failed.duration >= 0.0);
            assert_eq!(failed.total_tokens, failed.input_tokens);
        }
        assert!(records[2].success);
        assert!(records[2].output_tokens > 0);
    }

    #[tokio::test]
    async fn test_extension_adds_calls_for_same_pair() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let extension = ScriptedExtension::new().after(CLAUDE, 1, 1, 2);
        let mut controller =
            controller(mock.clone(), vec![plan(CLAUDE, 2), plan(NOVA, 1)], extension, &temp);

        let emitted = controller.run(&prompts(2)).await.unwrap();

        assert_eq!(controller.planned_calls(2), 6);
        assert_eq!(emitted, 8);
        assert_eq!(mock.call_count(), 8);

        let order: Vec<(&str, usize, u32)> = controller
            .records()
            .iter()
            .map(|r| (r.model_id.as_str(), r.question_id, r.iteration))
            .take(5)
            .collect();

        assert_eq!(
            order,
            vec![
                (CLAUDE, 1, 1),
                (CLAUDE, 1, 3),
                (CLAUDE, 1, 4),
                (CLAUDE, 1, 2),
                (CLAUDE, 2, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_keyboard_interrupt_stops_run_after_persisting() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let extension = ScriptedExtension::new().interrupt_after(CLAUDE, 1, 2);
        let mut controller =
            controller(mock.clone(), vec![plan(CLAUDE, 3), plan(NOVA, 1)], extension, &temp);

        let err = controller.run(&prompts(2)).await.unwrap_err();

        assert!(err.downcast_ref::<Interrupted>().is_some());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(controller.records().len(), 2);
        assert_eq!(read_records(controller.sink().path()).unwrap(), controller.records());
    }

    #[tokio::test]
    async fn test_sink_matches_in_memory_records() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let mut controller =
            controller(mock, vec![plan(CLAUDE, 1), plan(RERANK, 2)], NoExtension, &temp);

        controller.run(&prompts(3)).await.unwrap();

        let on_disk = read_records(controller.sink().path()).unwrap();
        assert_eq!(on_disk, controller.records());
        assert_eq!(controller.sink().appended(), 9);
    }

    #[tokio::test]
    async fn test_interrupted_run_keeps_completed_records() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new().with_latency(Duration::from_millis(40)));
        let mut controller = controller(mock, vec![plan(NOVA, 10)], NoExtension, &temp);
        let prompts = prompts(1);

        let outcome =
            tokio::time::timeout(Duration::from_millis(150), controller.run(&prompts)).await;
        assert!(outcome.is_err());

        let completed = controller.records().len();
        assert!(completed >= 1 && completed < 10);

        let on_disk = read_records(controller.sink().path()).unwrap();
        assert_eq!(on_disk.len(), completed);
        assert_eq!(on_disk, controller.records());
    }

    #[tokio::test]
    async fn test_no_prompts_means_no_calls() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new());
        let mut controller = controller(mock.clone(), vec![plan(CLAUDE, 5)], NoExtension, &temp);

        assert_eq!(controller.run(&[]).await.unwrap(), 0);
        assert_eq!(mock.call_count(), 0);
    }
}
