use async_trait::async_trait;
use chorus::{
    Agent, AgentFailure, AgentResult, ChatMode, ChatState, ConfigurationError, GroupChat,
    RunStatus, SharedContext, TerminationPolicy, LAST_OUTPUT_KEY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct EchoAgent {
    name: String,
    reply: String,
}

impl EchoAgent {
    fn boxed(name: &str, reply: &str) -> Box<dyn Agent> {
        Box::new(Self {
            name: name.to_string(),
            reply: reply.to_string(),
        })
    }
}

#[async_trait]
impl Agent for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, _ctx: &mut SharedContext, _input: Option<&str>) -> AgentResult {
        Ok(self.reply.clone())
    }
}

/// Appends its own name to the threaded input, exposing pipeline threading.
struct AppendAgent {
    name: String,
}

#[async_trait]
impl Agent for AppendAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, _ctx: &mut SharedContext, input: Option<&str>) -> AgentResult {
        Ok(format!("{} {}", input.unwrap_or("-"), self.name))
    }
}

struct FailingAgent {
    name: String,
}

#[async_trait]
impl Agent for FailingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, _ctx: &mut SharedContext, _input: Option<&str>) -> AgentResult {
        Err(AgentFailure::Contract("synthetic failure".into()))
    }
}

/// Succeeds until the shared call counter hits `fail_at` (1-based).
struct CountedAgent {
    name: String,
    calls: Arc<AtomicUsize>,
    fail_at: Option<usize>,
}

#[async_trait]
impl Agent for CountedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, _ctx: &mut SharedContext, _input: Option<&str>) -> AgentResult {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == Some(call) {
            Err(AgentFailure::Contract(format!("failed on call {}", call)))
        } else {
            Ok(format!("{} call {}", self.name, call))
        }
    }
}

fn unbounded_policy() -> TerminationPolicy {
    TerminationPolicy::max_iterations(1_000).unwrap()
}

#[tokio::test]
async fn pipeline_records_every_agent_in_registration_order() {
    let agents = vec![
        EchoAgent::boxed("a", "one"),
        EchoAgent::boxed("b", "two"),
        EchoAgent::boxed("c", "three"),
    ];
    let mut chat =
        GroupChat::new("pipeline", agents, ChatMode::Pipeline, unbounded_policy()).unwrap();

    let record = chat.run().await.unwrap();

    assert_eq!(record.turns.len(), 3);
    let order: Vec<&str> = record.turns.iter().map(|t| t.agent.as_str()).collect();
    assert_eq!(order, ["a", "b", "c"]);
    assert_eq!(record.status, Some(RunStatus::MaxIterationsReached));
    assert_eq!(
        chat.state(),
        ChatState::Finished(RunStatus::MaxIterationsReached)
    );
}

#[tokio::test]
async fn pipeline_threads_payloads_and_publishes_last_output() {
    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(AppendAgent { name: "a".into() }),
        Box::new(AppendAgent { name: "b".into() }),
    ];
    let mut chat = GroupChat::new("thread", agents, ChatMode::Pipeline, unbounded_policy())
        .unwrap()
        .with_input("seed");

    let record = chat.run().await.unwrap();

    assert_eq!(record.final_output(), Some("seed a b"));
    assert_eq!(chat.context().get_str(LAST_OUTPUT_KEY), Some("seed a b"));
    // The first agent saw the seed, the second saw the first's payload.
    assert_eq!(record.turns[0].payload(), Some("seed a"));
}

#[tokio::test]
async fn pipeline_fail_fast_skips_remaining_agents() {
    let agents: Vec<Box<dyn Agent>> = vec![
        EchoAgent::boxed("a", "ok"),
        Box::new(FailingAgent { name: "b".into() }),
        EchoAgent::boxed("c", "never"),
    ];
    let mut chat =
        GroupChat::new("fail-fast", agents, ChatMode::Pipeline, unbounded_policy()).unwrap();

    let record = chat.run().await.unwrap();

    assert_eq!(record.turns.len(), 2);
    assert!(record.turns[0].succeeded());
    assert!(!record.turns[1].succeeded());
    assert_eq!(record.status, Some(RunStatus::Failed));
}

#[tokio::test]
async fn pipeline_best_effort_runs_every_agent_past_a_failure() {
    let agents: Vec<Box<dyn Agent>> = vec![
        EchoAgent::boxed("a", "ok"),
        Box::new(FailingAgent { name: "b".into() }),
        EchoAgent::boxed("c", "still ran"),
    ];
    let policy = unbounded_policy().with_fail_fast(false);
    let mut chat = GroupChat::new("best-effort", agents, ChatMode::Pipeline, policy).unwrap();

    let record = chat.run().await.unwrap();

    assert_eq!(record.turns.len(), 3);
    assert!(!record.turns[1].succeeded());
    assert_eq!(record.turns[2].payload(), Some("still ran"));
    assert_eq!(record.status, Some(RunStatus::MaxIterationsReached));
}

#[tokio::test]
async fn round_robin_executes_a_b_a_then_resumes_at_b() {
    let agents = vec![EchoAgent::boxed("a", "ra"), EchoAgent::boxed("b", "rb")];
    let mut chat =
        GroupChat::new("rr", agents, ChatMode::RoundRobin, unbounded_policy()).unwrap();

    let record = chat.run_turns(3).await.unwrap();
    let order: Vec<&str> = record.turns.iter().map(|t| t.agent.as_str()).collect();
    assert_eq!(order, ["a", "b", "a"]);

    let record = chat.run_turns(1).await.unwrap();
    assert_eq!(record.turns.len(), 4);
    assert_eq!(record.turns[3].agent, "b");
    assert_eq!(record.cycles, 2);
}

#[tokio::test]
async fn round_robin_single_turns_equal_one_batched_call() {
    let build = || {
        GroupChat::new(
            "rr-equiv",
            vec![EchoAgent::boxed("a", "ra"), EchoAgent::boxed("b", "rb")],
            ChatMode::RoundRobin,
            unbounded_policy(),
        )
        .unwrap()
    };

    let mut batched = build();
    let batched_record = batched.run_turns(5).await.unwrap();

    let mut stepped = build();
    let mut stepped_record = stepped.run_turns(1).await.unwrap();
    for _ in 0..4 {
        stepped_record = stepped.run_turns(1).await.unwrap();
    }

    assert_eq!(batched_record.turns.len(), stepped_record.turns.len());
    for (a, b) in batched_record.turns.iter().zip(stepped_record.turns.iter()) {
        assert_eq!(a.agent, b.agent);
        assert_eq!(a.turn, b.turn);
        assert_eq!(a.payload(), b.payload());
    }
    assert_eq!(batched_record.status, stepped_record.status);
    assert_eq!(batched_record.cycles, stepped_record.cycles);
}

#[tokio::test]
async fn round_robin_policy_bounds_requested_turns() {
    let agents = vec![EchoAgent::boxed("a", "ra"), EchoAgent::boxed("b", "rb")];
    let policy = TerminationPolicy::max_iterations(3).unwrap();
    let mut chat = GroupChat::new("rr-bounded", agents, ChatMode::RoundRobin, policy).unwrap();

    let record = chat.run_turns(10).await.unwrap();

    assert_eq!(record.turns.len(), 3);
    assert_eq!(record.status, Some(RunStatus::MaxIterationsReached));
    assert!(matches!(
        chat.run_turns(1).await.unwrap_err(),
        ConfigurationError::AlreadyFinished
    ));
}

#[tokio::test]
async fn refinement_consults_predicate_once_per_cycle() {
    // Two agents, five individual turns (the fifth fails, stopping the run
    // mid-cycle): the predicate must have run exactly twice, once per
    // completed cycle.
    let calls = Arc::new(AtomicUsize::new(0));
    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(CountedAgent {
            name: "a".into(),
            calls: Arc::clone(&calls),
            fail_at: Some(5),
        }),
        Box::new(CountedAgent {
            name: "b".into(),
            calls: Arc::clone(&calls),
            fail_at: None,
        }),
    ];

    let evaluations = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&evaluations);
    let policy = TerminationPolicy::max_iterations(10)
        .unwrap()
        .with_convergence(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            false
        });

    let mut chat = GroupChat::new("refine", agents, ChatMode::Refinement, policy).unwrap();
    let record = chat.run().await.unwrap();

    assert_eq!(record.turns.len(), 5);
    assert_eq!(record.cycles, 2);
    assert_eq!(evaluations.load(Ordering::SeqCst), 2);
    assert_eq!(record.status, Some(RunStatus::Failed));
}

#[tokio::test]
async fn refinement_budget_counts_cycles_not_turns() {
    let agents = vec![EchoAgent::boxed("a", "ra"), EchoAgent::boxed("b", "rb")];
    let policy = TerminationPolicy::max_iterations(3).unwrap();
    let mut chat = GroupChat::new("refine-budget", agents, ChatMode::Refinement, policy).unwrap();

    let record = chat.run().await.unwrap();

    assert_eq!(record.cycles, 3);
    assert_eq!(record.turns.len(), 6);
    assert_eq!(record.status, Some(RunStatus::MaxIterationsReached));
}

#[tokio::test]
async fn missing_feedback_never_reads_as_convergence() {
    // No agent ever writes the feedback key; a predicate keyed on it must
    // keep the loop running to its budget instead of converging at once.
    let agents = vec![EchoAgent::boxed("quiet", "no feedback here")];
    let policy = TerminationPolicy::max_iterations(2)
        .unwrap()
        .with_convergence(|_, ctx| {
            ctx.get_str("feedback")
                .map(|feedback| feedback == "clean")
                .unwrap_or(false)
        });
    let mut chat = GroupChat::new("no-feedback", agents, ChatMode::Refinement, policy).unwrap();

    let record = chat.run().await.unwrap();

    assert_eq!(record.status, Some(RunStatus::MaxIterationsReached));
    assert_eq!(record.cycles, 2);
}

#[tokio::test]
async fn policy_without_stopping_condition_fails_construction_for_every_mode() {
    for mode in [ChatMode::Pipeline, ChatMode::RoundRobin, ChatMode::Refinement] {
        let policy = TerminationPolicy::new(None, None);
        assert_eq!(
            policy.unwrap_err(),
            ConfigurationError::NoStoppingCondition,
            "mode {:?} must reject a policy with no stopping condition",
            mode
        );
    }
}

#[tokio::test]
async fn entry_points_are_mode_checked() {
    let mut rr = GroupChat::new(
        "rr",
        vec![EchoAgent::boxed("a", "ra")],
        ChatMode::RoundRobin,
        unbounded_policy(),
    )
    .unwrap();
    assert!(matches!(
        rr.run().await.unwrap_err(),
        ConfigurationError::WrongMode(_)
    ));

    let mut pipeline = GroupChat::new(
        "pipe",
        vec![EchoAgent::boxed("a", "ra")],
        ChatMode::Pipeline,
        unbounded_policy(),
    )
    .unwrap();
    assert!(matches!(
        pipeline.run_turns(1).await.unwrap_err(),
        ConfigurationError::WrongMode(_)
    ));
}

#[tokio::test]
async fn empty_agent_list_is_rejected() {
    let err = GroupChat::new(
        "empty",
        Vec::new(),
        ChatMode::Pipeline,
        unbounded_policy(),
    )
    .err()
    .unwrap();
    assert_eq!(err, ConfigurationError::NoAgents);
}

#[tokio::test]
async fn finished_chat_rejects_another_run() {
    let mut chat = GroupChat::new(
        "once",
        vec![EchoAgent::boxed("a", "ra")],
        ChatMode::Pipeline,
        unbounded_policy(),
    )
    .unwrap();

    chat.run().await.unwrap();
    assert!(matches!(
        chat.run().await.unwrap_err(),
        ConfigurationError::AlreadyFinished
    ));
}

#[tokio::test]
async fn stop_handle_aborts_before_the_first_turn() {
    let mut chat = GroupChat::new(
        "stoppable",
        vec![EchoAgent::boxed("a", "ra"), EchoAgent::boxed("b", "rb")],
        ChatMode::RoundRobin,
        unbounded_policy(),
    )
    .unwrap();

    chat.stop_handle().stop();
    let record = chat.run_turns(5).await.unwrap();

    assert!(record.turns.is_empty());
    assert_eq!(record.status, Some(RunStatus::Failed));
}

#[tokio::test]
async fn stop_handle_halts_a_resumed_round_robin() {
    let mut chat = GroupChat::new(
        "stop-mid",
        vec![EchoAgent::boxed("a", "ra"), EchoAgent::boxed("b", "rb")],
        ChatMode::RoundRobin,
        unbounded_policy(),
    )
    .unwrap();
    let handle = chat.stop_handle();

    let record = chat.run_turns(1).await.unwrap();
    assert_eq!(record.turns.len(), 1);
    assert_eq!(record.status, None);

    handle.stop();
    let record = chat.run_turns(3).await.unwrap();

    // The abort lands before the next turn; the earlier turn survives.
    assert_eq!(record.turns.len(), 1);
    assert_eq!(record.status, Some(RunStatus::Failed));
}

#[tokio::test]
async fn expired_deadline_aborts_before_the_next_turn() {
    let mut chat = GroupChat::new(
        "deadline",
        vec![EchoAgent::boxed("a", "ra")],
        ChatMode::Pipeline,
        unbounded_policy(),
    )
    .unwrap()
    .with_deadline(Duration::ZERO);

    let record = chat.run().await.unwrap();

    assert!(record.turns.is_empty());
    assert_eq!(record.status, Some(RunStatus::Failed));
}
