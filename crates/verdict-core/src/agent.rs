//! The agent actor — owns the engine triad and serialises every call through
//! a mailbox, so one decision cycle is in flight at a time.

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::events::{
    AgentState, DecisionData, DecisionEvent, DegradedData, SimulationData, StatusData,
};
use crate::profile::{DecisionContext, ExperienceOutcome, TraitAdjustments};
use crate::reasoning::{Decision, ReasoningEngine, Situation};
use crate::risk::{
    AssessmentSummary, NewRisk, RiskAssessment, RiskDashboard, RiskSelection, RiskSummary,
    SimulationResult,
};

const MAILBOX_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("agent has stopped")]
    Stopped,
}

type Reply<T> = oneshot::Sender<Result<T, EngineError>>;

/// Messages that can be sent TO the agent
#[derive(Debug)]
pub enum AgentCommand {
    Decide {
        situation: Box<Situation>,
        context: DecisionContext,
        reply: Reply<Decision>,
    },
    AssessRisks {
        context: DecisionContext,
        selection: RiskSelection,
        reply: Reply<RiskAssessment>,
    },
    AddRisk {
        risk: NewRisk,
        reply: Reply<String>,
    },
    Simulate {
        selection: RiskSelection,
        trials: Option<usize>,
        reply: Reply<SimulationResult>,
    },
    RecordOutcome {
        decision_id: String,
        outcome: ExperienceOutcome,
        reply: Reply<TraitAdjustments>,
    },
    Dashboard {
        reply: oneshot::Sender<RiskDashboard>,
    },
    Stop,
}

/// The Agent — runs as an independent tokio task.
pub struct Agent {
    engine: ReasoningEngine,
    event_tx: broadcast::Sender<DecisionEvent>,
    decisions: usize,
}

impl Agent {
    pub fn new(engine: ReasoningEngine) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            event_tx,
            decisions: 0,
        }
    }

    /// Start the mailbox loop. The engine is handed back when the agent stops.
    pub fn spawn(self) -> AgentHandle {
        let (command_tx, command_rx) = mpsc::channel(MAILBOX_CAPACITY);
        let event_tx = self.event_tx.clone();
        let task = tokio::spawn(self.run(command_rx));
        AgentHandle {
            command_tx,
            event_tx,
            task,
        }
    }

    fn broadcast(&self, event: DecisionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn status(&self, state: AgentState) {
        self.broadcast(DecisionEvent::Status(StatusData {
            state,
            decisions: self.decisions,
        }));
    }

    fn degraded(&self, stage: &str, message: String) {
        warn!("{} degraded: {}", stage, message);
        self.broadcast(DecisionEvent::Degraded(DegradedData {
            stage: stage.to_string(),
            message,
        }));
    }

    async fn run(mut self, mut command_rx: mpsc::Receiver<AgentCommand>) -> ReasoningEngine {
        info!("Agent is ready.");
        self.status(AgentState::Idle);

        while let Some(cmd) = command_rx.recv().await {
            match cmd {
                AgentCommand::Decide {
                    situation,
                    context,
                    reply,
                } => {
                    self.status(AgentState::Deciding);
                    let result = self.engine.decide(&situation, &context);
                    if let Ok(decision) = &result {
                        self.decisions += 1;
                        if decision.risk_assessment.degraded {
                            self.degraded("decision risk", format!("decision {}", decision.id));
                        }
                        self.broadcast(DecisionEvent::Decision(DecisionData::from(decision)));
                    }
                    let _ = reply.send(result);
                }
                AgentCommand::AssessRisks {
                    context,
                    selection,
                    reply,
                } => {
                    self.status(AgentState::Assessing);
                    let result = self.engine.risk_mut().assess_risks(&context, &selection);
                    if let Ok(assessment) = &result {
                        self.broadcast(DecisionEvent::Assessment(AssessmentSummary::from(assessment)));
                    }
                    let _ = reply.send(result);
                }
                AgentCommand::AddRisk { risk, reply } => {
                    let result = self.engine.risk_mut().add_risk(risk);
                    if let Ok(id) = &result {
                        if let Some(risk) = self.engine.risk().get_risk(id) {
                            self.broadcast(DecisionEvent::RiskRegistered(RiskSummary::from(risk)));
                        }
                    }
                    let _ = reply.send(result);
                }
                AgentCommand::Simulate {
                    selection,
                    trials,
                    reply,
                } => {
                    self.status(AgentState::Simulating);
                    let result = self
                        .engine
                        .risk()
                        .simulate_risk_scenarios_parallel(&selection, trials)
                        .await;
                    if let Ok(sim) = &result {
                        match &sim.error {
                            Some(e) => self.degraded("simulation", e.clone()),
                            None => self.broadcast(DecisionEvent::Simulation(SimulationData::from(sim))),
                        }
                    }
                    let _ = reply.send(result);
                }
                AgentCommand::RecordOutcome {
                    decision_id,
                    outcome,
                    reply,
                } => {
                    let _ = reply.send(self.engine.record_outcome(&decision_id, outcome));
                }
                AgentCommand::Dashboard { reply } => {
                    let dashboard = self.engine.risk().risk_dashboard();
                    if !dashboard.errors.is_empty() {
                        self.degraded("dashboard", dashboard.errors.join("; "));
                    }
                    let _ = reply.send(dashboard);
                }
                AgentCommand::Stop => break,
            }
            self.status(AgentState::Idle);
        }

        info!("Agent is shutting down after {} decision(s).", self.decisions);
        self.engine
    }
}

/// Client side of an Agent's mailbox.
pub struct AgentHandle {
    command_tx: mpsc::Sender<AgentCommand>,
    event_tx: broadcast::Sender<DecisionEvent>,
    task: JoinHandle<ReasoningEngine>,
}

impl AgentHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<DecisionEvent> {
        self.event_tx.subscribe()
    }

    pub fn command_sender(&self) -> mpsc::Sender<AgentCommand> {
        self.command_tx.clone()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> AgentCommand,
    ) -> Result<T, AgentError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(make(tx))
            .await
            .map_err(|_| AgentError::Stopped)?;
        let result = rx.await.map_err(|_| AgentError::Stopped)?;
        Ok(result?)
    }

    pub async fn decide(
        &self,
        situation: Situation,
        context: DecisionContext,
    ) -> Result<Decision, AgentError> {
        self.request(|reply| AgentCommand::Decide {
            situation: Box::new(situation),
            context,
            reply,
        })
        .await
    }

    pub async fn assess_risks(
        &self,
        context: DecisionContext,
        selection: RiskSelection,
    ) -> Result<RiskAssessment, AgentError> {
        self.request(|reply| AgentCommand::AssessRisks {
            context,
            selection,
            reply,
        })
        .await
    }

    pub async fn add_risk(&self, risk: NewRisk) -> Result<String, AgentError> {
        self.request(|reply| AgentCommand::AddRisk { risk, reply }).await
    }

    pub async fn simulate(
        &self,
        selection: RiskSelection,
        trials: Option<usize>,
    ) -> Result<SimulationResult, AgentError> {
        self.request(|reply| AgentCommand::Simulate {
            selection,
            trials,
            reply,
        })
        .await
    }

    pub async fn record_outcome(
        &self,
        decision_id: &str,
        outcome: ExperienceOutcome,
    ) -> Result<TraitAdjustments, AgentError> {
        self.request(|reply| AgentCommand::RecordOutcome {
            decision_id: decision_id.to_string(),
            outcome,
            reply,
        })
        .await
    }

    pub async fn dashboard(&self) -> Result<RiskDashboard, AgentError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(AgentCommand::Dashboard { reply: tx })
            .await
            .map_err(|_| AgentError::Stopped)?;
        rx.await.map_err(|_| AgentError::Stopped)
    }

    /// Stop the loop and take the engine back.
    pub async fn stop(self) -> Result<ReasoningEngine, AgentError> {
        let _ = self.command_tx.send(AgentCommand::Stop).await;
        self.task.await.map_err(|_| AgentError::Stopped)
    }
}
