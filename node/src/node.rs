//! Relay node: wires configuration, chain, cluster surface and loops.

use std::sync::Arc;

use warden_announcer::{Announcer, StepOutcome};
use warden_chain::{ChainClient, GatewayClient};
use warden_cluster::{
    CommandRestart, ConfigSurface, ConfigSynchronizer, ManagerClient, NoopRestart,
    RestartTrigger, ServiceJsonFile,
};
use warden_rpc::{StatusBoard, StatusServer};
use warden_trust::{TrustEvaluator, TrustSet};
use warden_utils::{Clock, TokioClock};

use crate::config::SurfaceSelection;
use crate::{NodeConfig, NodeError, NodeMetrics, ReconcileService, ShutdownController};

/// Which loops a node runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Roles {
    /// Reconcile the trusted set from finalized heads.
    pub listen: bool,
    /// Keep this node's peer id inscribed on chain.
    pub announce: bool,
}

/// A configured relay.
pub struct WardenNode {
    config: NodeConfig,
    chain: Arc<dyn ChainClient>,
    clock: Arc<dyn Clock>,
    metrics: Arc<NodeMetrics>,
    shutdown: ShutdownController,
}

impl WardenNode {
    /// Build a node talking to the chain gateway named in `config`.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let chain = Arc::new(GatewayClient::new(config.gateway_config())?);
        Self::with_chain(config, chain, Arc::new(TokioClock))
    }

    /// Build a node on an existing chain client and clock.
    pub fn with_chain(
        config: NodeConfig,
        chain: Arc<dyn ChainClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        Ok(Self {
            config,
            chain,
            clock,
            metrics: Arc::new(NodeMetrics::new()?),
            shutdown: ShutdownController::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// The configured surface and the restart that goes with it. A manager
    /// restarts the cluster itself, so it gets a no-op restart.
    pub fn cluster_surface(
        &self,
    ) -> Result<(Arc<dyn ConfigSurface>, Arc<dyn RestartTrigger>), NodeError> {
        match self.config.surface()? {
            SurfaceSelection::ServiceJson(path) => {
                let restart: Arc<dyn RestartTrigger> = match self
                    .config
                    .restart_command
                    .as_deref()
                    .and_then(CommandRestart::from_command_line)
                {
                    Some(command) => Arc::new(command),
                    None => {
                        tracing::warn!("no restart_command configured, cluster will not be restarted");
                        Arc::new(NoopRestart)
                    }
                };
                Ok((Arc::new(ServiceJsonFile::new(path)), restart))
            }
            SurfaceSelection::Manager(url) => {
                Ok((Arc::new(ManagerClient::new(url)?), Arc::new(NoopRestart)))
            }
        }
    }

    /// Build the reconciliation pipeline on `surface`.
    pub fn reconcile_service(
        &self,
        surface: Arc<dyn ConfigSurface>,
        restart: Arc<dyn RestartTrigger>,
        board: Arc<StatusBoard>,
    ) -> Result<ReconcileService, NodeError> {
        self.config.validate_listener()?;
        let evaluator = TrustEvaluator::new(self.config.subnet()?, self.config.trust_params()?);
        let synchronizer =
            ConfigSynchronizer::new(surface).with_always_update(self.config.always_update);
        Ok(ReconcileService::new(
            self.chain.clone(),
            evaluator,
            TrustSet::new(self.config.leader()?),
            synchronizer,
            restart,
            self.metrics.clone(),
            board,
            self.clock.clone(),
            self.config.failure_backoff(),
        ))
    }

    pub fn announcer(&self) -> Result<Announcer, NodeError> {
        self.config.validate_announcer()?;
        Ok(Announcer::new(
            self.chain.clone(),
            self.clock.clone(),
            self.config.subnet()?,
            self.config.signing_identity()?,
            self.config.own_peer_id()?,
            self.config.announce_params(),
        ))
    }

    /// Run the selected loops until shutdown.
    pub async fn run(&self, roles: Roles) -> Result<(), NodeError> {
        if !roles.listen && !roles.announce {
            return Err(NodeError::Config("nothing to run".into()));
        }

        let mut tasks = tokio::task::JoinSet::new();

        if roles.listen {
            let (surface, restart) = self.cluster_surface()?;
            let board = Arc::new(StatusBoard::new(self.config.subnet()?, self.config.leader()?));
            let mut service = self.reconcile_service(surface, restart, board.clone())?;
            let shutdown_rx = self.shutdown.subscribe();
            tasks.spawn(async move {
                service.run(shutdown_rx).await;
                Ok(())
            });

            if self.config.enable_status {
                let server = StatusServer::new(
                    self.config.status_port,
                    board,
                    self.metrics.registry.clone(),
                );
                let signalled = self.shutdown.signalled();
                tasks.spawn(async move { server.start(signalled).await.map_err(NodeError::from) });
            }
        }

        if roles.announce {
            let announcer = self.announcer()?;
            let metrics = self.metrics.clone();
            let shutdown_rx = self.shutdown.subscribe();
            tasks.spawn(async move {
                announcer
                    .run(shutdown_rx, |outcome| match outcome {
                        StepOutcome::Submitted { .. } => metrics.inscriptions_submitted.inc(),
                        StepOutcome::BackedOff { .. } => metrics.inscriptions_failed.inc(),
                        StepOutcome::Waited { .. } => {}
                    })
                    .await;
                Ok(())
            });
        }

        let mut result = Ok(());
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| NodeError::Task(e.to_string()))
                .and_then(|r| r);
            if let Err(e) = outcome {
                tracing::error!(error = %e, "node task failed, shutting down");
                self.shutdown.shutdown();
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}
