use async_trait::async_trait;
use relaunch_deployment::{
    ClusterCommand, CommandOutput, CommandRunner, DeploymentError, DeploymentTarget,
    RedeployController, RedeployPolicy,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// In-memory stand-in for a cluster holding one deployment.
///
/// Deletion is asynchronous: after a delete the deployment stays visible for
/// `linger` existence checks.
struct FakeCluster {
    state: Mutex<ClusterState>,
    linger: u32,
}

#[derive(Default)]
struct ClusterState {
    instances: u32,
    terminating: Option<u32>,
    applies: u32,
}

impl FakeCluster {
    fn deployed(linger: u32) -> Self {
        Self {
            state: Mutex::new(ClusterState {
                instances: 1,
                ..Default::default()
            }),
            linger,
        }
    }

    fn instances(&self) -> u32 {
        self.state.lock().unwrap().instances
    }

    fn applies(&self) -> u32 {
        self.state.lock().unwrap().applies
    }
}

fn not_found(target: &DeploymentTarget) -> CommandOutput {
    CommandOutput::new(
        1,
        "",
        format!(
            "Error from server (NotFound): deployments.apps \"{}\" not found",
            target.name
        ),
    )
}

#[async_trait]
impl CommandRunner for FakeCluster {
    async fn execute(&self, command: &ClusterCommand) -> CommandOutput {
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        match command {
            ClusterCommand::DeleteManifest(_) => {
                if state.instances == 0 {
                    return not_found(&DeploymentTarget::default());
                }
                state.terminating.get_or_insert(self.linger);
                CommandOutput::new(
                    0,
                    "deployment.apps \"cicd-demo-deployment\" deleted\nservice \"cicd-demo-service\" deleted\n",
                    "",
                )
            }
            ClusterCommand::DeleteDeployment(target) => {
                if state.instances == 0 {
                    return not_found(target);
                }
                state.terminating.get_or_insert(self.linger);
                CommandOutput::new(0, format!("deployment.apps \"{}\" deleted", target.name), "")
            }
            ClusterCommand::GetDeployment(target) => {
                match state.terminating {
                    Some(0) => {
                        state.instances = 0;
                        state.terminating = None;
                    }
                    Some(n) => state.terminating = Some(n - 1),
                    None => {}
                }
                if state.instances == 0 {
                    not_found(target)
                } else {
                    CommandOutput::new(0, format!("{}   1/1     1            1", target.name), "")
                }
            }
            ClusterCommand::ApplyManifest(_) => {
                state.applies += 1;
                let verb = if state.instances == 0 { "created" } else { "configured" };
                state.instances = 1;
                CommandOutput::new(
                    0,
                    format!(
                        "deployment.apps/cicd-demo-deployment {verb}\nservice/cicd-demo-service {verb}\n"
                    ),
                    "",
                )
            }
        }
    }
}

fn manifest() -> PathBuf {
    let path = std::env::temp_dir().join(format!("relaunch-cycle-{}.yaml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "apiVersion: apps/v1\nkind: Deployment\n").unwrap();
    path
}

#[tokio::test]
async fn repeated_cycles_leave_one_deployment() {
    let cluster = Arc::new(FakeCluster::deployed(2));
    let controller = RedeployController::new(
        cluster.clone(),
        DeploymentTarget::default(),
        RedeployPolicy::immediate(10),
    );
    let path = manifest();

    let first = controller.redeploy(&path).await.unwrap();
    let second = controller.redeploy(&path).await.unwrap();

    assert_eq!(cluster.instances(), 1);
    assert_eq!(cluster.applies(), 2);
    assert_eq!(first.delete_attempts, 3);
    assert_eq!(second.delete_attempts, 3);
    assert!(second.applied[0].ends_with("created"));
    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn lingering_deployment_exhausts_bound() {
    let cluster = Arc::new(FakeCluster::deployed(50));
    let controller = RedeployController::new(
        cluster.clone(),
        DeploymentTarget::default(),
        RedeployPolicy::immediate(4),
    );
    let path = manifest();

    let err = controller.redeploy(&path).await.unwrap_err();

    assert!(matches!(
        err,
        DeploymentError::DeletionTimeout { attempts: 4, .. }
    ));
    assert_eq!(cluster.applies(), 0);
    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn overlapping_trigger_is_rejected() {
    let cluster = Arc::new(FakeCluster::deployed(1));
    let controller = RedeployController::new(
        cluster.clone(),
        DeploymentTarget::default(),
        RedeployPolicy::immediate(10),
    );
    let path = manifest();

    let (first, second) = tokio::join!(controller.redeploy(&path), controller.redeploy(&path));

    assert!(first.is_ok());
    assert!(matches!(second, Err(DeploymentError::InProgress { .. })));
    assert_eq!(cluster.applies(), 1);
    assert!(!controller.is_in_flight());
    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn empty_cluster_fails_bulk_delete() {
    let cluster = Arc::new(FakeCluster {
        state: Mutex::new(ClusterState::default()),
        linger: 0,
    });
    let controller = RedeployController::new(
        cluster.clone(),
        DeploymentTarget::default(),
        RedeployPolicy::immediate(10),
    );
    let path = manifest();

    let err = controller.redeploy(&path).await.unwrap_err();

    assert!(matches!(err, DeploymentError::DeleteManifestFailed { .. }));
    assert!(err.stderr().unwrap().contains("not found"));
    assert_eq!(cluster.applies(), 0);
    std::fs::remove_file(path).ok();
}
