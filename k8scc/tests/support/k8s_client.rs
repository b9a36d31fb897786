#![allow(dead_code)]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8scc::k8s::{K8sClient, K8sError, PodPhase};
use kube::core::ErrorResponse;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// One answer of [`MockK8sClient::get_pod`] for a scripted pod.
#[derive(Debug, Clone)]
pub enum PodStep {
    Phase(PodPhase),
    Missing,
    Error(u16),
}

#[derive(Default)]
struct Script {
    steps: VecDeque<PodStep>,
    armed: bool,
}

#[derive(Default)]
struct State {
    pods: HashMap<String, Pod>,
    scripts: HashMap<String, Script>,
    created: Vec<Pod>,
    deleted: Vec<String>,
    get_calls: HashMap<String, usize>,
    failing_deletes: HashSet<String>,
}

/// In-memory [`K8sClient`] answering from scripted phase sequences.
///
/// The last step of a script repeats forever once reached.
#[derive(Default)]
pub struct MockK8sClient {
    state: Mutex<State>,
}

impl MockK8sClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an existing pod, such as the peer pod.
    pub fn with_pod(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pods
            .insert(name.to_owned(), named_pod(name));
        self
    }

    /// Scripts the answers for `name`, used right away.
    pub fn with_phases(self, name: &str, steps: impl IntoIterator<Item = PodStep>) -> Self {
        self.script(name, steps, true)
    }

    /// Scripts the answers for `name`, used once the pod has been created.
    pub fn on_create(self, name: &str, steps: impl IntoIterator<Item = PodStep>) -> Self {
        self.script(name, steps, false)
    }

    /// Makes every deletion of `name` fail with a server error.
    pub fn failing_delete(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(name.to_owned());
        self
    }

    pub fn created(&self) -> Vec<Pod> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn get_calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .get_calls
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    fn script(self, name: &str, steps: impl IntoIterator<Item = PodStep>, armed: bool) -> Self {
        self.state.lock().unwrap().scripts.insert(
            name.to_owned(),
            Script {
                steps: steps.into_iter().collect(),
                armed,
            },
        );
        self
    }
}

#[async_trait]
impl K8sClient for MockK8sClient {
    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, K8sError> {
        let mut state = self.state.lock().unwrap();
        *state.get_calls.entry(name.to_owned()).or_default() += 1;

        if let Some(script) = state.scripts.get_mut(name).filter(|script| script.armed) {
            let step = if script.steps.len() > 1 {
                script.steps.pop_front()
            } else {
                script.steps.front().cloned()
            };

            return match step {
                Some(PodStep::Phase(phase)) => Ok(Some(pod_in_phase(name, phase))),
                Some(PodStep::Missing) | None => Ok(None),
                Some(PodStep::Error(code)) => Err(api_error(code)),
            };
        }

        Ok(state.pods.get(name).cloned())
    }

    async fn create_pod(&self, pod: &Pod) -> Result<Pod, K8sError> {
        let mut state = self.state.lock().unwrap();
        let name = pod.metadata.name.clone().unwrap_or_default();

        if state.pods.contains_key(&name) {
            return Err(api_error(409));
        }
        if let Some(script) = state.scripts.get_mut(&name) {
            script.armed = true;
        }
        state.pods.insert(name, pod.clone());
        state.created.push(pod.clone());

        Ok(pod.clone())
    }

    async fn delete_pod(&self, name: &str) -> Result<(), K8sError> {
        let mut state = self.state.lock().unwrap();
        state.deleted.push(name.to_owned());

        if state.failing_deletes.contains(name) {
            return Err(api_error(500));
        }
        state.pods.remove(name);

        Ok(())
    }
}

pub fn api_error(code: u16) -> K8sError {
    K8sError::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".to_owned(),
        message: format!("mock error {code}"),
        reason: "Mock".to_owned(),
        code,
    }))
}

fn named_pod(name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            uid: Some(format!("{name}-uid")),
            ..ObjectMeta::default()
        },
        ..Pod::default()
    }
}

fn pod_in_phase(name: &str, phase: PodPhase) -> Pod {
    Pod {
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            ..PodStatus::default()
        }),
        ..named_pod(name)
    }
}
