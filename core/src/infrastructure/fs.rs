//! Directory-backed workload for local runs.
//!
//! Container paths are mapped under a root directory (`/etc/smf/x` becomes
//! `<root>/etc/smf/x`). Supervisor state is persisted as JSON in
//! `<root>/.supervisor/state.json` so successive `smfctl event` invocations
//! see the plan left by earlier ones. The container counts as reachable when
//! the root directory exists.

use std::path::{Component, Path, PathBuf};

use super::supervisor::SupervisorState;
use super::Workload;
use crate::error::{OperatorError, Result};
use crate::types::plan::{Layer, ServiceChange};

const STATE_DIR: &str = ".supervisor";
const STATE_FILE: &str = "state.json";

pub struct DirectoryWorkload {
    root: PathBuf,
}

impl DirectoryWorkload {
    pub fn new(root: &Path) -> Self {
        DirectoryWorkload {
            root: root.to_path_buf(),
        }
    }

    /// Map an absolute container path to a host path under the root.
    pub fn host_path(&self, path: &str) -> Result<PathBuf> {
        let mut mapped = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => mapped.push(part),
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(OperatorError::Invariant(format!(
                        "container path '{}' escapes the workload root",
                        path
                    )))
                }
            }
        }
        Ok(mapped)
    }

    fn state_path(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(STATE_FILE)
    }

    fn check_connected(&self) -> Result<()> {
        if self.can_connect() {
            Ok(())
        } else {
            Err(OperatorError::Unavailable(format!(
                "workload root {} does not exist",
                self.root.display()
            )))
        }
    }

    fn load_state(&self) -> Result<SupervisorState> {
        self.check_connected()?;
        let path = self.state_path();
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SupervisorState::new()),
            Err(e) => Err(OperatorError::io(path, e)),
        }
    }

    fn save_state(&self, state: &SupervisorState) -> Result<()> {
        let path = self.state_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OperatorError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&path, content).map_err(|e| OperatorError::io(path, e))
    }
}

impl Workload for DirectoryWorkload {
    fn can_connect(&self) -> bool {
        self.root.is_dir()
    }

    fn exists(&self, path: &str) -> Result<bool> {
        self.check_connected()?;
        Ok(self.host_path(path)?.is_file())
    }

    fn pull(&self, path: &str) -> Result<Option<String>> {
        self.check_connected()?;
        let host = self.host_path(path)?;
        match std::fs::read_to_string(&host) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OperatorError::io(host, e)),
        }
    }

    fn push(&mut self, path: &str, content: &str) -> Result<()> {
        self.check_connected()?;
        let host = self.host_path(path)?;
        if let Some(parent) = host.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OperatorError::io(parent, e))?;
        }
        std::fs::write(&host, content).map_err(|e| OperatorError::io(host, e))
    }

    fn add_layer(&mut self, label: &str, layer: &Layer, combine: bool) -> Result<()> {
        let mut state = self.load_state()?;
        state.add_layer(label, layer, combine)?;
        self.save_state(&state)
    }

    fn plan(&self) -> Result<Layer> {
        Ok(self.load_state()?.plan())
    }

    fn replan(&mut self) -> Result<Vec<ServiceChange>> {
        let mut state = self.load_state()?;
        let changes = state.replan();
        self.save_state(&state)?;
        Ok(changes)
    }
}
