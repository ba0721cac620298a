use crate::model::Plan;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub trait PlanStore {
    /// Dernier plan enregistré, `None` si aucun.
    fn load(&self) -> anyhow::Result<Option<Plan>>;
    /// Enregistre le plan complet en une seule écriture atomique.
    fn commit(&self, plan: &Plan) -> anyhow::Result<()>;
}

pub struct JsonPlanStore {
    path: PathBuf,
}

impl JsonPlanStore {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self { path: path.as_ref().to_path_buf() })
    }
}

impl PlanStore for JsonPlanStore {
    fn load(&self) -> anyhow::Result<Option<Plan>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let plan: Plan = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(plan))
    }

    fn commit(&self, plan: &Plan) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(plan)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        info!(plan = plan.id.as_str(), path = %self.path.display(), "plan committed");
        Ok(())
    }
}
