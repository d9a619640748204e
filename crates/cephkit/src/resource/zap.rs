//! Device zapping through `ceph-volume`.
//!
//! There is no cheap way to tell whether a device is already clean, so a
//! zap always runs and always reports a change.

use super::{Observed, Resource, Step, step};
use crate::command::Tool;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Device (or logical volume) to wipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZapTarget {
    /// Raw device path or logical volume name
    pub device: String,
    /// Volume group holding `device`, when it is a logical volume
    #[serde(default)]
    pub volume_group: Option<String>,
    /// Also remove partitions, volume groups and logical volumes
    #[serde(default)]
    pub destroy: bool,
}

impl ZapTarget {
    /// Zap a raw device without destroying it.
    pub fn device(device: &str) -> Self {
        Self {
            device: device.to_string(),
            volume_group: None,
            destroy: false,
        }
    }

    /// Zap a logical volume in `vg`.
    pub fn logical_volume(vg: &str, lv: &str) -> Self {
        Self {
            device: lv.to_string(),
            volume_group: Some(vg.to_string()),
            destroy: false,
        }
    }

    /// Pass `--destroy`.
    pub fn destroying(mut self) -> Self {
        self.destroy = true;
        self
    }

    /// `vg/lv` for logical volumes, the device path otherwise.
    pub fn target(&self) -> String {
        match self.volume_group.as_deref().filter(|vg| !vg.is_empty()) {
            Some(vg) => format!("{vg}/{}", self.device),
            None => self.device.clone(),
        }
    }

    /// `lvm zap <target> [--destroy]`.
    pub fn zap_step(&self) -> Step {
        let mut args = step(["lvm".to_string(), "zap".to_string(), self.target()]);
        if self.destroy {
            args.push("--destroy".to_string());
        }
        args
    }
}

impl Resource for ZapTarget {
    type State = ();

    fn id(&self) -> String {
        self.target()
    }

    fn resource_type(&self) -> &'static str {
        "zap"
    }

    fn tool(&self) -> Tool {
        Tool::CephVolume
    }

    fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            return Err(Error::invalid("zap", self.target(), "device is empty"));
        }
        Ok(())
    }

    fn plan(&self, _observed: &Observed<()>) -> Result<Vec<Step>> {
        Ok(vec![self.zap_step()])
    }
}
