//! State files.
//!
//! A state file is TOML with an optional `test` default, an optional `[verify]`
//! table and any number of `[[state]]` entries applied in file order:
//!
//! ```toml
//! test = false
//!
//! [verify]
//! attempts = 5
//! delay_secs = 1
//!
//! [[state]]
//! kind = "formatted"
//! name = "/dev/vg/data"
//! fs_type = "xfs"
//! force = true
//!
//! [[state]]
//! kind = "tuned"
//! name = "/dev/sdb"
//! read_ahead = 512
//! ```

use blockstate_error::{BlockstateResult, StateError};
use blockstate_hal::{FormatOptions, TuneOptions};
use blockstate_states::blockdev::DEFAULT_FS_TYPE;
use blockstate_states::{StateDeclaration, VerifyPolicy};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateFile {
    /// Default for `--test` when the flag is not given
    #[serde(default)]
    pub test: bool,
    #[serde(default)]
    pub verify: Option<VerifySettings>,
    #[serde(default, rename = "state")]
    pub states: Vec<StateEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VerifySettings {
    pub attempts: u32,
    #[serde(default)]
    pub delay_secs: u64,
}

impl From<VerifySettings> for VerifyPolicy {
    fn from(settings: VerifySettings) -> Self {
        VerifyPolicy {
            attempts: settings.attempts,
            delay: Duration::from_secs(settings.delay_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateEntry {
    Tuned {
        name: String,
        read_ahead: Option<u64>,
        filesystem_read_ahead: Option<u64>,
        read_only: Option<bool>,
        read_write: Option<bool>,
    },
    Formatted {
        name: String,
        #[serde(default = "default_fs_type")]
        fs_type: String,
        #[serde(default)]
        force: bool,
        inode_size: Option<u32>,
        lazy_itable_init: Option<bool>,
        fat: Option<u8>,
    },
}

fn default_fs_type() -> String {
    DEFAULT_FS_TYPE.to_string()
}

impl StateEntry {
    fn name(&self) -> &str {
        match self {
            StateEntry::Tuned { name, .. } | StateEntry::Formatted { name, .. } => name,
        }
    }

    fn validate(&self) -> BlockstateResult<()> {
        if self.name().trim().is_empty() {
            return Err(StateError::ValidationFailed(
                "state entry without a name".to_string(),
            ));
        }
        if let StateEntry::Formatted { name, fs_type, fat, .. } = self {
            if fs_type.trim().is_empty() {
                return Err(StateError::ValidationFailed(format!(
                    "{}: fs_type must not be empty",
                    name
                )));
            }
            if let Some(fat) = fat {
                validate_fat(*fat).map_err(|msg| {
                    StateError::ValidationFailed(format!("{}: {}", name, msg))
                })?;
            }
        }
        Ok(())
    }

    pub fn into_declaration(self) -> StateDeclaration {
        match self {
            StateEntry::Tuned {
                name,
                read_ahead,
                filesystem_read_ahead,
                read_only,
                read_write,
            } => StateDeclaration::Tuned {
                name,
                options: TuneOptions {
                    read_ahead,
                    filesystem_read_ahead,
                    read_only,
                    read_write,
                },
            },
            StateEntry::Formatted {
                name,
                fs_type,
                force,
                inode_size,
                lazy_itable_init,
                fat,
            } => StateDeclaration::Formatted {
                name,
                fs_type,
                options: FormatOptions {
                    force,
                    inode_size,
                    lazy_itable_init,
                    fat,
                },
            },
        }
    }
}

/// FAT sizes accepted by `mkfs.fat -F`.
pub fn validate_fat(fat: u8) -> Result<(), String> {
    match fat {
        12 | 16 | 32 => Ok(()),
        other => Err(format!("fat must be 12, 16 or 32, got {}", other)),
    }
}

impl StateFile {
    pub fn parse(content: &str) -> BlockstateResult<Self> {
        let file: StateFile =
            toml::from_str(content).map_err(|e| StateError::StateFile(e.to_string()))?;
        for entry in &file.states {
            entry.validate()?;
        }
        Ok(file)
    }

    pub fn load(path: &Path) -> BlockstateResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn verify_policy(&self) -> VerifyPolicy {
        self.verify.map(VerifyPolicy::from).unwrap_or_default()
    }

    pub fn declarations(&self) -> Vec<StateDeclaration> {
        self.states
            .iter()
            .cloned()
            .map(StateEntry::into_declaration)
            .collect()
    }
}
