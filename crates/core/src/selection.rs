//! # Backend Selection
//!
//! The single process-wide setting that chooses which backend variant new
//! pipeline runs are built against. It is held in an [`AtomicU8`] so reads
//! and updates are single-word operations: a reader sees either the old or
//! the new variant, never anything in between.
//!
//! The register is passed explicitly (usually behind an `Arc` in the
//! server's state) rather than reached through a global.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Which family of worker bindings a pipeline run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendVariant {
    /// Every worker on the primary backend (OpenAI)
    Primary,
    /// Web research on the alternate backend (Llama on Groq)
    Alternate,
}

impl BackendVariant {
    pub const ALL: [BackendVariant; 2] = [BackendVariant::Primary, BackendVariant::Alternate];

    /// Name accepted by the administrative endpoint
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendVariant::Primary => "OpenAI",
            BackendVariant::Alternate => "Llama Meta",
        }
    }

    /// Parse a display name; anything else is a configuration error
    pub fn from_name(name: &str) -> PipelineResult<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.display_name() == name)
            .ok_or_else(|| {
                PipelineError::configuration(format!(
                    "Invalid model name: {}. Must be '{}' or '{}'",
                    name,
                    BackendVariant::Alternate.display_name(),
                    BackendVariant::Primary.display_name()
                ))
            })
    }

    fn to_raw(self) -> u8 {
        match self {
            BackendVariant::Primary => 1,
            BackendVariant::Alternate => 2,
        }
    }

    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(BackendVariant::Primary),
            2 => Some(BackendVariant::Alternate),
            _ => None,
        }
    }
}

impl fmt::Display for BackendVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BackendVariant {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Single-slot register holding the current [`BackendVariant`]
#[derive(Debug)]
pub struct BackendSelection {
    raw: AtomicU8,
}

impl BackendSelection {
    pub fn new(initial: BackendVariant) -> Self {
        Self {
            raw: AtomicU8::new(initial.to_raw()),
        }
    }

    /// Read the current variant. Callers read once per run and keep the value.
    pub fn current(&self) -> PipelineResult<BackendVariant> {
        let raw = self.raw.load(Ordering::Acquire);
        BackendVariant::from_raw(raw).ok_or_else(|| {
            tracing::error!(raw, "backend selection register holds an unknown value");
            PipelineError::configuration(format!("unknown backend selection value {}", raw))
        })
    }

    /// Store a variant, returning the one it replaced
    pub fn set(&self, variant: BackendVariant) -> Option<BackendVariant> {
        let previous = self.raw.swap(variant.to_raw(), Ordering::AcqRel);
        BackendVariant::from_raw(previous)
    }

    /// Parse and store a display name. On error the register is untouched.
    pub fn set_by_name(&self, name: &str) -> PipelineResult<BackendVariant> {
        let variant = BackendVariant::from_name(name)?;
        let previous = self.set(variant);
        tracing::info!(
            from = previous.map(|v| v.display_name()).unwrap_or("unset"),
            to = variant.display_name(),
            "Backend selection updated"
        );
        Ok(variant)
    }
}

impl Default for BackendSelection {
    fn default() -> Self {
        Self::new(BackendVariant::Primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_is_primary() {
        let selection = BackendSelection::default();
        assert_eq!(selection.current().unwrap(), BackendVariant::Primary);
    }

    #[test]
    fn test_set_by_name() {
        let selection = BackendSelection::default();
        let variant = selection.set_by_name("Llama Meta").unwrap();
        assert_eq!(variant, BackendVariant::Alternate);
        assert_eq!(selection.current().unwrap(), BackendVariant::Alternate);
    }

    #[test]
    fn test_invalid_name_leaves_value_unchanged() {
        let selection = BackendSelection::new(BackendVariant::Alternate);
        let err = selection.set_by_name("Claude").unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("Invalid model name: Claude"));
        assert_eq!(selection.current().unwrap(), BackendVariant::Alternate);
    }

    #[test]
    fn test_names_round_trip() {
        for variant in BackendVariant::ALL {
            assert_eq!(variant.display_name().parse::<BackendVariant>().unwrap(), variant);
        }
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_values() {
        let selection = Arc::new(BackendSelection::default());

        let writer = {
            let selection = Arc::clone(&selection);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    let variant = if i % 2 == 0 {
                        BackendVariant::Alternate
                    } else {
                        BackendVariant::Primary
                    };
                    selection.set(variant);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let selection = Arc::clone(&selection);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        assert!(selection.current().is_ok());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        // Last write was i = 999, an odd index
        assert_eq!(selection.current().unwrap(), BackendVariant::Primary);
    }
}
