//! Which (persona, platform) pairs a saga acts on.

use gk_core::{DeclaredConfig, Persona, Platform, PlatformKind};
use serde::Serialize;

use crate::error::LifecycleError;

/// Filter given on the command line. Persona and platform combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub persona: Option<String>,
    pub platform: Option<PlatformKind>,
    pub all: bool,
}

impl Selection {
    #[must_use]
    pub fn all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.all && self.persona.is_none() && self.platform.is_none()
    }

    #[must_use]
    pub fn matches(&self, persona: &Persona, platform: &Platform) -> bool {
        self.persona.as_deref().is_none_or(|name| name == persona.name)
            && self.platform.is_none_or(|kind| kind == platform.kind)
    }

    /// Indices of matching pairs, in declaration order.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::EmptySelection`] for an empty filter,
    /// [`LifecycleError::PersonaNotFound`] for an unknown persona.
    pub fn resolve(&self, config: &DeclaredConfig) -> Result<Vec<PairRef>, LifecycleError> {
        if self.is_empty() {
            return Err(LifecycleError::EmptySelection);
        }
        if let Some(name) = &self.persona
            && config.persona(name).is_none()
        {
            return Err(LifecycleError::PersonaNotFound(name.clone()));
        }
        Ok(pairs(config)
            .filter(|pair| {
                let persona = &config.personas[pair.persona];
                self.matches(persona, &persona.platforms[pair.platform])
            })
            .collect())
    }
}

/// Position of a platform inside the declared model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRef {
    pub persona: usize,
    pub platform: usize,
}

/// Every pair in declaration order.
pub fn pairs(config: &DeclaredConfig) -> impl Iterator<Item = PairRef> + '_ {
    config.personas.iter().enumerate().flat_map(|(pi, persona)| {
        (0..persona.platforms.len()).map(move |qi| PairRef {
            persona: pi,
            platform: qi,
        })
    })
}

/// Human label for report lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairLabel {
    pub persona: String,
    pub platform: PlatformKind,
    pub account: String,
}

impl PairLabel {
    #[must_use]
    pub fn of(persona: &Persona, platform: &Platform) -> Self {
        Self {
            persona: persona.name.clone(),
            platform: platform.kind,
            account: platform.account.clone(),
        }
    }
}

impl std::fmt::Display for PairLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.persona, self.platform, self.account)
    }
}
