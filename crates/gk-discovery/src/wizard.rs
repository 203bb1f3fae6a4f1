//! Import / rebuild wizard as a pure state machine.
//!
//! [`next_step`] replays the raw answers given so far over a recommendation
//! and returns either the next question or the accepted personas. The
//! terminal loop that asks questions lives in the binary; everything it
//! decides is here.
//!
//! Order of questions:
//!
//! ```text
//! for each persona:   adopt? (y/n)  -> name [suggestion]
//!   for each platform:  adopt? (y/n)  -> account [known account]
//! ```
//!
//! A blank name keeps the suggestion; a blank account keeps the known one
//! or is asked again when there is none. Adopted personas that end up with
//! no platforms are dropped.

use gk_core::recommend::{RecommendedMapping, RecommendedPlatform};
use gk_core::{DeclaredConfig, Persona, Platform};

use crate::recommend::known_account;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    AdoptPersona { persona: usize },
    PersonaName { persona: usize },
    AdoptPlatform { persona: usize, platform: usize },
    PlatformAccount { persona: usize, platform: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub kind: QuestionKind,
    pub prompt: String,
    /// Value used for a blank answer.
    pub default: Option<String>,
}

impl Question {
    #[must_use]
    pub const fn is_yes_no(&self) -> bool {
        matches!(
            self.kind,
            QuestionKind::AdoptPersona { .. } | QuestionKind::AdoptPlatform { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardStep {
    Ask(Question),
    Complete(Vec<Persona>),
}

/// `y` / `yes`, case-insensitive.
#[must_use]
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Next question for `answers`, or the accepted personas once all are answered.
#[must_use]
pub fn next_step(mapping: &RecommendedMapping, answers: &[String]) -> WizardStep {
    let mut answers = answers.iter().map(|a| a.trim());
    let mut accepted = Vec::new();

    for (pi, recommended) in mapping.personas.iter().enumerate() {
        let Some(adopt) = answers.next() else {
            return WizardStep::Ask(Question {
                kind: QuestionKind::AdoptPersona { persona: pi },
                prompt: format!(
                    "Create a persona for {} <{}> ({} platform(s) found)?",
                    recommended.name,
                    recommended.email,
                    recommended.platforms.len()
                ),
                default: Some("n".into()),
            });
        };
        if !is_yes(adopt) {
            continue;
        }

        let Some(name) = answers.next() else {
            return WizardStep::Ask(Question {
                kind: QuestionKind::PersonaName { persona: pi },
                prompt: "Persona name".into(),
                default: Some(recommended.name.clone()),
            });
        };
        let name = if name.is_empty() {
            recommended.name.clone()
        } else {
            name.to_string()
        };

        let mut platforms = Vec::new();
        for (qi, candidate) in recommended.platforms.iter().enumerate() {
            let Some(adopt) = answers.next() else {
                return WizardStep::Ask(Question {
                    kind: QuestionKind::AdoptPlatform {
                        persona: pi,
                        platform: qi,
                    },
                    prompt: format!("Add {} for this persona?", describe(candidate)),
                    default: Some("n".into()),
                });
            };
            if !is_yes(adopt) {
                continue;
            }

            let known = known_account(candidate).map(str::to_string);
            let account = loop {
                let Some(answer) = answers.next() else {
                    return WizardStep::Ask(Question {
                        kind: QuestionKind::PlatformAccount {
                            persona: pi,
                            platform: qi,
                        },
                        prompt: format!("Account on {}", describe(candidate)),
                        default: known,
                    });
                };
                if !answer.is_empty() {
                    break answer.to_string();
                }
                if let Some(known) = &known {
                    break known.clone();
                }
            };

            let mut platform = Platform::new(candidate.kind, account, candidate.base_url.clone());
            platform.git_dir.clone_from(&candidate.git_dir);
            platforms.push(platform);
        }

        if platforms.is_empty() {
            tracing::debug!(persona = %name, "adopted persona has no platforms; dropped");
            continue;
        }
        accepted.push(Persona {
            name,
            email: recommended.email.clone(),
            platforms,
        });
    }

    WizardStep::Complete(accepted)
}

fn describe(platform: &RecommendedPlatform) -> String {
    match &platform.base_url {
        Some(base) => format!("{} ({base})", platform.kind),
        None => platform.kind.spec().canonical_host.to_string(),
    }
}

/// Merge accepted personas into `config`: new personas are appended, and
/// platforms new to an existing persona are added to it.
///
/// Returns how many personas and platforms were added.
pub fn merge_personas(config: &mut DeclaredConfig, accepted: Vec<Persona>) -> (usize, usize) {
    let (mut personas_added, mut platforms_added) = (0, 0);
    for persona in accepted {
        match config.persona_mut(&persona.name) {
            Some(existing) => {
                for platform in persona.platforms {
                    let known = existing.platforms.iter().any(|p| {
                        p.same_identity(platform.kind, &platform.account, platform.base_url.as_deref())
                    });
                    if !known {
                        existing.platforms.push(platform);
                        platforms_added += 1;
                    }
                }
            }
            None => {
                platforms_added += persona.platforms.len();
                personas_added += 1;
                config.personas.push(persona);
            }
        }
    }
    (personas_added, platforms_added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_core::PlatformKind;
    use gk_core::recommend::{RecommendationSource, RecommendedPersona};
    use pretty_assertions::assert_eq;

    fn mapping() -> RecommendedMapping {
        RecommendedMapping {
            personas: vec![
                RecommendedPersona {
                    name: "personal".into(),
                    email: "octo@example.com".into(),
                    source: RecommendationSource::GlobalIdentity,
                    platforms: vec![RecommendedPlatform {
                        kind: PlatformKind::GitHub,
                        account: crate::recommend::PLACEHOLDER_ACCOUNT.into(),
                        base_url: None,
                        key_path: Some("/h/.ssh/id_ed25519".into()),
                        git_dir: None,
                    }],
                },
                RecommendedPersona {
                    name: "work".into(),
                    email: "octo@acme.io".into(),
                    source: RecommendationSource::ConditionalInclude,
                    platforms: vec![RecommendedPlatform {
                        kind: PlatformKind::GitLab,
                        account: "octo-acme".into(),
                        base_url: Some("https://gitlab.acme.io".into()),
                        key_path: None,
                        git_dir: Some("~/work/".into()),
                    }],
                },
            ],
        }
    }

    fn answers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| (*a).to_string()).collect()
    }

    #[test]
    fn first_question_is_persona_adoption() {
        let WizardStep::Ask(question) = next_step(&mapping(), &[]) else {
            panic!("expected a question");
        };
        assert_eq!(question.kind, QuestionKind::AdoptPersona { persona: 0 });
        assert!(question.is_yes_no());
        assert!(question.prompt.contains("octo@example.com"));
    }

    #[test]
    fn placeholder_account_is_not_offered_and_blank_is_asked_again() {
        let step = next_step(&mapping(), &answers(&["y", "", "y", ""]));
        let WizardStep::Ask(question) = step else {
            panic!("expected a question");
        };
        assert_eq!(
            question.kind,
            QuestionKind::PlatformAccount {
                persona: 0,
                platform: 0
            }
        );
        assert_eq!(question.default, None);
    }

    #[test]
    fn full_replay_completes_with_defaults_applied() {
        let step = next_step(
            &mapping(),
            &answers(&["y", "", "yes", "", "octo", "Y", "acme", "y", ""]),
        );
        let WizardStep::Complete(personas) = step else {
            panic!("expected completion");
        };
        assert_eq!(personas.len(), 2);
        assert_eq!(personas[0].name, "personal");
        assert_eq!(personas[0].platforms[0].account, "octo");
        assert_eq!(personas[1].name, "acme");
        assert_eq!(personas[1].platforms[0].account, "octo-acme");
        assert_eq!(personas[1].platforms[0].git_dir.as_deref(), Some("~/work/"));
    }

    #[test]
    fn declined_personas_and_empty_adoptions_are_dropped() {
        let step = next_step(&mapping(), &answers(&["n", "y", "", "n"]));
        assert_eq!(step, WizardStep::Complete(Vec::new()));
    }

    #[test]
    fn merge_adds_only_new_identities() {
        let mut config = DeclaredConfig::new(gk_core::Machine {
            id: "m".into(),
            name: "laptop".into(),
            os: "linux".into(),
            os_version: None,
        });
        let WizardStep::Complete(first) = next_step(
            &mapping(),
            &answers(&["y", "", "y", "octo", "n"]),
        ) else {
            panic!("expected completion");
        };
        assert_eq!(merge_personas(&mut config, first.clone()), (1, 1));
        assert_eq!(merge_personas(&mut config, first), (0, 0));
        assert_eq!(config.personas.len(), 1);
    }
}
