//! AI artifact cards: commit explanations, code analyses and task reports.
//!
//! | Module     | Responsibility                                               |
//! |------------|--------------------------------------------------------------|
//! | `models`   | `ArtifactKind`, `ArtifactKey`, `Artifact`, `GenerateOptions` |
//! | `store`    | `ArtifactStore` trait: cached-or-generated artifact source   |
//! | `card`     | `AiCard` state machine shared by every kind                  |
//! | `progress` | Rotating loading messages                                    |
//! | `confirm`  | `Confirm` seam guarding destructive regeneration             |

pub mod card;
pub mod confirm;
pub mod models;
pub mod progress;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
