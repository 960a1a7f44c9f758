pub mod category;
pub mod coach_history;
pub mod decode;
pub mod error;
pub mod import;
pub mod judge_roles;
pub mod normalize;
pub mod registry;
pub mod similarity;
pub mod xml;

pub use category::{CategoryAnalyzer, CategorySuggestion, RankDictionary};
pub use coach_history::{CoachTransitionBuilder, TransitionReport};
pub use error::{ImporterError, Result};
pub use import::{
    BatchCorrections, BatchReport, CategoryCorrections, FailedFile, ImportConfig, ImportService,
    ImportSummary,
};
pub use judge_roles::{JudgeRole, RoleChange, assign_judge_roles, role_for_order};
pub use registry::{ClubRegistry, CoachRegistry, ImportSession};
pub use similarity::{ClubNameSimilarity, SimilarityStrategy, SimilarityThresholds};
